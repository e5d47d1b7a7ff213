mod handlers;
mod types;

pub use handlers::{
    attach_device, create_user, delete_user, detach_device, get_user, list_users, update_user,
};
pub use types::{AttachDevicePayload, NewUser, UserPayload, UserResponse};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_attach_device, __path_create_user, __path_delete_user, __path_detach_device,
    __path_get_user, __path_list_users, __path_update_user,
};
