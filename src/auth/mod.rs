mod extract;
pub mod password;
pub mod policy;
pub mod token;

pub use extract::CurrentUser;
pub use policy::Permission;
