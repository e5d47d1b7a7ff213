/// Role holding every capability, including visibility over devices it has
/// no explicit grant for.
pub const SUPER_ADMIN_ROLE: &str = "SuperAdmin";

/// Capabilities checked by handlers instead of comparing raw role ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// See and manage every device regardless of access grants.
    ViewAllDevices,
    /// Change `device_code` and `device_type` on an existing device.
    MutateDeviceIdentity,
}

/// Whether a role (by name) carries the given capability.
///
/// Roles other than the privileged one hold no blanket capabilities; their
/// device access comes entirely from explicit grants.
#[must_use]
pub fn allows(role: Option<&str>, _permission: Permission) -> bool {
    matches!(role, Some(SUPER_ADMIN_ROLE))
}
