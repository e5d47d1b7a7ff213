use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::entity::{devices, roles, users};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form::{self, FormData};
use crate::services::storage;

/// Write payload for user create/update. All fields optional so that update
/// requests can send only what changes; create validates the required set.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct UserPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i32>,
    /// External avatar URL, stored verbatim. File uploads arrive as the
    /// multipart `photo` part instead.
    pub photo_path: Option<String>,
}

/// Validated required fields for user creation.
#[derive(Debug)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl UserPayload {
    /// Build the payload from a collected multipart form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when `role_id` is not an integer.
    pub fn from_form(form: &FormData) -> AppResult<Self> {
        let mut errors = FieldErrors::new();

        let role_id = match form.text("role_id") {
            None => None,
            Some(raw) => match raw.trim().parse::<i32>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("role_id", "The role_id must be an integer.");
                    None
                }
            },
        };

        errors.into_result()?;

        Ok(Self {
            name: form.text("name").map(str::to_string),
            email: form.text("email").map(str::to_string),
            password: form.text("password").map(str::to_string),
            role_id,
            photo_path: form.text("photo_path").map(str::to_string),
        })
    }

    /// Validate the required set for creation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with one message per violated rule.
    pub fn validate_create(&self) -> AppResult<NewUser> {
        let mut errors = FieldErrors::new();

        let name = form::require(&mut errors, "name", self.name.as_deref());
        let email = form::require(&mut errors, "email", self.email.as_deref());
        if let Some(email) = email {
            if !email.contains('@') {
                errors.add("email", "The email must be a valid email address.");
            }
        }
        let password = form::require(&mut errors, "password", self.password.as_deref());
        if let Some(password) = password {
            if password.len() < 6 {
                errors.add("password", "The password must be at least 6 characters.");
            }
        }

        errors.into_result()?;

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(AppError::Internal(
                "user validation passed with missing fields".to_string(),
            ));
        };

        Ok(NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }

    /// Validate the sometimes-rules for update: fields that are present must
    /// still satisfy their creation rules.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with one message per violated rule.
    pub fn validate_update(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.add("name", "The name field is required.");
            }
        }
        if let Some(email) = &self.email {
            if email.trim().is_empty() {
                errors.add("email", "The email field is required.");
            } else if !email.contains('@') {
                errors.add("email", "The email must be a valid email address.");
            }
        }
        if let Some(password) = &self.password {
            if password.len() < 6 {
                errors.add("password", "The password must be at least 6 characters.");
            }
        }

        errors.into_result()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role_id: Option<i32>,
    /// Resolved avatar URL (absolute URLs verbatim, local paths against the
    /// public asset base).
    pub photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<roles::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub devices: Option<Vec<devices::Model>>,
}

impl UserResponse {
    #[must_use]
    pub fn from_model(config: &Config, user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role_id: user.role_id,
            photo_url: storage::resolve_image_url(config, user.photo_path.as_deref()),
            role: None,
            devices: None,
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: Option<roles::Model>) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_devices(mut self, devices: Vec<devices::Model>) -> Self {
        self.devices = Some(devices);
        self
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct AttachDevicePayload {
    pub device_id: Option<i32>,
}
