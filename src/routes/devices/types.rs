use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Config;
use crate::entity::devices::DeviceType;
use crate::entity::{device_settings, devices, sensor_readings, users};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form::{self, FormData};
use crate::services::status::{self, DeviceStatus};
use crate::services::storage;

/// Write payload for device create/update. All fields optional so that
/// update requests can send only what changes; create validates the
/// required set.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct DevicePayload {
    pub device_code: Option<String>,
    pub name: Option<String>,
    pub device_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    /// External image URL, stored verbatim. File uploads arrive as the
    /// multipart `image` part instead.
    pub image: Option<String>,
    pub initial_distance: Option<f64>,
    pub alert_threshold: Option<f64>,
    pub danger_threshold: Option<f64>,
}

/// Calibration fields a request chose to send. Absent fields keep their
/// stored (or default) values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calibration {
    pub initial_distance: Option<f64>,
    pub alert_threshold: Option<f64>,
    pub danger_threshold: Option<f64>,
}

impl Calibration {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.initial_distance.is_none()
            && self.alert_threshold.is_none()
            && self.danger_threshold.is_none()
    }
}

/// Validated required fields for device creation.
#[derive(Debug)]
pub struct NewDevice {
    pub device_code: String,
    pub name: String,
    pub device_type: DeviceType,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

/// Validated field set for a device update. Identity fields are present only
/// when the caller is allowed to change them.
#[derive(Debug, Default)]
pub struct DeviceChanges {
    pub device_code: Option<String>,
    pub name: Option<String>,
    pub device_type: Option<DeviceType>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
    pub image: Option<String>,
}

impl DevicePayload {
    /// Build the payload from a collected multipart form.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when a numeric field is unparseable.
    pub fn from_form(form: &FormData) -> AppResult<Self> {
        let mut errors = FieldErrors::new();

        let latitude = form.parse_f64("latitude", &mut errors);
        let longitude = form.parse_f64("longitude", &mut errors);
        let initial_distance = form.parse_f64("initial_distance", &mut errors);
        let alert_threshold = form.parse_f64("alert_threshold", &mut errors);
        let danger_threshold = form.parse_f64("danger_threshold", &mut errors);

        errors.into_result()?;

        Ok(Self {
            device_code: form.text("device_code").map(str::to_string),
            name: form.text("name").map(str::to_string),
            device_type: form.text("device_type").map(str::to_string),
            latitude,
            longitude,
            address: form.text("address").map(str::to_string),
            image: form.text("image").map(str::to_string),
            initial_distance,
            alert_threshold,
            danger_threshold,
        })
    }

    #[must_use]
    pub fn calibration(&self) -> Calibration {
        Calibration {
            initial_distance: self.initial_distance,
            alert_threshold: self.alert_threshold,
            danger_threshold: self.danger_threshold,
        }
    }

    /// Validate the required set for creation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with one message per violated rule.
    pub fn validate_create(&self) -> AppResult<NewDevice> {
        let mut errors = FieldErrors::new();

        let device_code = form::require(&mut errors, "device_code", self.device_code.as_deref());
        let name = form::require(&mut errors, "name", self.name.as_deref());
        let device_type = match form::require(&mut errors, "device_type", self.device_type.as_deref())
        {
            Some(raw) => match raw.parse::<DeviceType>() {
                Ok(device_type) => Some(device_type),
                Err(()) => {
                    errors.add("device_type", "The selected device_type is invalid.");
                    None
                }
            },
            None => None,
        };
        if self.latitude.is_none() {
            errors.add("latitude", "The latitude field is required.");
        }
        if self.longitude.is_none() {
            errors.add("longitude", "The longitude field is required.");
        }
        let address = form::require(&mut errors, "address", self.address.as_deref());

        errors.into_result()?;

        let (
            Some(device_code),
            Some(name),
            Some(device_type),
            Some(latitude),
            Some(longitude),
            Some(address),
        ) = (
            device_code,
            name,
            device_type,
            self.latitude,
            self.longitude,
            address,
        )
        else {
            return Err(AppError::Internal(
                "device validation passed with missing fields".to_string(),
            ));
        };

        Ok(NewDevice {
            device_code: device_code.to_string(),
            name: name.to_string(),
            device_type,
            latitude,
            longitude,
            address: address.to_string(),
        })
    }

    /// Validate the sometimes-rules for update.
    ///
    /// Identity fields (`device_code`, `device_type`) are silently dropped
    /// for callers without the mutate-identity permission, mirroring how the
    /// write set is narrowed rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` with one message per violated rule.
    pub fn validate_update(&self, can_mutate_identity: bool) -> AppResult<DeviceChanges> {
        let mut errors = FieldErrors::new();
        let mut changes = DeviceChanges::default();

        if can_mutate_identity {
            if let Some(device_code) = &self.device_code {
                if device_code.trim().is_empty() {
                    errors.add("device_code", "The device_code field is required.");
                } else {
                    changes.device_code = Some(device_code.clone());
                }
            }
            if let Some(raw) = &self.device_type {
                match raw.parse::<DeviceType>() {
                    Ok(device_type) => changes.device_type = Some(device_type),
                    Err(()) => errors.add("device_type", "The selected device_type is invalid."),
                }
            }
        }

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                errors.add("name", "The name field is required.");
            } else {
                changes.name = Some(name.clone());
            }
        }
        if let Some(address) = &self.address {
            if address.trim().is_empty() {
                errors.add("address", "The address field is required.");
            } else {
                changes.address = Some(address.clone());
            }
        }
        changes.latitude = self.latitude;
        changes.longitude = self.longitude;
        changes.image = self.image.clone();

        errors.into_result()?;
        Ok(changes)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceResponse {
    pub id: i32,
    pub device_code: String,
    pub name: String,
    pub device_type: DeviceType,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    /// Resolved image URL (absolute URLs verbatim, local paths against the
    /// public asset base).
    pub image_url: Option<String>,
    /// Derived from the newest reading timestamp on every read.
    pub status: DeviceStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub settings: Option<device_settings::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_reading: Option<sensor_readings::Model>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub readings: Option<Vec<sensor_readings::Model>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<PublicUser>>,
}

/// User summary embedded in device responses; never exposes credentials.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicUser {
    pub id: i32,
    pub name: String,
    pub email: String,
}

impl From<users::Model> for PublicUser {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

impl DeviceResponse {
    #[must_use]
    pub fn from_model(
        config: &Config,
        device: devices::Model,
        latest_reading: Option<sensor_readings::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        let latest_at = latest_reading
            .as_ref()
            .map(|r| r.recorded_at.with_timezone(&Utc));

        Self {
            id: device.id,
            device_code: device.device_code,
            name: device.name,
            device_type: device.device_type,
            latitude: device.latitude,
            longitude: device.longitude,
            address: device.address,
            image_url: storage::resolve_image_url(config, device.image.as_deref()),
            status: status::device_status(latest_at, now),
            created_at: device.created_at.map(|t| t.with_timezone(&Utc)),
            updated_at: device.updated_at.map(|t| t.with_timezone(&Utc)),
            settings: None,
            latest_reading,
            readings: None,
            users: None,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: Option<device_settings::Model>) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_readings(mut self, readings: Vec<sensor_readings::Model>) -> Self {
        self.readings = Some(readings);
        self
    }

    #[must_use]
    pub fn with_users(mut self, users: Vec<users::Model>) -> Self {
        self.users = Some(users.into_iter().map(PublicUser::from).collect());
        self
    }
}

/// Reduced device view for the unauthenticated map endpoint. No image,
/// calibration or reading data leaks through here.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicDeviceResponse {
    pub id: i32,
    pub device_code: String,
    pub name: String,
    pub device_type: DeviceType,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl From<devices::Model> for PublicDeviceResponse {
    fn from(device: devices::Model) -> Self {
        Self {
            id: device.id,
            device_code: device.device_code,
            name: device.name,
            device_type: device.device_type,
            latitude: device.latitude,
            longitude: device.longitude,
            address: device.address,
        }
    }
}
