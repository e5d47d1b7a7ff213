use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A device whose newest reading is older than this is considered offline.
pub const OFFLINE_AFTER_SECS: i64 = 30 * 60;

/// Computed from the latest reading timestamp on every read; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Active,
    Offline,
    Inactive,
}

/// Derive the status of a device from its most recent reading.
///
/// No reading at all means the device never reported: INACTIVE. A reading
/// exactly at the threshold still counts as ACTIVE.
#[must_use]
pub fn device_status(latest_recorded_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DeviceStatus {
    match latest_recorded_at {
        None => DeviceStatus::Inactive,
        Some(t) if (now - t).num_seconds() > OFFLINE_AFTER_SECS => DeviceStatus::Offline,
        Some(_) => DeviceStatus::Active,
    }
}
