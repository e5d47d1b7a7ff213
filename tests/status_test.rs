use chrono::{Duration, TimeZone, Utc};

use geosense::services::status::{DeviceStatus, OFFLINE_AFTER_SECS, device_status};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[test]
fn no_reading_means_inactive() {
    assert_eq!(device_status(None, now()), DeviceStatus::Inactive);
}

#[test]
fn recent_reading_means_active() {
    let now = now();
    assert_eq!(device_status(Some(now), now), DeviceStatus::Active);
    assert_eq!(
        device_status(Some(now - Duration::minutes(5)), now),
        DeviceStatus::Active
    );
    assert_eq!(
        device_status(Some(now - Duration::minutes(29)), now),
        DeviceStatus::Active
    );
}

#[test]
fn reading_exactly_at_threshold_is_still_active() {
    let now = now();
    assert_eq!(
        device_status(Some(now - Duration::seconds(OFFLINE_AFTER_SECS)), now),
        DeviceStatus::Active
    );
}

#[test]
fn reading_one_second_past_threshold_is_offline() {
    let now = now();
    assert_eq!(
        device_status(Some(now - Duration::seconds(OFFLINE_AFTER_SECS + 1)), now),
        DeviceStatus::Offline
    );
}

#[test]
fn very_old_reading_is_offline() {
    let now = now();
    assert_eq!(
        device_status(Some(now - Duration::days(30)), now),
        DeviceStatus::Offline
    );
}

#[test]
fn future_reading_is_active() {
    // Clock skew between device and server must not flag the device offline.
    let now = now();
    assert_eq!(
        device_status(Some(now + Duration::minutes(5)), now),
        DeviceStatus::Active
    );
}
