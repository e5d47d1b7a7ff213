use geosense::entity::devices::DeviceType;
use geosense::error::AppError;
use geosense::routes::devices::DevicePayload;
use geosense::routes::users::UserPayload;

fn field_errors(err: AppError) -> std::collections::BTreeMap<String, Vec<String>> {
    match err {
        AppError::Validation(errors) => errors.0,
        other => panic!("expected validation error, got {other:?}"),
    }
}

fn full_device_payload() -> DevicePayload {
    DevicePayload {
        device_code: Some("DEV-001".to_string()),
        name: Some("Hillside sensor".to_string()),
        device_type: Some("LANDSLIDE".to_string()),
        latitude: Some(-6.9),
        longitude: Some(107.6),
        address: Some("Jalan Raya 1".to_string()),
        ..Default::default()
    }
}

#[test]
fn device_create_accepts_a_full_payload() {
    let new_device = full_device_payload().validate_create().unwrap();
    assert_eq!(new_device.device_code, "DEV-001");
    assert_eq!(new_device.device_type, DeviceType::Landslide);
}

#[test]
fn device_create_reports_every_missing_field() {
    let errors = field_errors(DevicePayload::default().validate_create().unwrap_err());

    for field in [
        "device_code",
        "name",
        "device_type",
        "latitude",
        "longitude",
        "address",
    ] {
        assert!(errors.contains_key(field), "missing error for {field}");
    }
}

#[test]
fn device_create_rejects_unknown_type() {
    let mut payload = full_device_payload();
    payload.device_type = Some("VOLCANO".to_string());

    let errors = field_errors(payload.validate_create().unwrap_err());
    assert_eq!(
        errors["device_type"],
        vec!["The selected device_type is invalid.".to_string()]
    );
}

#[test]
fn device_create_rejects_blank_required_strings() {
    let mut payload = full_device_payload();
    payload.name = Some("   ".to_string());

    let errors = field_errors(payload.validate_create().unwrap_err());
    assert!(errors.contains_key("name"));
}

#[test]
fn device_update_keeps_identity_fields_for_privileged_callers() {
    let payload = DevicePayload {
        device_code: Some("DEV-002".to_string()),
        device_type: Some("WILDFIRE".to_string()),
        name: Some("Renamed".to_string()),
        ..Default::default()
    };

    let changes = payload.validate_update(true).unwrap();
    assert_eq!(changes.device_code.as_deref(), Some("DEV-002"));
    assert_eq!(changes.device_type, Some(DeviceType::Wildfire));
    assert_eq!(changes.name.as_deref(), Some("Renamed"));
}

#[test]
fn device_update_silently_drops_identity_fields_for_others() {
    let payload = DevicePayload {
        device_code: Some("DEV-002".to_string()),
        device_type: Some("WILDFIRE".to_string()),
        name: Some("Renamed".to_string()),
        ..Default::default()
    };

    let changes = payload.validate_update(false).unwrap();
    assert!(changes.device_code.is_none());
    assert!(changes.device_type.is_none());
    // Non-identity fields still go through.
    assert_eq!(changes.name.as_deref(), Some("Renamed"));
}

#[test]
fn device_update_ignores_invalid_type_from_unprivileged_caller() {
    // The field is dropped before validation, so it cannot fail it.
    let payload = DevicePayload {
        device_type: Some("VOLCANO".to_string()),
        ..Default::default()
    };

    assert!(payload.validate_update(false).is_ok());
    assert!(payload.validate_update(true).is_err());
}

#[test]
fn user_create_requires_name_email_and_password() {
    let errors = field_errors(UserPayload::default().validate_create().unwrap_err());

    for field in ["name", "email", "password"] {
        assert!(errors.contains_key(field), "missing error for {field}");
    }
}

#[test]
fn user_create_rejects_bad_email_and_short_password() {
    let payload = UserPayload {
        name: Some("Dewi".to_string()),
        email: Some("not-an-email".to_string()),
        password: Some("short".to_string()),
        ..Default::default()
    };

    let errors = field_errors(payload.validate_create().unwrap_err());
    assert_eq!(
        errors["email"],
        vec!["The email must be a valid email address.".to_string()]
    );
    assert_eq!(
        errors["password"],
        vec!["The password must be at least 6 characters.".to_string()]
    );
}

#[test]
fn user_update_only_validates_present_fields() {
    assert!(UserPayload::default().validate_update().is_ok());

    let payload = UserPayload {
        email: Some("dewi@example.com".to_string()),
        ..Default::default()
    };
    assert!(payload.validate_update().is_ok());

    let payload = UserPayload {
        password: Some("short".to_string()),
        ..Default::default()
    };
    assert!(payload.validate_update().is_err());
}
