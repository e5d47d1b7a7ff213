use axum::body::Body;
use axum::extract::{Json, Path, State};
use axum::http::Request;
use chrono::Utc;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult};

use geosense::auth::CurrentUser;
use geosense::common::AppState;
use geosense::config::{Config, Deployment};
use geosense::entity::devices::DeviceType;
use geosense::entity::{devices, users};
use geosense::error::AppError;
use geosense::routes::devices::{Calibration, create_device, upsert_calibration};
use geosense::routes::sensor_readings::{IngestPayload, ingest_reading};
use geosense::routes::users::{AttachDevicePayload, attach_device, detach_device};

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_ttl_seconds: 3600,
        storage_root: "storage".to_string(),
        public_asset_base_url: "/storage".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 8000,
        disable_rate_limiting: true,
        rate_limit_ingest_per_second: 5,
        rate_limit_ingest_burst: 30,
        deployment: Deployment::Local,
    }
}

fn user(id: i32) -> users::Model {
    users::Model {
        id,
        name: "Dewi".to_string(),
        email: "dewi@example.com".to_string(),
        password_hash: "hash".to_string(),
        role_id: None,
        photo_path: None,
        created_at: None,
        updated_at: None,
    }
}

fn device(id: i32) -> devices::Model {
    devices::Model {
        id,
        device_code: format!("DEV-{id:03}"),
        name: "Hillside sensor".to_string(),
        device_type: DeviceType::Landslide,
        latitude: -6.9,
        longitude: 107.6,
        address: "Jalan Raya 1".to_string(),
        image: None,
        created_at: None,
        updated_at: None,
    }
}

fn super_admin() -> CurrentUser {
    CurrentUser {
        user: user(99),
        role: Some("SuperAdmin".to_string()),
    }
}

#[tokio::test]
async fn ingestion_with_unknown_device_code_persists_nothing() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<devices::Model>::new()])
        .into_connection();
    let state = AppState::new(db, test_config());

    let payload = IngestPayload {
        device_code: Some("GHOST".to_string()),
        recorded_at: Some(Utc::now()),
        temperature: Some(21.5),
        ..Default::default()
    };

    let err = ingest_reading(State(state.clone()), Json(payload))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    // Only the device lookup hit the database; no insert was attempted.
    let log = std::sync::Arc::try_unwrap(state.db).ok().unwrap().into_transaction_log();
    assert_eq!(log.len(), 1);
}

#[tokio::test]
async fn partial_calibration_upsert_only_overwrites_provided_columns() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 1,
            rows_affected: 1,
        }])
        .into_connection();

    let calibration = Calibration {
        alert_threshold: Some(65.0),
        ..Default::default()
    };
    upsert_calibration(&db, 7, &calibration).await.unwrap();

    let log = db.into_transaction_log();
    assert_eq!(log.len(), 1);
    let sql = format!("{log:?}");

    // Conflict clause touches only the provided column (plus updated_at).
    assert!(sql.contains(r#"\"alert_threshold\" = \"excluded\".\"alert_threshold\""#));
    assert!(!sql.contains(r#"\"initial_distance\" = \"excluded\""#));
    assert!(!sql.contains(r#"\"danger_threshold\" = \"excluded\""#));
    // The insert path still carries every calibration column, defaulted.
    assert!(sql.contains(r#"\"initial_distance\""#));
    assert!(sql.contains(r#"\"danger_threshold\""#));
}

#[tokio::test]
async fn attaching_an_already_attached_device_is_tolerated() {
    // The unique grant index rejects the duplicate row; the handler treats
    // that outcome as success.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user(1)]])
        .append_query_results([vec![device(7)]])
        .append_exec_errors([DbErr::RecordNotInserted])
        .append_query_results([vec![device(7)]])
        .into_connection();
    let state = AppState::new(db, test_config());

    let Json(body) = attach_device(
        State(state),
        super_admin(),
        Path(1),
        Json(AttachDevicePayload { device_id: Some(7) }),
    )
    .await
    .unwrap();

    assert_eq!(body["message"], "Device attached successfully");
    assert_eq!(body["user"]["devices"][0]["id"], 7);
}

#[tokio::test]
async fn detaching_an_absent_grant_is_a_no_op() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user(1)]])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .append_query_results([Vec::<devices::Model>::new()])
        .into_connection();
    let state = AppState::new(db, test_config());

    let Json(body) = detach_device(State(state), super_admin(), Path((1, 7)))
        .await
        .unwrap();

    assert_eq!(body["message"], "Device detached successfully");
    assert_eq!(body["user"]["devices"], serde_json::json!([]));
}

#[tokio::test]
async fn duplicate_device_code_create_is_rejected_before_any_write() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![device(1)]])
        .into_connection();
    let state = AppState::new(db, test_config());

    let payload = serde_json::json!({
        "device_code": "DEV-001",
        "name": "Hillside sensor",
        "device_type": "LANDSLIDE",
        "latitude": -6.9,
        "longitude": 107.6,
        "address": "Jalan Raya 1",
    });
    let req = Request::builder()
        .method("POST")
        .uri("/api/devices")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let err = create_device(State(state.clone()), super_admin(), req)
        .await
        .unwrap_err();
    match err {
        AppError::Validation(errors) => assert!(errors.0.contains_key("device_code")),
        other => panic!("expected validation error, got {other:?}"),
    }

    // The uniqueness check was the only statement; nothing was inserted.
    let log = std::sync::Arc::try_unwrap(state.db).ok().unwrap().into_transaction_log();
    assert_eq!(log.len(), 1);
}

#[test]
fn unique_violation_mapping_passes_other_errors_through() {
    let err = AppError::from_unique_violation(
        DbErr::RecordNotInserted,
        "email",
        "The email has already been taken.",
    );
    assert!(matches!(err, AppError::Database(_)));
}

#[test]
fn field_helper_produces_a_per_field_validation_error() {
    match AppError::field("email", "The email has already been taken.") {
        AppError::Validation(errors) => {
            assert_eq!(
                errors.0["email"],
                vec!["The email has already been taken.".to_string()]
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}
