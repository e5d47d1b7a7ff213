pub mod auth;
pub mod classification_results;
pub mod device_settings;
pub mod devices;
pub mod form;
pub mod health;
pub mod pagination;
pub mod roles;
pub mod sensor_readings;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use std::sync::Arc;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::auth::{CurrentUser, Permission};
use crate::common::AppState;
use crate::entity::{device_user, devices as devices_entity, users as users_entity};
use crate::error::{AppError, AppResult};
use crate::services::rate_limit::FallbackIpKeyExtractor;

// Request bodies stay small except image uploads, which are capped well
// below this by the per-file validation.
const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Resolve a user by id
pub async fn resolve_user(db: &DatabaseConnection, id: i32) -> AppResult<users_entity::Model> {
    users_entity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Resolve a device by id, enforcing the caller's visibility scope
///
/// Callers with the view-all permission reach every device; everyone else
/// needs a grant row. Missing devices are a 404 regardless of scope, a
/// known-but-ungranted device is a 403.
pub async fn resolve_device(
    db: &DatabaseConnection,
    current: &CurrentUser,
    id: i32,
) -> AppResult<devices_entity::Model> {
    let device = devices_entity::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Device not found".to_string()))?;

    if current.can(Permission::ViewAllDevices) {
        return Ok(device);
    }

    let granted = device_user::Entity::find()
        .filter(device_user::Column::UserId.eq(current.user.id))
        .filter(device_user::Column::DeviceId.eq(device.id))
        .one(db)
        .await?
        .is_some();
    if !granted {
        return Err(AppError::Forbidden(
            "You do not have access to this device.".to_string(),
        ));
    }

    Ok(device)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        auth::login,
        auth::register,
        auth::me,
        auth::refresh,
        auth::logout,
        devices::list_devices,
        devices::create_device,
        devices::get_device,
        devices::update_device,
        devices::delete_device,
        devices::public_devices,
        sensor_readings::ingest_reading,
        sensor_readings::list_readings,
        sensor_readings::get_reading,
        device_settings::list_settings,
        device_settings::create_settings,
        device_settings::get_settings,
        device_settings::update_settings,
        device_settings::delete_settings,
        classification_results::list_classifications,
        classification_results::create_classification,
        classification_results::get_classification,
        classification_results::update_classification,
        classification_results::delete_classification,
        users::list_users,
        users::create_user,
        users::get_user,
        users::update_user,
        users::delete_user,
        users::attach_device,
        users::detach_device,
        roles::list_roles,
        roles::create_role,
        roles::get_role,
        roles::update_role,
        roles::delete_role,
    ),
    components(
        schemas(
            crate::entity::devices::DeviceType,
            crate::entity::devices::Model,
            crate::entity::device_settings::Model,
            crate::entity::sensor_readings::Model,
            crate::entity::classification_results::Model,
            crate::entity::roles::Model,
            crate::entity::users::Model,
            crate::services::status::DeviceStatus,
            auth::LoginPayload,
            auth::TokenResponse,
            devices::DevicePayload,
            devices::DeviceResponse,
            devices::PublicDeviceResponse,
            devices::PublicUser,
            sensor_readings::IngestPayload,
            sensor_readings::ReadingDetail,
            device_settings::SettingsPayload,
            device_settings::SettingsResponse,
            classification_results::ClassificationPayload,
            users::UserPayload,
            users::UserResponse,
            users::AttachDevicePayload,
            roles::RolePayload,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Token authentication"),
        (name = "devices", description = "Monitoring devices and their derived status"),
        (name = "sensor-readings", description = "Raw measurements reported by devices"),
        (name = "device-settings", description = "Per-device calibration"),
        (name = "classification-results", description = "Model inference results"),
        (name = "users", description = "Accounts and device grants"),
        (name = "roles", description = "Account roles"),
    ),
    info(
        title = "GeoSense API",
        description = "Environmental monitoring backend for field IoT devices",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    // Public ingestion endpoint, rate limited per source IP
    let ingest_base =
        Router::new().route("/sensor-readings", post(sensor_readings::ingest_reading));
    let ingest_routes = if config.disable_rate_limiting {
        tracing::warn!("Rate limiting DISABLED");
        ingest_base
    } else {
        tracing::info!(
            ingest_rate = %format!(
                "{}/s burst {}",
                config.rate_limit_ingest_per_second, config.rate_limit_ingest_burst
            ),
            "Rate limiting configured"
        );
        let ingest_limiter = GovernorConfigBuilder::default()
            .key_extractor(FallbackIpKeyExtractor)
            .per_second(config.rate_limit_ingest_per_second)
            .burst_size(config.rate_limit_ingest_burst)
            .finish()
            .expect("Failed to create ingest rate limiter");

        ingest_base.layer(GovernorLayer {
            config: Arc::new(ingest_limiter),
        })
    };

    let public_routes = Router::new()
        .route("/public-devices", get(devices::public_devices))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register));

    // Authentication is enforced per handler through the bearer extractor.
    // POST on the item routes doubles as PUT for multipart clients that send
    // a `_method=PUT` override field.
    let protected_routes = Router::new()
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .route("/me", post(auth::me))
        .route(
            "/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route(
            "/devices/{id}",
            get(devices::get_device)
                .put(devices::update_device)
                .post(devices::update_device)
                .delete(devices::delete_device),
        )
        .route("/sensor-readings", get(sensor_readings::list_readings))
        .route("/sensor-readings/{id}", get(sensor_readings::get_reading))
        .route(
            "/device-settings",
            get(device_settings::list_settings).post(device_settings::create_settings),
        )
        .route(
            "/device-settings/{id}",
            get(device_settings::get_settings)
                .put(device_settings::update_settings)
                .delete(device_settings::delete_settings),
        )
        .route(
            "/classification-results",
            get(classification_results::list_classifications)
                .post(classification_results::create_classification),
        )
        .route(
            "/classification-results/{id}",
            get(classification_results::get_classification)
                .put(classification_results::update_classification)
                .delete(classification_results::delete_classification),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .post(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/devices", post(users::attach_device))
        .route(
            "/users/{id}/devices/{device_id}",
            delete(users::detach_device),
        )
        .route("/roles", get(roles::list_roles).post(roles::create_role))
        .route(
            "/roles/{id}",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        );

    let api_routes = Router::new()
        .merge(ingest_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES));

    // Health check routes (NO rate limiting)
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .nest_service("/storage", ServeDir::new(&config.storage_root))
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
