use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::{CurrentUser, Permission};
use crate::common::AppState;
use crate::entity::{classification_results, device_user, devices, sensor_readings};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form;
use crate::routes::pagination::{self, Page, PageQuery, PER_PAGE};
use crate::routes::resolve_device;

/// Ingestion payload posted by a device. The device identifies itself by its
/// code; the relevant measurement subset depends on the device type and
/// everything else stays null.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct IngestPayload {
    pub device_code: Option<String>,
    /// Measurement time at the device.
    pub recorded_at: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub water_level: Option<f64>,
    pub tilt_x: Option<f64>,
    pub tilt_y: Option<f64>,
    pub magnitude: Option<f64>,
    pub landslide_score: Option<f32>,
    pub landslide_status: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct ReadingFilter {
    /// Restrict to one device.
    pub device_id: Option<i32>,
    /// 1-based page number.
    pub page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingDetail {
    #[serde(flatten)]
    pub reading: sensor_readings::Model,
    pub classification_results: Vec<classification_results::Model>,
}

/// Ingest a sensor reading
///
/// Unauthenticated, rate limited. An unknown device code is rejected and
/// nothing is persisted.
#[utoipa::path(
    post,
    path = "/api/sensor-readings",
    request_body = IngestPayload,
    responses(
        (status = 201, description = "Reading stored", body = sensor_readings::Model),
        (status = 404, description = "Unknown device code"),
        (status = 422, description = "Validation failed"),
        (status = 429, description = "Rate limit exceeded"),
    ),
    tag = "sensor-readings"
)]
pub async fn ingest_reading(
    State(state): State<AppState>,
    Json(payload): Json<IngestPayload>,
) -> AppResult<(StatusCode, Json<sensor_readings::Model>)> {
    let mut errors = FieldErrors::new();
    let device_code = form::require(&mut errors, "device_code", payload.device_code.as_deref());
    if payload.recorded_at.is_none() {
        errors.add("recorded_at", "The recorded_at field is required.");
    }
    errors.into_result()?;

    let (Some(device_code), Some(recorded_at)) = (device_code, payload.recorded_at) else {
        return Err(AppError::Internal(
            "ingest validation passed with missing fields".to_string(),
        ));
    };

    // Unknown codes reject the reading outright; nothing is persisted.
    let device = devices::Entity::find()
        .filter(devices::Column::DeviceCode.eq(device_code))
        .one(&*state.db)
        .await?;
    let Some(device) = device else {
        return Err(AppError::NotFound("Device not found".to_string()));
    };

    let created = sensor_readings::ActiveModel {
        device_id: Set(device.id),
        recorded_at: Set(recorded_at.into()),
        temperature: Set(payload.temperature),
        humidity: Set(payload.humidity),
        wind_speed: Set(payload.wind_speed),
        water_level: Set(payload.water_level),
        tilt_x: Set(payload.tilt_x),
        tilt_y: Set(payload.tilt_y),
        magnitude: Set(payload.magnitude),
        landslide_score: Set(payload.landslide_score),
        landslide_status: Set(payload.landslide_status),
        created_at: Set(Some(Utc::now().into())),
        ..Default::default()
    }
    .insert(&*state.db)
    .await?;

    tracing::debug!(
        device_id = device.id,
        device_code,
        "Stored sensor reading"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

/// List sensor readings, newest first
///
/// Optionally filtered to one device the caller can access; unfiltered
/// listings are scoped to the caller's device grants.
#[utoipa::path(
    get,
    path = "/api/sensor-readings",
    params(ReadingFilter),
    responses(
        (status = 200, description = "Readings retrieved successfully"),
        (status = 401, description = "Unauthenticated"),
        (status = 403, description = "No grant for this device"),
        (status = 404, description = "Device not found"),
    ),
    tag = "sensor-readings"
)]
pub async fn list_readings(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(filter): Query<ReadingFilter>,
) -> AppResult<Json<Page<sensor_readings::Model>>> {
    let mut query = sensor_readings::Entity::find()
        .order_by_desc(sensor_readings::Column::RecordedAt);

    if let Some(device_id) = filter.device_id {
        resolve_device(&*state.db, &current, device_id).await?;
        query = query.filter(sensor_readings::Column::DeviceId.eq(device_id));
    } else if !current.can(Permission::ViewAllDevices) {
        let granted: Vec<i32> = device_user::Entity::find()
            .filter(device_user::Column::UserId.eq(current.user.id))
            .select_only()
            .column(device_user::Column::DeviceId)
            .into_tuple()
            .all(&*state.db)
            .await?;
        query = query.filter(sensor_readings::Column::DeviceId.is_in(granted));
    }

    let page_query = PageQuery { page: filter.page };
    let page = pagination::fetch_page(query.paginate(&*state.db, PER_PAGE), &page_query).await?;

    Ok(Json(page))
}

/// Get a sensor reading with its classification results
#[utoipa::path(
    get,
    path = "/api/sensor-readings/{id}",
    params(("id" = i32, Path, description = "Reading id")),
    responses(
        (status = 200, description = "Reading retrieved successfully", body = ReadingDetail),
        (status = 403, description = "No grant for this device"),
        (status = 404, description = "Reading not found"),
    ),
    tag = "sensor-readings"
)]
pub async fn get_reading(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ReadingDetail>> {
    let reading = sensor_readings::Entity::find_by_id(id).one(&*state.db).await?;
    let Some(reading) = reading else {
        return Err(AppError::NotFound("Sensor reading not found".to_string()));
    };

    resolve_device(&*state.db, &current, reading.device_id).await?;

    let classification_results = reading
        .find_related(classification_results::Entity)
        .all(&*state.db)
        .await?;

    Ok(Json(ReadingDetail {
        reading,
        classification_results,
    }))
}
