use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::auth::CurrentUser;
use crate::common::AppState;
use crate::entity::{device_settings, devices};
use crate::error::{AppError, AppResult, FieldErrors};

/// Write payload for calibration rows managed directly, outside the nested
/// device create/update path.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct SettingsPayload {
    pub device_id: Option<i32>,
    pub initial_distance: Option<f64>,
    pub alert_threshold: Option<f64>,
    pub danger_threshold: Option<f64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct SettingsFilter {
    /// Restrict to one device.
    pub device_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    #[serde(flatten)]
    pub settings: device_settings::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<devices::Model>,
}

async fn resolve_settings(state: &AppState, id: i32) -> AppResult<device_settings::Model> {
    device_settings::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Device settings not found".to_string()))
}

/// List calibration rows with their devices
#[utoipa::path(
    get,
    path = "/api/device-settings",
    params(SettingsFilter),
    responses(
        (status = 200, description = "Device settings retrieved successfully", body = Vec<SettingsResponse>),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "device-settings"
)]
pub async fn list_settings(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(filter): Query<SettingsFilter>,
) -> AppResult<Json<Vec<SettingsResponse>>> {
    let mut query = device_settings::Entity::find().find_also_related(devices::Entity);
    if let Some(device_id) = filter.device_id {
        query = query.filter(device_settings::Column::DeviceId.eq(device_id));
    }

    let rows = query.all(&*state.db).await?;
    let response = rows
        .into_iter()
        .map(|(settings, device)| SettingsResponse { settings, device })
        .collect();

    Ok(Json(response))
}

/// Create a calibration row
///
/// Each device carries at most one; creating a second for the same device is
/// a validation error.
#[utoipa::path(
    post,
    path = "/api/device-settings",
    request_body = SettingsPayload,
    responses(
        (status = 201, description = "Device settings created successfully", body = device_settings::Model),
        (status = 401, description = "Unauthenticated"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "device-settings"
)]
pub async fn create_settings(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(payload): Json<SettingsPayload>,
) -> AppResult<(StatusCode, Json<device_settings::Model>)> {
    let mut errors = FieldErrors::new();

    match payload.device_id {
        None => errors.add("device_id", "The device_id field is required."),
        Some(device_id) => {
            if devices::Entity::find_by_id(device_id)
                .one(&*state.db)
                .await?
                .is_none()
            {
                errors.add("device_id", "The selected device_id is invalid.");
            } else if device_settings::Entity::find()
                .filter(device_settings::Column::DeviceId.eq(device_id))
                .one(&*state.db)
                .await?
                .is_some()
            {
                errors.add("device_id", "The device_id has already been taken.");
            }
        }
    }
    if payload.initial_distance.is_none() {
        errors.add("initial_distance", "The initial_distance field is required.");
    }
    if payload.alert_threshold.is_none() {
        errors.add("alert_threshold", "The alert_threshold field is required.");
    }
    if payload.danger_threshold.is_none() {
        errors.add("danger_threshold", "The danger_threshold field is required.");
    }
    errors.into_result()?;

    let (Some(device_id), Some(initial_distance), Some(alert_threshold), Some(danger_threshold)) = (
        payload.device_id,
        payload.initial_distance,
        payload.alert_threshold,
        payload.danger_threshold,
    ) else {
        return Err(AppError::Internal(
            "settings validation passed with missing fields".to_string(),
        ));
    };

    let now = Utc::now();
    let created = device_settings::ActiveModel {
        device_id: Set(device_id),
        initial_distance: Set(initial_distance),
        alert_threshold: Set(alert_threshold),
        danger_threshold: Set(danger_threshold),
        created_at: Set(Some(now.into())),
        updated_at: Set(Some(now.into())),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, "device_id", "The device_id has already been taken.")
    })?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a calibration row with its device
#[utoipa::path(
    get,
    path = "/api/device-settings/{id}",
    params(("id" = i32, Path, description = "Settings id")),
    responses(
        (status = 200, description = "Device settings retrieved successfully", body = SettingsResponse),
        (status = 404, description = "Device settings not found"),
    ),
    tag = "device-settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<SettingsResponse>> {
    let settings = resolve_settings(&state, id).await?;
    let device = settings.find_related(devices::Entity).one(&*state.db).await?;

    Ok(Json(SettingsResponse { settings, device }))
}

/// Update a calibration row
///
/// Absent fields keep their stored values.
#[utoipa::path(
    put,
    path = "/api/device-settings/{id}",
    params(("id" = i32, Path, description = "Settings id")),
    request_body = SettingsPayload,
    responses(
        (status = 200, description = "Device settings updated successfully", body = device_settings::Model),
        (status = 404, description = "Device settings not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "device-settings"
)]
pub async fn update_settings(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<SettingsPayload>,
) -> AppResult<Json<device_settings::Model>> {
    let settings = resolve_settings(&state, id).await?;

    let mut active: device_settings::ActiveModel = settings.into();
    if let Some(initial_distance) = payload.initial_distance {
        active.initial_distance = Set(initial_distance);
    }
    if let Some(alert_threshold) = payload.alert_threshold {
        active.alert_threshold = Set(alert_threshold);
    }
    if let Some(danger_threshold) = payload.danger_threshold {
        active.danger_threshold = Set(danger_threshold);
    }
    active.updated_at = Set(Some(Utc::now().into()));

    let updated = active.update(&*state.db).await?;
    Ok(Json(updated))
}

/// Delete a calibration row
///
/// The owning device falls back to defaults on its next nested write.
#[utoipa::path(
    delete,
    path = "/api/device-settings/{id}",
    params(("id" = i32, Path, description = "Settings id")),
    responses(
        (status = 204, description = "Device settings deleted"),
        (status = 404, description = "Device settings not found"),
    ),
    tag = "device-settings"
)]
pub async fn delete_settings(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let settings = resolve_settings(&state, id).await?;
    settings.delete(&*state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
