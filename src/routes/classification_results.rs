use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::CurrentUser;
use crate::common::AppState;
use crate::entity::{classification_results, devices, sensor_readings};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form;
use crate::routes::pagination::{self, Page, PageQuery, PER_PAGE};

/// Write payload for classification results, typically posted by the
/// inference pipeline after scoring a reading.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct ClassificationPayload {
    pub device_id: Option<i32>,
    pub sensor_reading_id: Option<i32>,
    pub label: Option<String>,
    pub confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(default)]
pub struct ClassificationFilter {
    /// Restrict to one device.
    pub device_id: Option<i32>,
    /// 1-based page number.
    pub page: Option<u64>,
}

async fn validate_references(
    state: &AppState,
    errors: &mut FieldErrors,
    device_id: Option<i32>,
    sensor_reading_id: Option<i32>,
) -> AppResult<()> {
    if let Some(device_id) = device_id {
        if devices::Entity::find_by_id(device_id)
            .one(&*state.db)
            .await?
            .is_none()
        {
            errors.add("device_id", "The selected device_id is invalid.");
        }
    }
    if let Some(reading_id) = sensor_reading_id {
        if sensor_readings::Entity::find_by_id(reading_id)
            .one(&*state.db)
            .await?
            .is_none()
        {
            errors.add("sensor_reading_id", "The selected sensor_reading_id is invalid.");
        }
    }
    Ok(())
}

async fn resolve_result(
    state: &AppState,
    id: i32,
) -> AppResult<classification_results::Model> {
    classification_results::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Classification result not found".to_string()))
}

/// List classification results, newest first
#[utoipa::path(
    get,
    path = "/api/classification-results",
    params(ClassificationFilter),
    responses(
        (status = 200, description = "Classification results retrieved successfully"),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "classification-results"
)]
pub async fn list_classifications(
    State(state): State<AppState>,
    _current: CurrentUser,
    Query(filter): Query<ClassificationFilter>,
) -> AppResult<Json<Page<classification_results::Model>>> {
    let mut query = classification_results::Entity::find()
        .order_by_desc(classification_results::Column::CreatedAt)
        .order_by_desc(classification_results::Column::Id);

    if let Some(device_id) = filter.device_id {
        query = query.filter(classification_results::Column::DeviceId.eq(device_id));
    }

    let page_query = PageQuery { page: filter.page };
    let page = pagination::fetch_page(query.paginate(&*state.db, PER_PAGE), &page_query).await?;

    Ok(Json(page))
}

/// Record a classification result
#[utoipa::path(
    post,
    path = "/api/classification-results",
    request_body = ClassificationPayload,
    responses(
        (status = 201, description = "Classification result created successfully", body = classification_results::Model),
        (status = 401, description = "Unauthenticated"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "classification-results"
)]
pub async fn create_classification(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(payload): Json<ClassificationPayload>,
) -> AppResult<(StatusCode, Json<classification_results::Model>)> {
    let mut errors = FieldErrors::new();

    if payload.device_id.is_none() {
        errors.add("device_id", "The device_id field is required.");
    }
    let label = form::require(&mut errors, "label", payload.label.as_deref());
    if payload.confidence.is_none() {
        errors.add("confidence", "The confidence field is required.");
    }
    validate_references(&state, &mut errors, payload.device_id, payload.sensor_reading_id).await?;
    errors.into_result()?;

    let (Some(device_id), Some(label), Some(confidence)) =
        (payload.device_id, label, payload.confidence)
    else {
        return Err(AppError::Internal(
            "classification validation passed with missing fields".to_string(),
        ));
    };

    let created = classification_results::ActiveModel {
        device_id: Set(device_id),
        sensor_reading_id: Set(payload.sensor_reading_id),
        label: Set(label.to_string()),
        confidence: Set(confidence),
        created_at: Set(Some(chrono::Utc::now().into())),
        ..Default::default()
    }
    .insert(&*state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a classification result
#[utoipa::path(
    get,
    path = "/api/classification-results/{id}",
    params(("id" = i32, Path, description = "Classification result id")),
    responses(
        (status = 200, description = "Classification result retrieved successfully", body = classification_results::Model),
        (status = 404, description = "Classification result not found"),
    ),
    tag = "classification-results"
)]
pub async fn get_classification(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<classification_results::Model>> {
    Ok(Json(resolve_result(&state, id).await?))
}

/// Update a classification result
#[utoipa::path(
    put,
    path = "/api/classification-results/{id}",
    params(("id" = i32, Path, description = "Classification result id")),
    request_body = ClassificationPayload,
    responses(
        (status = 200, description = "Classification result updated successfully", body = classification_results::Model),
        (status = 404, description = "Classification result not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "classification-results"
)]
pub async fn update_classification(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<ClassificationPayload>,
) -> AppResult<Json<classification_results::Model>> {
    let result = resolve_result(&state, id).await?;

    let mut errors = FieldErrors::new();
    if let Some(label) = &payload.label {
        if label.trim().is_empty() {
            errors.add("label", "The label field is required.");
        }
    }
    validate_references(&state, &mut errors, payload.device_id, payload.sensor_reading_id).await?;
    errors.into_result()?;

    let mut active: classification_results::ActiveModel = result.into();
    if let Some(device_id) = payload.device_id {
        active.device_id = Set(device_id);
    }
    if payload.sensor_reading_id.is_some() {
        active.sensor_reading_id = Set(payload.sensor_reading_id);
    }
    if let Some(label) = payload.label {
        active.label = Set(label);
    }
    if let Some(confidence) = payload.confidence {
        active.confidence = Set(confidence);
    }

    let updated = active.update(&*state.db).await?;
    Ok(Json(updated))
}

/// Delete a classification result
#[utoipa::path(
    delete,
    path = "/api/classification-results/{id}",
    params(("id" = i32, Path, description = "Classification result id")),
    responses(
        (status = 204, description = "Classification result deleted"),
        (status = 404, description = "Classification result not found"),
    ),
    tag = "classification-results"
)]
pub async fn delete_classification(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let result = resolve_result(&state, id).await?;
    result.delete(&*state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
