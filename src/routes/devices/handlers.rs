use axum::{
    Json,
    extract::{Path, Request, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, LoaderTrait, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::auth::{CurrentUser, Permission};
use crate::common::AppState;
use crate::entity::device_settings::{
    self, DEFAULT_ALERT_THRESHOLD, DEFAULT_DANGER_THRESHOLD, DEFAULT_INITIAL_DISTANCE,
};
use crate::entity::{device_user, devices, sensor_readings, users};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form::{self, RequestBody};
use crate::routes::resolve_device;
use crate::services::storage;

use super::types::{Calibration, DevicePayload, DeviceResponse, PublicDeviceResponse};

/// Maximum readings embedded in a device detail response.
const DETAIL_READINGS_LIMIT: u64 = 100;

/// Insert or update a device's calibration row.
///
/// The insert carries defaults for anything the request left out; on
/// conflict with the per-device unique index only the provided columns are
/// overwritten, so concurrent partial updates never clobber each other's
/// fields.
pub async fn upsert_calibration<C: ConnectionTrait>(
    conn: &C,
    device_id: i32,
    calibration: &Calibration,
) -> AppResult<()> {
    let now = Utc::now();

    let mut update_columns = vec![device_settings::Column::UpdatedAt];
    if calibration.initial_distance.is_some() {
        update_columns.push(device_settings::Column::InitialDistance);
    }
    if calibration.alert_threshold.is_some() {
        update_columns.push(device_settings::Column::AlertThreshold);
    }
    if calibration.danger_threshold.is_some() {
        update_columns.push(device_settings::Column::DangerThreshold);
    }

    let insert = device_settings::Entity::insert(device_settings::ActiveModel {
        device_id: Set(device_id),
        initial_distance: Set(calibration
            .initial_distance
            .unwrap_or(DEFAULT_INITIAL_DISTANCE)),
        alert_threshold: Set(calibration.alert_threshold.unwrap_or(DEFAULT_ALERT_THRESHOLD)),
        danger_threshold: Set(calibration
            .danger_threshold
            .unwrap_or(DEFAULT_DANGER_THRESHOLD)),
        created_at: Set(Some(now.into())),
        updated_at: Set(Some(now.into())),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::column(device_settings::Column::DeviceId)
            .update_columns(update_columns)
            .to_owned(),
    )
    .exec(conn)
    .await;

    match insert {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn latest_reading(
    state: &AppState,
    device_id: i32,
) -> AppResult<Option<sensor_readings::Model>> {
    Ok(sensor_readings::Entity::find()
        .filter(sensor_readings::Column::DeviceId.eq(device_id))
        .order_by_desc(sensor_readings::Column::RecordedAt)
        .one(&*state.db)
        .await?)
}

/// List devices visible to the caller
///
/// Callers with the view-all permission see every device; everyone else sees
/// only devices granted to them.
#[utoipa::path(
    get,
    path = "/api/devices",
    responses(
        (status = 200, description = "Devices retrieved successfully", body = Vec<DeviceResponse>),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<DeviceResponse>>> {
    let device_list = if current.can(Permission::ViewAllDevices) {
        devices::Entity::find()
            .order_by_asc(devices::Column::Id)
            .all(&*state.db)
            .await?
    } else {
        current
            .user
            .find_related(devices::Entity)
            .order_by_asc(devices::Column::Id)
            .all(&*state.db)
            .await?
    };

    let settings_list = device_list
        .load_one(device_settings::Entity, &*state.db)
        .await?;
    let users_list = device_list
        .load_many_to_many(users::Entity, device_user::Entity, &*state.db)
        .await?;

    let now = Utc::now();
    let mut response = Vec::with_capacity(device_list.len());
    for ((device, settings), granted) in
        device_list.into_iter().zip(settings_list).zip(users_list)
    {
        let latest = latest_reading(&state, device.id).await?;
        response.push(
            DeviceResponse::from_model(&state.config, device, latest, now)
                .with_settings(settings)
                .with_users(granted),
        );
    }

    Ok(Json(response))
}

/// Register a device
///
/// Accepts JSON or multipart (for the `image` file part). Calibration fields
/// left out of the request fall back to the stock defaults.
#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = DevicePayload,
    responses(
        (status = 201, description = "Device created successfully", body = DeviceResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "devices"
)]
pub async fn create_device(
    State(state): State<AppState>,
    _current: CurrentUser,
    req: Request,
) -> AppResult<(StatusCode, Json<DeviceResponse>)> {
    let (payload, upload) = match form::request_body::<DevicePayload>(&state, req).await? {
        RequestBody::Json(payload) => (payload, None),
        RequestBody::Multipart(mut form_data) => {
            let upload = form_data.take_file("image");
            (DevicePayload::from_form(&form_data)?, upload)
        }
    };

    let new_device = payload.validate_create()?;

    let mut errors = FieldErrors::new();
    let code_taken = devices::Entity::find()
        .filter(devices::Column::DeviceCode.eq(new_device.device_code.as_str()))
        .one(&*state.db)
        .await?
        .is_some();
    if code_taken {
        errors.add("device_code", "The device_code has already been taken.");
    }
    if let Some(file) = &upload {
        if let Err(AppError::Validation(more)) = storage::validate_image("image", file) {
            errors.merge(more);
        }
    }
    errors.into_result()?;

    // The file lands on disk before the row that references it is committed.
    let image = match &upload {
        Some(file) => Some(storage::store(&state.config, "devices", file).await?),
        None => payload.image.clone(),
    };

    let txn = state.db.begin().await?;

    let created = devices::ActiveModel {
        device_code: Set(new_device.device_code),
        name: Set(new_device.name),
        device_type: Set(new_device.device_type),
        latitude: Set(new_device.latitude),
        longitude: Set(new_device.longitude),
        address: Set(new_device.address),
        image: Set(image),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, "device_code", "The device_code has already been taken.")
    })?;

    // A settings row only exists once some calibration value was written.
    let calibration = payload.calibration();
    if !calibration.is_empty() {
        upsert_calibration(&txn, created.id, &calibration).await?;
    }

    txn.commit().await?;

    let settings = devices::Entity::find_by_id(created.id)
        .find_also_related(device_settings::Entity)
        .one(&*state.db)
        .await?
        .and_then(|(_, s)| s);

    Ok((
        StatusCode::CREATED,
        Json(
            DeviceResponse::from_model(&state.config, created, None, Utc::now())
                .with_settings(settings),
        ),
    ))
}

/// Get a device with its calibration and recent readings
///
/// Embeds up to 100 of the newest readings, oldest first.
#[utoipa::path(
    get,
    path = "/api/devices/{id}",
    params(("id" = i32, Path, description = "Device id")),
    responses(
        (status = 200, description = "Device retrieved successfully", body = DeviceResponse),
        (status = 403, description = "No grant for this device"),
        (status = 404, description = "Device not found"),
    ),
    tag = "devices"
)]
pub async fn get_device(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<DeviceResponse>> {
    let device = resolve_device(&*state.db, &current, id).await?;

    let settings = device
        .find_related(device_settings::Entity)
        .one(&*state.db)
        .await?;
    let mut readings = device
        .find_related(sensor_readings::Entity)
        .order_by_desc(sensor_readings::Column::RecordedAt)
        .limit(DETAIL_READINGS_LIMIT)
        .all(&*state.db)
        .await?;
    readings.reverse();
    let granted_users = device.find_related(users::Entity).all(&*state.db).await?;

    let latest = readings.last().cloned();
    let response = DeviceResponse::from_model(&state.config, device, latest, Utc::now())
        .with_settings(settings)
        .with_readings(readings)
        .with_users(granted_users);

    Ok(Json(response))
}

/// Update a device
///
/// Accepts JSON or multipart. Identity fields (`device_code`, `device_type`)
/// are only written for callers holding the mutate-identity permission and
/// silently left untouched otherwise. Provided calibration fields are
/// upserted in the same transaction.
#[utoipa::path(
    put,
    path = "/api/devices/{id}",
    params(("id" = i32, Path, description = "Device id")),
    request_body = DevicePayload,
    responses(
        (status = 200, description = "Device updated successfully", body = DeviceResponse),
        (status = 403, description = "No grant for this device"),
        (status = 404, description = "Device not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "devices"
)]
pub async fn update_device(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
    req: Request,
) -> AppResult<Json<DeviceResponse>> {
    let device = resolve_device(&*state.db, &current, id).await?;

    let (payload, upload) = match form::request_body::<DevicePayload>(&state, req).await? {
        RequestBody::Json(payload) => (payload, None),
        RequestBody::Multipart(mut form_data) => {
            let upload = form_data.take_file("image");
            (DevicePayload::from_form(&form_data)?, upload)
        }
    };

    let changes = payload.validate_update(current.can(Permission::MutateDeviceIdentity))?;

    let mut errors = FieldErrors::new();
    if let Some(device_code) = changes.device_code.as_deref() {
        let taken = devices::Entity::find()
            .filter(devices::Column::DeviceCode.eq(device_code))
            .filter(devices::Column::Id.ne(device.id))
            .one(&*state.db)
            .await?
            .is_some();
        if taken {
            errors.add("device_code", "The device_code has already been taken.");
        }
    }
    if let Some(file) = &upload {
        if let Err(AppError::Validation(more)) = storage::validate_image("image", file) {
            errors.merge(more);
        }
    }
    errors.into_result()?;

    // Store the new image before touching the row; the old file is removed
    // only once the row points at the new one.
    let previous_image = device.image.clone();
    let new_image = match &upload {
        Some(file) => Some(storage::store(&state.config, "devices", file).await?),
        None => changes.image.clone(),
    };

    let calibration = payload.calibration();
    let device_id = device.id;

    let txn = state.db.begin().await?;

    let mut active: devices::ActiveModel = device.into();
    if let Some(device_code) = changes.device_code {
        active.device_code = Set(device_code);
    }
    if let Some(device_type) = changes.device_type {
        active.device_type = Set(device_type);
    }
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(latitude) = changes.latitude {
        active.latitude = Set(latitude);
    }
    if let Some(longitude) = changes.longitude {
        active.longitude = Set(longitude);
    }
    if let Some(address) = changes.address {
        active.address = Set(address);
    }
    if let Some(image) = new_image {
        active.image = Set(Some(image));
    }
    active.updated_at = Set(Some(Utc::now().into()));

    let updated = active.update(&txn).await.map_err(|e| {
        AppError::from_unique_violation(e, "device_code", "The device_code has already been taken.")
    })?;

    if !calibration.is_empty() {
        upsert_calibration(&txn, device_id, &calibration).await?;
    }

    txn.commit().await?;

    if upload.is_some() {
        if let Some(old) = previous_image {
            storage::delete_local(&state.config, &old).await;
        }
    }

    let settings = updated
        .find_related(device_settings::Entity)
        .one(&*state.db)
        .await?;
    let latest = latest_reading(&state, updated.id).await?;

    Ok(Json(
        DeviceResponse::from_model(&state.config, updated, latest, Utc::now())
            .with_settings(settings),
    ))
}

/// Delete a device
///
/// Readings, classification results, calibration and grants go with it.
#[utoipa::path(
    delete,
    path = "/api/devices/{id}",
    params(("id" = i32, Path, description = "Device id")),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 403, description = "No grant for this device"),
        (status = 404, description = "Device not found"),
    ),
    tag = "devices"
)]
pub async fn delete_device(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let device = resolve_device(&*state.db, &current, id).await?;
    device.delete(&*state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Public device map
///
/// Unauthenticated reduced view: identity and position only.
#[utoipa::path(
    get,
    path = "/api/public-devices",
    responses(
        (status = 200, description = "Devices retrieved successfully", body = Vec<PublicDeviceResponse>),
    ),
    tag = "devices"
)]
pub async fn public_devices(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<PublicDeviceResponse>>> {
    let device_list = devices::Entity::find()
        .order_by_asc(devices::Column::Id)
        .all(&*state.db)
        .await?;

    Ok(Json(
        device_list.into_iter().map(PublicDeviceResponse::from).collect(),
    ))
}
