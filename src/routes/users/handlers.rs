use axum::{
    Json,
    extract::{Path, Request, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, ModelTrait, QueryFilter, Set,
};
use serde_json::json;

use crate::auth::{CurrentUser, password};
use crate::common::AppState;
use crate::entity::{device_user, devices, roles, users};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form::{self, RequestBody};
use crate::routes::resolve_user;
use crate::services::storage;

use super::types::{AttachDevicePayload, UserPayload, UserResponse};

/// List all users with their roles
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users retrieved successfully", body = Vec<UserResponse>),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> AppResult<Json<Vec<UserResponse>>> {
    let users_list = users::Entity::find()
        .find_also_related(roles::Entity)
        .all(&*state.db)
        .await?;

    let response = users_list
        .into_iter()
        .map(|(u, role)| UserResponse::from_model(&state.config, u).with_role(role))
        .collect();

    Ok(Json(response))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 422, description = "Validation failed"),
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<UserPayload>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let new_user = payload.validate_create()?;

    let mut errors = FieldErrors::new();
    let email_taken = users::Entity::find()
        .filter(users::Column::Email.eq(new_user.email.as_str()))
        .one(&*state.db)
        .await?
        .is_some();
    if email_taken {
        errors.add("email", "The email has already been taken.");
    }
    if let Some(role_id) = payload.role_id {
        if roles::Entity::find_by_id(role_id).one(&*state.db).await?.is_none() {
            errors.add("role_id", "The selected role_id is invalid.");
        }
    }
    errors.into_result()?;

    let created = users::ActiveModel {
        name: Set(new_user.name),
        email: Set(new_user.email),
        password_hash: Set(password::hash(&new_user.password)?),
        role_id: Set(payload.role_id),
        photo_path: Set(payload.photo_path),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, "email", "The email has already been taken.")
    })?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::from_model(&state.config, created)),
    ))
}

/// Get a user with their role and device grants
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User retrieved successfully", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = resolve_user(&*state.db, id).await?;

    let role = match user.role_id {
        Some(role_id) => roles::Entity::find_by_id(role_id).one(&*state.db).await?,
        None => None,
    };
    let granted_devices = user.find_related(devices::Entity).all(&*state.db).await?;

    Ok(Json(
        UserResponse::from_model(&state.config, user)
            .with_role(role)
            .with_devices(granted_devices),
    ))
}

/// Update a user
///
/// Accepts JSON or multipart (for the `photo` file part). A replaced local
/// photo file is deleted only after the row update succeeds.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
    req: Request,
) -> AppResult<Json<UserResponse>> {
    let user = resolve_user(&*state.db, id).await?;

    let (payload, upload) = match form::request_body::<UserPayload>(&state, req).await? {
        RequestBody::Json(payload) => (payload, None),
        RequestBody::Multipart(mut form_data) => {
            let upload = form_data.take_file("photo");
            (UserPayload::from_form(&form_data)?, upload)
        }
    };

    payload.validate_update()?;

    let mut errors = FieldErrors::new();
    if let Some(email) = payload.email.as_deref() {
        let taken = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::Id.ne(user.id))
            .one(&*state.db)
            .await?
            .is_some();
        if taken {
            errors.add("email", "The email has already been taken.");
        }
    }
    if let Some(role_id) = payload.role_id {
        if roles::Entity::find_by_id(role_id).one(&*state.db).await?.is_none() {
            errors.add("role_id", "The selected role_id is invalid.");
        }
    }
    errors.into_result()?;

    // Store the new photo before touching the row; the old file is removed
    // only once the row points at the new one.
    let previous_photo = user.photo_path.clone();
    let new_photo_path = match &upload {
        Some(file) => {
            storage::validate_image("photo", file)?;
            Some(storage::store(&state.config, "profiles", file).await?)
        }
        None => payload.photo_path.clone(),
    };

    let mut active: users::ActiveModel = user.into();
    if let Some(name) = payload.name {
        active.name = Set(name);
    }
    if let Some(email) = payload.email {
        active.email = Set(email);
    }
    if let Some(plain) = payload.password {
        active.password_hash = Set(password::hash(&plain)?);
    }
    if payload.role_id.is_some() {
        active.role_id = Set(payload.role_id);
    }
    if let Some(path) = new_photo_path.clone() {
        active.photo_path = Set(Some(path));
    }
    active.updated_at = Set(Some(Utc::now().into()));

    let updated = active.update(&*state.db).await.map_err(|e| {
        AppError::from_unique_violation(e, "email", "The email has already been taken.")
    })?;

    if upload.is_some() {
        if let Some(old) = previous_photo {
            storage::delete_local(&state.config, &old).await;
        }
    }

    Ok(Json(UserResponse::from_model(&state.config, updated)))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let user = resolve_user(&*state.db, id).await?;
    user.delete(&*state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Grant a user access to a device
///
/// Idempotent: attaching an already-attached device changes nothing.
#[utoipa::path(
    post,
    path = "/api/users/{id}/devices",
    params(("id" = i32, Path, description = "User id")),
    request_body = AttachDevicePayload,
    responses(
        (status = 200, description = "Device attached successfully"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "users"
)]
pub async fn attach_device(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<AttachDevicePayload>,
) -> AppResult<Json<serde_json::Value>> {
    let user = resolve_user(&*state.db, id).await?;

    let mut errors = FieldErrors::new();
    let device_id = match payload.device_id {
        Some(device_id) => {
            if devices::Entity::find_by_id(device_id)
                .one(&*state.db)
                .await?
                .is_none()
            {
                errors.add("device_id", "The selected device_id is invalid.");
            }
            device_id
        }
        None => {
            errors.add("device_id", "The device_id field is required.");
            0
        }
    };
    errors.into_result()?;

    // Unique (user_id, device_id) index makes concurrent attaches collapse
    // into a single row.
    let insert = device_user::Entity::insert(device_user::ActiveModel {
        user_id: Set(user.id),
        device_id: Set(device_id),
        ..Default::default()
    })
    .on_conflict(
        OnConflict::columns([device_user::Column::UserId, device_user::Column::DeviceId])
            .do_nothing()
            .to_owned(),
    )
    .exec(&*state.db)
    .await;

    match insert {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    let granted = user.find_related(devices::Entity).all(&*state.db).await?;
    let response = UserResponse::from_model(&state.config, user).with_devices(granted);

    Ok(Json(json!({
        "message": "Device attached successfully",
        "user": response,
    })))
}

/// Revoke a user's access to a device
///
/// Detaching an absent grant is a no-op.
#[utoipa::path(
    delete,
    path = "/api/users/{id}/devices/{device_id}",
    params(
        ("id" = i32, Path, description = "User id"),
        ("device_id" = i32, Path, description = "Device id"),
    ),
    responses(
        (status = 200, description = "Device detached successfully"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn detach_device(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path((id, device_id)): Path<(i32, i32)>,
) -> AppResult<Json<serde_json::Value>> {
    let user = resolve_user(&*state.db, id).await?;

    device_user::Entity::delete_many()
        .filter(device_user::Column::UserId.eq(user.id))
        .filter(device_user::Column::DeviceId.eq(device_id))
        .exec(&*state.db)
        .await?;

    let granted = user.find_related(devices::Entity).all(&*state.db).await?;
    let response = UserResponse::from_model(&state.config, user).with_devices(granted);

    Ok(Json(json!({
        "message": "Device detached successfully",
        "user": response,
    })))
}
