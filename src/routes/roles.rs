use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, Set};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::common::AppState;
use crate::entity::roles;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct RolePayload {
    pub name: Option<String>,
}

async fn resolve_role(state: &AppState, id: i32) -> AppResult<roles::Model> {
    roles::Entity::find_by_id(id)
        .one(&*state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".to_string()))
}

async fn check_name_free(
    state: &AppState,
    errors: &mut FieldErrors,
    name: &str,
    exclude_id: Option<i32>,
) -> AppResult<()> {
    let mut query = roles::Entity::find().filter(roles::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(roles::Column::Id.ne(id));
    }
    if query.one(&*state.db).await?.is_some() {
        errors.add("name", "The name has already been taken.");
    }
    Ok(())
}

/// List roles
#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "Roles retrieved successfully", body = Vec<roles::Model>),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "roles"
)]
pub async fn list_roles(
    State(state): State<AppState>,
    _current: CurrentUser,
) -> AppResult<Json<Vec<roles::Model>>> {
    Ok(Json(roles::Entity::find().all(&*state.db).await?))
}

/// Create a role
#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = RolePayload,
    responses(
        (status = 201, description = "Role created successfully", body = roles::Model),
        (status = 422, description = "Validation failed"),
    ),
    tag = "roles"
)]
pub async fn create_role(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(payload): Json<RolePayload>,
) -> AppResult<(StatusCode, Json<roles::Model>)> {
    let mut errors = FieldErrors::new();
    let name = form::require(&mut errors, "name", payload.name.as_deref());
    if let Some(name) = name {
        check_name_free(&state, &mut errors, name, None).await?;
    }
    errors.into_result()?;

    let Some(name) = name else {
        return Err(AppError::Internal(
            "role validation passed with missing fields".to_string(),
        ));
    };

    let created = roles::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .map_err(|e| AppError::from_unique_violation(e, "name", "The name has already been taken."))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a role
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    params(("id" = i32, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role retrieved successfully", body = roles::Model),
        (status = 404, description = "Role not found"),
    ),
    tag = "roles"
)]
pub async fn get_role(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<roles::Model>> {
    Ok(Json(resolve_role(&state, id).await?))
}

/// Update a role
#[utoipa::path(
    put,
    path = "/api/roles/{id}",
    params(("id" = i32, Path, description = "Role id")),
    request_body = RolePayload,
    responses(
        (status = 200, description = "Role updated successfully", body = roles::Model),
        (status = 404, description = "Role not found"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "roles"
)]
pub async fn update_role(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
    Json(payload): Json<RolePayload>,
) -> AppResult<Json<roles::Model>> {
    let role = resolve_role(&state, id).await?;

    let mut errors = FieldErrors::new();
    let name = form::require(&mut errors, "name", payload.name.as_deref());
    if let Some(name) = name {
        check_name_free(&state, &mut errors, name, Some(role.id)).await?;
    }
    errors.into_result()?;

    let Some(name) = name else {
        return Err(AppError::Internal(
            "role validation passed with missing fields".to_string(),
        ));
    };

    let mut active: roles::ActiveModel = role.into();
    active.name = Set(name.to_string());

    let updated = active
        .update(&*state.db)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "name", "The name has already been taken."))?;
    Ok(Json(updated))
}

/// Delete a role
///
/// Users holding the role fall back to no role.
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(("id" = i32, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found"),
    ),
    tag = "roles"
)]
pub async fn delete_role(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    let role = resolve_role(&state, id).await?;
    role.delete(&*state.db).await?;
    Ok(StatusCode::NO_CONTENT)
}
