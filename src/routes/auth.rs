use axum::{Json, extract::State, http::StatusCode};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::auth::{CurrentUser, password, token};
use crate::common::AppState;
use crate::entity::{roles, users};
use crate::error::{AppError, AppResult, FieldErrors};
use crate::routes::form;
use crate::routes::users::{UserPayload, UserResponse};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(default)]
pub struct LoginPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: UserResponse,
}

async fn token_response(state: &AppState, user: users::Model) -> AppResult<TokenResponse> {
    let access_token = token::issue(
        user.id,
        &state.config.jwt_secret,
        state.config.jwt_ttl_seconds,
    )?;
    let role = match user.role_id {
        Some(role_id) => roles::Entity::find_by_id(role_id).one(&*state.db).await?,
        None => None,
    };

    Ok(TokenResponse {
        access_token,
        token_type: "bearer",
        expires_in: state.config.jwt_ttl_seconds,
        user: UserResponse::from_model(&state.config, user).with_role(role),
    })
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Authenticated", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Validation failed"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> AppResult<Json<TokenResponse>> {
    let mut errors = FieldErrors::new();
    let email = form::require(&mut errors, "email", payload.email.as_deref());
    let plain = form::require(&mut errors, "password", payload.password.as_deref());
    errors.into_result()?;

    let (Some(email), Some(plain)) = (email, plain) else {
        return Err(AppError::Internal(
            "login validation passed with missing fields".to_string(),
        ));
    };

    let user = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(&*state.db)
        .await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized("Invalid credentials.".to_string()));
    };
    if !password::verify(plain, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials.".to_string()));
    }

    Ok(Json(token_response(&state, user).await?))
}

/// Register a new account
///
/// Self-registered accounts carry no role; device visibility comes from
/// grants an administrator attaches later.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = UserPayload,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 422, description = "Validation failed"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<UserPayload>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let new_user = payload.validate_create()?;

    let email_taken = users::Entity::find()
        .filter(users::Column::Email.eq(new_user.email.as_str()))
        .one(&*state.db)
        .await?
        .is_some();
    if email_taken {
        let mut errors = FieldErrors::new();
        errors.add("email", "The email has already been taken.");
        return Err(AppError::Validation(errors));
    }

    let created = users::ActiveModel {
        name: Set(new_user.name),
        email: Set(new_user.email),
        password_hash: Set(password::hash(&new_user.password)?),
        role_id: Set(None),
        ..Default::default()
    }
    .insert(&*state.db)
    .await
    .map_err(|e| {
        AppError::from_unique_violation(e, "email", "The email has already been taken.")
    })?;

    let response = token_response(&state, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Get the authenticated user
#[utoipa::path(
    post,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "auth"
)]
pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<UserResponse>> {
    let role = match current.user.role_id {
        Some(role_id) => roles::Entity::find_by_id(role_id).one(&*state.db).await?,
        None => None,
    };

    Ok(Json(
        UserResponse::from_model(&state.config, current.user).with_role(role),
    ))
}

/// Exchange a valid token for a fresh one
#[utoipa::path(
    post,
    path = "/api/refresh",
    responses(
        (status = 200, description = "Fresh token issued", body = TokenResponse),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "auth"
)]
pub async fn refresh(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<TokenResponse>> {
    Ok(Json(token_response(&state, current.user).await?))
}

/// Log out
///
/// Tokens are stateless; the client discards its copy and the token ages out
/// at its expiry.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthenticated"),
    ),
    tag = "auth"
)]
pub async fn logout(_current: CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "message": "Successfully logged out" }))
}
