use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::collections::BTreeMap;

/// Per-field validation messages, one entry per violated rule.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fold another error set into this one, keeping field grouping.
    pub fn merge(&mut self, other: Self) {
        for (field, mut messages) in other.0 {
            self.0.entry(field).or_default().append(&mut messages);
        }
    }

    /// Errors collected so far, or `Ok` if none.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when at least one field message was added.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

impl AppError {
    /// 422 carrying a single per-field message.
    #[must_use]
    pub fn field(field: &str, message: &str) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    /// Fold a unique-constraint violation into a per-field validation error.
    ///
    /// Uniqueness is pre-checked before writes, but two concurrent writes can
    /// both pass the check; the loser hits the database constraint and still
    /// owes the client the per-field 422 rather than a 500. Other database
    /// errors pass through unchanged.
    #[must_use]
    pub fn from_unique_violation(err: sea_orm::DbErr, field: &str, message: &str) -> Self {
        match err.sql_err() {
            Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => Self::field(field, message),
            _ => Self::Database(err),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("The given data was invalid")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthenticated: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Database(e) => {
                tracing::error!("Database error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Database error" }),
                )
            }
            Self::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({
                    "message": "The given data was invalid.",
                    "errors": errors,
                }),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "message": msg })),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "message": msg })),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "message": msg })),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Internal server error" }),
                )
            }
            Self::Config(e) => {
                tracing::error!("Config error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "message": "Configuration error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
