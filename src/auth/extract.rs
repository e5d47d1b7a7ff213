use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use sea_orm::EntityTrait;

use crate::auth::policy::{self, Permission};
use crate::auth::token;
use crate::common::AppState;
use crate::entity::{roles, users};
use crate::error::AppError;

/// Authenticated identity, resolved from the bearer token on every request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: users::Model,
    /// Role name, if the user has one assigned.
    pub role: Option<String>,
}

impl CurrentUser {
    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        policy::allows(self.role.as_deref(), permission)
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let unauthenticated = || AppError::Unauthorized("Unauthenticated.".to_string());

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(unauthenticated)?;

        let claims = token::verify(token, &state.config.jwt_secret)?;

        let user = users::Entity::find_by_id(claims.sub)
            .one(&*state.db)
            .await?
            .ok_or_else(unauthenticated)?;

        let role = match user.role_id {
            Some(role_id) => roles::Entity::find_by_id(role_id)
                .one(&*state.db)
                .await?
                .map(|r| r.name),
            None => None,
        };

        Ok(Self { user, role })
    }
}
