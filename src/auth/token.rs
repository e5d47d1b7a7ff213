use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub iat: i64,
    pub exp: i64,
}

/// Issue an HS256 bearer token for a user.
///
/// # Errors
///
/// Returns `AppError::Internal` if encoding fails.
pub fn issue(user_id: i32, secret: &str, ttl_seconds: i64) -> AppResult<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + ttl_seconds,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token encoding failed: {e}")))
}

/// Verify a bearer token and return its claims.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` for expired, malformed, or forged tokens.
pub fn verify(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized("Unauthenticated.".to_string()))
}
