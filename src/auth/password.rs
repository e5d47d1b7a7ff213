use crate::error::{AppError, AppResult};

/// Hash a plaintext password with bcrypt at the default cost.
///
/// # Errors
///
/// Returns `AppError::Internal` if hashing fails.
pub fn hash(plain: &str) -> AppResult<String> {
    bcrypt::hash(plain, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Constant result for malformed hashes: verification simply fails.
#[must_use]
pub fn verify(plain: &str, hashed: &str) -> bool {
    bcrypt::verify(plain, hashed).unwrap_or(false)
}
