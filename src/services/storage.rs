//! Local disk storage for uploaded images.
//!
//! Files are written under `Config::storage_root` and served back through the
//! public asset route. A new file is fully written before the database row
//! referencing it is committed; replaced files are deleted only afterwards.

use axum::body::Bytes;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult, FieldErrors};

pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

const ALLOWED_EXTENSIONS: [&str; 4] = ["jpeg", "jpg", "png", "gif"];

/// An image part extracted from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub bytes: Bytes,
}

/// Check extension and size limits for an uploaded image.
///
/// # Errors
///
/// Returns `AppError::Validation` with messages under `field`.
pub fn validate_image(field: &str, upload: &UploadedImage) -> AppResult<()> {
    let mut errors = FieldErrors::new();

    if !ALLOWED_EXTENSIONS.contains(&extension(&upload.filename).as_str()) {
        errors.add(field, "The file must be an image of type: jpeg, png, jpg, gif.");
    }
    if upload.bytes.len() > MAX_IMAGE_BYTES {
        errors.add(field, "The image may not be greater than 2048 kilobytes.");
    }

    errors.into_result()
}

/// Write an uploaded image under `storage_root/dir` and return its relative
/// path, suitable for persisting on the owning row.
///
/// # Errors
///
/// Returns `AppError::Internal` on filesystem failures.
pub async fn store(config: &Config, dir: &str, upload: &UploadedImage) -> AppResult<String> {
    let relative = format!("{dir}/{}.{}", Uuid::new_v4(), extension(&upload.filename));
    let absolute = PathBuf::from(&config.storage_root).join(&relative);

    if let Some(parent) = absolute.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create storage directory: {e}")))?;
    }
    tokio::fs::write(&absolute, &upload.bytes)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to store file: {e}")))?;

    Ok(relative)
}

/// Remove a previously stored local file. External URLs and already-missing
/// files are ignored.
pub async fn delete_local(config: &Config, path: &str) {
    if is_absolute_url(path) {
        return;
    }

    let absolute = PathBuf::from(&config.storage_root).join(path);
    if let Err(e) = tokio::fs::remove_file(&absolute).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path, error = %e, "Failed to delete stored file");
        }
    }
}

/// Resolve the stored image path to a client-facing URL.
///
/// Absolute URLs pass through verbatim; local paths are joined to the
/// configured public asset base.
#[must_use]
pub fn resolve_image_url(config: &Config, image: Option<&str>) -> Option<String> {
    let image = image?;
    if is_absolute_url(image) {
        return Some(image.to_string());
    }
    Some(format!(
        "{}/{}",
        config.public_asset_base_url.trim_end_matches('/'),
        image.trim_start_matches('/')
    ))
}

fn is_absolute_url(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

fn extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}
