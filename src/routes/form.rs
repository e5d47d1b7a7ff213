//! Request-body plumbing for endpoints that accept both JSON and
//! `multipart/form-data` (device and user writes with image uploads).
//!
//! Clients that cannot issue a native PUT with a file body POST a multipart
//! form carrying a `_method=PUT` field; the router maps that POST to the
//! update handler, so the override field itself is simply ignored here.

use axum::Json;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

use crate::common::AppState;
use crate::error::{AppError, AppResult, FieldErrors};
use crate::services::storage::UploadedImage;

/// A multipart form broken into text fields and file parts.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedImage>,
}

impl FormData {
    /// Drain a multipart stream into memory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` on malformed multipart bodies.
    pub async fn collect(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
        {
            let Some(name) = field.name().map(ToString::to_string) else {
                continue;
            };

            if let Some(filename) = field.file_name().map(ToString::to_string) {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                form.files.insert(name, UploadedImage { filename, bytes });
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read field: {e}")))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedImage> {
        self.files.remove(name)
    }

    /// Parse an optional numeric text field, recording a per-field error on
    /// unparseable input.
    pub fn parse_f64(&self, name: &str, errors: &mut FieldErrors) -> Option<f64> {
        let raw = self.text(name)?;
        match raw.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                errors.add(name, format!("The {name} must be a number."));
                None
            }
        }
    }
}

/// Required-field check: non-empty after trimming, otherwise a per-field
/// error is recorded and `None` returned.
pub fn require<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        _ => {
            errors.add(field, format!("The {field} field is required."));
            None
        }
    }
}

/// A write request body: parsed JSON, or a collected multipart form for the
/// handler to interpret.
pub enum RequestBody<P> {
    Json(P),
    Multipart(FormData),
}

/// Extract the body as JSON or multipart based on the Content-Type header.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for unreadable bodies of either kind.
pub async fn request_body<P: DeserializeOwned>(
    state: &AppState,
    req: Request,
) -> AppResult<RequestBody<P>> {
    let is_multipart = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?;
        Ok(RequestBody::Multipart(FormData::collect(multipart).await?))
    } else {
        let Json(payload) = Json::<P>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?;
        Ok(RequestBody::Json(payload))
    }
}
