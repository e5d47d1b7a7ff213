use axum::body::Bytes;

use geosense::config::{Config, Deployment};
use geosense::error::AppError;
use geosense::services::storage::{MAX_IMAGE_BYTES, UploadedImage, resolve_image_url, validate_image};

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/test".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_ttl_seconds: 3600,
        storage_root: "storage".to_string(),
        public_asset_base_url: "/storage".to_string(),
        api_host: "127.0.0.1".to_string(),
        api_port: 8000,
        disable_rate_limiting: true,
        rate_limit_ingest_per_second: 5,
        rate_limit_ingest_burst: 30,
        deployment: Deployment::Local,
    }
}

#[test]
fn missing_image_resolves_to_none() {
    assert_eq!(resolve_image_url(&test_config(), None), None);
}

#[test]
fn absolute_urls_pass_through_verbatim() {
    let config = test_config();
    assert_eq!(
        resolve_image_url(&config, Some("https://cdn.example.com/a.png")),
        Some("https://cdn.example.com/a.png".to_string())
    );
    assert_eq!(
        resolve_image_url(&config, Some("http://cdn.example.com/a.png")),
        Some("http://cdn.example.com/a.png".to_string())
    );
}

#[test]
fn local_paths_join_the_public_base() {
    let config = test_config();
    assert_eq!(
        resolve_image_url(&config, Some("devices/abc.png")),
        Some("/storage/devices/abc.png".to_string())
    );
}

#[test]
fn base_join_normalizes_slashes() {
    let mut config = test_config();
    config.public_asset_base_url = "https://assets.example.com/".to_string();
    assert_eq!(
        resolve_image_url(&config, Some("/devices/abc.png")),
        Some("https://assets.example.com/devices/abc.png".to_string())
    );
}

fn upload(filename: &str, len: usize) -> UploadedImage {
    UploadedImage {
        filename: filename.to_string(),
        bytes: Bytes::from(vec![0u8; len]),
    }
}

#[test]
fn accepts_allowed_image_extensions() {
    for name in ["photo.jpg", "photo.jpeg", "photo.PNG", "photo.gif"] {
        assert!(validate_image("image", &upload(name, 1024)).is_ok(), "{name}");
    }
}

#[test]
fn rejects_disallowed_extensions() {
    for name in ["script.php", "archive.zip", "noextension", "photo.svg"] {
        let err = validate_image("image", &upload(name, 1024)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{name}");
    }
}

#[test]
fn rejects_oversized_uploads() {
    let err = validate_image("image", &upload("photo.png", MAX_IMAGE_BYTES + 1)).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[test]
fn size_limit_is_inclusive() {
    assert!(validate_image("image", &upload("photo.png", MAX_IMAGE_BYTES)).is_ok());
}
