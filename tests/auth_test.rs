use geosense::auth::policy::{self, Permission, SUPER_ADMIN_ROLE};
use geosense::auth::{password, token};
use geosense::error::AppError;

#[test]
fn token_round_trip_preserves_claims() {
    let issued = token::issue(42, "secret", 3600).unwrap();
    let claims = token::verify(&issued, "secret").unwrap();

    assert_eq!(claims.sub, 42);
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[test]
fn token_with_wrong_secret_is_rejected() {
    let issued = token::issue(42, "secret", 3600).unwrap();
    let err = token::verify(&issued, "other-secret").unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[test]
fn tampered_token_is_rejected() {
    let issued = token::issue(42, "secret", 3600).unwrap();
    let mut parts: Vec<String> = issued.split('.').map(str::to_string).collect();
    // Swap the payload for a forged one; the signature no longer matches.
    parts[1] = parts[1].chars().rev().collect();
    let forged = parts.join(".");

    assert!(token::verify(&forged, "secret").is_err());
}

#[test]
fn expired_token_is_rejected() {
    let issued = token::issue(42, "secret", -120).unwrap();
    let err = token::verify(&issued, "secret").unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

#[test]
fn garbage_token_is_rejected() {
    assert!(token::verify("not-a-token", "secret").is_err());
}

#[test]
fn password_verify_accepts_matching_hash() {
    let hashed = password::hash("correct horse").unwrap();
    assert!(password::verify("correct horse", &hashed));
    assert!(!password::verify("wrong horse", &hashed));
}

#[test]
fn password_verify_rejects_malformed_hash() {
    assert!(!password::verify("anything", "not-a-bcrypt-hash"));
}

#[test]
fn super_admin_holds_every_permission() {
    for permission in [Permission::ViewAllDevices, Permission::MutateDeviceIdentity] {
        assert!(policy::allows(Some(SUPER_ADMIN_ROLE), permission));
    }
}

#[test]
fn other_roles_hold_no_blanket_permissions() {
    for role in [Some("Admin"), Some("User"), Some("superadmin"), None] {
        assert!(!policy::allows(role, Permission::ViewAllDevices));
        assert!(!policy::allows(role, Permission::MutateDeviceIdentity));
    }
}
