use super::*;

// =============================================================================
// parse_sign_in
// =============================================================================

#[test]
fn parse_sign_in_success() {
    let body = r#"{"kind":"identitytoolkit#VerifyPasswordResponse","localId":"uid-42","email":"ada@uni.edu","idToken":"t"}"#;
    let principal = parse_sign_in(200, body).unwrap();
    assert_eq!(principal.uid, "uid-42");
    assert_eq!(principal.email.as_deref(), Some("ada@uni.edu"));
}

#[test]
fn parse_sign_in_invalid_password() {
    let body = r#"{"error":{"code":400,"message":"INVALID_PASSWORD"}}"#;
    assert!(matches!(parse_sign_in(400, body), Err(AuthError::InvalidCredentials)));
}

#[test]
fn parse_sign_in_invalid_login_credentials() {
    let body = r#"{"error":{"code":400,"message":"INVALID_LOGIN_CREDENTIALS"}}"#;
    assert!(matches!(parse_sign_in(400, body), Err(AuthError::InvalidCredentials)));
}

#[test]
fn parse_sign_in_rate_limited_is_provider_error() {
    let body = r#"{"error":{"code":400,"message":"TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"}}"#;
    let err = parse_sign_in(400, body).unwrap_err();
    assert!(matches!(err, AuthError::Provider(_)));
    assert!(err.to_string().contains("TOO_MANY_ATTEMPTS_TRY_LATER"));
}

#[test]
fn parse_sign_in_server_error() {
    assert!(matches!(parse_sign_in(503, "unavailable"), Err(AuthError::Provider(_))));
}

#[test]
fn parse_sign_in_garbled_success_body() {
    assert!(matches!(parse_sign_in(200, "not json"), Err(AuthError::Provider(_))));
}

// =============================================================================
// DevAuthenticator
// =============================================================================

#[tokio::test]
async fn dev_uses_email_local_part() {
    let principal = DevAuthenticator.authenticate("grace@uni.edu", "").await.unwrap();
    assert_eq!(principal.uid, "grace");
    assert_eq!(principal.email.as_deref(), Some("grace@uni.edu"));
}

#[tokio::test]
async fn dev_accepts_bare_uid() {
    let principal = DevAuthenticator.authenticate("  p1 ", "x").await.unwrap();
    assert_eq!(principal.uid, "p1");
    assert!(principal.email.is_none());
}

#[tokio::test]
async fn dev_rejects_empty() {
    assert!(matches!(DevAuthenticator.authenticate("", "x").await, Err(AuthError::InvalidCredentials)));
    assert!(matches!(
        DevAuthenticator.authenticate("@uni.edu", "x").await,
        Err(AuthError::InvalidCredentials)
    ));
}

#[test]
fn from_config_builds_both_providers() {
    assert!(from_config(&AuthProviderConfig::Dev).is_ok());
    let firebase = AuthProviderConfig::Firebase { api_key: "k".into(), base_url: "http://localhost:9099".into() };
    assert!(from_config(&firebase).is_ok());
}
