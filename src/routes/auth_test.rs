use super::*;
use crate::session::Principal;
use crate::state::test_helpers;
use axum::http::StatusCode;
use axum::http::header::{LOCATION, SET_COOKIE};

fn location(resp: &Response) -> &str {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn client_token(resp: &Response) -> Option<String> {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|v| v.strip_prefix(&format!("{COOKIE_NAME}=")).map(|rest| rest.split(';').next().unwrap_or_default().to_owned()))
}

fn jar_with(token: &str) -> CookieJar {
    CookieJar::new().add(Cookie::new(COOKIE_NAME, token.to_owned()))
}

fn form(email: &str, from: Option<&str>) -> Form<SignInForm> {
    Form(SignInForm { email: email.into(), password: "pw".into(), from: from.map(str::to_owned) })
}

struct DownAuthenticator;

#[async_trait::async_trait]
impl crate::services::authenticator::Authenticator for DownAuthenticator {
    async fn authenticate(&self, _email: &str, _password: &str) -> Result<Principal, AuthError> {
        Err(AuthError::Provider("503: backend down".into()))
    }
}

// =============================================================================
// safe_return_path / login_error_location
// =============================================================================

#[test]
fn safe_return_path_accepts_local_paths() {
    assert_eq!(safe_return_path(Some("/student/grades")), "/student/grades");
    assert_eq!(safe_return_path(Some(" /dashboard ")), "/dashboard");
}

#[test]
fn safe_return_path_rejects_foreign_targets() {
    assert_eq!(safe_return_path(None), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("")), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("https://evil.test/")), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("//evil.test")), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("/\\evil.test")), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("/\t/evil.example")), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("/\n/evil.example")), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("/\r\n/evil.example")), DASHBOARD_PATH);
    assert_eq!(safe_return_path(Some("/student/\u{7f}grades")), DASHBOARD_PATH);
}

#[test]
fn login_error_location_keeps_return_target() {
    assert_eq!(login_error_location("invalid-credentials", None), "/login?error=invalid-credentials");
    assert_eq!(
        login_error_location("invalid-credentials", Some("/student/grades")),
        "/login?error=invalid-credentials&from=%2Fstudent%2Fgrades"
    );
}

// =============================================================================
// resolve_client
// =============================================================================

#[tokio::test]
async fn resolve_client_sets_cookie_once() {
    let state = test_helpers::test_app_state(&[]).await;
    let (jar, first) = resolve_client(&state, CookieJar::new()).await;
    let token = jar.get(COOKIE_NAME).map(|c| c.value().to_owned()).unwrap();

    let (_, second) = resolve_client(&state, jar_with(&token)).await;
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(state.clients.len().await, 1);
}

// =============================================================================
// sign_in / sign_out
// =============================================================================

#[tokio::test]
async fn sign_in_resolves_role_before_redirect() {
    let state = test_helpers::test_app_state(&[("p1", "student")]).await;
    let resp = sign_in(State(state.clone()), CookieJar::new(), form("p1@uni.edu", None)).await;

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");

    let token = client_token(&resp).expect("client cookie set");
    let client = state.clients.get(&token).await.unwrap();
    let snapshot = client.context.snapshot();
    assert_eq!(snapshot.principal.map(|p| p.uid), Some("p1".to_owned()));
    assert_eq!(snapshot.role, Some(Role::Student));
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn sign_in_returns_to_requested_path() {
    let state = test_helpers::test_app_state(&[("p1", "student")]).await;
    let resp = sign_in(State(state), CookieJar::new(), form("p1", Some("/student/grades"))).await;
    assert_eq!(location(&resp), "/student/grades");
}

#[tokio::test]
async fn sign_in_ignores_foreign_return_target() {
    let state = test_helpers::test_app_state(&[("p1", "student")]).await;
    let resp = sign_in(State(state), CookieJar::new(), form("p1", Some("https://evil.test"))).await;
    assert_eq!(location(&resp), "/dashboard");
}

#[tokio::test]
async fn sign_in_ignores_control_character_return_target() {
    let state = test_helpers::test_app_state(&[("p1", "student")]).await;
    let resp = sign_in(State(state), CookieJar::new(), form("p1", Some("/\t/evil.example"))).await;
    assert_eq!(location(&resp), "/dashboard");
}

#[tokio::test]
async fn sign_in_rejects_bad_credentials() {
    let state = test_helpers::test_app_state(&[]).await;
    let resp = sign_in(State(state.clone()), CookieJar::new(), form("", Some("/dashboard"))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login?error=invalid-credentials&from=%2Fdashboard");
    assert!(client_token(&resp).is_none());
    assert_eq!(state.clients.len().await, 0);
}

#[tokio::test]
async fn sign_in_provider_failure_reports_unavailable() {
    let base = test_helpers::test_app_state(&[]).await;
    let state = AppState { authenticator: Arc::new(DownAuthenticator), ..base };
    let resp = sign_in(State(state), CookieJar::new(), form("p1", None)).await;
    assert_eq!(location(&resp), "/login?error=provider-unavailable");
}

#[tokio::test]
async fn sign_out_clears_session() {
    let state = test_helpers::test_app_state(&[("p1", "admin")]).await;
    let resp = sign_in(State(state.clone()), CookieJar::new(), form("p1", None)).await;
    let token = client_token(&resp).unwrap();

    let resp = sign_out(State(state.clone()), jar_with(&token)).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");

    let snapshot = state.clients.get(&token).await.unwrap().context.snapshot();
    assert!(snapshot.principal.is_none());
    assert!(snapshot.role.is_none());
}

#[tokio::test]
async fn sign_out_without_client_still_redirects() {
    let state = test_helpers::test_app_state(&[]).await;
    let resp = sign_out(State(state), CookieJar::new()).await;
    assert_eq!(location(&resp), "/login");
}

// =============================================================================
// session
// =============================================================================

#[tokio::test]
async fn session_returns_snapshot_json() {
    let state = test_helpers::test_app_state(&[("p1", "faculty")]).await;
    let resp = sign_in(State(state.clone()), CookieJar::new(), form("p1", None)).await;
    let token = client_token(&resp).unwrap();

    let resp = session(State(state), jar_with(&token)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["principal"]["uid"], "p1");
    assert_eq!(json["role"], "faculty");
    assert_eq!(json["loading"], false);
    assert_eq!(json["resolving"], false);
}

#[tokio::test]
async fn session_without_client_is_anonymous_and_unregistered() {
    let state = test_helpers::test_app_state(&[]).await;
    let resp = session(State(state.clone()), CookieJar::new()).await;
    assert!(client_token(&resp).is_none());
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert!(json["principal"].is_null());
    assert_eq!(json["loading"], false);
    assert_eq!(state.clients.len().await, 0);
}

#[tokio::test]
async fn sign_in_after_switch_waits_for_new_role() {
    let state = test_helpers::test_app_state(&[("p1", "admin"), ("p2", "student")]).await;
    let resp = sign_in(State(state.clone()), CookieJar::new(), form("p1", None)).await;
    let token = client_token(&resp).unwrap();

    let resp = sign_in(State(state.clone()), jar_with(&token), form("p2", Some("/admin/user-management"))).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let snapshot = state.clients.get(&token).await.unwrap().context.snapshot();
    assert_eq!(snapshot.principal.map(|p| p.uid), Some("p2".to_owned()));
    assert_eq!(snapshot.role, Some(Role::Student));
}
