//! Auth routes — client cookie, sign-in, sign-out, session snapshot.
//!
//! Sign-in and sign-out only publish to the client's identity channel; the
//! session watcher resolves the role and writes the session state.

use std::sync::Arc;

use axum::extract::{Form, State};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::table::{DASHBOARD_PATH, LOGIN_PATH};
use crate::services::authenticator::AuthError;
use crate::services::clients::ClientSession;
use crate::session::{Role, SessionState};
use crate::state::AppState;

pub(crate) const COOKIE_NAME: &str = "lms_client";

// =============================================================================
// CLIENT COOKIE
// =============================================================================

/// This browser's registered client session, if its cookie names a live one.
/// Never registers, so cookieless traffic costs no watcher task.
pub(crate) async fn existing_client(state: &AppState, jar: &CookieJar) -> Option<Arc<ClientSession>> {
    let token = jar.get(COOKIE_NAME).map(Cookie::value).filter(|t| !t.is_empty())?;
    state.clients.get(token).await
}

/// Find this browser's client session, registering one (and setting the
/// cookie) when the cookie is missing or unknown. Only sign-in registers.
pub(crate) async fn resolve_client(state: &AppState, jar: CookieJar) -> (CookieJar, Arc<ClientSession>) {
    let token = jar.get(COOKIE_NAME).map(Cookie::value).filter(|t| !t.is_empty());
    let (token, client, created) = state.clients.get_or_create(token).await;
    if !created {
        return (jar, client);
    }
    let cookie = Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure);
    (jar.add(cookie), client)
}

/// Accept only local absolute paths as post-login targets.
///
/// Browsers drop tab and newline characters while parsing a `Location`, so
/// `/\t/host` would become the scheme-relative `//host`; any control
/// character disqualifies the target.
pub(crate) fn safe_return_path(from: Option<&str>) -> &str {
    match from.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(|c| c.is_ascii_control()) =>
        {
            path
        }
        _ => DASHBOARD_PATH,
    }
}

fn login_error_location(code: &str, from: Option<&str>) -> String {
    let mut location = format!("{LOGIN_PATH}?error={code}");
    if let Some(from) = from.filter(|f| !f.is_empty()) {
        location.push_str("&from=");
        location.push_str(&urlencoding::encode(safe_return_path(Some(from))));
    }
    location
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct SignInForm {
    email: String,
    #[serde(default)]
    password: String,
    from: Option<String>,
}

/// `POST /api/auth/sign-in` — check credentials, publish the principal, then
/// redirect to the return target once the session has resolved.
pub async fn sign_in(State(state): State<AppState>, jar: CookieJar, Form(form): Form<SignInForm>) -> Response {
    let from = form.from.as_deref();

    let principal = match state.authenticator.authenticate(&form.email, &form.password).await {
        Ok(principal) => principal,
        Err(AuthError::InvalidCredentials) => {
            info!("sign-in rejected: invalid credentials");
            return Redirect::to(&login_error_location("invalid-credentials", from)).into_response();
        }
        Err(e) => {
            error!(error = %e, "sign-in failed at identity provider");
            return Redirect::to(&login_error_location("provider-unavailable", from)).into_response();
        }
    };

    let (jar, client) = resolve_client(&state, jar).await;
    let uid = principal.uid.clone();
    client.identity.sign_in(principal);
    let settled = client
        .context
        .wait_for(state.config.sign_in_settle, |s| {
            s.is_settled() && s.principal.as_ref().is_some_and(|p| p.uid == uid)
        })
        .await;
    if !settled.is_settled() || settled.principal.as_ref().is_none_or(|p| p.uid != uid) {
        warn!(%uid, "session not resolved before sign-in redirect");
    } else {
        info!(%uid, role = settled.role.as_ref().map_or("none", Role::as_str), "signed in");
    }

    (jar, Redirect::to(safe_return_path(from))).into_response()
}

/// `POST /api/auth/sign-out` — publish the sign-out and return to `/login`.
pub async fn sign_out(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(client) = existing_client(&state, &jar).await {
        let uid = client.identity.current().map(|p| p.uid).unwrap_or_default();
        client.identity.sign_out();
        client
            .context
            .wait_for(state.config.sign_in_settle, |s| s.principal.is_none())
            .await;
        info!(%uid, "signed out");
    }
    (jar, Redirect::to(LOGIN_PATH)).into_response()
}

/// `GET /api/session` — current session snapshot for this browser. A browser
/// without a live client is reported as signed out.
pub async fn session(State(state): State<AppState>, jar: CookieJar) -> Response {
    let snapshot = match existing_client(&state, &jar).await {
        Some(client) => client.context.snapshot(),
        None => SessionState::anonymous(0),
    };
    Json(snapshot).into_response()
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
