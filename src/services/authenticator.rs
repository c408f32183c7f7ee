//! Credential check — Firebase Auth REST or a development bypass.

use std::time::Duration;

use serde::Deserialize;

use crate::config::AuthProviderConfig;
use crate::session::Principal;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("identity provider error: {0}")]
    Provider(String),
}

#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    /// Check credentials and return the signed-in principal.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, AuthError>;
}

/// Build the authenticator selected by config.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn from_config(config: &AuthProviderConfig) -> Result<Box<dyn Authenticator>, AuthError> {
    match config {
        AuthProviderConfig::Dev => Ok(Box::new(DevAuthenticator)),
        AuthProviderConfig::Firebase { api_key, base_url } => {
            Ok(Box::new(FirebaseAuthenticator::new(api_key.clone(), base_url.clone())?))
        }
    }
}

// =============================================================================
// FIREBASE
// =============================================================================

pub struct FirebaseAuthenticator {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl FirebaseAuthenticator {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AuthError::Provider(format!("http client build: {e}")))?;
        Ok(Self { http, api_key, base_url })
    }
}

#[async_trait::async_trait]
impl Authenticator for FirebaseAuthenticator {
    async fn authenticate(&self, email: &str, password: &str) -> Result<Principal, AuthError> {
        let resp = self
            .http
            .post(format!("{}/accounts:signInWithPassword", self.base_url))
            .query(&[("key", self.api_key.as_str())])
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        parse_sign_in(status.as_u16(), &body)
    }
}

/// Interpret a `signInWithPassword` response.
pub(crate) fn parse_sign_in(status: u16, body: &str) -> Result<Principal, AuthError> {
    if (200..300).contains(&status) {
        let ok: SignInResponse =
            serde_json::from_str(body).map_err(|_| AuthError::Provider(format!("unexpected response: {body}")))?;
        let principal = Principal::new(ok.local_id);
        return Ok(match ok.email {
            Some(email) => principal.with_email(email),
            None => principal,
        });
    }

    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_default();
    if status == 400 && is_credential_error(&message) {
        return Err(AuthError::InvalidCredentials);
    }
    Err(AuthError::Provider(format!("{status}: {message}")))
}

fn is_credential_error(message: &str) -> bool {
    // Messages may carry a suffix, e.g. "TOO_MANY_ATTEMPTS_TRY_LATER : ...".
    let code = message.split(':').next().unwrap_or_default().trim();
    matches!(
        code,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" | "INVALID_EMAIL"
    )
}

// =============================================================================
// DEV
// =============================================================================

/// Accepts any password. The uid is the email's local part.
///
/// Only selected with `AUTH_PROVIDER=dev`.
pub struct DevAuthenticator;

#[async_trait::async_trait]
impl Authenticator for DevAuthenticator {
    async fn authenticate(&self, email: &str, _password: &str) -> Result<Principal, AuthError> {
        let email = email.trim();
        let uid = email.split('@').next().unwrap_or_default();
        if uid.is_empty() || uid.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidCredentials);
        }
        let principal = Principal::new(uid);
        Ok(if email.contains('@') { principal.with_email(email) } else { principal })
    }
}

#[cfg(test)]
#[path = "authenticator_test.rs"]
mod tests;
