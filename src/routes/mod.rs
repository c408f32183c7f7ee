//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Auth and session endpoints live under `/api`. Every other path is a page
//! and goes through the fallback, which runs the role gate for the calling
//! browser's session.

pub mod auth;
pub mod pages;
pub mod table;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/session", get(auth::session))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/sign-out", post(auth::sign_out))
        .route("/api/course-content", post(pages::course_content))
        .fallback(pages::page)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
