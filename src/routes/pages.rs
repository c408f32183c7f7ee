//! Page routes — every client path goes through the role gate.

use std::time::Duration;

use axum::extract::{Form, Query, State};
use axum::http::header::CACHE_CONTROL;
use axum::http::{Method, StatusCode, Uri};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{debug, info};

use super::auth::{existing_client, safe_return_path};
use super::table::{Dispatch, dispatch};
use crate::pages::catalog::ContentAction;
use crate::pages::{Page, PageContext, render, render_loading};
use crate::session::SessionState;
use crate::state::AppState;

/// How long a page request waits for a pending resolution before falling
/// back to the loading page.
const RESOLUTION_GRACE: Duration = Duration::from_millis(250);

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    from: Option<String>,
    error: Option<String>,
}

/// Fallback handler: dispatch any `GET` path against the client's session.
pub async fn page(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    jar: CookieJar,
    Query(query): Query<PageQuery>,
) -> Response {
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    let snapshot = match existing_client(&state, &jar).await {
        Some(client) => {
            let snapshot = client.context.snapshot();
            if snapshot.is_settled() {
                snapshot
            } else {
                client.context.wait_for(RESOLUTION_GRACE, SessionState::is_settled).await
            }
        }
        None => SessionState::anonymous(0),
    };
    page_response(uri.path(), &snapshot, &query)
}

/// Turn a routing decision into an HTTP response.
pub(crate) fn page_response(path: &str, state: &SessionState, query: &PageQuery) -> Response {
    match dispatch(path, state) {
        Dispatch::Loading => ([(CACHE_CONTROL, "no-store")], Html(render_loading())).into_response(),
        Dispatch::Render { page, layout } => {
            let cx = PageContext {
                principal: state.principal.as_ref(),
                path,
                from: query.from.as_deref(),
                error: query.error.as_deref(),
            };
            ([(CACHE_CONTROL, "no-store")], Html(render(page, layout, &cx))).into_response()
        }
        Dispatch::Redirect(redirection) => {
            debug!(path, to = redirection.to, "page redirected");
            Redirect::temporary(&redirection.location()).into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct ContentActionForm {
    action: String,
    return_to: Option<String>,
}

/// `POST /api/course-content` — record a create/update content request from
/// a course catalog page, then go back to that page.
pub async fn course_content(State(state): State<AppState>, jar: CookieJar, Form(form): Form<ContentActionForm>) -> Response {
    let snapshot = match existing_client(&state, &jar).await {
        Some(client) => client.context.snapshot(),
        None => SessionState::anonymous(0),
    };
    let return_to = safe_return_path(form.return_to.as_deref());

    let on_catalog_page = matches!(
        dispatch(return_to, &snapshot),
        Dispatch::Render { page: Page::CourseCreation | Page::CourseManagement, .. }
    );
    if !on_catalog_page {
        return StatusCode::FORBIDDEN.into_response();
    }
    let Some(action) = ContentAction::parse(&form.action) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    let uid = snapshot.principal.as_ref().map_or("", |p| p.uid.as_str());
    info!(%uid, action = action.as_str(), page = return_to, "course content action requested");
    Redirect::to(return_to).into_response()
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
