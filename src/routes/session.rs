//! Session cookie handling and the end-session endpoint.

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::delete,
    Json, Router,
};
use tracing::debug;
use uuid::Uuid;

use crate::models::{AppState, SessionEndResponse};
use crate::session::SessionHandle;

pub const SESSION_COOKIE: &str = "office_md_session";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/session", delete(end_session))
        .with_state(state)
}

/// Session id from the request's cookie header, if present and well formed.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let cookie_str = headers.get(header::COOKIE)?.to_str().ok()?;

    for cookie in cookie_str.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=') {
            if name == SESSION_COOKIE {
                match Uuid::parse_str(value) {
                    Ok(id) => return Some(id),
                    Err(_) => {
                        debug!("Ignoring malformed session cookie");
                        continue;
                    }
                }
            }
        }
    }
    None
}

fn cookie_header(id: Uuid) -> HeaderValue {
    let value = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    // A hyphenated UUID and fixed attributes are always visible ASCII
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static(""))
}

fn expired_cookie_header() -> HeaderValue {
    HeaderValue::from_static("office_md_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Resolve the caller's session, starting one when needed, and mark it active.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> (Uuid, SessionHandle, bool) {
    let (id, handle, created) = state
        .sessions
        .get_or_create(session_id_from_headers(headers))
        .await;
    handle.lock().await.touch();
    (id, handle, created)
}

/// Attach the session cookie to a response when the session is new.
pub fn with_session_cookie(response: impl IntoResponse, id: Uuid, created: bool) -> Response {
    let mut response = response.into_response();
    if created {
        response
            .headers_mut()
            .append(header::SET_COOKIE, cookie_header(id));
    }
    response
}

async fn end_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ended = match session_id_from_headers(&headers) {
        Some(id) => state.sessions.end(&id).await,
        None => false,
    };

    let mut response = Json(SessionEndResponse { ended }).into_response();
    response
        .headers_mut()
        .append(header::SET_COOKIE, expired_cookie_header());
    response
}
