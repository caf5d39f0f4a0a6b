use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tracing::info;

use crate::models::{AppState, ConversionsResponse};
use crate::routes::session::{resolve_session, session_id_from_headers, with_session_cookie};
use crate::types::{AppError, AppResult};
use crate::workflow::{download_name, render};

const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/conversions", get(list_conversions))
        .route("/api/conversions/{filename}/download", get(download_conversion))
        .with_state(state)
}

async fn list_conversions(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let (session_id, handle, created) = resolve_session(&state, &headers).await;
    let conversions = render(&handle.lock().await.store);
    with_session_cookie(Json(ConversionsResponse { conversions }), session_id, created)
}

fn is_attr_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte)
}

/// `Content-Disposition` for an attachment, with an ASCII fallback name and
/// the exact UTF-8 name in `filename*`.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let encoded: String = filename
        .bytes()
        .map(|b| {
            if is_attr_char(b) {
                (b as char).to_string()
            } else {
                format!("%{:02X}", b)
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback, encoded
    )
}

async fn download_conversion(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let not_found = || AppError::NotFound(format!("no conversion stored for '{}'", filename));

    let session_id = session_id_from_headers(&headers).ok_or_else(not_found)?;
    let handle = state.sessions.get(&session_id).await.ok_or_else(not_found)?;
    let mut session = handle.lock().await;
    session.touch();

    let markdown = session.store.get(&filename).ok_or_else(not_found)?.to_string();
    let md_name = download_name(&filename);
    info!(session_id = %session_id, filename = %filename, download = %md_name, "Serving Markdown download");

    let disposition = HeaderValue::from_str(&content_disposition(&md_name))
        .map_err(|e| AppError::Internal(format!("invalid download header: {}", e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(MARKDOWN_CONTENT_TYPE)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        markdown,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("report.md"),
            "attachment; filename=\"report.md\"; filename*=UTF-8''report.md"
        );
    }

    #[test]
    fn test_content_disposition_escapes_quotes_and_unicode() {
        let value = content_disposition("résumé \"v2\".md");
        assert!(value.starts_with("attachment; filename=\"r_sum_ _v2_.md\""));
        assert!(value.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9%20%22v2%22.md"));
    }
}
