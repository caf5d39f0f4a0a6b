//! Conversion batch endpoint.
//!
//! Accepts a multipart form with zero or more `file` fields, runs them
//! through the workflow controller against the caller's session, and
//! answers with the batch notices plus the re-rendered session list.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use tracing::{info, warn};

use crate::converter::extension_of;
use crate::formats;
use crate::models::{AppState, ConvertResponse, NoticeView};
use crate::routes::session::{resolve_session, with_session_cookie};
use crate::types::{AppError, AppResult};
use crate::workflow::{render, Notice, UploadedFile, WorkflowController};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/convert", post(convert_files))
        .with_state(state)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::InvalidRequest(format!("Failed to parse multipart data: {}", e.body_text()))
    }
}

fn unsupported_notice(filename: String) -> Notice {
    let extension = extension_of(&filename);
    let error = if extension.is_empty() {
        "file has no extension".to_string()
    } else {
        format!("unsupported file type '.{}'", extension)
    };
    Notice::Failed { filename, error }
}

async fn convert_files(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut files = Vec::new();
    let mut rejected = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        // Browsers send an unnamed, empty part when nothing was selected
        let Some(name) = field.file_name().map(str::to_string).filter(|n| !n.is_empty()) else {
            continue;
        };
        let content = field.bytes().await.map_err(multipart_error)?;

        if !formats::is_supported(&name) {
            warn!(filename = %name, "Rejected upload with unsupported extension");
            rejected.push(unsupported_notice(name));
            continue;
        }
        files.push(UploadedFile { name, content });
    }

    let (session_id, handle, created) = resolve_session(&state, &headers).await;
    info!(
        session_id = %session_id,
        files = files.len(),
        rejected = rejected.len(),
        "Conversion batch requested"
    );

    let mut session = handle.lock().await;
    let mut notices = rejected;
    if !files.is_empty() || notices.is_empty() {
        let report = WorkflowController::new(&state.converter)
            .run_batch(&mut session.store, files)
            .await;
        notices.extend(report.notices);
    }
    session.touch();

    let body = ConvertResponse {
        notices: notices.into_iter().map(NoticeView::from).collect(),
        conversions: render(&session.store),
    };
    Ok(with_session_cookie(Json(body), session_id, created))
}
