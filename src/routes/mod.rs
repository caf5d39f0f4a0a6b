//! HTTP Routes
//!
//! - `/` - Upload page
//! - `/api/formats` - Accepted document formats
//! - `/api/convert` - Run a conversion batch (multipart upload)
//! - `/api/conversions` - Converted files of the current session
//! - `/api/conversions/{filename}/download` - Markdown download
//! - `/api/session` - End the current session
//! - `/api/health` - Health check

pub mod conversions;
pub mod convert;
pub mod formats;
pub mod health;
pub mod session;
pub mod ui;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::apply_cors;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_upload_bytes = state.config.upload.max_upload_bytes;
    let allowed_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(convert::router(state.clone()))
        .merge(conversions::router(state.clone()))
        .merge(session::router(state.clone()))
        .merge(health::router(state))
        .merge(formats::router())
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    let router = Router::new()
        .merge(api_router)
        .merge(ui::router())
        .layer(TraceLayer::new_for_http());

    apply_cors(router, &allowed_origins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::converter::testing::{stub_converter, FAIL_MARKER};
    use crate::routes::session::SESSION_COOKIE;
    use axum::body::Body;
    use axum::http::{header, Request, Response, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "office-md-test-boundary";

    fn app() -> Router {
        let (converter, _) = stub_converter();
        create_router(AppState::with_converter(Config::default(), converter))
    }

    fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, content) in files {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
                    name
                )
                .as_bytes(),
            );
            body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn convert_request(files: &[(&str, &[u8])], cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/convert")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(multipart_body(files))).unwrap()
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn session_cookie(response: &Response<Body>) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        let pair = set_cookie.split(';').next().unwrap();
        assert!(pair.starts_with(SESSION_COOKIE));
        pair.to_string()
    }

    async fn body_bytes(response: Response<Body>) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response<Body>) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_convert_batch_with_one_failure() {
        let app = app();
        let mut bad = FAIL_MARKER.to_vec();
        bad.extend_from_slice(b"junk");

        let response = app
            .oneshot(convert_request(
                &[("good.docx", b"# Good".as_slice()), ("bad.docx", bad.as_slice())],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response);

        let json = body_json(response).await;
        let notices = json["notices"].as_array().unwrap();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices[0]["kind"], "converted");
        assert_eq!(notices[0]["message"], "Converted good.docx successfully!");
        assert_eq!(notices[1]["kind"], "failed");
        assert_eq!(notices[1]["filename"], "bad.docx");
        assert_eq!(notices[1]["is_error"], true);

        let conversions = json["conversions"].as_array().unwrap();
        assert_eq!(conversions.len(), 1);
        assert_eq!(conversions[0]["filename"], "good.docx");
        assert_eq!(conversions[0]["download_name"], "good.md");
        assert_eq!(conversions[0]["preview"], "# Good");
    }

    #[tokio::test]
    async fn test_convert_without_files_is_validation_notice() {
        let response = app().oneshot(convert_request(&[], None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let notices = json["notices"].as_array().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["kind"], "validation");
        assert_eq!(notices[0]["message"], "Please upload at least one file");
        assert!(json["conversions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension_is_rejected_per_file() {
        let response = app()
            .oneshot(convert_request(&[("notes.txt", b"hello".as_slice())], None))
            .await
            .unwrap();

        let json = body_json(response).await;
        let notices = json["notices"].as_array().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0]["kind"], "failed");
        assert_eq!(notices[0]["error"], "unsupported file type '.txt'");
        assert!(json["conversions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_persists_across_requests_and_download() {
        let app = app();

        let first = app
            .clone()
            .oneshot(convert_request(&[("report.docx", b"v1".as_slice())], None))
            .await
            .unwrap();
        let cookie = session_cookie(&first);

        let second = app
            .clone()
            .oneshot(convert_request(
                &[("report.docx", b"v2".as_slice()), ("archive.tar.pdf", b"pdf text".as_slice())],
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert!(second.headers().get(header::SET_COOKIE).is_none());

        let listed = app
            .clone()
            .oneshot(get_request("/api/conversions", Some(&cookie)))
            .await
            .unwrap();
        let json = body_json(listed).await;
        let conversions = json["conversions"].as_array().unwrap();
        assert_eq!(conversions.len(), 2);
        assert_eq!(conversions[0]["filename"], "report.docx");
        assert_eq!(conversions[0]["preview"], "v2");
        assert_eq!(conversions[1]["download_name"], "archive.tar.md");

        let download = app
            .clone()
            .oneshot(get_request(
                "/api/conversions/report.docx/download",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(download.status(), StatusCode::OK);
        assert_eq!(
            download.headers()[header::CONTENT_TYPE],
            "text/markdown; charset=utf-8"
        );
        assert!(download.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("filename=\"report.md\""));
        assert_eq!(body_bytes(download).await, b"v2");
    }

    #[tokio::test]
    async fn test_download_unknown_entry_is_not_found() {
        let app = app();
        let response = app
            .clone()
            .oneshot(get_request("/api/conversions/missing.docx/download", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_end_session_discards_conversions() {
        let app = app();
        let first = app
            .clone()
            .oneshot(convert_request(&[("a.pdf", b"A".as_slice())], None))
            .await
            .unwrap();
        let cookie = session_cookie(&first);

        let ended = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/session")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(body_json(ended).await["ended"], true);

        let download = app
            .clone()
            .oneshot(get_request("/api/conversions/a.pdf/download", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(download.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_formats_and_health() {
        let app = app();

        let formats = app
            .clone()
            .oneshot(get_request("/api/formats", None))
            .await
            .unwrap();
        let json = body_json(formats).await;
        assert_eq!(json["extensions"].as_array().unwrap().len(), 8);
        assert_eq!(json["categories"][1]["label"], "📊 Spreadsheets");

        let health = app
            .clone()
            .oneshot(get_request("/api/health", None))
            .await
            .unwrap();
        let json = body_json(health).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["backend"], "stub");
    }

    #[tokio::test]
    async fn test_index_page() {
        let response = app().oneshot(get_request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("Office to Markdown"));
    }
}
