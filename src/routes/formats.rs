use axum::{routing::get, Json, Router};

use crate::formats::{all_extensions, supported_formats};
use crate::models::FormatsResponse;

pub fn router() -> Router {
    Router::new().route("/api/formats", get(list_formats))
}

async fn list_formats() -> Json<FormatsResponse> {
    Json(FormatsResponse {
        categories: supported_formats(),
        extensions: all_extensions(),
    })
}
