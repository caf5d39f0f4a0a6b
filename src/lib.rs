// Office MD - convert uploaded office documents to Markdown from the browser

pub mod config;
pub mod converter;  // Converter adapter and conversion backends
pub mod formats;    // Accepted document formats
pub mod middleware;
pub mod models;
pub mod routes;
pub mod session;    // Per-browser conversion storage
pub mod types;
pub mod utils;
pub mod workflow;   // Batch conversion and rendering

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
