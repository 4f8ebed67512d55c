pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::jobs::handlers;
use crate::perspectives::handlers::handle_list_prompts;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/prompts", get(handle_list_prompts))
        // Submission
        .route("/analyze/text", post(handlers::handle_analyze_text))
        .route("/analyze/url", post(handlers::handle_analyze_url))
        .route("/analyze/file", post(handlers::handle_analyze_file))
        // Polling and download
        .route("/status/:job_id", get(handlers::handle_get_status))
        .route("/download/:job_id", get(handlers::handle_download))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
