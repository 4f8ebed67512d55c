use axum::Json;
use chrono::Local;
use serde_json::{json, Value};

/// GET /health
/// Returns a simple status object with the current time and service version.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Local::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
