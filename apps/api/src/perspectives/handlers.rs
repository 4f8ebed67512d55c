//! Axum route handlers for the perspective catalogue.

use axum::Json;
use serde::Serialize;

use crate::perspectives::catalogue::{PromptTemplate, CATALOGUE};

#[derive(Debug, Serialize)]
pub struct PromptListResponse {
    pub prompts: Vec<PromptTemplate>,
}

/// GET /prompts
///
/// Lists the ten perspectives (key, titles, description) for client display.
pub async fn handle_list_prompts() -> Json<PromptListResponse> {
    Json(PromptListResponse {
        prompts: CATALOGUE.to_vec(),
    })
}
