use std::sync::Arc;

use crate::config::Config;
use crate::jobs::orchestrator::Orchestrator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the job store, LLM client, normalizer and renderer.
    pub orchestrator: Arc<Orchestrator>,
}
