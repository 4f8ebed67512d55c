//! Perspective Analyzer — runs the selected catalogue templates against the LLM.
//!
//! Dispatch is strictly sequential in catalogue order. A failing perspective is
//! recorded as an error entry and never aborts the batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::llm_client::prompts::CRITICAL_THINKING_SYSTEM;
use crate::llm_client::Completion;
use crate::perspectives::catalogue::{PromptTemplate, CATALOGUE};
use crate::perspectives::prompts::PERSPECTIVE_ERROR_PREFIX;

/// Outcome of one template for one job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerspectiveResult {
    pub key: String,
    pub title: String,
    pub title_localized: String,
    pub description: String,
    pub result_text: String,
    pub is_error: bool,
    pub produced_at: DateTime<Utc>,
}

impl PerspectiveResult {
    fn from_template(template: &PromptTemplate, result_text: String, is_error: bool) -> Self {
        Self {
            key: template.key.to_string(),
            title: template.title.to_string(),
            title_localized: template.title_localized.to_string(),
            description: template.description.to_string(),
            result_text,
            is_error,
            produced_at: Utc::now(),
        }
    }
}

/// Per-template results keyed by template key, kept in catalogue order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResults(Vec<PerspectiveResult>);

impl AnalysisResults {
    pub fn get(&self, key: &str) -> Option<&PerspectiveResult> {
        self.0.iter().find(|r| r.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerspectiveResult> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.0.iter().filter(|r| !r.is_error).count()
    }
}

impl FromIterator<PerspectiveResult> for AnalysisResults {
    /// Collects into catalogue order, keeping the first result per key.
    fn from_iter<I: IntoIterator<Item = PerspectiveResult>>(iter: I) -> Self {
        let mut items: Vec<PerspectiveResult> = Vec::new();
        for result in iter {
            if !items.iter().any(|r| r.key == result.key) {
                items.push(result);
            }
        }
        items.sort_by_key(|r| catalogue_position(&r.key));
        Self(items)
    }
}

/// Emitted after each template completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub completed: usize,
    pub total: usize,
    pub title: String,
}

pub type ProgressSender = UnboundedSender<ProgressEvent>;

fn catalogue_position(key: &str) -> usize {
    CATALOGUE
        .iter()
        .position(|t| t.key == key)
        .unwrap_or(CATALOGUE.len())
}

/// Resolves a key selection to templates in catalogue order.
/// `None` selects the whole catalogue; unknown and repeated keys are dropped.
pub fn resolve_selection(selected: Option<&[&str]>) -> Vec<&'static PromptTemplate> {
    match selected {
        None => CATALOGUE.iter().collect(),
        Some(keys) => CATALOGUE
            .iter()
            .filter(|t| keys.contains(&t.key))
            .collect(),
    }
}

/// Runs every selected perspective against `content`.
pub async fn analyze(
    llm: &dyn Completion,
    content: &str,
    selected: Option<&[&str]>,
    progress: Option<&ProgressSender>,
) -> AnalysisResults {
    let templates = resolve_selection(selected);
    let total = templates.len();
    let mut results = Vec::with_capacity(total);

    for (idx, template) in templates.into_iter().enumerate() {
        let prompt = template.render(content);

        let result = match llm.complete(CRITICAL_THINKING_SYSTEM, &prompt).await {
            Ok(text) => PerspectiveResult::from_template(template, text.trim().to_string(), false),
            Err(e) => {
                warn!("Perspective '{}' failed: {e}", template.key);
                PerspectiveResult::from_template(
                    template,
                    format!("{PERSPECTIVE_ERROR_PREFIX}: {e}"),
                    true,
                )
            }
        };
        results.push(result);

        info!("[{}/{}] {} done", idx + 1, total, template.key);

        if let Some(sender) = progress {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(ProgressEvent {
                completed: idx + 1,
                total,
                title: template.title_localized.to_string(),
            });
        }
    }

    AnalysisResults(results)
}
