//! Synthesizer — one cross-cutting summary over the successful perspectives.

use tracing::{info, warn};

use crate::llm_client::prompts::CRITICAL_THINKING_SYSTEM;
use crate::llm_client::{Completion, LlmError};
use crate::perspectives::analyzer::AnalysisResults;
use crate::perspectives::prompts::{SYNTHESIS_ERROR_PREFIX, SYNTHESIS_PROMPT_TEMPLATE};

/// Concatenates non-error results in catalogue order.
pub fn combine_successful(results: &AnalysisResults) -> String {
    results
        .iter()
        .filter(|r| !r.is_error)
        .map(|r| format!("\n\n## {}\n{}", r.title_localized, r.result_text))
        .collect()
}

pub fn build_synthesis_prompt(results: &AnalysisResults) -> String {
    SYNTHESIS_PROMPT_TEMPLATE.replacen("{combined_analysis}", &combine_successful(results), 1)
}

/// Dispatches the synthesis request, surfacing a dispatch failure as an error value.
pub async fn try_synthesize(
    llm: &dyn Completion,
    results: &AnalysisResults,
) -> Result<String, LlmError> {
    let prompt = build_synthesis_prompt(results);
    info!(
        "Synthesizing {} of {} perspectives",
        results.succeeded(),
        results.len()
    );
    llm.complete(CRITICAL_THINKING_SYSTEM, &prompt)
        .await
        .map(|text| text.trim().to_string())
}

/// Like `try_synthesize`, but a failure becomes inline report text.
pub async fn synthesize(llm: &dyn Completion, results: &AnalysisResults) -> String {
    match try_synthesize(llm, results).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Synthesis failed: {e}");
            format!("{SYNTHESIS_ERROR_PREFIX}: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::perspectives::analyzer::tests::ScriptedLlm;
    use crate::perspectives::analyzer::PerspectiveResult;
    use crate::perspectives::catalogue::CATALOGUE;

    fn result(idx: usize, text: &str, is_error: bool) -> PerspectiveResult {
        let template = &CATALOGUE[idx];
        PerspectiveResult {
            key: template.key.to_string(),
            title: template.title.to_string(),
            title_localized: template.title_localized.to_string(),
            description: template.description.to_string(),
            result_text: text.to_string(),
            is_error,
            produced_at: Utc::now(),
        }
    }

    fn mixed_results() -> AnalysisResults {
        vec![
            result(0, "ok-alpha", false),
            result(1, "broken-beta", true),
            result(2, "ok-gamma", false),
            result(3, "broken-delta", true),
            result(4, "ok-epsilon", false),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_prompt_contains_only_successful_entries() {
        let prompt = build_synthesis_prompt(&mixed_results());
        for text in ["ok-alpha", "ok-gamma", "ok-epsilon"] {
            assert!(prompt.contains(text), "missing {text}");
        }
        for text in ["broken-beta", "broken-delta"] {
            assert!(!prompt.contains(text), "error entry {text} leaked");
        }
        assert!(!prompt.contains("{combined_analysis}"));
    }

    #[test]
    fn test_combined_sections_keep_catalogue_order() {
        let combined = combine_successful(&mixed_results());
        let alpha = combined.find("ok-alpha").unwrap();
        let gamma = combined.find("ok-gamma").unwrap();
        let epsilon = combined.find("ok-epsilon").unwrap();
        assert!(alpha < gamma && gamma < epsilon);
        assert!(combined.starts_with("\n\n## 내 사고에 도전하기\nok-alpha"));
    }

    #[tokio::test]
    async fn test_synthesize_returns_model_text() {
        let llm = ScriptedLlm::new(None);
        let text = synthesize(&llm, &mixed_results()).await;
        assert_eq!(text, "reply #1");
    }

    #[tokio::test]
    async fn test_synthesis_failure_degrades_to_inline_text() {
        let llm = ScriptedLlm::new(Some("통합 요약"));
        let text = synthesize(&llm, &mixed_results()).await;
        assert!(text.starts_with(SYNTHESIS_ERROR_PREFIX));
        assert!(try_synthesize(&llm, &mixed_results()).await.is_err());
    }
}
