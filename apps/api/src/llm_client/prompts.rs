// Shared prompt constants.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// Output language every perspective and the synthesis are requested in.
pub const TARGET_LOCALE: &str = "Korean";

/// System instruction sent with every completion request.
pub const CRITICAL_THINKING_SYSTEM: &str = "You are a critical thinking assistant that helps \
    analyze ideas, plans, and strategies from multiple perspectives. \
    Provide thoughtful, insightful analysis in Korean.";
