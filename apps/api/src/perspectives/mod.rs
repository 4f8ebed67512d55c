// Perspective analysis: the fixed prompt catalogue, the sequential analyzer
// and the synthesis step. All LLM calls go through llm_client.

pub mod analyzer;
pub mod catalogue;
pub mod handlers;
pub mod prompts;
pub mod synthesis;
