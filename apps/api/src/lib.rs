//! ThinkLens: runs submitted content through ten critical-thinking
//! perspectives on an LLM and renders the analysis as a Markdown or PDF report.

pub mod config;
pub mod errors;
pub mod jobs;
pub mod llm_client;
pub mod normalize;
pub mod perspectives;
pub mod report;
pub mod routes;
pub mod state;
