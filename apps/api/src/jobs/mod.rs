// Analysis jobs: the record and its store, the pipeline orchestrator and the
// submission / polling / download endpoints.

pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod store;
