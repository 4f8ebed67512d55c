//! Shared harness for router-level tests: a scripted completion backend and
//! an `AppState` rooted in a temporary directory.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;

use thinklens::config::Config;
use thinklens::jobs::orchestrator::{JobDirs, Orchestrator};
use thinklens::jobs::store::InMemoryJobStore;
use thinklens::llm_client::{Completion, LlmError};
use thinklens::normalize::Normalizer;
use thinklens::report::{ReportOptions, ReportRenderer};
use thinklens::routes::build_router;
use thinklens::state::AppState;

/// Answers every prompt with a numbered canned reply.
pub struct CannedCompletion {
    calls: AtomicUsize,
}

impl CannedCompletion {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Completion for CannedCompletion {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("canned analysis {n}"))
    }

    fn model(&self) -> &str {
        "canned-model"
    }
}

pub struct TestApp {
    pub router: Router,
    pub llm: Arc<CannedCompletion>,
    pub root: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let dir = |name: &str| -> PathBuf { root.path().join(name) };

        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_base_url: "http://127.0.0.1:9".to_string(),
            llm_model: "canned-model".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            upload_dir: dir("uploads"),
            report_dir: dir("reports"),
            work_dir: dir("work"),
            report_content_limit: 2000,
            max_upload_bytes: 1024 * 1024,
            job_ttl_secs: 3600,
            job_sweep_interval_secs: 600,
            pdf_converter: "thinklens-missing-converter".to_string(),
            html_pdf_converter: "thinklens-missing-converter".to_string(),
        };

        let llm = Arc::new(CannedCompletion::new());
        let renderer = ReportRenderer::new(
            ReportOptions {
                model: config.llm_model.clone(),
                content_limit: config.report_content_limit,
            },
            None,
        );
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(InMemoryJobStore::new()),
            llm.clone(),
            Normalizer::new().expect("normalizer"),
            renderer,
            JobDirs {
                upload_dir: config.upload_dir.clone(),
                report_dir: config.report_dir.clone(),
                work_dir: config.work_dir.clone(),
            },
        ));

        let router = build_router(AppState {
            config,
            orchestrator,
        });

        Self { router, llm, root }
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body")
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("json body")
}
