use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use thinklens::config::Config;
use thinklens::jobs::orchestrator::{JobDirs, Orchestrator};
use thinklens::jobs::store::InMemoryJobStore;
use thinklens::llm_client::{Completion, LlmClient};
use thinklens::normalize::Normalizer;
use thinklens::report::convert::probe_converter;
use thinklens::report::{ReportOptions, ReportRenderer};
use thinklens::routes::build_router;
use thinklens::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_PKG_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ThinkLens API v{}", env!("CARGO_PKG_VERSION"));

    config.ensure_dirs().await?;

    // Initialize LLM client
    let llm: Arc<dyn Completion> = Arc::new(LlmClient::new(
        config.llm_api_key.clone(),
        &config.llm_base_url,
        config.llm_model.clone(),
    )?);
    info!("LLM client initialized (model: {})", llm.model());

    // Pick the PDF backend once
    let converter = probe_converter(&config.pdf_converter, &config.html_pdf_converter).await;
    let renderer = ReportRenderer::new(
        ReportOptions {
            model: config.llm_model.clone(),
            content_limit: config.report_content_limit,
        },
        converter,
    );

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(InMemoryJobStore::new()),
        llm,
        Normalizer::new()?,
        renderer,
        JobDirs {
            upload_dir: config.upload_dir.clone(),
            report_dir: config.report_dir.clone(),
            work_dir: config.work_dir.clone(),
        },
    ));

    spawn_eviction_sweeper(
        Arc::clone(&orchestrator),
        config.job_ttl_secs,
        config.job_sweep_interval_secs,
    );

    // Build app state
    let state = AppState {
        config: config.clone(),
        orchestrator,
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically drops finished jobs older than the TTL, with their files.
fn spawn_eviction_sweeper(orchestrator: Arc<Orchestrator>, ttl_secs: u64, interval_secs: u64) {
    let ttl = chrono::Duration::seconds(ttl_secs.min(u64::from(u32::MAX)) as i64);
    let period = Duration::from_secs(interval_secs.max(1));
    info!("Job eviction every {}s (ttl {ttl_secs}s)", period.as_secs());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            orchestrator.evict_expired(ttl).await;
        }
    });
}
