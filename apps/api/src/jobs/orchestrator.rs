//! Job Orchestrator — owns the job lifecycle and drives one pipeline task per job.
//!
//! normalize (10) → analyze (20..80) → synthesize (85) → render (90) → completed (100)
//!
//! The pipeline task is the only writer of its job row. While the analyzer
//! runs, the row is lent to a progress tracker task and taken back before the
//! synthesis checkpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use chrono::{Duration, Utc};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::models::{Job, JobStatus};
use crate::jobs::store::JobStore;
use crate::llm_client::Completion;
use crate::normalize::{InputKind, Normalizer};
use crate::perspectives::analyzer::{self, ProgressEvent};
use crate::perspectives::synthesis;
use crate::report::{ReportFormat, ReportRenderer};

const NORMALIZE_MESSAGE: &str = "입력 데이터 처리 중...";
const ANALYZE_MESSAGE: &str = "10가지 사고 프롬프트 분석 중...";
const SYNTHESIZE_MESSAGE: &str = "종합 요약 생성 중...";
const RENDER_MESSAGE: &str = "보고서 생성 중...";
const PERSPECTIVE_DONE_SUFFIX: &str = "분석 완료";

const JOB_NOT_FOUND: &str = "작업을 찾을 수 없습니다.";
const JOB_NOT_READY: &str = "분석이 아직 완료되지 않았습니다.";
const REPORT_MISSING: &str = "보고서 파일을 찾을 수 없습니다.";

const ANALYZE_START: u8 = 20;
const ANALYZE_SPAN: usize = 60;

/// What a job analyzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    Text(String),
    Url(String),
    Document(PathBuf),
}

impl JobInput {
    pub fn kind(&self) -> InputKind {
        match self {
            JobInput::Text(_) => InputKind::Text,
            JobInput::Url(_) => InputKind::Url,
            JobInput::Document(_) => InputKind::Document,
        }
    }

    fn raw(&self) -> String {
        match self {
            JobInput::Text(text) => text.clone(),
            JobInput::Url(url) => url.clone(),
            JobInput::Document(path) => path.to_string_lossy().into_owned(),
        }
    }
}

/// A completed report ready to be streamed back to the client.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub path: PathBuf,
    pub media_type: &'static str,
    pub file_name: String,
}

/// Storage locations the orchestrator writes into.
#[derive(Debug, Clone)]
pub struct JobDirs {
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
    pub work_dir: PathBuf,
}

pub struct Orchestrator {
    store: Arc<dyn JobStore>,
    llm: Arc<dyn Completion>,
    normalizer: Normalizer,
    renderer: ReportRenderer,
    dirs: JobDirs,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn JobStore>,
        llm: Arc<dyn Completion>,
        normalizer: Normalizer,
        renderer: ReportRenderer,
        dirs: JobDirs,
    ) -> Self {
        Self {
            store,
            llm,
            normalizer,
            renderer,
            dirs,
        }
    }

    /// Registers a queued job and starts its pipeline in the background.
    pub async fn submit(
        self: &Arc<Self>,
        input: JobInput,
        format: ReportFormat,
        perspectives: Option<Vec<String>>,
    ) -> Result<Uuid, AppError> {
        let job = Job::new(input.kind(), format);
        self.schedule(job, input, perspectives).await
    }

    /// Stores an uploaded PDF under `upload_dir/{job_id}/` and schedules a document job.
    pub async fn submit_upload(
        self: &Arc<Self>,
        file_name: &str,
        bytes: Bytes,
        format: ReportFormat,
        perspectives: Option<Vec<String>>,
    ) -> Result<Uuid, AppError> {
        let base_name = upload_base_name(file_name).ok_or_else(|| {
            AppError::Validation(format!("'{file_name}' is not a usable file name"))
        })?;
        if !base_name.to_lowercase().ends_with(".pdf") {
            return Err(AppError::Validation(
                "only PDF documents can be uploaded".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }

        let job = Job::new(InputKind::Document, format);
        let job_upload_dir = self.dirs.upload_dir.join(job.id.to_string());
        tokio::fs::create_dir_all(&job_upload_dir)
            .await
            .with_context(|| format!("Failed to create {}", job_upload_dir.display()))?;

        let path = job_upload_dir.join(base_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to store upload at {}", path.display()))?;
        info!("Stored upload {} ({} bytes)", path.display(), bytes.len());

        self.schedule(job, JobInput::Document(path), perspectives)
            .await
    }

    async fn schedule(
        self: &Arc<Self>,
        job: Job,
        input: JobInput,
        perspectives: Option<Vec<String>>,
    ) -> Result<Uuid, AppError> {
        let id = job.id;
        self.store
            .insert(job.clone())
            .await
            .context("Failed to register job")?;
        info!(
            "Job {id} queued ({:?} → {})",
            job.input_kind, job.output_format
        );

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.run(job, input, perspectives).await;
        });

        Ok(id)
    }

    async fn run(&self, mut job: Job, input: JobInput, perspectives: Option<Vec<String>>) {
        let id = job.id;
        match self.execute(&mut job, &input, perspectives.as_deref()).await {
            Ok(report_path) => {
                info!("Job {id} completed: {}", report_path.display());
                job.complete(report_path);
            }
            Err(e) => {
                error!("Job {id} failed: {e:#}");
                job.fail(format!("{e:#}"));
            }
        }
        self.persist(&job).await;
    }

    async fn execute(
        &self,
        job: &mut Job,
        input: &JobInput,
        perspectives: Option<&[String]>,
    ) -> anyhow::Result<PathBuf> {
        job.start();
        self.checkpoint(job, 10, NORMALIZE_MESSAGE).await;
        let normalized = self
            .normalizer
            .normalize(&input.raw(), Some(input.kind()))
            .await
            .context("입력 처리 실패")?;

        self.checkpoint(job, ANALYZE_START, ANALYZE_MESSAGE).await;
        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = tokio::spawn(track_progress(Arc::clone(&self.store), job.clone(), rx));

        let keys: Option<Vec<&str>> =
            perspectives.map(|keys| keys.iter().map(String::as_str).collect());
        let results =
            analyzer::analyze(self.llm.as_ref(), &normalized.content, keys.as_deref(), Some(&tx))
                .await;
        drop(tx);
        *job = tracker.await.context("progress tracker stopped unexpectedly")?;
        info!(
            "Job {}: {}/{} perspectives succeeded",
            job.id,
            results.succeeded(),
            results.len()
        );

        self.checkpoint(job, 85, SYNTHESIZE_MESSAGE).await;
        let synthesis = synthesis::synthesize(self.llm.as_ref(), &results).await;

        self.checkpoint(job, 90, RENDER_MESSAGE).await;
        let scratch = self.dirs.work_dir.join(job.id.to_string());
        let rendered = self
            .renderer
            .render(&normalized, &results, &synthesis, job.output_format, &scratch)
            .await
            .context("보고서 생성 실패")?;

        let final_path = self.dirs.report_dir.join(format!(
            "{}_report.{}",
            job.id,
            job.output_format.extension()
        ));
        move_file(&rendered, &final_path).await?;
        remove_dir_quietly(&scratch).await;

        Ok(final_path)
    }

    async fn checkpoint(&self, job: &mut Job, progress: u8, message: &str) {
        job.advance(progress, message);
        info!("Job {} [{}%] {}", job.id, job.progress, message);
        self.persist(job).await;
    }

    async fn persist(&self, job: &Job) {
        if let Err(e) = self.store.update(job).await {
            warn!("Could not persist job {}: {e}", job.id);
        }
    }

    pub async fn get_status(&self, id: Uuid) -> Result<Job, AppError> {
        self.store
            .get(id)
            .await
            .ok_or_else(|| AppError::NotFound(JOB_NOT_FOUND.to_string()))
    }

    pub async fn download(&self, id: Uuid) -> Result<ReportArtifact, AppError> {
        let job = self.get_status(id).await?;
        if job.status != JobStatus::Completed {
            return Err(AppError::NotReady(JOB_NOT_READY.to_string()));
        }

        let path = job
            .report_path
            .ok_or_else(|| AppError::MissingArtifact(REPORT_MISSING.to_string()))?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(AppError::MissingArtifact(REPORT_MISSING.to_string()));
        }

        let id_prefix: String = id.to_string().chars().take(8).collect();
        Ok(ReportArtifact {
            path,
            media_type: job.output_format.media_type(),
            file_name: format!(
                "analysis_report_{id_prefix}.{}",
                job.output_format.extension()
            ),
        })
    }

    /// Drops finished jobs older than `ttl` along with their reports and uploads.
    pub async fn evict_expired(&self, ttl: Duration) -> usize {
        let cutoff = Utc::now() - ttl;
        let evicted = self.store.evict_finished_before(cutoff).await;

        for job in &evicted {
            if let Some(path) = &job.report_path {
                if let Err(e) = tokio::fs::remove_file(path).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!("Could not remove report {}: {e}", path.display());
                    }
                }
            }
            remove_dir_quietly(&self.dirs.upload_dir.join(job.id.to_string())).await;
            remove_dir_quietly(&self.dirs.work_dir.join(job.id.to_string())).await;
        }

        if !evicted.is_empty() {
            info!("Evicted {} expired jobs", evicted.len());
        }
        evicted.len()
    }
}

/// Applies analyzer progress events to the lent job row until the sender is dropped.
async fn track_progress(
    store: Arc<dyn JobStore>,
    mut job: Job,
    mut events: UnboundedReceiver<ProgressEvent>,
) -> Job {
    while let Some(event) = events.recv().await {
        job.advance(
            analysis_progress(event.completed, event.total),
            format!(
                "[{}/{}] {} {PERSPECTIVE_DONE_SUFFIX}",
                event.completed, event.total, event.title
            ),
        );
        if let Err(e) = store.update(&job).await {
            warn!("Could not persist progress for job {}: {e}", job.id);
        }
    }
    job
}

/// `20 + 60 × completed / total`, floored.
fn analysis_progress(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return ANALYZE_START;
    }
    let step = ANALYZE_SPAN * completed.min(total) / total;
    ANALYZE_START + step as u8
}

/// Last path component of a client-supplied name, ignoring either separator style.
fn upload_base_name(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next()?.trim();
    match base {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

async fn move_file(from: &Path, to: &Path) -> anyhow::Result<()> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if tokio::fs::rename(from, to).await.is_ok() {
        return Ok(());
    }
    // rename fails across filesystems
    tokio::fs::copy(from, to)
        .await
        .with_context(|| format!("Failed to move report to {}", to.display()))?;
    tokio::fs::remove_file(from)
        .await
        .with_context(|| format!("Failed to remove {}", from.display()))?;
    Ok(())
}

async fn remove_dir_quietly(dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Could not remove {}: {e}", dir.display());
        }
    }
}
