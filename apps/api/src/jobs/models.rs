//! Job record and its state transitions.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::normalize::InputKind;
use crate::report::ReportFormat;

pub const QUEUED_MESSAGE: &str = "분석 대기 중...";
pub const COMPLETED_MESSAGE: &str = "분석 완료!";
const FAILED_MESSAGE_PREFIX: &str = "오류 발생";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    /// 0-100, never decreases while `processing`.
    pub progress: u8,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub report_path: Option<PathBuf>,
    pub error: Option<String>,
    pub input_kind: InputKind,
    pub output_format: ReportFormat,
}

impl Job {
    pub fn new(input_kind: InputKind, output_format: ReportFormat) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Queued,
            progress: 0,
            message: QUEUED_MESSAGE.to_string(),
            created_at: Utc::now(),
            completed_at: None,
            report_path: None,
            error: None,
            input_kind,
            output_format,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Processing;
    }

    /// Moves to `progress` unless the job is already further along.
    pub fn advance(&mut self, progress: u8, message: impl Into<String>) {
        self.progress = self.progress.max(progress.min(100));
        self.message = message.into();
    }

    pub fn complete(&mut self, report_path: PathBuf) {
        self.status = JobStatus::Completed;
        self.progress = 100;
        self.message = COMPLETED_MESSAGE.to_string();
        self.report_path = Some(report_path);
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        let error = error.into();
        self.status = JobStatus::Failed;
        self.progress = 0;
        self.message = format!("{FAILED_MESSAGE_PREFIX}: {error}");
        self.error = Some(error);
        self.completed_at = Some(Utc::now());
    }

    /// When the job stopped changing, if it has.
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        if self.status.is_finished() {
            self.completed_at
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(InputKind::Text, ReportFormat::Markdown)
    }

    #[test]
    fn test_new_job_is_queued_at_zero() {
        let job = job();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert_eq!(job.message, QUEUED_MESSAGE);
        assert_eq!(job.id.get_version_num(), 4);
        assert!(job.finished_at().is_none());
    }

    #[test]
    fn test_progress_never_goes_backwards() {
        let mut job = job();
        job.start();
        job.advance(50, "half");
        job.advance(20, "late event");
        assert_eq!(job.progress, 50);
        assert_eq!(job.message, "late event");
        job.advance(250, "clamped");
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_complete_sets_artifact() {
        let mut job = job();
        job.start();
        job.complete(PathBuf::from("/tmp/r.md"));
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.message, COMPLETED_MESSAGE);
        assert!(job.finished_at().is_some());
    }

    #[test]
    fn test_fail_resets_progress_and_records_error() {
        let mut job = job();
        job.start();
        job.advance(85, "synth");
        job.fail("boom");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 0);
        assert_eq!(job.message, "오류 발생: boom");
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let value = serde_json::to_value(job()).unwrap();
        assert_eq!(value["status"], "queued");
        assert_eq!(value["input_kind"], "text");
        assert_eq!(value["output_format"], "markdown");
    }
}
