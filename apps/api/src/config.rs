use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub port: u16,
    pub rust_log: String,
    pub upload_dir: PathBuf,
    pub report_dir: PathBuf,
    /// Scratch directory the renderer writes into before the report is moved.
    pub work_dir: PathBuf,
    /// Characters of original content reproduced in a report.
    pub report_content_limit: usize,
    pub max_upload_bytes: usize,
    pub job_ttl_secs: u64,
    pub job_sweep_interval_secs: u64,
    pub pdf_converter: String,
    pub html_pdf_converter: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_base_url: env_or("LLM_BASE_URL", "https://api.openai.com/v1"),
            llm_model: env_or("LLM_MODEL", "gpt-4.1-mini"),
            port: parse_env("PORT", 8000)?,
            rust_log: env_or("RUST_LOG", "info"),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "data/uploads")),
            report_dir: PathBuf::from(env_or("REPORT_DIR", "data/reports")),
            work_dir: PathBuf::from(env_or("WORK_DIR", "data/work")),
            report_content_limit: parse_env("REPORT_CONTENT_LIMIT", 2000)?,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            job_ttl_secs: parse_env("JOB_TTL_SECS", 24 * 60 * 60)?,
            job_sweep_interval_secs: parse_env("JOB_SWEEP_INTERVAL_SECS", 600)?,
            pdf_converter: env_or("PDF_CONVERTER", "md-to-pdf"),
            html_pdf_converter: env_or("HTML_PDF_CONVERTER", "wkhtmltopdf"),
        })
    }

    /// Creates the upload, report and work directories if they do not exist.
    pub async fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.upload_dir, &self.report_dir, &self.work_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
