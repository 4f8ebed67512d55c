// Report rendering: fills the fixed Markdown layout, writes it to disk and,
// for PDF output, hands it to whichever converter was probed at startup.

pub mod convert;
pub mod template;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::normalize::NormalizedInput;
use crate::perspectives::analyzer::AnalysisResults;
use crate::report::convert::DocumentConverter;
pub use crate::report::template::ReportOptions;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("report io: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF conversion failed: {0}")]
    Conversion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Markdown,
    Pdf,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Pdf => "pdf",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ReportFormat::Markdown => "text/markdown; charset=utf-8",
            ReportFormat::Pdf => "application/pdf",
        }
    }
}

impl Default for ReportFormat {
    fn default() -> Self {
        ReportFormat::Pdf
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Markdown => f.write_str("markdown"),
            ReportFormat::Pdf => f.write_str("pdf"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ReportFormat::Pdf),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(format!(
                "unsupported format '{other}', expected 'pdf' or 'markdown'"
            )),
        }
    }
}

pub struct ReportRenderer {
    options: ReportOptions,
    converter: Option<Arc<dyn DocumentConverter>>,
}

impl ReportRenderer {
    pub fn new(options: ReportOptions, converter: Option<Arc<dyn DocumentConverter>>) -> Self {
        Self { options, converter }
    }

    /// Writes the report into `out_dir` and returns the path of the final artifact.
    ///
    /// For PDF output the intermediate Markdown file is removed once the PDF
    /// exists. A missing converter fails the render rather than silently
    /// falling back to Markdown.
    pub async fn render(
        &self,
        input: &NormalizedInput,
        results: &AnalysisResults,
        synthesis: &str,
        format: ReportFormat,
        out_dir: &Path,
    ) -> Result<PathBuf, RenderError> {
        let generated_at = Local::now();
        let markdown =
            template::render_markdown(input, results, synthesis, &self.options, &generated_at);
        let stem = template::report_file_stem(&input.metadata.title, &generated_at);

        tokio::fs::create_dir_all(out_dir).await?;
        let markdown_path = out_dir.join(format!("{stem}.md"));
        tokio::fs::write(&markdown_path, markdown.as_bytes()).await?;
        info!("Markdown report written to {}", markdown_path.display());

        if format == ReportFormat::Markdown {
            return Ok(markdown_path);
        }

        let Some(converter) = &self.converter else {
            return Err(RenderError::Conversion(
                "no PDF converter is available on this host".to_string(),
            ));
        };

        let pdf_path = out_dir.join(format!("{stem}.pdf"));
        converter.convert(&markdown_path, &pdf_path).await?;
        info!(
            "PDF report written to {} via {}",
            pdf_path.display(),
            converter.name()
        );

        if let Err(e) = tokio::fs::remove_file(&markdown_path).await {
            warn!("Could not remove {}: {e}", markdown_path.display());
        }
        Ok(pdf_path)
    }
}
