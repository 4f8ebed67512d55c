//! Markdown → PDF conversion backends.
//!
//! Both backends shell out to an external tool; which one serves the process
//! is decided once at startup by `probe_converter`.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pulldown_cmark::{html, Options, Parser};
use tokio::process::Command;
use tracing::{info, warn};

use crate::report::RenderError;

const CONVERSION_TIMEOUT: Duration = Duration::from_secs(60);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Fixed A4 stylesheet applied to the HTML intermediate.
pub const REPORT_STYLESHEET: &str = r#"
@page { size: A4; margin: 2cm; }
body { font-family: 'Noto Sans KR', 'Malgun Gothic', sans-serif; line-height: 1.6; color: #333; }
h1 { color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px; }
h2 { color: #34495e; border-bottom: 2px solid #95a5a6; padding-bottom: 8px; margin-top: 30px; }
h3 { color: #7f8c8d; margin-top: 20px; }
hr { border: none; border-top: 1px solid #bdc3c7; margin: 20px 0; }
code { background-color: #f4f4f4; padding: 2px 6px; border-radius: 3px; }
pre { background-color: #f4f4f4; padding: 15px; border-radius: 5px; overflow-x: auto; }
blockquote { border-left: 4px solid #3498db; padding-left: 15px; color: #555; font-style: italic; }
"#;

/// Turns a written Markdown report into a PDF at `pdf_path`.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    fn name(&self) -> &str;

    async fn convert(&self, markdown_path: &Path, pdf_path: &Path) -> Result<(), RenderError>;
}

/// Runs `<program> <in.md> <out.pdf>`.
pub struct MarkdownCommandConverter {
    program: String,
}

impl MarkdownCommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl DocumentConverter for MarkdownCommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(&self, markdown_path: &Path, pdf_path: &Path) -> Result<(), RenderError> {
        run_converter(&self.program, markdown_path, pdf_path).await
    }
}

/// Renders Markdown to styled HTML, then runs `<program> <in.html> <out.pdf>`.
pub struct HtmlCommandConverter {
    program: String,
}

impl HtmlCommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl DocumentConverter for HtmlCommandConverter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn convert(&self, markdown_path: &Path, pdf_path: &Path) -> Result<(), RenderError> {
        let markdown = tokio::fs::read_to_string(markdown_path).await?;
        let html_path = markdown_path.with_extension("html");
        tokio::fs::write(&html_path, markdown_to_html(&markdown)).await?;

        let result = run_converter(&self.program, &html_path, pdf_path).await;
        if let Err(e) = tokio::fs::remove_file(&html_path).await {
            warn!("Could not remove {}: {e}", html_path.display());
        }
        result
    }
}

/// Complete HTML document with the report stylesheet inlined.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut body = String::new();
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    html::push_html(&mut body, parser);

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<style>{REPORT_STYLESHEET}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}

async fn run_converter(program: &str, input: &Path, output: &Path) -> Result<(), RenderError> {
    let child = Command::new(program)
        .arg(input)
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let result = tokio::time::timeout(CONVERSION_TIMEOUT, child)
        .await
        .map_err(|_| {
            RenderError::Conversion(format!(
                "{program} timed out after {}s",
                CONVERSION_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| RenderError::Conversion(format!("could not run {program}: {e}")))?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(RenderError::Conversion(format!(
            "{program} exited with {}: {}",
            result.status,
            stderr.trim()
        )));
    }

    if !tokio::fs::try_exists(output).await.unwrap_or(false) {
        return Err(RenderError::Conversion(format!(
            "{program} reported success but wrote no {}",
            output.display()
        )));
    }

    Ok(())
}

/// True when `<program> --version` can be spawned.
pub async fn command_available(program: &str) -> bool {
    let probe = Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .status();

    matches!(tokio::time::timeout(PROBE_TIMEOUT, probe).await, Ok(Ok(_)))
}

/// Picks the Markdown command if present, else the HTML command, else nothing.
pub async fn probe_converter(
    markdown_program: &str,
    html_program: &str,
) -> Option<Arc<dyn DocumentConverter>> {
    if command_available(markdown_program).await {
        info!("PDF conversion via Markdown converter '{markdown_program}'");
        return Some(Arc::new(MarkdownCommandConverter::new(markdown_program)));
    }
    if command_available(html_program).await {
        info!("PDF conversion via HTML converter '{html_program}'");
        return Some(Arc::new(HtmlCommandConverter::new(html_program)));
    }
    warn!(
        "Neither '{markdown_program}' nor '{html_program}' is available; PDF reports are disabled"
    );
    None
}
