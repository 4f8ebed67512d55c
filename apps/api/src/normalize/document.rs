//! PDF text and metadata extraction.

use std::path::Path;

use pdf::file::FileOptions;
use tracing::{debug, warn};

use crate::normalize::NormalizeError;

/// Text and embedded metadata recovered from one PDF.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedDocument {
    pub text: String,
    pub pages: usize,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Reads and parses a PDF off the async runtime.
pub async fn extract_document(path: &Path) -> Result<ExtractedDocument, NormalizeError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| NormalizeError::Document(format!("{}: {e}", path.display())))?;

    tokio::task::spawn_blocking(move || parse_pdf(&bytes))
        .await
        .map_err(|e| NormalizeError::Document(format!("PDF extraction task failed: {e}")))?
}

fn parse_pdf(bytes: &[u8]) -> Result<ExtractedDocument, NormalizeError> {
    let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .map_err(|e| NormalizeError::Document(e.to_string()))?;

    let page_count = pages.len();
    let text = join_pages(&pages);
    let (title, author) = read_info_dict(bytes);

    debug!(
        "Extracted {} characters from {} PDF pages",
        text.chars().count(),
        page_count
    );

    Ok(ExtractedDocument {
        text,
        pages: page_count,
        title,
        author,
    })
}

/// Non-empty pages separated by a blank line.
fn join_pages(pages: &[String]) -> String {
    pages
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Best-effort read of `/Title` and `/Author`; a broken info dictionary is not fatal.
fn read_info_dict(bytes: &[u8]) -> (Option<String>, Option<String>) {
    let file = match FileOptions::cached().load(bytes) {
        Ok(file) => file,
        Err(e) => {
            warn!("Could not read PDF metadata: {e}");
            return (None, None);
        }
    };

    let Some(info) = file.trailer.info_dict.as_ref() else {
        return (None, None);
    };

    let clean = |value: Option<String>| {
        value
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    (
        clean(info.title.as_ref().map(|s| s.to_string_lossy())),
        clean(info.author.as_ref().map(|s| s.to_string_lossy())),
    )
}
