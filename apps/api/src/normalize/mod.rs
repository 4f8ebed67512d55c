//! Content Normalizer — turns literal text, a URL or a PDF path into one
//! `NormalizedInput` the analyzer and renderer can consume.

pub mod detect;
pub mod document;
pub mod html;

use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const DIRECT_INPUT_SOURCE: &str = "Direct Input";
const TITLE_MAX_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("input is empty")]
    Empty,

    #[error("failed to fetch URL: {0}")]
    Fetch(String),

    #[error("failed to read document: {0}")]
    Document(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Url,
    Document,
}

impl InputKind {
    /// Korean label shown in reports.
    pub fn label(&self) -> &'static str {
        match self {
            InputKind::Text => "텍스트 직접 입력",
            InputKind::Url => "웹 페이지 (URL)",
            InputKind::Document => "PDF 문서",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputMetadata {
    pub title: String,
    pub source: String,
    /// Character count of the extracted content.
    pub length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedInput {
    pub content: String,
    pub metadata: InputMetadata,
    pub kind: InputKind,
}

/// Holds the HTTP client used for URL inputs.
#[derive(Clone)]
pub struct Normalizer {
    client: Client,
}

impl Normalizer {
    pub fn new() -> Result<Self, NormalizeError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| NormalizeError::Fetch(e.to_string()))?;
        Ok(Self { client })
    }

    /// Normalizes `raw` according to `declared`; `None` auto-detects the kind.
    pub async fn normalize(
        &self,
        raw: &str,
        declared: Option<InputKind>,
    ) -> Result<NormalizedInput, NormalizeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(NormalizeError::Empty);
        }

        let kind = declared.unwrap_or_else(|| detect::detect_kind(trimmed));
        info!("Normalizing {:?} input ({} chars)", kind, trimmed.chars().count());

        match kind {
            InputKind::Text => Ok(normalize_text(trimmed)),
            InputKind::Url => self.normalize_url(trimmed).await,
            InputKind::Document => normalize_document(Path::new(trimmed)).await,
        }
    }

    async fn normalize_url(&self, url: &str) -> Result<NormalizedInput, NormalizeError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NormalizeError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NormalizeError::Fetch(format!("{url} returned {status}")));
        }

        let domain = response.url().host_str().map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| NormalizeError::Fetch(e.to_string()))?;

        let (title, content) = {
            let document = Html::parse_document(&body);
            (html::extract_title(&document), html::extract_content(&document))
        };

        Ok(NormalizedInput {
            metadata: InputMetadata {
                title,
                source: url.to_string(),
                length: content.chars().count(),
                domain,
                author: None,
                pages: None,
            },
            content,
            kind: InputKind::Url,
        })
    }
}

fn normalize_text(text: &str) -> NormalizedInput {
    NormalizedInput {
        content: text.to_string(),
        metadata: InputMetadata {
            title: title_from_text(text),
            source: DIRECT_INPUT_SOURCE.to_string(),
            length: text.chars().count(),
            domain: None,
            author: None,
            pages: None,
        },
        kind: InputKind::Text,
    }
}

async fn normalize_document(path: &Path) -> Result<NormalizedInput, NormalizeError> {
    let extracted = document::extract_document(path).await?;

    let title = extracted.title.unwrap_or_else(|| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    });

    Ok(NormalizedInput {
        metadata: InputMetadata {
            title,
            source: path.display().to_string(),
            length: extracted.text.chars().count(),
            domain: None,
            author: extracted.author,
            pages: Some(extracted.pages),
        },
        content: extracted.text,
        kind: InputKind::Document,
    })
}

/// First line of the text, cut to 50 characters with "..." when longer.
pub fn title_from_text(text: &str) -> String {
    let first_line = text.trim().lines().next().unwrap_or("").trim();
    if first_line.chars().count() > TITLE_MAX_CHARS {
        let head: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        format!("{head}...")
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_title_is_first_line() {
        assert_eq!(title_from_text("Hello\nWorld"), "Hello");
    }

    #[test]
    fn test_long_first_line_is_truncated_with_ellipsis() {
        let line = "a".repeat(60);
        let title = title_from_text(&line);
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn test_title_truncation_counts_characters_not_bytes() {
        let line = "가".repeat(55);
        let title = title_from_text(&line);
        assert_eq!(title.chars().count(), 53);
    }

    #[tokio::test]
    async fn test_text_input_metadata() {
        let normalizer = Normalizer::new().unwrap();
        let input = normalizer
            .normalize("  AI 교육 플랫폼\n개인화 학습  ", None)
            .await
            .unwrap();
        assert_eq!(input.kind, InputKind::Text);
        assert_eq!(input.content, "AI 교육 플랫폼\n개인화 학습");
        assert_eq!(input.metadata.title, "AI 교육 플랫폼");
        assert_eq!(input.metadata.source, "Direct Input");
        assert_eq!(input.metadata.length, input.content.chars().count());
    }

    #[tokio::test]
    async fn test_blank_input_fails_fast() {
        let normalizer = Normalizer::new().unwrap();
        let err = normalizer.normalize(" \n\t ", None).await.unwrap_err();
        assert!(matches!(err, NormalizeError::Empty));
    }

    #[tokio::test]
    async fn test_url_input_is_fetched_and_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><title>Launch Plan</title></head>\
                 <body><nav>Home</nav><article><p>Ship   it</p></article></body></html>",
            ))
            .mount(&server)
            .await;

        let url = format!("{}/post", server.uri());
        let input = Normalizer::new().unwrap().normalize(&url, None).await.unwrap();

        assert_eq!(input.kind, InputKind::Url);
        assert_eq!(input.metadata.title, "Launch Plan");
        assert_eq!(input.content, "Ship it");
        assert_eq!(input.metadata.source, url);
        assert_eq!(input.metadata.domain.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_url_error_status_is_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/gone", server.uri());
        let err = Normalizer::new().unwrap().normalize(&url, None).await.unwrap_err();
        assert!(matches!(err, NormalizeError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_document_without_title_uses_file_name() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/untitled_notes.pdf");
        let input = Normalizer::new()
            .unwrap()
            .normalize(path, Some(InputKind::Document))
            .await
            .unwrap();
        assert_eq!(input.kind, InputKind::Document);
        assert_eq!(input.metadata.title, "untitled_notes.pdf");
        assert_eq!(input.metadata.pages, Some(1));
        assert_eq!(input.metadata.author, None);
        assert_eq!(input.metadata.source, path);
    }

    #[tokio::test]
    async fn test_document_title_comes_from_info_dict() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/two_pages.pdf");
        let input = Normalizer::new().unwrap().normalize(path, None).await.unwrap();
        assert_eq!(input.kind, InputKind::Document);
        assert_eq!(input.metadata.title, "Fixture Title");
        assert_eq!(input.metadata.author.as_deref(), Some("Fixture Author"));
        assert_eq!(input.metadata.pages, Some(2));
    }

    #[tokio::test]
    async fn test_declared_kind_overrides_detection() {
        let normalizer = Normalizer::new().unwrap();
        let input = normalizer
            .normalize("https://example.com", Some(InputKind::Text))
            .await
            .unwrap();
        assert_eq!(input.kind, InputKind::Text);
        assert_eq!(input.metadata.title, "https://example.com");
    }
}
