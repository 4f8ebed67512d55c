//! Axum route handlers for job submission, polling and report download.

use std::collections::HashMap;

use axum::{
    async_trait,
    body::Body,
    extract::{
        multipart::{Field, MultipartRejection},
        FromRequest, Multipart, Path, Request, State,
    },
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use bytes::Bytes;
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::models::Job;
use crate::jobs::orchestrator::JobInput;
use crate::perspectives::catalogue;
use crate::report::ReportFormat;
use crate::state::AppState;

const STARTED_MESSAGE: &str = "분석이 시작되었습니다.";
const UPLOADED_MESSAGE: &str = "파일이 업로드되었습니다. 분석을 시작합니다.";
const DOWNLOAD_CHUNK_BYTES: usize = 64 * 1024;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Text fields of a submission, from either a urlencoded or a multipart body.
#[derive(Debug, Default)]
pub struct SubmissionForm {
    fields: HashMap<String, String>,
}

impl SubmissionForm {
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }
}

#[async_trait]
impl<S> FromRequest<S> for SubmissionForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            return Ok(Self { fields });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        let mut fields = HashMap::new();
        while let Some(field) = next_field(&mut multipart).await? {
            let name = field.name().unwrap_or("").to_string();
            if field.file_name().is_some() {
                warn!("Ignoring file part '{name}' on a text submission");
                continue;
            }
            fields.insert(name, read_text(field).await?);
        }
        Ok(Self { fields })
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
    pub message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze/text
///
/// Accepts `text`, `format` and `perspectives` as urlencoded or multipart fields.
pub async fn handle_analyze_text(
    State(state): State<AppState>,
    mut form: SubmissionForm,
) -> Result<Json<SubmitResponse>, AppError> {
    let text = required_field("text", form.take("text"))?;
    let format = parse_format(form.take("format").as_deref())?;
    let perspectives = parse_perspectives(form.take("perspectives").as_deref())?;

    let job_id = state
        .orchestrator
        .submit(JobInput::Text(text), format, perspectives)
        .await?;

    Ok(Json(SubmitResponse {
        job_id,
        message: STARTED_MESSAGE.to_string(),
    }))
}

/// POST /analyze/url
pub async fn handle_analyze_url(
    State(state): State<AppState>,
    mut form: SubmissionForm,
) -> Result<Json<SubmitResponse>, AppError> {
    let url = required_field("url", form.take("url"))?;
    let format = parse_format(form.take("format").as_deref())?;
    let perspectives = parse_perspectives(form.take("perspectives").as_deref())?;

    let job_id = state
        .orchestrator
        .submit(JobInput::Url(url.trim().to_string()), format, perspectives)
        .await?;

    Ok(Json(SubmitResponse {
        job_id,
        message: STARTED_MESSAGE.to_string(),
    }))
}

/// POST /analyze/file
///
/// Multipart body with a `file` part plus optional `format` and `perspectives` parts.
pub async fn handle_analyze_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;
    let mut upload = None;
    let mut format = None;
    let mut perspectives = None;

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
                upload = Some((file_name, bytes));
            }
            "format" => format = Some(read_text(field).await?),
            "perspectives" => perspectives = Some(read_text(field).await?),
            _ => warn!("Ignoring unknown multipart field: {name}"),
        }
    }

    let (file_name, bytes) =
        upload.ok_or_else(|| AppError::Validation("file is required".to_string()))?;
    let format = parse_format(format.as_deref())?;
    let perspectives = parse_perspectives(perspectives.as_deref())?;
    info!("Upload received: {file_name} ({} bytes)", bytes.len());

    let job_id = state
        .orchestrator
        .submit_upload(&file_name, bytes, format, perspectives)
        .await?;

    Ok(Json(SubmitResponse {
        job_id,
        message: UPLOADED_MESSAGE.to_string(),
    }))
}

/// GET /status/:job_id
pub async fn handle_get_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<Job>, AppError> {
    let id = parse_job_id(&job_id)?;
    Ok(Json(state.orchestrator.get_status(id).await?))
}

/// GET /download/:job_id
///
/// Streams the report file in chunks.
pub async fn handle_download(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_job_id(&job_id)?;
    let artifact = state.orchestrator.download(id).await?;

    let file = tokio::fs::File::open(&artifact.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::MissingArtifact(format!("{} disappeared", artifact.path.display()))
        } else {
            AppError::Internal(anyhow::Error::from(e).context("Failed to open report"))
        }
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, artifact.media_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", artifact.file_name),
            ),
        ],
        Body::from_stream(file_chunks(file)),
    )
        .into_response())
}

/// Reads `file` in fixed-size chunks, ending after EOF or the first read error.
fn file_chunks(file: tokio::fs::File) -> impl Stream<Item = std::io::Result<Bytes>> {
    stream::unfold(Some(file), |file| async move {
        let mut file = match file {
            Some(file) => file,
            None => return None,
        };
        let mut buf = vec![0u8; DOWNLOAD_CHUNK_BYTES];
        match file.read(&mut buf).await {
            Ok(0) => None,
            Ok(n) => {
                buf.truncate(n);
                Some((Ok::<_, std::io::Error>(Bytes::from(buf)), Some(file)))
            }
            Err(e) => Some((Err(e), None)),
        }
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Field parsing
// ────────────────────────────────────────────────────────────────────────────

fn required_field(name: &str, value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{name} cannot be empty"))),
    }
}

/// Blank or absent means PDF.
fn parse_format(raw: Option<&str>) -> Result<ReportFormat, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ReportFormat::default()),
        Some(value) => value.parse().map_err(AppError::Validation),
    }
}

/// Comma-separated catalogue keys; blank means every perspective.
fn parse_perspectives(raw: Option<&str>) -> Result<Option<Vec<String>>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let mut keys: Vec<String> = Vec::new();
    for key in raw.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        if catalogue::find(key).is_none() {
            return Err(AppError::Validation(format!(
                "unknown perspective '{key}'; expected one of: {}",
                catalogue::keys().collect::<Vec<_>>().join(", ")
            )));
        }
        if !keys.iter().any(|k| k == key) {
            keys.push(key.to_string());
        }
    }

    if keys.is_empty() {
        return Ok(None);
    }
    Ok(Some(keys))
}

fn parse_job_id(raw: &str) -> Result<Uuid, AppError> {
    // Anything that is not a UUID cannot name a job.
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("작업을 찾을 수 없습니다.".to_string()))
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))
}

async fn read_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart field: {e}")))
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn test_file_chunks_reassemble_the_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        let content = "보고서 ".repeat(DOWNLOAD_CHUNK_BYTES / 4);
        std::fs::write(&path, &content).unwrap();

        let file = tokio::fs::File::open(&path).await.unwrap();
        let chunks: Vec<Bytes> = file_chunks(file)
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;
        assert!(chunks.len() > 1);
        let joined: Vec<u8> = chunks.concat();
        assert_eq!(joined, content.as_bytes());
    }

    #[test]
    fn test_required_field_rejects_blank() {
        assert!(required_field("text", None).is_err());
        assert!(required_field("text", Some("   \n".to_string())).is_err());
        assert_eq!(required_field("text", Some("hi".to_string())).unwrap(), "hi");
    }

    #[test]
    fn test_format_defaults_to_pdf() {
        assert_eq!(parse_format(None).unwrap(), ReportFormat::Pdf);
        assert_eq!(parse_format(Some(" ")).unwrap(), ReportFormat::Pdf);
        assert_eq!(parse_format(Some("markdown")).unwrap(), ReportFormat::Markdown);
        assert!(matches!(
            parse_format(Some("docx")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_perspective_selection() {
        assert_eq!(parse_perspectives(None).unwrap(), None);
        assert_eq!(parse_perspectives(Some(" , ")).unwrap(), None);
        assert_eq!(
            parse_perspectives(Some("think_in_reverse, challenge_thinking,think_in_reverse"))
                .unwrap(),
            Some(vec![
                "think_in_reverse".to_string(),
                "challenge_thinking".to_string()
            ])
        );
        assert!(matches!(
            parse_perspectives(Some("challenge_thinking,nope")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_malformed_job_id_is_not_found() {
        assert!(matches!(
            parse_job_id("not-a-uuid"),
            Err(AppError::NotFound(_))
        ));
    }
}
