//! The fixed Markdown report layout and its section builders.
//!
//! Everything here is pure: the same inputs and timestamp produce the same bytes.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::NormalizedInput;
use crate::perspectives::analyzer::AnalysisResults;

const SUMMARY_PREVIEW_CHARS: usize = 300;
const FILENAME_MAX_CHARS: usize = 50;
const FRAMEWORK_NAME: &str = "10가지 사고 지원 프롬프트";
/// Markdown hard line break.
const LINE_BREAK: &str = "  ";
const TRUNCATION_NOTICE: &str = "\n\n... (내용이 길어 일부만 표시됩니다)";

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SEPARATOR_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-\s]+").expect("valid regex"));

/// Provenance and size knobs that do not come from the job itself.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub model: String,
    /// Characters of original content reproduced in the report.
    pub content_limit: usize,
}

pub fn render_markdown(
    input: &NormalizedInput,
    results: &AnalysisResults,
    synthesis: &str,
    options: &ReportOptions,
    generated_at: &DateTime<Local>,
) -> String {
    let timestamp = generated_at.format("%Y년 %m월 %d일 %H:%M:%S").to_string();
    let title = &input.metadata.title;
    let source = &input.metadata.source;
    let input_kind = input.kind.label();
    let summary = executive_summary(&input.content, results);
    let original_content = truncate_chars(&input.content, options.content_limit);
    let analyses = format_analyses(results);
    let model = &options.model;
    let system = format!("ThinkLens v{}", env!("CARGO_PKG_VERSION"));

    format!(
        "# {title}

**분석 일시**: {timestamp}{LINE_BREAK}
**출처**: {source}{LINE_BREAK}
**분석 유형**: {input_kind}

---

## 📋 요약 (Executive Summary)

{summary}

---

## 📄 원본 내용 (Original Content)

{original_content}

---

## 🧠 10가지 관점별 분석

{analyses}

---

## 🎯 종합 결론 (Synthesis)

{synthesis}

---

## 📚 참고 정보

- **분석 모델**: {model}
- **분석 프레임워크**: {FRAMEWORK_NAME}
- **생성 시스템**: {system}
- **보고서 생성 일시**: {timestamp}

---

*본 보고서는 AI 기반 다각도 사고 분석 시스템을 통해 자동 생성되었습니다.*
"
    )
}

fn executive_summary(content: &str, results: &AnalysisResults) -> String {
    let preview = if content.chars().count() > SUMMARY_PREVIEW_CHARS {
        let head: String = content.chars().take(SUMMARY_PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        content.to_string()
    };

    format!(
        "본 보고서는 제공된 내용을 **10가지 사고 프롬프트**를 통해 다각도로 분석한 결과입니다.

**분석 완료**: {}/{}개 관점

**원본 내용 요약**:
{preview}

각 관점별 상세 분석은 아래 섹션에서 확인하실 수 있습니다.",
        results.succeeded(),
        results.len()
    )
}

fn format_analyses(results: &AnalysisResults) -> String {
    results
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            format!(
                "### {}. {} ({})

**분석 목적**: {}

**분석 결과**:

{}

---
",
                idx + 1,
                r.title_localized,
                r.title,
                r.description,
                r.result_text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn truncate_chars(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let head: String = content.chars().take(max_chars).collect();
    format!("{head}{TRUNCATION_NOTICE}")
}

/// Strips non-word characters, joins words with `_`, caps at 50 characters.
pub fn sanitize_title(title: &str) -> String {
    let stripped = NON_WORD.replace_all(title, "");
    let joined = SEPARATOR_RUN.replace_all(&stripped, "_");
    joined.chars().take(FILENAME_MAX_CHARS).collect()
}

/// `report_{title}_{YYYYmmdd_HHMMSS}` without extension.
pub fn report_file_stem(title: &str, at: &DateTime<Local>) -> String {
    format!(
        "report_{}_{}",
        sanitize_title(title),
        at.format("%Y%m%d_%H%M%S")
    )
}
