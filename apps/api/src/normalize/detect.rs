//! Input kind classification for `auto` submissions.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::InputKind;

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)^https?://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+[A-Z]{2,6}\.?|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3})",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("URL pattern is a valid regex")
});

const DOCUMENT_EXTENSIONS: &[&str] = &["pdf"];

pub fn is_url(input: &str) -> bool {
    URL_PATTERN.is_match(input)
}

/// True when `input` names an existing file with a recognized document extension.
pub fn is_document_path(input: &str) -> bool {
    let path = Path::new(input);
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false);
    has_extension && path.is_file()
}

/// URL first, then document path, otherwise literal text.
pub fn detect_kind(input: &str) -> InputKind {
    let trimmed = input.trim();
    if is_url(trimmed) {
        InputKind::Url
    } else if is_document_path(trimmed) {
        InputKind::Document
    } else {
        InputKind::Text
    }
}
