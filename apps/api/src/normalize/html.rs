//! HTML title and body-text extraction for fetched web pages.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

/// Subtrees never contributing to extracted body text.
const STRIPPED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "aside"];

const UNTITLED: &str = "Untitled";

static CONTENT_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)content|article|post|entry").expect("valid class regex"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static CSS selector")
}

static TITLE: Lazy<Selector> = Lazy::new(|| selector("title"));
static H1: Lazy<Selector> = Lazy::new(|| selector("h1"));
static OG_TITLE: Lazy<Selector> = Lazy::new(|| selector(r#"meta[property="og:title"]"#));
static ARTICLE: Lazy<Selector> = Lazy::new(|| selector("article"));
static MAIN: Lazy<Selector> = Lazy::new(|| selector("main"));
static CLASSED_DIV: Lazy<Selector> = Lazy::new(|| selector("div[class]"));
static BODY: Lazy<Selector> = Lazy::new(|| selector("body"));

/// Title resolution: `<title>` → first `<h1>` → `og:title` → "Untitled".
pub fn extract_title(document: &Html) -> String {
    let from_title = document
        .select(&TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());
    if let Some(title) = from_title {
        return title;
    }

    if let Some(h1) = document.select(&H1).next() {
        return h1.text().collect::<String>().trim().to_string();
    }

    document
        .select(&OG_TITLE)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Content resolution: `<article>` → `<main>` → content-like `div` → `<body>` → whole document.
pub fn extract_content(document: &Html) -> String {
    let container = first_visible(document, &ARTICLE)
        .or_else(|| first_visible(document, &MAIN))
        .or_else(|| {
            document
                .select(&CLASSED_DIV)
                .filter(|el| !inside_stripped(el))
                .find(|el| el.value().classes().any(|c| CONTENT_CLASS.is_match(c)))
        })
        .or_else(|| first_visible(document, &BODY))
        .unwrap_or_else(|| document.root_element());

    let mut raw = String::new();
    visible_text(container, &mut raw);
    clean_text(&raw)
}

/// Collapses every whitespace run (including blank-line runs) to one space.
pub fn clean_text(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").trim().to_string()
}

fn first_visible<'a>(document: &'a Html, sel: &Selector) -> Option<ElementRef<'a>> {
    document.select(sel).find(|el| !inside_stripped(el))
}

fn inside_stripped(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|el| STRIPPED_TAGS.contains(&el.name()))
            .unwrap_or(false)
    })
}

fn visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !STRIPPED_TAGS.contains(&child_el.value().name()) {
                visible_text(child_el, out);
                // Block boundaries must not glue words together.
                out.push(' ');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_prefers_title_tag() {
        let doc = Html::parse_document(
            "<html><head><title> Page Title </title></head><body><h1>Heading</h1></body></html>",
        );
        assert_eq!(extract_title(&doc), "Page Title");
    }

    #[test]
    fn test_title_falls_back_to_h1_then_og_title() {
        let doc = Html::parse_document("<html><body><h1>Heading</h1></body></html>");
        assert_eq!(extract_title(&doc), "Heading");

        let doc = Html::parse_document(
            r#"<html><head><meta property="og:title" content="Social Title"></head><body></body></html>"#,
        );
        assert_eq!(extract_title(&doc), "Social Title");

        let doc = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert_eq!(extract_title(&doc), "Untitled");
    }

    #[test]
    fn test_content_prefers_article_and_strips_noise() {
        let doc = Html::parse_document(
            r#"<html><body>
                <nav>Menu</nav>
                <article><p>Real   story</p><script>var x = 1;</script><aside>ad</aside></article>
                <footer>Copyright</footer>
            </body></html>"#,
        );
        assert_eq!(extract_content(&doc), "Real story");
    }

    #[test]
    fn test_content_uses_main_before_classed_div() {
        let doc = Html::parse_document(
            r#"<html><body><div class="post-body">Div text</div><main>Main text</main></body></html>"#,
        );
        assert_eq!(extract_content(&doc), "Main text");
    }

    #[test]
    fn test_content_matches_content_like_class_case_insensitively() {
        let doc = Html::parse_document(
            r#"<html><body><div class="sidebar">Side</div><div class="Main-CONTENT">Body copy</div></body></html>"#,
        );
        assert_eq!(extract_content(&doc), "Body copy");
    }

    #[test]
    fn test_content_falls_back_to_body_without_header() {
        let doc = Html::parse_document(
            "<html><body><header>Site</header><p>First</p>\n\n\n<p>Second</p></body></html>",
        );
        assert_eq!(extract_content(&doc), "First Second");
    }

    #[test]
    fn test_article_inside_header_is_ignored() {
        let doc = Html::parse_document(
            "<html><body><header><article>Teaser</article></header><p>Body</p></body></html>",
        );
        assert_eq!(extract_content(&doc), "Body");
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        assert_eq!(clean_text("  a \t b\n\n\n c  "), "a b c");
    }
}
