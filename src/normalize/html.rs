use scraper::{Html, Selector};

use crate::error::{FetchError, Result};

/// Tags that never contribute content.
const SKIP_TAGS: [&str; 7] = [
    "script", "style", "meta", "link", "noscript", "iframe", "svg",
];

/// Convert rendered page markup to normalized markdown text.
///
/// Non-content elements are stripped, structural markup becomes
/// lightweight markdown, and fragments end up separated by exactly one
/// blank line. Zero-length output means "no content", not an error.
pub fn to_text(html: &str) -> Result<String> {
    let content = extract_content_html(html);

    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(SKIP_TAGS.to_vec())
        .build();

    let markdown = converter
        .convert(&content)
        .map_err(|e| FetchError::Extraction(format!("markdown conversion failed: {e}")))?;

    Ok(collapse_blank_lines(&markdown))
}

/// Narrow the document to its content root before conversion.
///
/// Prefers `<main>`, then `<article>`, then `<body>`; falls back to the
/// raw input for fragments without any of them.
fn extract_content_html(html: &str) -> String {
    let doc = Html::parse_document(html);

    for selector in ["main", "article", "body"] {
        let selector = Selector::parse(selector).expect("static selector");
        if let Some(element) = doc.select(&selector).next() {
            let inner = element.inner_html();
            if !inner.trim().is_empty() {
                return inner;
            }
        }
    }

    html.to_string()
}

/// Trim trailing space and squeeze runs of blank lines down to one.
fn collapse_blank_lines(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut blank_run = false;

    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() {
            blank_run = true;
            continue;
        }
        if blank_run && !lines.is_empty() {
            lines.push("");
        }
        blank_run = false;
        lines.push(trimmed);
    }

    lines.join("\n").trim().to_string()
}
