use std::fs;
use std::path::Path;

use crate::error::{FetchError, Result};

/// A structural element produced by partitioning a document.
#[derive(Debug, Clone)]
pub struct DocElement {
    /// Plain text of the element.
    pub text: String,
    /// HTML fragment preserving structure (tables), when available.
    pub html: Option<String>,
}

impl DocElement {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: None,
        }
    }

    pub fn html(html: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            html: Some(html.into()),
        }
    }
}

/// Document-parse capability: partition a downloaded file into
/// structural elements.
///
/// Implementations may take seconds per file and block the calling
/// thread; the normalizer always invokes them from a worker thread.
pub trait DocumentParser: Send + Sync {
    fn partition(&self, path: &Path) -> Result<Vec<DocElement>>;
}

/// File formats the built-in parser understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Html,
    Text,
    Unknown,
}

impl DocumentKind {
    /// Detect the format from the file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => DocumentKind::Pdf,
            Some("html" | "htm" | "xhtml") => DocumentKind::Html,
            Some("txt" | "md" | "markdown" | "rst" | "text" | "csv" | "log") => DocumentKind::Text,
            _ => DocumentKind::Unknown,
        }
    }
}

/// Built-in parser dispatching on file type.
pub struct FileParser;

impl DocumentParser for FileParser {
    fn partition(&self, path: &Path) -> Result<Vec<DocElement>> {
        fs::metadata(path).map_err(|e| FetchError::io(path, e))?;

        match DocumentKind::from_path(path) {
            DocumentKind::Pdf => partition_pdf(path),
            DocumentKind::Html => {
                let html = fs::read_to_string(path).map_err(|e| FetchError::io(path, e))?;
                Ok(vec![DocElement::html(html)])
            }
            DocumentKind::Text => {
                let text = fs::read_to_string(path).map_err(|e| FetchError::io(path, e))?;
                Ok(paragraph_elements(&text))
            }
            DocumentKind::Unknown => Err(FetchError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }
}

fn partition_pdf(path: &Path) -> Result<Vec<DocElement>> {
    let text = pdf_extract::extract_text(path)
        .map_err(|e| FetchError::Extraction(format!("pdf extraction failed: {e}")))?;

    let elements = paragraph_elements(&text);
    if elements.is_empty() {
        return Err(FetchError::Extraction(
            "pdf contains no extractable text".into(),
        ));
    }
    Ok(elements)
}

/// Split plain text on blank lines into one element per paragraph.
fn paragraph_elements(text: &str) -> Vec<DocElement> {
    let mut elements = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            if !current.is_empty() {
                elements.push(DocElement::text(current.join(" ")));
                current.clear();
            }
        } else {
            current.push(trimmed);
        }
    }
    if !current.is_empty() {
        elements.push(DocElement::text(current.join(" ")));
    }

    elements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_path() {
        assert_eq!(DocumentKind::from_path(Path::new("r.pdf")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("r.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("a/b.htm")), DocumentKind::Html);
        assert_eq!(DocumentKind::from_path(Path::new("notes.md")), DocumentKind::Text);
        assert_eq!(DocumentKind::from_path(Path::new("movie.mp4")), DocumentKind::Unknown);
        assert_eq!(DocumentKind::from_path(Path::new("no-extension")), DocumentKind::Unknown);
    }

    #[test]
    fn test_paragraph_elements() {
        let text = "First line\ncontinues here\n\nSecond paragraph\n\n\nThird";
        let elements = paragraph_elements(text);
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].text, "First line continues here");
        assert_eq!(elements[2].text, "Third");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = FileParser.partition(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }
}
