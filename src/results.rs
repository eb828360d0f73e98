use serde::{Deserialize, Serialize};

/// Which extraction path produced the content of an outcome.
///
/// Diagnostic only — callers correlate outcomes by `url`, not by method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMethod {
    /// The URL resolved to a rendered page.
    Navigation,
    /// The URL triggered a file download.
    Download,
}

/// One result per requested URL.
///
/// Exactly one outcome is produced for every URL in a batch. A failed
/// fetch carries `error` and no `content`; a page that rendered to
/// nothing carries neither.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// The original request URL, echoed back for correlation.
    pub url: String,

    /// Normalized text, absent when extraction failed or produced nothing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Extraction path that produced the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<FetchMethod>,

    /// Failure description for this URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchOutcome {
    /// An outcome carrying extracted content.
    pub fn content(url: impl Into<String>, content: String, method: FetchMethod) -> Self {
        Self {
            url: url.into(),
            content: Some(content),
            method: Some(method),
            error: None,
        }
    }

    /// An outcome for a URL that rendered but produced no usable content.
    pub fn empty(url: impl Into<String>, method: FetchMethod) -> Self {
        Self {
            url: url.into(),
            content: None,
            method: Some(method),
            error: None,
        }
    }

    /// An outcome for a failed fetch.
    pub fn failed(url: impl Into<String>, error: impl ToString) -> Self {
        Self {
            url: url.into(),
            content: None,
            method: None,
            error: Some(error.to_string()),
        }
    }

    /// True when the fetch yielded non-empty content.
    pub fn has_content(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}
