use std::path::PathBuf;

/// Top-level error type for batch fetch operations.
///
/// Per-URL failures (`Navigation`, `Download`, `Extraction`, ...) never
/// escape a worker — they are stringified into the outcome's `error`
/// field. Only `InvalidInput` and a batch-wide `Launch` failure escalate
/// to the caller of the batch operation.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Caller handed over unusable input (empty batch, zero concurrency).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A browser session could not be launched.
    #[error("session launch failed: {0}")]
    Launch(String),

    /// Navigation to a URL failed (DNS, refused connection, bad scheme).
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// Navigation did not settle within the configured bound.
    #[error("navigation timed out after {0} seconds")]
    NavigationTimeout(u64),

    /// A file download was started but never reached a stable file.
    #[error("download failed: {0}")]
    Download(String),

    /// Content extraction or conversion failed.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// The downloaded file's format has no parser.
    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Filesystem I/O error with the offending path.
    #[error("i/o error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A filter pattern failed to compile.
    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl FetchError {
    /// Wrap a `std::io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FetchError>;
