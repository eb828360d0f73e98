use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::filter::RequestFilter;

/// Resolves once a started download has reached a stable, fully-written
/// file. Replaces fixed-interval polling with a real completion signal.
pub struct DownloadHandle {
    inner: Pin<Box<dyn Future<Output = Result<PathBuf>> + Send>>,
}

impl DownloadHandle {
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<PathBuf>> + Send + 'static,
    {
        Self {
            inner: Box::pin(fut),
        }
    }

    /// A handle for a file that is already fully written.
    pub fn ready(path: PathBuf) -> Self {
        Self::new(async move { Ok(path) })
    }

    /// Wait until the saved file is complete and readable.
    pub async fn wait(self) -> Result<PathBuf> {
        self.inner.await
    }
}

impl fmt::Debug for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DownloadHandle")
    }
}

/// What a single navigation resolved to.
///
/// A navigation produces exactly one of these; the page-load and
/// file-download signals are mutually exclusive. Navigation failure is
/// the `Err` arm of [`BrowserSession::navigate`].
#[derive(Debug)]
pub enum NavigationOutcome {
    /// The page finished loading; the fully rendered markup is captured.
    Loaded { html: String },
    /// The target started a file download instead of rendering.
    Download(DownloadHandle),
}

/// One isolated browsing session: a browser process plus a single
/// context with its own cookie/cache/storage jar.
///
/// A session is checked out to at most one worker at a time; the pool
/// enforces this by handing sessions out behind a lock.
#[async_trait]
pub trait BrowserSession: Send {
    /// Drive the session to `url` and report what happened.
    async fn navigate(&mut self, url: &str) -> Result<NavigationOutcome>;

    /// Tear down the context and its owning browser process.
    async fn close(&mut self) -> Result<()>;
}

/// Launches isolated browsing sessions.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Launch one session configured per `config`, with `filter`
    /// installed as its sub-resource policy.
    async fn launch(
        &self,
        config: &SessionConfig,
        filter: Arc<RequestFilter>,
    ) -> Result<Box<dyn BrowserSession>>;
}
