//! Batch web-content acquisition through a pool of headless browser
//! sessions.
//!
//! Given a list of URLs, each is fetched concurrently through an
//! isolated browsing session. A navigation either renders a page or
//! starts a file download; both converge on one normalized markdown
//! text representation. Every URL yields exactly one outcome, failures
//! included, and the session pool is torn down at batch end no matter
//! how the batch went.

// Re-export modules
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod normalize;
pub mod results;
pub mod session;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::FetchConfig;
pub use error::{FetchError, Result};
pub use results::{FetchMethod, FetchOutcome};

use std::path::Path;
use std::sync::Arc;

use fetch::BatchCoordinator;
use normalize::document::{DocumentParser, FileParser};
use session::cdp::CdpDriver;
use session::driver::BrowserDriver;

/// Builder for one batch fetch.
///
/// ```no_run
/// use page_haul::Batch;
///
/// # async fn run() -> page_haul::Result<()> {
/// let outcomes = Batch::new(["https://example.com/", "https://example.com/report.pdf"])
///     .with_max_concurrency(2)
///     .run()
///     .await?;
/// for outcome in &outcomes {
///     println!("{}: {:?}", outcome.url, outcome.method);
/// }
/// # Ok(())
/// # }
/// ```
pub struct Batch {
    urls: Vec<String>,
    config: FetchConfig,
}

impl Batch {
    /// Create a batch over the given URLs.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: urls.into_iter().map(Into::into).collect(),
            config: FetchConfig::default(),
        }
    }

    /// Replace the whole configuration.
    pub fn with_config(mut self, config: FetchConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a JSON file.
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.config = FetchConfig::from_file(path)?;
        Ok(self)
    }

    /// Cap on concurrent fetches and launched sessions.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.config.max_concurrency = max_concurrency;
        self
    }

    /// Browser navigation bound, in seconds.
    pub fn with_navigation_timeout(mut self, seconds: u64) -> Self {
        self.config.navigation_timeout_secs = seconds;
        self
    }

    /// Directory where downloaded files land.
    pub fn with_download_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.download_dir = Some(dir.into());
        self
    }

    /// Run the batch with the production browser driver and the
    /// built-in file parser.
    pub async fn run(self) -> Result<Vec<FetchOutcome>> {
        self.run_with(Arc::new(CdpDriver), Arc::new(FileParser)).await
    }

    /// Run the batch with injected collaborators.
    pub async fn run_with(
        self,
        driver: Arc<dyn BrowserDriver>,
        parser: Arc<dyn DocumentParser>,
    ) -> Result<Vec<FetchOutcome>> {
        let coordinator = BatchCoordinator::new(self.config, driver, parser)?;
        coordinator.fetch_all(&self.urls).await
    }
}
