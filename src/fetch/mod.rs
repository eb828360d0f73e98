//! Batch coordination: one worker per URL, round-robin over the session
//! pool, all under the concurrency limiter, with unconditional pool
//! teardown at batch end.


use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::filter::RequestFilter;
use crate::normalize::document::DocumentParser;
use crate::normalize::Normalizer;
use crate::results::{FetchMethod, FetchOutcome};
use crate::session::driver::{BrowserDriver, NavigationOutcome};
use crate::session::pool::{SessionPool, SessionSlot};

/// Orchestrates a full batch fetch.
pub struct BatchCoordinator {
    config: FetchConfig,
    driver: Arc<dyn BrowserDriver>,
    normalizer: Arc<Normalizer>,
    filter: Arc<RequestFilter>,
    http: Option<reqwest::Client>,
}

impl BatchCoordinator {
    /// Wire up a coordinator. Fails fast on invalid configuration,
    /// before anything is launched.
    pub fn new(
        config: FetchConfig,
        driver: Arc<dyn BrowserDriver>,
        parser: Arc<dyn DocumentParser>,
    ) -> Result<Self> {
        config.validate()?;

        let filter = Arc::new(RequestFilter::from_config(&config)?);
        let normalizer = Arc::new(Normalizer::new(parser, &config));

        let http = if config.light_first {
            let client = reqwest::Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(Duration::from_secs(config.light_timeout_secs))
                .redirect(reqwest::redirect::Policy::limited(5))
                .danger_accept_invalid_certs(true)
                .build()
                .map_err(|e| FetchError::Launch(format!("http client: {e}")))?;
            Some(client)
        } else {
            None
        };

        Ok(Self {
            config,
            driver,
            normalizer,
            filter,
            http,
        })
    }

    /// Fetch every URL in `urls` concurrently.
    ///
    /// Returns exactly one outcome per input URL, in input order,
    /// however many of them failed. Individual failures never abort the
    /// batch; only an empty input list or a pool that could not come up
    /// at all produce an `Err`.
    pub async fn fetch_all(&self, urls: &[String]) -> Result<Vec<FetchOutcome>> {
        if urls.is_empty() {
            return Err(FetchError::InvalidInput("empty URL list".into()));
        }

        let concurrency = self.config.max_concurrency.min(urls.len());
        log::info!(
            "starting batch: {} URLs across {} sessions",
            urls.len(),
            concurrency
        );

        let download_dir = match &self.config.download_dir {
            Some(dir) => {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| FetchError::io(dir, e))?;
                dir.clone()
            }
            None => std::env::temp_dir(),
        };

        let mut pool = SessionPool::new(
            Arc::clone(&self.driver),
            self.config.session_config(download_dir),
            Arc::clone(&self.filter),
        );
        let slots = pool.acquire(concurrency).await?;

        let limiter = Arc::new(Semaphore::new(self.config.max_concurrency));
        let active = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            let worker = FetchWorker {
                id: i,
                url: url.clone(),
                slot: Arc::clone(&slots[i % slots.len()]),
                limiter: Arc::clone(&limiter),
                active: Arc::clone(&active),
                normalizer: Arc::clone(&self.normalizer),
                http: self.http.clone(),
                navigation_timeout: Duration::from_secs(self.config.navigation_timeout_secs),
                download_timeout: Duration::from_secs(self.config.download_timeout_secs),
            };
            handles.push(tokio::spawn(worker.run()));
        }

        // Aggregate. A worker never errors past its own boundary, but a
        // task can still die; fold that into the URL's outcome so the
        // one-outcome-per-URL invariant survives.
        let mut outcomes = Vec::with_capacity(urls.len());
        for (handle, url) in handles.into_iter().zip(urls) {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    log::error!("worker task for {url} died: {e}");
                    outcomes.push(FetchOutcome::failed(url, format!("worker task failed: {e}")));
                }
            }
        }

        pool.release().await;

        let succeeded = outcomes.iter().filter(|o| o.has_content()).count();
        log::info!(
            "batch complete: {} of {} URLs produced content",
            succeeded,
            outcomes.len()
        );

        Ok(outcomes)
    }
}

/// Resolves one URL to a `FetchOutcome`.
///
/// State per URL flows `Pending → Navigating → {Loaded | Downloading} →
/// Extracting → {Done | Failed}`, driven entirely by this worker's own
/// control flow. The limiter permit and the session slot are both held
/// until extraction has finished.
struct FetchWorker {
    id: usize,
    url: String,
    slot: SessionSlot,
    limiter: Arc<Semaphore>,
    active: Arc<AtomicUsize>,
    normalizer: Arc<Normalizer>,
    http: Option<reqwest::Client>,
    navigation_timeout: Duration,
    download_timeout: Duration,
}

impl FetchWorker {
    async fn run(self) -> FetchOutcome {
        let permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return FetchOutcome::failed(&self.url, "concurrency limiter closed"),
        };

        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!("Worker {} fetching {} ({} active)", self.id, self.url, running);

        let outcome = self.resolve().await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        drop(permit);

        match (&outcome.content, &outcome.error) {
            (_, Some(error)) => log::warn!("Worker {} failed {}: {}", self.id, self.url, error),
            (Some(_), None) => log::debug!("Worker {} done {}", self.id, self.url),
            (None, None) => log::debug!("Worker {} got no content from {}", self.id, self.url),
        }

        outcome
    }

    async fn resolve(&self) -> FetchOutcome {
        // Lightweight pass: plain HTTP with a short timeout. Anything
        // that is not a clean HTML page falls through to the browser.
        if let Some(client) = &self.http {
            match self.light_fetch(client).await {
                Ok(Some(content)) => {
                    log::debug!("Worker {} resolved {} via http", self.id, self.url);
                    return FetchOutcome::content(&self.url, content, FetchMethod::Navigation);
                }
                Ok(None) => {}
                Err(e) => {
                    log::debug!("Worker {} http pass failed for {}: {e}", self.id, self.url);
                }
            }
        }

        // Full navigation. The slot lock serializes workers that share a
        // session and is held until extraction completes, so the session
        // is never torn down or reused mid-extraction.
        let mut session = self.slot.lock().await;

        let navigated = tokio::time::timeout(
            self.navigation_timeout,
            session.navigate(&self.url),
        )
        .await;

        match navigated {
            Err(_) => FetchOutcome::failed(
                &self.url,
                FetchError::NavigationTimeout(self.navigation_timeout.as_secs()),
            ),
            Ok(Err(e)) => FetchOutcome::failed(&self.url, e),
            Ok(Ok(NavigationOutcome::Loaded { html })) => {
                match self.normalizer.html_to_text(&html) {
                    Ok(text) if text.is_empty() => {
                        FetchOutcome::empty(&self.url, FetchMethod::Navigation)
                    }
                    Ok(text) => FetchOutcome::content(&self.url, text, FetchMethod::Navigation),
                    Err(e) => FetchOutcome::failed(&self.url, e),
                }
            }
            Ok(Ok(NavigationOutcome::Download(handle))) => {
                let saved = tokio::time::timeout(self.download_timeout, handle.wait()).await;
                match saved {
                    Err(_) => FetchOutcome::failed(
                        &self.url,
                        FetchError::Download(format!(
                            "download did not complete within {} seconds",
                            self.download_timeout.as_secs()
                        )),
                    ),
                    Ok(Err(e)) => FetchOutcome::failed(&self.url, e),
                    Ok(Ok(path)) => match self.normalizer.file_to_text(&path).await {
                        Ok(text) if text.is_empty() => {
                            FetchOutcome::empty(&self.url, FetchMethod::Download)
                        }
                        Ok(text) => FetchOutcome::content(&self.url, text, FetchMethod::Download),
                        Err(e) => FetchOutcome::failed(&self.url, e),
                    },
                }
            }
        }
    }

    /// One plain GET; `Ok(Some)` only for a successful `text/html`
    /// response whose normalized text is non-empty.
    async fn light_fetch(&self, client: &reqwest::Client) -> Result<Option<String>> {
        let response = client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase().contains("text/html"))
            .unwrap_or(false);
        if !is_html {
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;

        let text = self.normalizer.html_to_text(&body)?;
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}
