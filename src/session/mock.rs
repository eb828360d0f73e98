//! Scripted driver used by the pipeline tests. Maps URLs to canned
//! navigation outcomes and counts launches, closes and in-flight
//! navigations so tests can assert pool and concurrency behaviour.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::SessionConfig;
use crate::error::{FetchError, Result};
use crate::filter::RequestFilter;
use crate::session::driver::{BrowserDriver, BrowserSession, DownloadHandle, NavigationOutcome};

/// Canned outcome for one URL.
#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Page(String),
    Download(PathBuf),
    Fail(String),
}

impl Scripted {
    pub(crate) fn page(html: &str) -> Self {
        Scripted::Page(html.to_string())
    }

    pub(crate) fn download(path: impl Into<PathBuf>) -> Self {
        Scripted::Download(path.into())
    }

    pub(crate) fn fail(message: &str) -> Self {
        Scripted::Fail(message.to_string())
    }
}

/// Shared observation counters for one driver.
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters {
    pub launched: Arc<AtomicUsize>,
    pub closed: Arc<AtomicUsize>,
    pub live: Arc<AtomicUsize>,
    /// Navigations currently in flight.
    pub active: Arc<AtomicUsize>,
    /// High-water mark of `active`.
    pub peak: Arc<AtomicUsize>,
}

pub(crate) struct MockDriver {
    scripts: Arc<HashMap<String, Scripted>>,
    counters: Counters,
    latency: Duration,
    launch_failures: AtomicUsize,
}

impl MockDriver {
    pub(crate) fn new() -> Self {
        Self {
            scripts: Arc::new(HashMap::new()),
            counters: Counters::default(),
            latency: Duration::from_millis(10),
            launch_failures: AtomicUsize::new(0),
        }
    }

    /// Script the outcome of navigating to `url`.
    pub(crate) fn script(mut self, url: &str, outcome: Scripted) -> Self {
        Arc::get_mut(&mut self.scripts)
            .expect("script before sharing the driver")
            .insert(url.to_string(), outcome);
        self
    }

    /// Make the first `n` launches fail.
    pub(crate) fn fail_first_launches(self, n: usize) -> Self {
        self.launch_failures.store(n, Ordering::SeqCst);
        self
    }

    /// Artificial per-navigation latency.
    pub(crate) fn latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub(crate) fn counters(&self) -> Counters {
        self.counters.clone()
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    async fn launch(
        &self,
        _config: &SessionConfig,
        _filter: Arc<RequestFilter>,
    ) -> Result<Box<dyn BrowserSession>> {
        if self
            .launch_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(FetchError::Launch("scripted launch failure".into()));
        }

        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            scripts: Arc::clone(&self.scripts),
            counters: self.counters.clone(),
            latency: self.latency,
        }))
    }
}

struct MockSession {
    scripts: Arc<HashMap<String, Scripted>>,
    counters: Counters,
    latency: Duration,
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<NavigationOutcome> {
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(active, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;

        let result = match self.scripts.get(url) {
            Some(Scripted::Page(html)) => Ok(NavigationOutcome::Loaded { html: html.clone() }),
            Some(Scripted::Download(path)) => {
                Ok(NavigationOutcome::Download(DownloadHandle::ready(path.clone())))
            }
            Some(Scripted::Fail(message)) => Err(FetchError::Navigation(message.clone())),
            None => Err(FetchError::Navigation(format!("no route to {url}"))),
        };

        self.counters.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn close(&mut self) -> Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
