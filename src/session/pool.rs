use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::SessionConfig;
use crate::error::{FetchError, Result};
use crate::filter::RequestFilter;
use crate::session::driver::{BrowserDriver, BrowserSession};

/// A pooled session, checked out to one worker at a time via its lock.
pub type SessionSlot = Arc<Mutex<Box<dyn BrowserSession>>>;

/// Provisions and releases a bounded set of isolated browsing sessions.
///
/// Sessions live for exactly one batch: `acquire` at batch start,
/// `release` on every exit path at batch end.
pub struct SessionPool {
    driver: Arc<dyn BrowserDriver>,
    session_config: SessionConfig,
    filter: Arc<RequestFilter>,
    slots: Vec<SessionSlot>,
}

impl SessionPool {
    pub fn new(
        driver: Arc<dyn BrowserDriver>,
        session_config: SessionConfig,
        filter: Arc<RequestFilter>,
    ) -> Self {
        Self {
            driver,
            session_config,
            filter,
            slots: Vec::new(),
        }
    }

    /// Launch up to `n` sessions, in parallel.
    ///
    /// Individual launch failures do not abort sessions that did come up:
    /// the pool proceeds with the reduced set and logs each failure. Only
    /// when every launch fails does `acquire` error.
    pub async fn acquire(&mut self, n: usize) -> Result<Vec<SessionSlot>> {
        let launches = (0..n).map(|_| self.driver.launch(&self.session_config, Arc::clone(&self.filter)));
        let results = futures::future::join_all(launches).await;

        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(session) => self.slots.push(Arc::new(Mutex::new(session))),
                Err(e) => errors.push(e),
            }
        }

        for error in &errors {
            log::warn!("session launch failed: {error}");
        }

        if self.slots.is_empty() {
            let detail = errors
                .first()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no sessions requested".into());
            return Err(FetchError::Launch(format!(
                "all {n} session launches failed: {detail}"
            )));
        }

        if !errors.is_empty() {
            log::warn!(
                "continuing with reduced pool: {} of {n} sessions available",
                self.slots.len()
            );
        }

        Ok(self.slots.clone())
    }

    /// Close every live session and its browser process.
    ///
    /// Locks each slot first, so a session is never torn down while a
    /// worker still holds it. Idempotent: a second call is a no-op.
    pub async fn release(&mut self) {
        for slot in self.slots.drain(..) {
            let mut session = slot.lock().await;
            if let Err(e) = session.close().await {
                log::warn!("failed to close session: {e}");
            }
        }
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
