//! Browsing sessions: the driver seam, the chromiumoxide production
//! driver, and the per-batch session pool.

pub mod cdp;
pub mod driver;
pub mod pool;

#[cfg(test)]
pub(crate) mod mock;

pub use cdp::CdpDriver;
pub use driver::{BrowserDriver, BrowserSession, DownloadHandle, NavigationOutcome};
pub use pool::{SessionPool, SessionSlot};
