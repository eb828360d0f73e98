use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    DownloadProgressState, EventDownloadProgress, EventDownloadWillBegin,
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    ErrorReason, Headers, ResourceType, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::Page;
use futures::{Stream, StreamExt};
use tokio::task::JoinHandle;

use crate::config::SessionConfig;
use crate::error::{FetchError, Result};
use crate::filter::RequestFilter;
use crate::session::driver::{BrowserDriver, BrowserSession, DownloadHandle, NavigationOutcome};

/// Production driver backed by a Chromium instance per session.
pub struct CdpDriver;

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn launch(
        &self,
        config: &SessionConfig,
        filter: Arc<RequestFilter>,
    ) -> Result<Box<dyn BrowserSession>> {
        let session = CdpSession::launch(config, filter).await?;
        Ok(Box::new(session))
    }
}

/// One Chromium process with a single page, driven over CDP.
pub struct CdpSession {
    browser: Browser,
    page: Page,
    download_dir: PathBuf,
    handler_task: JoinHandle<()>,
    intercept_task: JoinHandle<()>,
}

impl CdpSession {
    async fn launch(config: &SessionConfig, filter: Arc<RequestFilter>) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .window_size(config.viewport_width, config.viewport_height)
            .no_sandbox()
            .arg("--ignore-certificate-errors")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking");

        if let Some(path) = &config.browser_path {
            builder = builder.chrome_executable(path);
        }

        let browser_config = builder
            .build()
            .map_err(FetchError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        // The handler pumps CDP messages for the life of the browser.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        page.execute(SetUserAgentOverrideParams::new(config.user_agent.clone()))
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        if !config.extra_headers.is_empty() {
            let headers = Headers::new(serde_json::json!(config.extra_headers));
            page.execute(SetExtraHttpHeadersParams::new(headers))
                .await
                .map_err(|e| FetchError::Launch(e.to_string()))?;
        }

        // Name downloads by their guid so the saved path is predictable,
        // and have progress reported as events.
        let behavior = SetDownloadBehaviorParams::builder()
            .behavior(SetDownloadBehaviorBehavior::AllowAndName)
            .download_path(config.download_dir.to_string_lossy())
            .events_enabled(true)
            .build()
            .map_err(FetchError::Launch)?;
        page.execute(behavior)
            .await
            .map_err(|e| FetchError::Launch(e.to_string()))?;

        let intercept_task = install_request_filter(&page, filter).await?;

        Ok(Self {
            browser,
            page,
            download_dir: config.download_dir.clone(),
            handler_task,
            intercept_task,
        })
    }
}

#[async_trait]
impl BrowserSession for CdpSession {
    async fn navigate(&mut self, url: &str) -> Result<NavigationOutcome> {
        // Subscribe before navigating so no download signal can be missed.
        let progress = self
            .page
            .event_listener::<EventDownloadProgress>()
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;
        let mut will_begin = self
            .page
            .event_listener::<EventDownloadWillBegin>()
            .await
            .map_err(|e| FetchError::Navigation(e.to_string()))?;

        let goto = self.page.goto(url.to_string());
        tokio::pin!(goto);

        tokio::select! {
            event = will_begin.next() => {
                match event {
                    Some(event) => Ok(NavigationOutcome::Download(download_handle(
                        self.download_dir.clone(),
                        event.guid.clone(),
                        event.suggested_filename.clone(),
                        progress,
                    ))),
                    None => Err(FetchError::Navigation(
                        "session event stream closed during navigation".into(),
                    )),
                }
            }
            result = &mut goto => {
                match result {
                    Ok(_) => {
                        self.page
                            .wait_for_navigation()
                            .await
                            .map_err(|e| FetchError::Navigation(e.to_string()))?;
                        let html = self
                            .page
                            .content()
                            .await
                            .map_err(|e| FetchError::Extraction(e.to_string()))?;
                        Ok(NavigationOutcome::Loaded { html })
                    }
                    Err(e) => {
                        // Chromium aborts the navigation itself when the
                        // target turns out to be a download; give the
                        // download signal a short grace window before
                        // treating this as a failure.
                        match tokio::time::timeout(
                            Duration::from_millis(750),
                            will_begin.next(),
                        )
                        .await
                        {
                            Ok(Some(event)) => Ok(NavigationOutcome::Download(download_handle(
                                self.download_dir.clone(),
                                event.guid.clone(),
                                event.suggested_filename.clone(),
                                progress,
                            ))),
                            _ => Err(FetchError::Navigation(e.to_string())),
                        }
                    }
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.intercept_task.abort();
        if let Err(e) = self.browser.close().await {
            log::warn!("failed to close browser cleanly: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        Ok(())
    }
}

/// Enable the fetch domain and answer every paused request with the
/// filter's verdict. Top-level document requests always pass.
async fn install_request_filter(
    page: &Page,
    filter: Arc<RequestFilter>,
) -> Result<JoinHandle<()>> {
    let mut paused = page
        .event_listener::<EventRequestPaused>()
        .await
        .map_err(|e| FetchError::Launch(e.to_string()))?;

    page.execute(FetchEnableParams::default())
        .await
        .map_err(|e| FetchError::Launch(e.to_string()))?;

    let page = page.clone();
    let task = tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let url = event.request.url.clone();
            let is_document = matches!(&event.resource_type, ResourceType::Document);

            let command = if !is_document && filter.decide(&url).is_abort() {
                log::trace!("aborted sub-resource: {url}");
                page.execute(FailRequestParams::new(
                    event.request_id.clone(),
                    ErrorReason::Aborted,
                ))
                .await
                .map(|_| ())
            } else {
                page.execute(ContinueRequestParams::new(event.request_id.clone()))
                    .await
                    .map(|_| ())
            };

            if let Err(e) = command {
                log::debug!("interception reply failed for {url}: {e}");
            }
        }
    });

    Ok(task)
}

/// Resolve to the saved file once the browser reports the download
/// complete and the file is readable.
///
/// The browser names the file after its guid; it is renamed to the
/// suggested filename so the extension survives for format dispatch.
fn download_handle(
    dir: PathBuf,
    guid: String,
    suggested_filename: String,
    mut progress: impl Stream<Item = Arc<EventDownloadProgress>> + Send + Unpin + 'static,
) -> DownloadHandle {
    DownloadHandle::new(async move {
        while let Some(event) = progress.next().await {
            if event.guid != guid {
                continue;
            }
            match &event.state {
                DownloadProgressState::Completed => {
                    let saved = dir.join(&guid);
                    let named = dir.join(format!(
                        "{guid}-{}",
                        crate::utils::sanitize_filename(&suggested_filename)
                    ));
                    tokio::fs::rename(&saved, &named)
                        .await
                        .map_err(|e| FetchError::io(&saved, e))?;
                    tokio::fs::metadata(&named)
                        .await
                        .map_err(|e| FetchError::io(&named, e))?;
                    return Ok(named);
                }
                DownloadProgressState::Canceled => {
                    return Err(FetchError::Download("download canceled".into()));
                }
                DownloadProgressState::InProgress => {}
            }
        }
        Err(FetchError::Download(
            "session closed before download completed".into(),
        ))
    })
}
