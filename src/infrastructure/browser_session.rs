//! Browser session management.
//!
//! Owns one headless-browser session at a time: launch, navigate with a
//! render-idle wait, hand the rendered DOM to the parsers, teardown. The
//! target pages hydrate their content asynchronously, so "navigation
//! complete" is not enough — `visit` always waits the configured idle
//! period on top of navigation.
//!
//! No business logic lives here; scrapers decide what to extract.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::domain::error::SessionError;
use crate::infrastructure::config::BrowserConfig as BrowserSettings;

/// Launch settings for one session.
#[derive(Debug, Clone)]
pub struct BrowserSessionConfig {
    pub timeout: Duration,
    pub idle_wait: Duration,
    pub window: (u32, u32),
}

impl Default for BrowserSessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            idle_wait: Duration::from_millis(1000),
            window: (1440, 900),
        }
    }
}

impl From<&BrowserSettings> for BrowserSessionConfig {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_seconds),
            idle_wait: Duration::from_millis(settings.idle_wait_ms),
            window: (settings.window_width, settings.window_height),
        }
    }
}

/// One live browser-automation session. Not shared across workers; each
/// worker launches its own and tears it down on completion.
pub struct BrowserSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
    config: BrowserSessionConfig,
}

impl BrowserSession {
    /// Launch a headless browser and open a blank page.
    pub async fn launch(config: &BrowserSessionConfig) -> Result<Self, SessionError> {
        let browser_config = BrowserConfig::builder()
            .window_size(config.window.0, config.window.1)
            .request_timeout(config.timeout)
            .args(vec!["--no-sandbox"])
            .build()
            .map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // The handler stream must be polled for the session to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {e}");
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        Ok(Self {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
            config: config.clone(),
        })
    }

    fn page(&self) -> Result<&Page, SessionError> {
        self.page.as_ref().ok_or(SessionError::Closed)
    }

    /// Navigate and block until the render-idle condition is satisfied.
    pub async fn visit(&self, url: &str) -> Result<(), SessionError> {
        let page = self.page()?;

        let navigation = async {
            page.goto(url).await.map_err(|e| map_cdp(url, e))?;
            // A timeout here means the main document landed but its
            // subresource connections never settled.
            page.wait_for_navigation().await.map_err(|e| match e {
                CdpError::Timeout => SessionError::PendingConnections {
                    url: url.to_string(),
                },
                other => SessionError::Cdp(other.to_string()),
            })?;
            Ok::<_, SessionError>(())
        };
        tokio::time::timeout(self.config.timeout, navigation)
            .await
            .map_err(|_| SessionError::Timeout { url: url.to_string() })??;

        // Hydration happens after navigation; give the page its idle window.
        tokio::time::sleep(self.config.idle_wait).await;
        Ok(())
    }

    /// Rendered DOM of the current page.
    pub async fn html(&self) -> Result<String, SessionError> {
        let page = self.page()?;
        page.content()
            .await
            .map_err(|e| SessionError::Cdp(e.to_string()))
    }

    /// URL the session currently points at (after any redirects).
    pub async fn current_url(&self) -> Result<String, SessionError> {
        let page = self.page()?;
        page.url()
            .await
            .map_err(|e| SessionError::Cdp(e.to_string()))?
            .ok_or(SessionError::Closed)
    }

    /// Tear the session down. Idempotent and safe on an already-dead
    /// session; teardown failures are logged, never raised.
    pub async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!("failed to close page: {e}");
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("failed to close browser: {e}");
            }
            let _ = browser.wait().await;
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Close is async; Drop only reaps what close() may have missed.
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}

fn map_cdp(url: &str, err: CdpError) -> SessionError {
    match err {
        CdpError::Timeout => SessionError::Timeout {
            url: url.to_string(),
        },
        other => SessionError::Cdp(other.to_string()),
    }
}
