//! Scoped headless-browser session management.
//!
//! A [`BrowserSession`] owns one Chromium process and the event-handler
//! task that keeps its CDP connection alive. Sessions are scoped: the
//! caller launches one, shares it across however many fetches it wants,
//! and closes it, which tears down exactly that process and nothing
//! else. Nothing here ever touches browser processes it did not spawn.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Chromium launch arguments that reduce automation fingerprinting and
/// keep the process well-behaved in containers.
const LAUNCH_ARGS: &[&str] = &[
    "--disable-blink-features=AutomationControlled",
    "--disable-infobars",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-sandbox",
    "--disable-extensions",
    "--disable-popup-blocking",
    "--disable-background-networking",
    "--disable-sync",
    "--disable-translate",
    "--metrics-recording-only",
    "--no-first-run",
];

/// An owned headless Chromium instance plus its CDP event pump.
///
/// Dropping a session without calling [`close`](Self::close) aborts the
/// event pump, which drops the CDP connection and lets Chromium exit;
/// calling `close` shuts the browser down cleanly and waits for it.
#[derive(Debug)]
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch a fresh headless Chromium for this session.
    #[instrument(level = "info", skip_all)]
    pub async fn launch(config: &FetchConfig) -> Result<Self, FetchError> {
        let browser_config = BrowserConfig::builder()
            .args(LAUNCH_ARGS.to_vec())
            .arg(format!("--lang={}", config.browser_locale))
            .window_size(1920, 1080)
            .build()
            .map_err(FetchError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;

        // The handler stream must be polled for the CDP connection to
        // make progress at all.
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

        info!("Browser session launched");
        Ok(Self {
            browser,
            handler_task,
        })
    }

    /// Open a blank page in this session.
    pub async fn new_page(&self) -> Result<Page, FetchError> {
        self.browser
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }

    /// Shut the browser down cleanly and wait for the process to exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser close request failed");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Waiting for browser exit failed");
        }
        self.handler_task.abort();
        debug!("Browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        // Fallback for sessions abandoned without close(): killing the
        // event pump severs the CDP connection and Chromium exits.
        self.handler_task.abort();
    }
}
