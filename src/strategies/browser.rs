//! Headless-browser strategy: the most expensive tier of the cascade.
//!
//! Drives a real Chromium page through a [`BrowserSession`]: masks the
//! obvious automation tells before navigation, dismisses known consent
//! overlays for the domain, scrolls to trigger lazy-loaded content, and
//! hands the rendered DOM to the extractor. This tier only runs after
//! the cheaper tiers have failed (or for domains known to need it), so
//! it is deliberately thorough rather than fast.

use std::time::{Duration, Instant};

use chromiumoxide::cdp::browser_protocol::emulation::SetTimezoneOverrideParams;
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use crate::config::FetchConfig;
use crate::domains;
use crate::error::FetchError;
use crate::extract;
use crate::models::{ExtractedArticle, FetchMethod, FetchRequest};
use crate::session::BrowserSession;
use crate::strategies::FetchStrategy;

/// Number of incremental scroll steps used to trigger lazy loading.
const SCROLL_STEPS: u32 = 3;

/// Script injected before any page script runs, hiding the automation
/// fingerprints that anti-bot checks probe first.
const STEALTH_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = { runtime: {} };
"#;

/// Fetches article pages by rendering them in headless Chromium.
#[derive(Debug)]
pub struct BrowserStrategy<'a> {
    session: &'a BrowserSession,
    config: &'a FetchConfig,
}

impl<'a> BrowserStrategy<'a> {
    pub fn new(session: &'a BrowserSession, config: &'a FetchConfig) -> Self {
        Self { session, config }
    }

    /// Apply identity overrides and the stealth script to a fresh page.
    async fn prepare_page(&self, page: &Page) -> Result<(), FetchError> {
        let identity = SetUserAgentOverrideParams::builder()
            .user_agent(self.config.browser_user_agent.clone())
            .accept_language(self.config.browser_locale.clone())
            .build()
            .map_err(FetchError::Browser)?;
        page.set_user_agent(identity)
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        page.execute(SetTimezoneOverrideParams::new(
            self.config.browser_timezone.clone(),
        ))
        .await
        .map_err(|e| FetchError::Browser(e.to_string()))?;
        page.execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS))
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))?;
        Ok(())
    }

    /// Click any of the domain's known consent/dismiss buttons.
    ///
    /// Best effort only: overlays vary by visitor and by day, and a
    /// missing button must never fail the fetch.
    async fn dismiss_overlays(&self, page: &Page, request: &FetchRequest) {
        let Some(rules) = domains::rules_for(&request.domain) else {
            return;
        };
        for label in rules.dismiss_buttons {
            let script = format!(
                r#"(() => {{
                    const label = {label:?}.toLowerCase();
                    const candidates = document.querySelectorAll('button, [role="button"], a');
                    for (const el of candidates) {{
                        if ((el.textContent || '').trim().toLowerCase() === label) {{
                            el.click();
                            return true;
                        }}
                    }}
                    return false;
                }})()"#
            );
            match page.evaluate(script).await {
                Ok(result) => {
                    if result.value().and_then(|v| v.as_bool()).unwrap_or(false) {
                        debug!(button = label, "Dismissed overlay button");
                        sleep(Duration::from_millis(500)).await;
                    }
                }
                Err(e) => debug!(button = label, error = %e, "Overlay dismissal script failed"),
            }
        }
    }

    /// Scroll the page in steps so lazy-loaded article bodies render.
    async fn scroll_through(&self, page: &Page) {
        for step in 1..=SCROLL_STEPS {
            let script = format!(
                "window.scrollTo(0, document.body.scrollHeight * {step} / {SCROLL_STEPS})"
            );
            if let Err(e) = page.evaluate(script).await {
                debug!(step, error = %e, "Scroll step failed");
                return;
            }
            sleep(self.config.browser_scroll_pause).await;
        }
    }

    /// Navigate, render, and pull the DOM for one request.
    async fn render(&self, page: &Page, request: &FetchRequest) -> Result<String, FetchError> {
        self.prepare_page(page).await?;

        let nav = async {
            page.goto(&request.url)
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| FetchError::Browser(e.to_string()))?;
            Ok::<(), FetchError>(())
        };
        timeout(self.config.browser_nav_timeout, nav)
            .await
            .map_err(|_| FetchError::Timeout(self.config.browser_nav_timeout))??;

        self.dismiss_overlays(page, request).await;
        self.scroll_through(page).await;

        page.content()
            .await
            .map_err(|e| FetchError::Browser(e.to_string()))
    }
}

impl FetchStrategy for BrowserStrategy<'_> {
    fn method(&self) -> FetchMethod {
        FetchMethod::Browser
    }

    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    async fn attempt(&self, request: &FetchRequest) -> Result<ExtractedArticle, FetchError> {
        let t0 = Instant::now();
        let page = self.session.new_page().await?;

        let rendered = self.render(&page, request).await;

        // The page is closed on every path so a failed navigation
        // cannot leak tabs into a long-lived session.
        if let Err(e) = page.close().await {
            warn!(error = %e, "Failed to close browser page");
        }

        let html = rendered?;
        let article = extract::extract(&html, &request.url, self.config);
        if article.text.is_empty() {
            return Err(FetchError::Empty);
        }
        info!(
            chars = article.text.len(),
            truncated = article.truncated,
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Browser fetch succeeded"
        );
        Ok(article)
    }
}
