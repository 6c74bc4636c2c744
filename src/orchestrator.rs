//! The adaptive fetch cascade.
//!
//! [`Fetcher`] walks the strategies in cost order: feed discovery
//! first, then the reader proxy, then direct HTTP, and finally a real
//! headless browser. Each tier's output is gated by the suitability
//! checker before it is accepted; an unsuitable result escalates to the
//! next tier rather than being handed to the caller. Escalation is
//! monotonic, never returning to a cheaper tier, and callers can pin or
//! forbid the browser tier per fetch.
//!
//! The public entry point deliberately returns `Option<String>`: a
//! source that cannot be fetched is an expected, fully logged outcome,
//! not an error the caller is asked to handle.

use tracing::{info, instrument, warn};

use crate::config::FetchConfig;
use crate::domains;
use crate::error::FetchError;
use crate::feeds;
use crate::models::{FetchMethod, FetchRequest, FetchResult};
use crate::session::BrowserSession;
use crate::strategies::browser::BrowserStrategy;
use crate::strategies::direct_http::DirectHttpStrategy;
use crate::strategies::reader_proxy::ReaderProxyStrategy;
use crate::strategies::FetchStrategy;
use crate::suitability;

/// Per-fetch knobs controlling which tiers the cascade may use.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// `Some(true)` jumps straight to the browser tier; `Some(false)`
    /// forbids it entirely; `None` lets the cascade decide.
    pub force_browser: Option<bool>,
    /// Whether the reader-proxy tier may be used at all.
    pub allow_reader_proxy: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            force_browser: None,
            allow_reader_proxy: true,
        }
    }
}

/// Orchestrates the fetch cascade over a shared HTTP client.
#[derive(Debug)]
pub struct Fetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Build a fetcher with its own cookie-carrying HTTP client.
    ///
    /// # Arguments
    ///
    /// * `config` - Timeouts, thresholds, and tier settings
    ///
    /// # Returns
    ///
    /// A ready fetcher, or an error if the HTTP client cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch article text for a URL, escalating tiers as needed.
    ///
    /// # Arguments
    ///
    /// * `url` - The article or source URL to fetch
    /// * `options` - Per-fetch tier controls
    /// * `session` - An existing browser session to share; when `None`,
    ///   a scoped session is launched for the browser tier and torn
    ///   down before returning
    ///
    /// # Returns
    ///
    /// Suitable article text, or `None` when every permitted tier was
    /// exhausted.
    #[instrument(level = "info", skip_all, fields(url = %url))]
    pub async fn fetch_content(
        &self,
        url: &str,
        options: FetchOptions,
        session: Option<&BrowserSession>,
    ) -> Option<String> {
        let request = match FetchRequest::parse(url) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Refusing to fetch unparseable URL");
                return None;
            }
        };

        // A domain's force_browser flag only short-circuits the cheap
        // tiers when the browser is actually available to fall to.
        let browser_required = options.force_browser == Some(true)
            || (domains::requires_browser(&request.domain) && options.force_browser != Some(false));

        if !browser_required {
            // Tier 1: feed discovery. Feed output is structured digest
            // text rather than a scraped page, but it goes through the
            // same suitability gate as everything else.
            if let Some(article) = feeds::discover_feed(&self.client, &request, &self.config).await
            {
                let result = FetchResult::success(FetchMethod::Feed, article.text);
                if let Some(text) = self.accept(result, &request) {
                    return Some(text);
                }
            }

            // Tier 2: reader proxy.
            if options.allow_reader_proxy {
                let strategy = ReaderProxyStrategy::new(&self.client, &self.config);
                if let Some(text) = self.run_tier(&strategy, &request).await {
                    return Some(text);
                }
            }

            // Tier 3: direct HTTP.
            let strategy = DirectHttpStrategy::new(&self.client, &self.config);
            if let Some(text) = self.run_tier(&strategy, &request).await {
                return Some(text);
            }
        }

        // Tier 4: headless browser.
        if options.force_browser == Some(false) {
            info!("Cascade exhausted; browser tier forbidden for this fetch");
            return None;
        }
        match session {
            Some(shared) => self.browser_tier(shared, &request).await,
            None => {
                let owned = match BrowserSession::launch(&self.config).await {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(error = %e, "Browser session launch failed; cascade exhausted");
                        return None;
                    }
                };
                let text = self.browser_tier(&owned, &request).await;
                owned.close().await;
                text
            }
        }
    }

    /// Run one scraping tier and gate its result.
    async fn run_tier<S: FetchStrategy>(
        &self,
        strategy: &S,
        request: &FetchRequest,
    ) -> Option<String> {
        let result = match strategy.attempt(request).await {
            Ok(article) => FetchResult::success(strategy.method(), article.text),
            Err(e) => FetchResult::failure(strategy.method(), e),
        };
        self.accept(result, request)
    }

    /// The browser tier is last resort: its output is returned even
    /// when the suitability checker objects, as long as it is nonempty,
    /// because there is nothing further to escalate to.
    async fn browser_tier(&self, session: &BrowserSession, request: &FetchRequest) -> Option<String> {
        let strategy = BrowserStrategy::new(session, &self.config);
        let result = match strategy.attempt(request).await {
            Ok(article) => FetchResult::success(FetchMethod::Browser, article.text),
            Err(e) => FetchResult::failure(FetchMethod::Browser, e),
        };
        match result.outcome {
            Ok(text) => {
                let verdict =
                    suitability::is_suitable(&text, &request.url, &self.config.suitability);
                if !verdict.suitable {
                    warn!(
                        method = result.method.as_str(),
                        reasons = ?verdict.reasons,
                        "Browser output flagged unsuitable; returning best effort"
                    );
                }
                Some(text)
            }
            Err(e) => {
                log_tier_failure(result.method, &e);
                None
            }
        }
    }

    /// Gate one tier's result: suitable content passes, everything else
    /// is logged and escalates.
    fn accept(&self, result: FetchResult, request: &FetchRequest) -> Option<String> {
        match result.outcome {
            Ok(text) => {
                let verdict =
                    suitability::is_suitable(&text, &request.url, &self.config.suitability);
                if verdict.suitable {
                    info!(
                        method = result.method.as_str(),
                        chars = text.len(),
                        "Fetch accepted"
                    );
                    Some(text)
                } else {
                    info!(
                        method = result.method.as_str(),
                        reasons = ?verdict.reasons,
                        "Fetch result unsuitable; escalating"
                    );
                    None
                }
            }
            Err(e) => {
                log_tier_failure(result.method, &e);
                None
            }
        }
    }
}

fn log_tier_failure(method: FetchMethod, error: &FetchError) {
    info!(
        method = method.as_str(),
        error = %error,
        definitive = error.is_definitive(),
        "Tier failed; escalating"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suitable_text() -> String {
        (0..5)
            .map(|i| {
                format!(
                    "Paragraph {i} of the story describes the events of the day in careful and \
                     complete detail for readers."
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_accept_passes_suitable_results() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let request = FetchRequest::parse("https://example.com/story").unwrap();
        let result = FetchResult::success(FetchMethod::ReaderProxy, suitable_text());
        assert_eq!(fetcher.accept(result, &request), Some(suitable_text()));
    }

    #[test]
    fn test_accept_escalates_unsuitable_results() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let request = FetchRequest::parse("https://example.com/story").unwrap();
        let stub = FetchResult::success(FetchMethod::DirectHttp, "404 not found".into());
        assert_eq!(fetcher.accept(stub, &request), None);
    }

    #[test]
    fn test_accept_escalates_tier_failures() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let request = FetchRequest::parse("https://example.com/story").unwrap();
        let failed = FetchResult::failure(FetchMethod::ReaderProxy, FetchError::Status(503));
        assert_eq!(fetcher.accept(failed, &request), None);
    }

    #[test]
    fn test_default_options() {
        let options = FetchOptions::default();
        assert_eq!(options.force_browser, None);
        assert!(options.allow_reader_proxy);
    }

    #[test]
    fn test_fetcher_builds() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        assert_eq!(fetcher.config().http_max_retries, 2);
    }

    #[tokio::test]
    async fn test_unparseable_url_short_circuits() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let text = fetcher
            .fetch_content("not a url", FetchOptions::default(), None)
            .await;
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn test_ftp_scheme_refused() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let text = fetcher
            .fetch_content("ftp://example.com/file", FetchOptions::default(), None)
            .await;
        assert_eq!(text, None);
    }
}
