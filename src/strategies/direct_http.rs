//! Direct HTTP strategy: fetch the page like a real browser would.
//!
//! This tier sends a plain GET with a rotated modern user agent, a full
//! set of browser-like headers, a Google-search referer, and a warmed
//! cookie session, then runs the response through the HTML extractor.
//! Hard blocks (403/429, captcha interstitials, suspiciously tiny
//! bodies) fail definitively so the orchestrator escalates to the
//! browser at once; transient failures are retried with exponential
//! backoff and jitter.

use std::time::{Duration, Instant};

use rand::{rng, Rng};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::extract;
use crate::models::{ExtractedArticle, FetchMethod, FetchRequest};
use crate::strategies::FetchStrategy;
use crate::util::truncate_for_log;

/// Pool of current desktop user agents, rotated per fetch.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:135.0) Gecko/20100101 Firefox/135.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.3 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36 Edg/132.0.0.0",
];

/// Lowercased body markers that mean an anti-bot wall, not an article.
const BLOCK_MARKERS: &[&str] = &[
    "captcha",
    "checking your browser",
    "just a moment",
    "cloudflare",
    "attention required",
    "access denied",
];

/// Bodies shorter than this are a block page or an error shell.
const MIN_BODY_LEN: usize = 100;

/// Fetches article pages over plain HTTP while impersonating a browser.
#[derive(Debug)]
pub struct DirectHttpStrategy<'a> {
    client: &'a reqwest::Client,
    config: &'a FetchConfig,
}

impl<'a> DirectHttpStrategy<'a> {
    /// The client is expected to carry a cookie store so the homepage
    /// warmup request actually seeds a session.
    pub fn new(client: &'a reqwest::Client, config: &'a FetchConfig) -> Self {
        Self { client, config }
    }

    /// Visit the site's homepage before the article to pick up session
    /// cookies, with a short random pause so the two requests don't
    /// arrive back to back.
    async fn warm_up(&self, request: &FetchRequest, headers: &HeaderMap) {
        let Ok(origin) = request.origin() else {
            return;
        };
        let t0 = Instant::now();
        match self
            .client
            .get(&origin)
            .headers(headers.clone())
            .timeout(self.config.http_timeout)
            .send()
            .await
        {
            Ok(r) => debug!(
                %origin,
                status = r.status().as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u128,
                "Homepage warmup done"
            ),
            Err(e) => debug!(%origin, error = %e, "Homepage warmup failed; continuing"),
        }
        let pause_ms: u64 = rng().random_range(1_000..=3_000);
        sleep(Duration::from_millis(pause_ms)).await;
    }

    /// One GET of the article URL, with block detection and extraction.
    async fn attempt_once(
        &self,
        request: &FetchRequest,
        headers: &HeaderMap,
    ) -> Result<ExtractedArticle, FetchError> {
        let response = self
            .client
            .get(&request.url)
            .headers(headers.clone())
            .timeout(self.config.http_timeout)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 403 || status.as_u16() == 429 {
            return Err(FetchError::Blocked(format!(
                "status {} from {}",
                status.as_u16(),
                request.domain
            )));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        if let Some(marker) = find_block_marker(&body) {
            debug!(
                marker,
                preview = %truncate_for_log(&body, 160),
                "Anti-bot marker in response body"
            );
            return Err(FetchError::Blocked(format!("body contains \"{marker}\"")));
        }
        if body.len() < MIN_BODY_LEN {
            return Err(FetchError::Blocked(format!(
                "body suspiciously short ({} bytes)",
                body.len()
            )));
        }

        let article = extract::extract(&body, &request.url, self.config);
        if article.text.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(article)
    }
}

impl FetchStrategy for DirectHttpStrategy<'_> {
    fn method(&self) -> FetchMethod {
        FetchMethod::DirectHttp
    }

    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    async fn attempt(&self, request: &FetchRequest) -> Result<ExtractedArticle, FetchError> {
        let headers = browser_headers(&request.domain);
        if self.config.http_homepage_warmup {
            self.warm_up(request, &headers).await;
        }

        let total_t0 = Instant::now();
        let mut attempt = 0usize;
        loop {
            let attempt_t0 = Instant::now();
            match self.attempt_once(request, &headers).await {
                Ok(article) => {
                    info!(
                        chars = article.text.len(),
                        truncated = article.truncated,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u128,
                        "Direct HTTP fetch succeeded"
                    );
                    return Ok(article);
                }
                Err(e) => {
                    attempt += 1;
                    // A definitive block will not change on retry; hand
                    // it back so the cascade escalates immediately.
                    if e.is_definitive() || attempt > self.config.http_max_retries {
                        warn!(
                            attempt,
                            max = self.config.http_max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u128,
                            error = %e,
                            "Direct HTTP fetch gave up"
                        );
                        return Err(e);
                    }

                    let delay = self
                        .config
                        .http_retry_base_delay
                        .saturating_mul(1 << (attempt - 1));
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);
                    warn!(
                        attempt,
                        max = self.config.http_max_retries,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u128,
                        ?delay,
                        error = %e,
                        "Direct HTTP attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Case-insensitive scan for anti-bot wall markers. Any hit is a
/// blocking signal, whatever else the body contains.
fn find_block_marker(body: &str) -> Option<&'static str> {
    let lowered = body.to_lowercase();
    BLOCK_MARKERS
        .iter()
        .copied()
        .find(|marker| lowered.contains(marker))
}

/// Build the full browser-impersonating header set for one fetch.
///
/// The user agent is drawn at random from [`USER_AGENTS`], and the
/// referer claims the visitor arrived from a Google search for the
/// site, which is how most real article traffic looks.
pub fn browser_headers(domain: &str) -> HeaderMap {
    let ua = USER_AGENTS[rng().random_range(0..USER_AGENTS.len())];
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(ua));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert("DNT", HeaderValue::from_static("1"));
    headers.insert("Upgrade-Insecure-Requests", HeaderValue::from_static("1"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("document"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("navigate"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("cross-site"));
    headers.insert("Sec-Fetch-User", HeaderValue::from_static("?1"));
    // Client-hint brands must match the agent; Edge carries its own
    // brand set, so only plain Chrome agents get these.
    if ua.contains("Chrome") && !ua.contains("Edg/") {
        headers.insert(
            "sec-ch-ua",
            HeaderValue::from_static(
                "\"Not(A:Brand\";v=\"99\", \"Google Chrome\";v=\"133\", \"Chromium\";v=\"133\"",
            ),
        );
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Windows\""));
    }
    let referer = format!(
        "https://www.google.com/search?q={}",
        urlencoding::encode(domain)
    );
    if let Ok(value) = HeaderValue::from_str(&referer) {
        headers.insert(REFERER, value);
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_headers_complete() {
        let headers = browser_headers("example.com");
        assert!(headers.contains_key(USER_AGENT));
        assert!(headers.contains_key(ACCEPT));
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
        assert!(headers.contains_key("Upgrade-Insecure-Requests"));
        assert!(headers.contains_key("Sec-Fetch-Mode"));

        let referer = headers.get(REFERER).unwrap().to_str().unwrap();
        assert!(referer.starts_with("https://www.google.com/search?q="));
        assert!(referer.contains("example.com"));
    }

    #[test]
    fn test_user_agent_pool_is_modern() {
        assert_eq!(USER_AGENTS.len(), 6);
        for ua in USER_AGENTS {
            assert!(ua.starts_with("Mozilla/5.0"));
        }
    }

    #[test]
    fn test_chrome_agents_get_client_hints() {
        // Chrome UAs must carry sec-ch-ua headers to look coherent;
        // Edge UAs must not claim the Google Chrome brand.
        for _ in 0..32 {
            let headers = browser_headers("example.com");
            let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
            let plain_chrome = ua.contains("Chrome") && !ua.contains("Edg/");
            assert_eq!(plain_chrome, headers.contains_key("sec-ch-ua"));
        }
    }

    #[test]
    fn test_block_marker_found_regardless_of_body_size() {
        let mut body = "lorem ipsum dolor sit amet ".repeat(1_000);
        body.push_str("Checking your browser before accessing");
        assert_eq!(find_block_marker(&body), Some("checking your browser"));
    }

    #[test]
    fn test_clean_body_has_no_block_marker() {
        let body = "<html><body><p>An ordinary article about town business.</p></body></html>";
        assert_eq!(find_block_marker(body), None);
    }

    #[test]
    fn test_method() {
        let client = reqwest::Client::new();
        let config = FetchConfig::default();
        let strategy = DirectHttpStrategy::new(&client, &config);
        assert_eq!(strategy.method(), FetchMethod::DirectHttp);
    }
}
