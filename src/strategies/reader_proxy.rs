//! Reader-proxy strategy: remote text rendering via r.jina.ai.
//!
//! The proxy fetches and renders the page server-side and returns plain
//! text, which sidesteps most client-side rendering and some soft
//! blocks for the cost of one HTTP request. Because the proxy already
//! strips markup, its output goes through normalization and capping
//! only, never through the HTML extractor.

use std::time::Instant;

use tracing::{info, instrument, warn};

use crate::config::FetchConfig;
use crate::domains;
use crate::error::FetchError;
use crate::extract::{cap_text, normalize_text};
use crate::models::{ExtractedArticle, FetchMethod, FetchRequest};
use crate::strategies::FetchStrategy;

/// Fetches article text through a reader proxy.
///
/// The proxy URL is formed by appending the target URL to the
/// configured proxy base, e.g. `https://r.jina.ai/https://example.com/a`.
#[derive(Debug)]
pub struct ReaderProxyStrategy<'a> {
    client: &'a reqwest::Client,
    config: &'a FetchConfig,
}

impl<'a> ReaderProxyStrategy<'a> {
    pub fn new(client: &'a reqwest::Client, config: &'a FetchConfig) -> Self {
        Self { client, config }
    }
}

impl FetchStrategy for ReaderProxyStrategy<'_> {
    fn method(&self) -> FetchMethod {
        FetchMethod::ReaderProxy
    }

    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    async fn attempt(&self, request: &FetchRequest) -> Result<ExtractedArticle, FetchError> {
        // Some domains actively reject or garble proxy traffic; going
        // through the proxy for them only burns the cascade's time.
        if domains::reader_proxy_blocked(&request.domain) {
            return Err(FetchError::Blocked(format!(
                "domain {} is known to reject the reader proxy",
                request.domain
            )));
        }

        let proxy_url = format!("{}{}", self.config.reader_proxy_base, request.url);
        let t0 = Instant::now();
        let response = self
            .client
            .get(&proxy_url)
            .timeout(self.config.reader_proxy_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                elapsed_ms = t0.elapsed().as_millis() as u128,
                "Reader proxy returned non-success status"
            );
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let text = normalize_text(&body);
        if text.is_empty() {
            return Err(FetchError::Empty);
        }

        let (text, truncated) = cap_text(&text, self.config.max_content_length);
        info!(
            chars = text.len(),
            truncated,
            elapsed_ms = t0.elapsed().as_millis() as u128,
            "Reader proxy fetch succeeded"
        );
        Ok(ExtractedArticle {
            text,
            source_url: request.url.clone(),
            truncated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocked_domain_is_refused_without_network() {
        let client = reqwest::Client::new();
        let config = FetchConfig::default();
        let strategy = ReaderProxyStrategy::new(&client, &config);
        let request = FetchRequest::parse("https://www.sfchronicle.com/article").unwrap();

        let err = strategy.attempt(&request).await.unwrap_err();
        assert!(matches!(err, FetchError::Blocked(_)));
        assert!(err.is_definitive());
    }

    #[test]
    fn test_method() {
        let client = reqwest::Client::new();
        let config = FetchConfig::default();
        let strategy = ReaderProxyStrategy::new(&client, &config);
        assert_eq!(strategy.method(), FetchMethod::ReaderProxy);
    }
}
