//! Immutable configuration for the fetch pipeline.
//!
//! All tunables live here and are threaded through calls as a single
//! immutable value. The suitability thresholds in particular have drifted
//! across deployments of this pipeline; they are configuration, not
//! load-bearing constants.

use std::time::Duration;

/// Thresholds for the suitability classifier.
///
/// Defaults reflect the narrow, higher-precision revision of the rules:
/// a tighter indicator list with a higher trip count produces fewer
/// false rejections than the early broad list did.
#[derive(Debug, Clone)]
pub struct SuitabilityThresholds {
    /// Texts shorter than this are rejected outright.
    pub min_length: usize,
    /// Reject when at least this many problem indicators occur.
    pub max_indicator_hits: usize,
    /// Minimum count of lines with more than ten words.
    pub min_meaningful_lines: usize,
    /// Word-frequency ceiling for the repetition anomaly check.
    pub repetition_max_frequency: f64,
    /// A word must also occur more than this many times to trip the
    /// repetition check.
    pub repetition_min_count: usize,
}

impl Default for SuitabilityThresholds {
    fn default() -> Self {
        Self {
            min_length: 200,
            max_indicator_hits: 5,
            min_meaningful_lines: 3,
            repetition_max_frequency: 0.10,
            repetition_min_count: 100,
        }
    }
}

/// Configuration consumed by the fetcher, extractor, and strategies.
///
/// Construct once per process (or per digest run) and share by reference.
/// There is no mutable global state anywhere in the pipeline; a different
/// policy means a different `FetchConfig` value.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Hard cap on extracted text length, in characters. Text beyond the
    /// cap is dropped and a truncation marker appended.
    pub max_content_length: usize,
    /// Timeout for the feed-discovery page fetch.
    pub feed_page_timeout: Duration,
    /// Timeout for each guessed feed candidate.
    pub feed_candidate_timeout: Duration,
    /// Maximum feed entries rendered into the digest blob.
    pub feed_max_entries: usize,
    /// Timeout for the reader-proxy call.
    pub reader_proxy_timeout: Duration,
    /// Base URL of the reader proxy; the target URL is appended.
    pub reader_proxy_base: String,
    /// Timeout for each direct HTTP request.
    pub http_timeout: Duration,
    /// Extra attempts after the first direct HTTP failure (transient
    /// errors only; blocking signals are never retried).
    pub http_max_retries: usize,
    /// Base delay for the direct HTTP backoff schedule.
    pub http_retry_base_delay: Duration,
    /// Visit the bare domain homepage to acquire cookies before the real
    /// request.
    pub http_homepage_warmup: bool,
    /// Timeout for browser navigation (DOM ready, not full quiescence).
    pub browser_nav_timeout: Duration,
    /// Pause after each scroll step so lazy content can load.
    pub browser_scroll_pause: Duration,
    /// User-Agent presented by the headless browser context.
    pub browser_user_agent: String,
    /// Locale presented by the headless browser context.
    pub browser_locale: String,
    /// Timezone presented by the headless browser context.
    pub browser_timezone: String,
    /// Suitability thresholds, applied after every HTML-producing tier.
    pub suitability: SuitabilityThresholds,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_content_length: 15_000,
            feed_page_timeout: Duration::from_secs(10),
            feed_candidate_timeout: Duration::from_secs(5),
            feed_max_entries: 30,
            reader_proxy_timeout: Duration::from_secs(30),
            reader_proxy_base: "https://r.jina.ai/".to_string(),
            http_timeout: Duration::from_secs(15),
            http_max_retries: 2,
            http_retry_base_delay: Duration::from_secs(2),
            http_homepage_warmup: true,
            browser_nav_timeout: Duration::from_secs(40),
            browser_scroll_pause: Duration::from_secs(2),
            browser_user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                                 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36"
                .to_string(),
            browser_locale: "en-US".to_string(),
            browser_timezone: "America/Los_Angeles".to_string(),
            suitability: SuitabilityThresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts_are_bounded() {
        let config = FetchConfig::default();
        assert!(config.feed_page_timeout <= Duration::from_secs(10));
        assert!(config.http_timeout <= Duration::from_secs(15));
        assert!(config.browser_nav_timeout <= Duration::from_secs(45));
    }

    #[test]
    fn test_default_thresholds() {
        let t = SuitabilityThresholds::default();
        assert_eq!(t.min_length, 200);
        assert_eq!(t.max_indicator_hits, 5);
        assert_eq!(t.min_meaningful_lines, 3);
    }

    #[test]
    fn test_reader_proxy_base_ends_with_slash() {
        let config = FetchConfig::default();
        assert!(config.reader_proxy_base.ends_with('/'));
    }
}
