//! Error taxonomy for the fetch pipeline.
//!
//! Every failure mode in this crate degrades to "this one source produced
//! no content". Strategies surface errors through [`FetchError`]; the
//! orchestrator catches them at its boundary and converts them into
//! failure results rather than letting them propagate to the caller.

use std::time::Duration;

/// Errors raised by fetch strategies and supporting components.
///
/// The variants mirror the escalation semantics of the cascade:
///
/// - [`FetchError::Http`], [`FetchError::Status`], and
///   [`FetchError::Timeout`] are retried with backoff inside the
///   direct-HTTP strategy before becoming a strategy failure.
/// - [`FetchError::Blocked`] is a definitive signal (403/429, CAPTCHA or
///   Cloudflare markers, degenerate short bodies): the strategy is
///   abandoned immediately and the orchestrator escalates.
/// - [`FetchError::BrowserLaunch`] and [`FetchError::Browser`] are
///   failures of the browser tier specifically and never crash the
///   orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The URL could not be parsed as an absolute HTTP(S) URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The transport reported an error after exhausting retries.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-success HTTP status that is not a blocking signal.
    #[error("unexpected status {0}")]
    Status(u16),

    /// A definitive blocking signal; retrying the same strategy is wasted
    /// effort.
    #[error("blocked: {0}")]
    Blocked(String),

    /// A network operation exceeded its configured deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The headless browser engine failed to launch.
    #[error("browser launch failed: {0}")]
    BrowserLaunch(String),

    /// The browser session was live but navigation or capture failed.
    #[error("browser error: {0}")]
    Browser(String),

    /// Retrieval succeeded but yielded nothing worth extracting.
    #[error("no usable content")]
    Empty,
}

impl FetchError {
    /// True when escalating is the only sensible reaction: retrying the
    /// same strategy will not help.
    pub fn is_definitive(&self) -> bool {
        matches!(
            self,
            FetchError::Blocked(_) | FetchError::BrowserLaunch(_) | FetchError::InvalidUrl(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_is_definitive() {
        assert!(FetchError::Blocked("403".into()).is_definitive());
        assert!(FetchError::BrowserLaunch("no chromium".into()).is_definitive());
    }

    #[test]
    fn test_timeout_is_not_definitive() {
        assert!(!FetchError::Timeout(Duration::from_secs(15)).is_definitive());
        assert!(!FetchError::Status(500).is_definitive());
        assert!(!FetchError::Empty.is_definitive());
    }

    #[test]
    fn test_display_formats() {
        let e = FetchError::Blocked("captcha marker".into());
        assert_eq!(e.to_string(), "blocked: captcha marker");
        let e = FetchError::Status(503);
        assert_eq!(e.to_string(), "unexpected status 503");
    }
}
