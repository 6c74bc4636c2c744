//! Data models for the fetch pipeline.
//!
//! This module defines the transient value types that flow through the
//! cascade:
//! - [`FetchRequest`]: a validated source URL plus its derived domain
//! - [`FetchResult`]: the outcome of one strategy attempt
//! - [`ExtractedArticle`]: cleaned article text with its length invariant
//! - [`SuitabilityVerdict`]: the classifier's decision and diagnostics
//!
//! Nothing here is persisted; the pipeline is functionally pure aside
//! from logging.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;

/// A validated request to fetch one source URL.
///
/// Construction parses and validates the URL, so anything downstream may
/// rely on `url` being a well-formed absolute HTTP(S) URL and `domain`
/// being its host with any leading `www.` removed.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// The absolute URL to fetch.
    pub url: String,
    /// Host of `url`, minus a leading `www.`.
    pub domain: String,
}

impl FetchRequest {
    /// Parse and validate a source URL.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for relative URLs, non-HTTP(S)
    /// schemes, or URLs without a host.
    pub fn parse(url: &str) -> Result<Self, FetchError> {
        let parsed = Url::parse(url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(
                url::ParseError::RelativeUrlWithoutBase,
            ));
        }
        let host = parsed
            .host_str()
            .ok_or(FetchError::InvalidUrl(url::ParseError::EmptyHost))?;
        let domain = host.strip_prefix("www.").unwrap_or(host).to_string();
        Ok(Self {
            url: url.to_string(),
            domain,
        })
    }

    /// The scheme-host-port origin of this request, used for feed-path
    /// guessing and homepage cookie warm-up. Default ports are omitted.
    pub fn origin(&self) -> Result<String, FetchError> {
        let parsed = Url::parse(&self.url)?;
        let host = parsed.host_str().unwrap_or(&self.domain).to_string();
        Ok(match parsed.port() {
            Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
            None => format!("{}://{}", parsed.scheme(), host),
        })
    }
}

/// Which backend produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchMethod {
    /// RSS/Atom feed discovery.
    Feed,
    /// Third-party readability proxy.
    ReaderProxy,
    /// Direct HTTP GET with browser-like headers.
    DirectHttp,
    /// Headless browser rendering.
    Browser,
}

impl FetchMethod {
    /// Short lowercase tag for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchMethod::Feed => "feed",
            FetchMethod::ReaderProxy => "reader_proxy",
            FetchMethod::DirectHttp => "direct_http",
            FetchMethod::Browser => "browser",
        }
    }
}

/// The outcome of a single strategy attempt.
#[derive(Debug)]
pub struct FetchResult {
    /// The strategy that produced this result.
    pub method: FetchMethod,
    /// Raw content on success, or the failure.
    pub outcome: Result<String, FetchError>,
}

impl FetchResult {
    pub fn success(method: FetchMethod, content: String) -> Self {
        Self {
            method,
            outcome: Ok(content),
        }
    }

    pub fn failure(method: FetchMethod, error: FetchError) -> Self {
        Self {
            method,
            outcome: Err(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Cleaned article text produced by the content extractor.
///
/// Invariant: `text` never exceeds the cap the extractor was configured
/// with, and `truncated` is true exactly when the pre-cap text did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    /// Normalized article text, capped at the configured length.
    pub text: String,
    /// The URL the HTML came from.
    pub source_url: String,
    /// Whether the cap was applied.
    pub truncated: bool,
}

/// The suitability classifier's decision for one text.
///
/// `reasons` carries every failed rule, not just the first, so the logs
/// show the whole picture when a fetch escalates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityVerdict {
    /// True when the text is usable as LLM input.
    pub suitable: bool,
    /// One entry per failed rule; empty when suitable.
    pub reasons: Vec<String>,
}

impl SuitabilityVerdict {
    pub fn suitable() -> Self {
        Self {
            suitable: true,
            reasons: Vec::new(),
        }
    }

    pub fn unsuitable(reasons: Vec<String>) -> Self {
        Self {
            suitable: false,
            reasons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_request_strips_www() {
        let req = FetchRequest::parse("https://www.example.com/story/1").unwrap();
        assert_eq!(req.domain, "example.com");
        assert_eq!(req.url, "https://www.example.com/story/1");
    }

    #[test]
    fn test_fetch_request_plain_host() {
        let req = FetchRequest::parse("https://lite.cnn.com/2025/05/06/article").unwrap();
        assert_eq!(req.domain, "lite.cnn.com");
    }

    #[test]
    fn test_fetch_request_rejects_relative() {
        assert!(FetchRequest::parse("/just/a/path").is_err());
    }

    #[test]
    fn test_fetch_request_rejects_non_http() {
        assert!(FetchRequest::parse("ftp://example.com/file").is_err());
        assert!(FetchRequest::parse("file:///etc/passwd").is_err());
    }

    #[test]
    fn test_origin() {
        let req = FetchRequest::parse("https://www.example.com/a/b?c=d").unwrap();
        assert_eq!(req.origin().unwrap(), "https://www.example.com");
    }

    #[test]
    fn test_origin_keeps_explicit_port() {
        let req = FetchRequest::parse("http://127.0.0.1:8080/a").unwrap();
        assert_eq!(req.origin().unwrap(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_fetch_result_accessors() {
        let ok = FetchResult::success(FetchMethod::Feed, "text".into());
        assert!(ok.succeeded());
        assert_eq!(ok.method.as_str(), "feed");

        let err = FetchResult::failure(FetchMethod::DirectHttp, FetchError::Status(500));
        assert!(!err.succeeded());
    }

    #[test]
    fn test_verdict_serialization() {
        let verdict = SuitabilityVerdict::unsuitable(vec!["too short".into()]);
        let json = serde_json::to_string(&verdict).unwrap();
        assert!(json.contains("too short"));
        let back: SuitabilityVerdict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, verdict);
    }
}
