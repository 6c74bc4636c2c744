//! Fetch strategies, one per tier of the escalation cascade.
//!
//! Each strategy knows how to retrieve article text one particular way:
//! through the text-rendering reader proxy, with a plain browser-like
//! HTTP request, or by driving a real headless browser. They share a
//! single trait so the orchestrator can walk them in cost order without
//! caring how any tier does its work.
//!
//! # Design
//!
//! - [`FetchStrategy`]: Core trait defining one escalation tier
//! - [`reader_proxy::ReaderProxyStrategy`]: cheap remote text rendering
//! - [`direct_http::DirectHttpStrategy`]: browser-impersonating HTTP
//! - [`browser::BrowserStrategy`]: full headless Chromium rendering

pub mod browser;
pub mod direct_http;
pub mod reader_proxy;

use crate::error::FetchError;
use crate::models::{ExtractedArticle, FetchMethod, FetchRequest};

/// Trait for one tier of the fetch cascade.
///
/// Implementors retrieve article text for a request in one specific
/// way. A strategy reports failure through [`FetchError`]; deciding
/// whether to escalate to the next tier is the orchestrator's job, not
/// the strategy's.
pub trait FetchStrategy {
    /// Which cascade tier this strategy implements.
    fn method(&self) -> FetchMethod;

    /// Attempt to fetch and extract article text for the request.
    ///
    /// # Arguments
    ///
    /// * `request` - The parsed target URL and its domain
    ///
    /// # Returns
    ///
    /// The extracted article text, or an error describing why this
    /// tier could not produce it.
    async fn attempt(&self, request: &FetchRequest) -> Result<ExtractedArticle, FetchError>;
}
