//! # News Fetch
//!
//! An adaptive content-fetching pipeline for news digests. Given a
//! source URL, it escalates through progressively heavier retrieval
//! strategies until one produces article text that is actually usable:
//!
//! 1. **Feed discovery**: find and render the source's RSS/Atom feed
//! 2. **Reader proxy**: remote text rendering via `r.jina.ai`
//! 3. **Direct HTTP**: a browser-impersonating GET with a warmed session
//! 4. **Headless browser**: full Chromium rendering as the last resort
//!
//! Every tier's output passes through a suitability checker that spots
//! markup leakage, paywall stubs, anti-bot interstitials, and
//! low-information repetition; unsuitable output escalates instead of
//! reaching the caller. Domains with known quirks (hard paywalls,
//! proxy blocks, overlay dialogs) are handled by a declarative rules
//! table rather than scattered special cases.
//!
//! ## Usage
//!
//! ```ignore
//! let fetcher = Fetcher::new(FetchConfig::default())?;
//! let text = fetcher
//!     .fetch_content("https://example.com/story", FetchOptions::default(), None)
//!     .await;
//! ```
//!
//! Callers assembling a digest can use [`digest::collect_section_sources`]
//! to fetch a whole section's sources through one shared browser session.

pub mod config;
pub mod digest;
pub mod domains;
pub mod error;
pub mod extract;
pub mod feeds;
pub mod models;
pub mod orchestrator;
pub mod session;
pub mod strategies;
pub mod suitability;
pub mod util;

pub use config::{FetchConfig, SuitabilityThresholds};
pub use error::FetchError;
pub use models::{ExtractedArticle, FetchMethod, FetchRequest, FetchResult, SuitabilityVerdict};
pub use orchestrator::{FetchOptions, Fetcher};
pub use session::BrowserSession;
