//! Feed discovery: the cheapest, most reliable tier of the cascade.
//!
//! Feeds are structured, rarely blocked, and cost one small request, so
//! they are always tried before any scraping strategy. Discovery is two
//! phase: the page's own `<link rel="alternate">` declarations are
//! tried first; when a page declares none, or every declared link turns
//! out to be dead, a fixed list of conventional feed paths is probed on
//! the origin, aborting early once that clearly isn't going anywhere.

use feed_rs::model::Feed;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::FetchConfig;
use crate::extract::cap_text;
use crate::models::{ExtractedArticle, FetchRequest};

/// Conventional feed locations probed when a page declares none.
const COMMON_FEED_PATHS: &[&str] = &[
    "/feed",
    "/feed/",
    "/rss",
    "/rss.xml",
    "/atom.xml",
    "/feed.xml",
    "/index.xml",
    "/feeds/posts/default",
    "/blog/feed",
];

/// Guessed-path probing stops after this many consecutive misses.
const MAX_CONSECUTIVE_MISSES: usize = 3;

/// Formatted feed text below this length is treated as not found.
const MIN_ACCEPT_LEN: usize = 500;

/// Per-entry summary cap, in characters.
const SUMMARY_CAP: usize = 1_000;

static LINK_ALTERNATE: Lazy<Selector> =
    Lazy::new(|| Selector::parse("link[rel=\"alternate\"]").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Attempt to locate and render an RSS/Atom feed for a source URL.
///
/// Returns `None` when no usable feed exists; every failure here is an
/// expected outcome, logged and swallowed, and the cascade proceeds to
/// the scraping strategies.
#[instrument(level = "info", skip_all, fields(url = %request.url))]
pub async fn discover_feed(
    client: &reqwest::Client,
    request: &FetchRequest,
    config: &FetchConfig,
) -> Option<ExtractedArticle> {
    // Phase 1: the page's own feed declarations.
    let declared = declared_feed_urls(client, request, config).await;
    if !declared.is_empty() {
        debug!(count = declared.len(), "Found declared feed links");
        for feed_url in &declared {
            if let Some(text) =
                try_feed_url(client, feed_url, config.feed_page_timeout, config).await
            {
                info!(%feed_url, chars = text.len(), "Feed discovery succeeded via link tag");
                return Some(to_article(text, feed_url, config));
            }
        }
        // Pages do declare stale or broken feed links; a dead
        // declaration still falls through to the guessed paths.
        debug!(
            count = declared.len(),
            "Declared feed links exhausted; probing common paths"
        );
    }

    // Phase 2: conventional paths on the origin.
    let origin = request.origin().ok()?;
    let mut consecutive_misses = 0;
    for path in COMMON_FEED_PATHS {
        if consecutive_misses >= MAX_CONSECUTIVE_MISSES {
            debug!(misses = consecutive_misses, "Aborting feed path probing");
            break;
        }
        let feed_url = format!("{origin}{path}");
        match try_feed_url(client, &feed_url, config.feed_candidate_timeout, config).await {
            Some(text) => {
                info!(%feed_url, chars = text.len(), "Feed discovery succeeded via common path");
                return Some(to_article(text, &feed_url, config));
            }
            None => consecutive_misses += 1,
        }
    }
    None
}

fn to_article(text: String, feed_url: &str, config: &FetchConfig) -> ExtractedArticle {
    let (text, truncated) = cap_text(&text, config.max_content_length);
    ExtractedArticle {
        text,
        source_url: feed_url.to_string(),
        truncated,
    }
}

/// Fetch the page and collect `<link rel="alternate">` feed URLs,
/// resolved to absolute form, with comment feeds excluded.
async fn declared_feed_urls(
    client: &reqwest::Client,
    request: &FetchRequest,
    config: &FetchConfig,
) -> Vec<String> {
    let response = match client
        .get(&request.url)
        .timeout(config.feed_page_timeout)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(url = %request.url, error = %e, "Feed discovery page fetch failed");
            return Vec::new();
        }
    };
    let html = match response.text().await {
        Ok(t) => t,
        Err(e) => {
            warn!(url = %request.url, error = %e, "Feed discovery page body unreadable");
            return Vec::new();
        }
    };
    feed_links_in_html(&html, &request.url)
}

/// Scan HTML for alternate links whose type mentions rss, atom, or xml.
pub fn feed_links_in_html(html: &str, base_url: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let base = match Url::parse(base_url) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };

    let mut found = Vec::new();
    for element in document.select(&LINK_ALTERNATE) {
        let Some(kind) = element.value().attr("type") else {
            continue;
        };
        let kind = kind.to_ascii_lowercase();
        if !(kind.contains("rss") || kind.contains("atom") || kind.contains("xml")) {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        let resolved = resolved.to_string();
        // Comment feeds duplicate the article feed with discussion noise.
        if resolved.contains("/comments") {
            continue;
        }
        found.push(resolved);
    }
    found
}

/// Fetch one candidate feed URL and render it, or `None` when it does
/// not parse as a feed, has no entries, or renders too little text.
async fn try_feed_url(
    client: &reqwest::Client,
    feed_url: &str,
    timeout: std::time::Duration,
    config: &FetchConfig,
) -> Option<String> {
    let response = client.get(feed_url).timeout(timeout).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }
    let bytes = response.bytes().await.ok()?;
    let feed = feed_rs::parser::parse(bytes.as_ref()).ok()?;
    if feed.entries.is_empty() {
        return None;
    }
    let text = format_feed_entries(&feed, config.feed_max_entries);
    if text.len() > MIN_ACCEPT_LEN {
        Some(text)
    } else {
        debug!(%feed_url, chars = text.len(), "Feed rendered too little text");
        None
    }
}

/// Render feed entries as digest text: a `## title` heading, the entry
/// link, and an HTML-stripped summary per entry, blank-line separated.
pub fn format_feed_entries(feed: &Feed, max_entries: usize) -> String {
    feed.entries
        .iter()
        .take(max_entries)
        .map(|entry| {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .unwrap_or_else(|| "(untitled)".to_string());
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let summary = entry
                .summary
                .as_ref()
                .map(|s| strip_html(&s.content))
                .unwrap_or_default();
            let (summary, _) = cap_text(&summary, SUMMARY_CAP);

            let mut block = format!("## {title}");
            if !link.is_empty() {
                block.push('\n');
                block.push_str(&link);
            }
            if !summary.is_empty() {
                block.push('\n');
                block.push_str(&summary);
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Drop tags and collapse whitespace in a feed summary, which is often
/// raw HTML.
fn strip_html(html: &str) -> String {
    let stripped = TAG_RE.replace_all(html, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}
