//! Digest-section source collection.
//!
//! A digest is assembled from named sections, each with its own list of
//! source URLs. This module fetches a section's sources through the
//! cascade and joins the results into one labeled text blob per
//! section, ready to hand to a summarizer. A source that cannot be
//! fetched is recorded as such in the blob rather than failing the
//! section; partial sections are normal.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::orchestrator::{FetchOptions, Fetcher};
use crate::session::BrowserSession;

/// One named section of a digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSection {
    /// Section heading, e.g. "Local News".
    pub name: String,
    /// Summarization prompt applied to this section's collected text.
    pub prompt: String,
    /// Source URLs fetched for this section.
    pub sources: Vec<String>,
}

/// The outcome of fetching one source URL.
#[derive(Debug, Clone)]
pub struct SourceContent {
    pub url: String,
    /// Fetched article text, or `None` when the cascade was exhausted.
    pub content: Option<String>,
}

/// Fetch every source in a section, in order, through the cascade.
///
/// Sources are fetched sequentially on purpose: the sources within a
/// section frequently share a domain, and concurrent hits are exactly
/// the access pattern that trips rate limiting and anti-bot walls. A
/// shared browser session, when provided, is reused across all sources
/// that escalate that far.
#[instrument(level = "info", skip_all, fields(section = %section.name))]
pub async fn collect_section_sources(
    fetcher: &Fetcher,
    section: &NewsSection,
    options: FetchOptions,
    session: Option<&BrowserSession>,
) -> Vec<SourceContent> {
    let mut collected = Vec::with_capacity(section.sources.len());
    for url in &section.sources {
        let content = fetcher.fetch_content(url, options, session).await;
        if content.is_none() {
            warn!(%url, "Source yielded no content");
        }
        collected.push(SourceContent {
            url: url.clone(),
            content,
        });
    }
    let fetched = collected.iter().filter(|s| s.content.is_some()).count();
    info!(
        fetched,
        total = collected.len(),
        "Section source collection finished"
    );
    collected
}

/// Join a section's fetched sources into one labeled text blob.
///
/// Each source contributes either its content under a `Content from`
/// header or an explicit error line, so the summarizer always sees
/// which sources were unavailable.
pub fn join_section_sources(sources: &[SourceContent]) -> String {
    sources
        .iter()
        .map(|source| match &source.content {
            Some(text) => format!("Content from {}:\n{}", source.url, text),
            None => format!("Error fetching content from {}", source.url),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_section_sources() {
        let sources = vec![
            SourceContent {
                url: "https://example.com/a".to_string(),
                content: Some("Article text.".to_string()),
            },
            SourceContent {
                url: "https://example.com/b".to_string(),
                content: None,
            },
        ];
        let blob = join_section_sources(&sources);
        assert_eq!(
            blob,
            "Content from https://example.com/a:\nArticle text.\n\n\
             Error fetching content from https://example.com/b"
        );
    }

    #[test]
    fn test_join_empty_section() {
        assert_eq!(join_section_sources(&[]), "");
    }

    #[tokio::test]
    async fn test_failed_sources_do_not_abort_the_section() {
        use crate::config::FetchConfig;

        // Unparseable URLs fail inside fetch_content before any network
        // activity, so the whole section resolves offline.
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        let section = NewsSection {
            name: "Local News".to_string(),
            prompt: "Summarize the local stories.".to_string(),
            sources: vec![
                "not a url at all".to_string(),
                "/relative/path".to_string(),
                "ftp://example.com/file".to_string(),
            ],
        };

        let collected =
            collect_section_sources(&fetcher, &section, FetchOptions::default(), None).await;

        // Every source is visited, in order, and each failure is
        // recorded rather than aborting the section.
        assert_eq!(collected.len(), section.sources.len());
        for (source, url) in collected.iter().zip(&section.sources) {
            assert_eq!(&source.url, url);
            assert_eq!(source.content, None);
        }

        let blob = join_section_sources(&collected);
        assert_eq!(blob.matches("Error fetching content from").count(), 3);
    }

    #[test]
    fn test_section_round_trips_through_serde() {
        let json = r#"{
            "name": "Local News",
            "prompt": "Summarize the local stories.",
            "sources": ["https://example.com/news"]
        }"#;
        let section: NewsSection = serde_json::from_str(json).unwrap();
        assert_eq!(section.name, "Local News");
        assert_eq!(section.sources.len(), 1);
    }
}
