//! Content extraction: isolating article text from noisy HTML.
//!
//! Extraction is layered. A per-domain override table handles sites whose
//! generic markup is known to be noisy, a generic selector list covers
//! the common semantic containers, and a denylist-filtered body walk is
//! the last resort. The first tier to yield non-empty text wins.
//!
//! Text is gathered with block-level separation (each block element
//! contributes a line), then normalized: lines stripped, blanks dropped,
//! double-space phrase boundaries collapsed. Output is capped at the
//! configured length with a truncation marker.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::config::FetchConfig;
use crate::domains;
use crate::models::ExtractedArticle;

/// Elements that never contribute article text.
const STRIP_TAGS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "aside", "iframe", "noscript", "svg", "form",
    "button", "input", "select", "textarea",
];

/// Elements that end a text block.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "blockquote", "tr", "ul", "ol", "figcaption", "main",
];

/// Class-name fragments marking page chrome, removed in the fallback tier.
const CHROME_CLASS_DENYLIST: &[&str] = &[
    "ad", "ads", "advertisement", "sidebar", "comments", "related", "recommended", "newsletter",
    "social-share",
];

/// Generic container selectors, in decreasing specificity.
static GENERIC_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    [
        "article",
        "[itemprop=\"articleBody\"]",
        "[class*=\"article-body\"]",
        "[class*=\"story-body\"]",
        "[class*=\"entry-content\"]",
        "[class*=\"post-content\"]",
        "[role=\"main\"]",
        "main",
        "#content",
        ".content",
    ]
    .iter()
    .map(|s| Selector::parse(s).unwrap())
    .collect()
});

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());

/// Extract cleaned article text from raw HTML.
///
/// Deterministic for a fixed `(html, url)` pair. The only side effect is
/// a log line naming the extraction tier that matched.
///
/// # Arguments
///
/// * `html` - The raw page HTML
/// * `url` - The page's URL, used for the per-domain override lookup
/// * `config` - Supplies the output length cap
pub fn extract(html: &str, url: &str, config: &FetchConfig) -> ExtractedArticle {
    let document = Html::parse_document(html);
    let domain = crate::util::domain_of(url).unwrap_or_default();

    let raw = domain_override_text(&document, &domain)
        .or_else(|| generic_selector_text(&document))
        .unwrap_or_else(|| fallback_body_text(&document));

    let normalized = normalize_text(&raw);
    let (text, truncated) = cap_text(&normalized, config.max_content_length);
    ExtractedArticle {
        text,
        source_url: url.to_string(),
        truncated,
    }
}

/// Tier 1: per-domain override selectors; all matches concatenated in
/// document order.
fn domain_override_text(document: &Html, domain: &str) -> Option<String> {
    let rules = domains::rules_for(domain)?;
    for raw_selector in rules.selectors {
        let Ok(selector) = Selector::parse(raw_selector) else {
            continue;
        };
        let mut combined = String::new();
        for element in document.select(&selector) {
            collect_text(element, &mut combined, false);
            combined.push('\n');
        }
        if !combined.trim().is_empty() {
            debug!(tier = "domain_override", selector = raw_selector, domain, "Extractor matched");
            return Some(combined);
        }
    }
    None
}

/// Tier 2: generic semantic containers, first non-empty match wins.
fn generic_selector_text(document: &Html) -> Option<String> {
    for (i, selector) in GENERIC_SELECTORS.iter().enumerate() {
        for element in document.select(selector) {
            let mut text = String::new();
            collect_text(element, &mut text, false);
            if !text.trim().is_empty() {
                debug!(tier = "generic", index = i, "Extractor matched");
                return Some(text);
            }
        }
    }
    None
}

/// Tier 3: the whole body, minus elements whose class names look like
/// page chrome.
fn fallback_body_text(document: &Html) -> String {
    let mut text = String::new();
    if let Some(body) = document.select(&BODY_SELECTOR).next() {
        collect_text(body, &mut text, true);
        debug!(tier = "fallback_body", "Extractor fell back to body text");
    }
    text
}

/// Walk an element's subtree accumulating text, skipping non-content
/// elements and (optionally) chrome-classed containers, inserting a
/// newline after each block-level element.
fn collect_text(element: ElementRef, out: &mut String, filter_chrome: bool) {
    for child in element.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                let name = e.name();
                if STRIP_TAGS.contains(&name) {
                    continue;
                }
                if filter_chrome && has_chrome_class(e.attr("class")) {
                    continue;
                }
                if let Some(child_ref) = ElementRef::wrap(child) {
                    collect_text(child_ref, out, filter_chrome);
                }
                if BLOCK_TAGS.contains(&name) {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

fn has_chrome_class(class_attr: Option<&str>) -> bool {
    let Some(classes) = class_attr else {
        return false;
    };
    classes
        .split_whitespace()
        .any(|c| CHROME_CLASS_DENYLIST.contains(&c.to_ascii_lowercase().as_str()))
}

/// Normalize extracted text: strip every line, treat runs of double
/// spaces as phrase separators, and drop blank lines.
pub fn normalize_text(raw: &str) -> String {
    raw.lines()
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Cap text at `max_len` characters, marker included.
///
/// Returns the capped text and whether truncation occurred. The returned
/// string never exceeds `max_len` characters.
pub fn cap_text(text: &str, max_len: usize) -> (String, bool) {
    let char_count = text.chars().count();
    if char_count <= max_len {
        return (text.to_string(), false);
    }
    // Caps too small to hold the marker get a bare cut.
    if max_len < 3 {
        return (text.chars().take(max_len).collect(), true);
    }
    let keep = max_len - 3;
    let mut capped: String = text.chars().take(keep).collect();
    capped.push_str("...");
    (capped, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FetchConfig {
        FetchConfig::default()
    }

    const ARTICLE_HTML: &str = r#"
        <html><head><title>t</title><script>var x = 1;</script></head>
        <body>
        <nav>Home News Sports</nav>
        <article>
          <h1>City council approves new transit plan</h1>
          <p>The city council voted on Tuesday to approve a sweeping new transit plan for the region.</p>
          <p>Supporters of the measure said the plan would reduce congestion across every major corridor.</p>
          <p>Opponents argued during the public comment period that the costs were badly underestimated.</p>
          <p>The first construction phase is expected to begin early next year near the waterfront.</p>
          <p>Funding comes from a combination of federal grants and a regional sales tax increase.</p>
        </article>
        <footer>Copyright notice here</footer>
        </body></html>
    "#;

    #[test]
    fn test_extracts_article_tag() {
        let article = extract(ARTICLE_HTML, "https://example.com/story", &config());
        assert!(article.text.contains("transit plan"));
        assert!(article.text.contains("sales tax increase"));
        assert!(!article.text.contains("Home News Sports"));
        assert!(!article.text.contains("Copyright notice"));
        assert!(!article.text.contains("var x"));
        assert!(!article.truncated);
    }

    #[test]
    fn test_cap_text_degenerate_caps_stay_within_bounds() {
        let (text, truncated) = cap_text("hello world", 2);
        assert_eq!(text, "he");
        assert!(truncated);

        let (text, truncated) = cap_text("hello world", 0);
        assert_eq!(text, "");
        assert!(truncated);

        let (text, truncated) = cap_text("hello world", 3);
        assert_eq!(text, "...");
        assert!(truncated);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let a = extract(ARTICLE_HTML, "https://example.com/story", &config());
        let b = extract(ARTICLE_HTML, "https://example.com/story", &config());
        assert_eq!(a, b);
    }

    #[test]
    fn test_block_level_separation() {
        let html = "<html><body><article><p>First paragraph here.</p><p>Second paragraph here.</p></article></body></html>";
        let article = extract(html, "https://example.com/a", &config());
        let lines: Vec<&str> = article.text.lines().collect();
        assert_eq!(lines, vec!["First paragraph here.", "Second paragraph here."]);
    }

    #[test]
    fn test_domain_override_concatenates_matches() {
        let html = r#"<html><body>
            <div class="story-body">Part one of the story body.</div>
            <div class="unrelated">Navigation junk</div>
            <div class="story-body">Part two of the story body.</div>
        </body></html>"#;
        let article = extract(html, "https://www.mv-voice.com/news/1", &config());
        assert!(article.text.contains("Part one"));
        assert!(article.text.contains("Part two"));
    }

    #[test]
    fn test_fallback_removes_chrome_classes() {
        let html = r#"<html><body>
            <div class="sidebar">Subscribe to our newsletter now</div>
            <div>Plain body text that has no semantic container at all.</div>
            <div class="comments">User comment junk</div>
        </body></html>"#;
        let article = extract(html, "https://example.com/x", &config());
        assert!(article.text.contains("no semantic container"));
        assert!(!article.text.contains("comment junk"));
        assert!(!article.text.contains("Subscribe to our newsletter"));
    }

    #[test]
    fn test_length_cap_and_marker() {
        let body: String = "word ".repeat(10_000);
        let html = format!("<html><body><article><p>{body}</p></article></body></html>");
        let mut cfg = config();
        cfg.max_content_length = 1_000;
        let article = extract(&html, "https://example.com/long", &cfg);
        assert!(article.truncated);
        assert!(article.text.chars().count() <= 1_000);
        assert!(article.text.ends_with("..."));
    }

    #[test]
    fn test_cap_text_exact_boundary() {
        let (text, truncated) = cap_text("abcde", 5);
        assert_eq!(text, "abcde");
        assert!(!truncated);

        let (text, truncated) = cap_text("abcdef", 5);
        assert!(truncated);
        assert_eq!(text.chars().count(), 5);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn test_normalize_text() {
        let raw = "  line one  \n\n   \nphrase a  phrase b\n";
        assert_eq!(normalize_text(raw), "line one\nphrase a\nphrase b");
    }

    #[test]
    fn test_empty_html() {
        let article = extract("", "https://example.com/empty", &config());
        assert!(article.text.is_empty());
        assert!(!article.truncated);
    }
}
