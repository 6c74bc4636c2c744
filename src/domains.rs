//! Declarative per-domain knowledge base.
//!
//! Everything the pipeline knows about specific websites lives in one
//! table: extraction selectors tuned for noisy markup, escalation flags
//! for sites that resist plain HTTP or reject the reader proxy, and the
//! button texts that dismiss their consent and subscription dialogs.
//! The extractor and the orchestrator consult the table; neither carries
//! site-specific conditionals of its own, so adding a site is a one-line
//! change here.

/// Behavior overrides and extraction hints for one domain pattern.
#[derive(Debug)]
pub struct DomainRules {
    /// Substring matched against the request's domain.
    pub pattern: &'static str,
    /// CSS selectors tried before the generic extraction tiers. All
    /// matches are concatenated in document order.
    pub selectors: &'static [&'static str],
    /// Skip the cheap tiers and go straight to the browser; set for
    /// sites that empirically serve nothing useful over plain HTTP.
    pub force_browser: bool,
    /// Skip the reader proxy; set for sites it is known to refuse.
    pub skip_reader_proxy: bool,
    /// Button texts clicked (best-effort) before the browser captures
    /// the page, to clear consent and subscription dialogs.
    pub dismiss_buttons: &'static [&'static str],
}

const ACCEPT_BUTTONS: &[&str] = &["Accept", "Agree", "Continue"];
const CLOSE_BUTTONS: &[&str] = &["Close", "No thanks"];

/// The knowledge base, in match-priority order.
static DOMAIN_RULES: &[DomainRules] = &[
    DomainRules {
        pattern: "mv-voice.com",
        selectors: &[".story", ".story-body", ".article-body", ".article-text"],
        force_browser: true,
        skip_reader_proxy: false,
        dismiss_buttons: CLOSE_BUTTONS,
    },
    DomainRules {
        pattern: "paloaltoonline.com",
        selectors: &[".story", ".story-body", ".article-body"],
        force_browser: true,
        skip_reader_proxy: false,
        dismiss_buttons: CLOSE_BUTTONS,
    },
    DomainRules {
        pattern: "almanacnews.com",
        selectors: &[".story", ".story-body", ".article-body"],
        force_browser: true,
        skip_reader_proxy: false,
        dismiss_buttons: CLOSE_BUTTONS,
    },
    DomainRules {
        pattern: "sfchronicle.com",
        selectors: &[".article-body", ".article", ".story-body", ".paywall-article"],
        force_browser: false,
        skip_reader_proxy: true,
        dismiss_buttons: ACCEPT_BUTTONS,
    },
    DomainRules {
        pattern: "mercurynews.com",
        selectors: &[".article-body", ".entry-content", ".article", ".story-body"],
        force_browser: false,
        skip_reader_proxy: true,
        dismiss_buttons: ACCEPT_BUTTONS,
    },
];

/// Look up the rules for a domain, if any pattern matches by containment.
pub fn rules_for(domain: &str) -> Option<&'static DomainRules> {
    DOMAIN_RULES.iter().find(|r| domain.contains(r.pattern))
}

/// Whether a domain should skip straight to the browser tier.
pub fn requires_browser(domain: &str) -> bool {
    rules_for(domain).is_some_and(|r| r.force_browser)
}

/// Whether the reader proxy should be skipped for a domain.
pub fn reader_proxy_blocked(domain: &str) -> bool {
    rules_for(domain).is_some_and(|r| r.skip_reader_proxy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_match_by_containment() {
        assert!(rules_for("www.mv-voice.com").is_some());
        assert!(rules_for("mv-voice.com").is_some());
        assert!(rules_for("example.com").is_none());
    }

    #[test]
    fn test_force_browser_domains() {
        assert!(requires_browser("mv-voice.com"));
        assert!(requires_browser("paloaltoonline.com"));
        assert!(requires_browser("almanacnews.com"));
        assert!(!requires_browser("sfchronicle.com"));
        assert!(!requires_browser("bbc.co.uk"));
    }

    #[test]
    fn test_reader_proxy_blocklist() {
        assert!(reader_proxy_blocked("sfchronicle.com"));
        assert!(reader_proxy_blocked("mercurynews.com"));
        assert!(!reader_proxy_blocked("mv-voice.com"));
    }

    #[test]
    fn test_selectors_present_for_known_sites() {
        let rules = rules_for("sfchronicle.com").unwrap();
        assert!(rules.selectors.contains(&".article-body"));
        assert!(!rules.dismiss_buttons.is_empty());
    }
}
