//! Utility functions for URL handling and log hygiene.

use url::Url;

/// Extract the domain of a URL: the host with any leading `www.` removed.
///
/// # Returns
///
/// `None` when the URL does not parse or has no host.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(domain_of("https://www.example.com/a"), Some("example.com".into()));
/// ```
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte
/// count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let cut = s
            .char_indices()
            .take_while(|(i, _)| *i <= max)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_of_strips_www() {
        assert_eq!(
            domain_of("https://www.example.com/a/b"),
            Some("example.com".to_string())
        );
    }

    #[test]
    fn test_domain_of_keeps_subdomains() {
        assert_eq!(
            domain_of("https://lite.cnn.com/2025/05/06/article"),
            Some("lite.cnn.com".to_string())
        );
    }

    #[test]
    fn test_domain_of_invalid() {
        assert_eq!(domain_of("not a url"), None);
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("bytes)"));
    }
}
