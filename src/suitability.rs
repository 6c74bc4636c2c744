//! Suitability classification: is this text usable as LLM input?
//!
//! The classifier gates escalation in the fetch cascade. A fetch that
//! technically succeeded but produced a cookie wall, a CAPTCHA page, or
//! markup leakage must escalate to the next strategy, so the rules here
//! target the failure signatures of bad extractions rather than judging
//! prose quality. Every failed rule is reported, not just the first.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::config::SuitabilityThresholds;
use crate::models::SuitabilityVerdict;

/// Substrings strongly correlated with failed extraction. This is the
/// narrow, high-precision revision: broad phrases like "loading" or
/// "privacy policy" fire on legitimate articles and were removed.
const PROBLEM_INDICATORS: &[&str] = &[
    // raw markup leakage
    "<html",
    "<body",
    "<script",
    "<style",
    "function(",
    "document.getelementbyid",
    // paywall / signup walls
    "subscribe now",
    "subscription required",
    "sign in to continue",
    "create an account",
    // anti-bot challenges
    "captcha",
    "checking your browser",
    "cloudflare",
    "automated access",
    // error pages
    "404 not found",
    "403 forbidden",
    "access denied",
    "page not available",
    "enable javascript",
];

/// Common words excluded from the repetition check.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "of", "for", "with", "by",
    "that", "this", "from",
];

/// Classify extracted text for downstream LLM use.
///
/// All rules must pass for a suitable verdict:
/// - minimum length
/// - problem-indicator density below the threshold
/// - at least a few structurally meaningful lines (>10 words)
/// - no single word dominating the text (repetition anomaly)
///
/// Appending more problem indicators to a text can only move the verdict
/// toward unsuitable, never back.
pub fn is_suitable(text: &str, url: &str, thresholds: &SuitabilityThresholds) -> SuitabilityVerdict {
    let mut reasons = Vec::new();

    let char_count = text.chars().count();
    if char_count < thresholds.min_length {
        reasons.push(format!(
            "too short: {char_count} chars (minimum {})",
            thresholds.min_length
        ));
        // Nothing else to measure on a stub.
        warn!(%url, reasons = ?reasons, "Content unsuitable");
        return SuitabilityVerdict::unsuitable(reasons);
    }

    let lowered = text.to_lowercase();
    let indicator_hits = count_indicator_hits(&lowered);
    if indicator_hits >= thresholds.max_indicator_hits {
        reasons.push(format!(
            "{indicator_hits} problem indicators (threshold {})",
            thresholds.max_indicator_hits
        ));
    }

    let meaningful_lines = text
        .lines()
        .filter(|line| line.split_whitespace().count() > 10)
        .count();
    if meaningful_lines < thresholds.min_meaningful_lines {
        reasons.push(format!(
            "only {meaningful_lines} meaningful lines (minimum {})",
            thresholds.min_meaningful_lines
        ));
    }

    if let Some((word, count, frequency)) = repetition_anomaly(&lowered, thresholds) {
        reasons.push(format!(
            "suspicious repetition of \"{word}\": {count} times ({:.1}% of words)",
            frequency * 100.0
        ));
    }

    if reasons.is_empty() {
        debug!(%url, "Content suitable");
        SuitabilityVerdict::suitable()
    } else {
        warn!(%url, reasons = ?reasons, "Content unsuitable");
        SuitabilityVerdict::unsuitable(reasons)
    }
}

/// Count case-insensitive occurrences of every problem indicator.
/// Multiple occurrences of one indicator each count.
fn count_indicator_hits(lowered: &str) -> usize {
    PROBLEM_INDICATORS
        .iter()
        .map(|needle| lowered.matches(needle).count())
        .sum()
}

/// Detect a single word dominating the text: frequency above the
/// configured ceiling AND an absolute count above the floor. Only
/// texts over 100 words are checked; shorter texts repeat legitimately.
fn repetition_anomaly(
    lowered: &str,
    thresholds: &SuitabilityThresholds,
) -> Option<(String, usize, f64)> {
    let words: Vec<&str> = lowered.split_whitespace().collect();
    if words.len() <= 100 {
        return None;
    }
    let total = words.len() as f64;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        if word.chars().count() <= 3 || STOPWORDS.contains(word) {
            continue;
        }
        *counts.entry(*word).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter(|(_, count)| {
            *count > thresholds.repetition_min_count
                && (*count as f64 / total) > thresholds.repetition_max_frequency
        })
        .max_by_key(|(_, count)| *count)
        .map(|(word, count)| (word.to_string(), count, count as f64 / total))
}
