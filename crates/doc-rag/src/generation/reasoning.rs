//! Removal of model reasoning spans from chat replies

use regex::Regex;
use std::borrow::Cow;

use crate::config::ReasoningConfig;
use crate::error::{Error, Result};

/// Post-processing filter that drops `start ... end` reasoning spans
///
/// Matching is non-greedy, case-sensitive and spans lines. Text without a
/// complete marker pair passes through untouched.
#[derive(Debug, Clone)]
pub struct ReasoningFilter {
    pattern: Regex,
}

impl ReasoningFilter {
    /// Create a filter for the given marker pair
    pub fn new(start: &str, end: &str) -> Result<Self> {
        if start.is_empty() || end.is_empty() {
            return Err(Error::Config("reasoning markers must not be empty".to_string()));
        }
        let pattern = Regex::new(&format!(
            "(?s){}.*?{}",
            regex::escape(start),
            regex::escape(end)
        ))
        .map_err(|e| Error::Config(format!("invalid reasoning markers: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Create from configuration
    pub fn from_config(config: &ReasoningConfig) -> Result<Self> {
        Self::new(&config.start_marker, &config.end_marker)
    }

    /// Remove every reasoning span
    ///
    /// Removal repeats until no pair is left, so a span exposed by an earlier
    /// removal is also dropped and `strip(strip(x)) == strip(x)`.
    pub fn strip<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(text);
        loop {
            let next = match self.pattern.replace_all(&current, "") {
                Cow::Borrowed(_) => break,
                Cow::Owned(next) => next,
            };
            current = Cow::Owned(next);
        }
        current
    }

    /// Whether the text contains at least one complete span
    pub fn has_reasoning(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn think_filter() -> ReasoningFilter {
        ReasoningFilter::from_config(&ReasoningConfig::default()).unwrap()
    }

    #[test]
    fn test_strips_multiline_span() {
        let filter = think_filter();
        let reply = "<think>\nThe user asks about Newton.\nRecall F = ma.\n</think>\n\nForce equals mass times acceleration.";
        assert_eq!(
            filter.strip(reply).trim(),
            "Force equals mass times acceleration."
        );
    }

    #[test]
    fn test_non_greedy_keeps_text_between_spans() {
        let filter = think_filter();
        let reply = "<think>a</think>keep<think>b</think> this";
        assert_eq!(filter.strip(reply), "keep this");
    }

    #[test]
    fn test_unmatched_markers_pass_through() {
        let filter = think_filter();
        for reply in ["<think>never closed", "stray close</think>", "no markers at all", "</think>reversed<think>"] {
            let stripped = filter.strip(reply);
            assert!(matches!(stripped, Cow::Borrowed(_)));
            assert_eq!(stripped, reply);
        }
    }

    #[test]
    fn test_case_sensitive() {
        let filter = think_filter();
        let reply = "<THINK>loud</THINK>answer";
        assert_eq!(filter.strip(reply), reply);
    }

    #[test]
    fn test_idempotent_even_when_removal_exposes_a_pair() {
        let filter = think_filter();
        let reply = "<thi<think>x</think>nk>hidden</think>Final.";
        let once = filter.strip(reply).into_owned();
        let twice = filter.strip(&once).into_owned();
        assert_eq!(once, "Final.");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_custom_markers_are_literal() {
        let filter = ReasoningFilter::new("[[", "]]").unwrap();
        assert_eq!(filter.strip("a[[b.*c]]d"), "ad");
        assert!(filter.has_reasoning("x[[y]]"));
        assert!(ReasoningFilter::new("", "]]").is_err());
    }
}
