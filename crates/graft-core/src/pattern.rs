//! Match patterns for deciding where a content script applies.
//!
//! A pattern is either the sentinel `<all_urls>` or a glob in which `*`
//! matches any run of characters (including none) and every other character
//! matches itself:
//! - `<all_urls>` - Every document
//! - `https://a.test/page` - Exactly that page
//! - `https://*.example.com/*` - Any page on any subdomain of example.com
//!
//! Patterns are anchored at both ends and evaluated against
//! [`DocumentUrl::match_target`], so query strings and fragments never
//! influence the result.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document_url::DocumentUrl;
use crate::error::PatternError;

/// Sentinel pattern that matches every document.
pub const ALL_URLS: &str = "<all_urls>";

/// Upper bound on the compiled size of a single pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone)]
enum Matcher {
    All,
    Exact,
    Glob(Regex),
}

/// A compiled match pattern.
#[derive(Debug, Clone)]
pub struct MatchPattern {
    /// The original pattern string.
    pattern: String,
    matcher: Matcher,
}

impl MatchPattern {
    /// Compile a match pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is empty or its compiled form
    /// exceeds the size limit.
    pub fn new(pattern: impl Into<String>) -> Result<Self, PatternError> {
        let pattern = pattern.into();

        if pattern.is_empty() {
            return Err(PatternError {
                pattern,
                reason: "pattern must not be empty".to_string(),
            });
        }

        let matcher = if pattern == ALL_URLS {
            Matcher::All
        } else if pattern.contains('*') {
            let source = glob_to_regex(&pattern);
            let regex = RegexBuilder::new(&source)
                .size_limit(PATTERN_SIZE_LIMIT)
                .build()
                .map_err(|e| PatternError {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
            Matcher::Glob(regex)
        } else {
            Matcher::Exact
        };

        Ok(Self { pattern, matcher })
    }

    /// Check if this pattern matches a document URL.
    #[must_use]
    pub fn matches(&self, url: &DocumentUrl) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Exact => self.pattern == url.match_target(),
            Matcher::Glob(regex) => regex.is_match(url.match_target()),
        }
    }

    /// Get the pattern string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check if this is the `<all_urls>` sentinel.
    #[must_use]
    pub fn is_all_urls(&self) -> bool {
        matches!(self.matcher, Matcher::All)
    }
}

/// Translate a glob into an anchored regex, escaping everything except `*`.
fn glob_to_regex(pattern: &str) -> String {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    format!("^{body}$")
}

/// Check whether `pattern` applies to `url`.
///
/// A pattern that fails to compile is logged and treated as not matching.
#[must_use]
pub fn matches(pattern: &str, url: &DocumentUrl) -> bool {
    match MatchPattern::new(pattern) {
        Ok(compiled) => compiled.matches(url),
        Err(e) => {
            warn!(pattern, error = %e, "Ignoring malformed match pattern");
            false
        },
    }
}

impl std::fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl Serialize for MatchPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.pattern.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MatchPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let pattern = String::deserialize(deserializer)?;
        Self::new(pattern).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for MatchPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for MatchPattern {}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> DocumentUrl {
        DocumentUrl::parse(s).unwrap()
    }

    #[test]
    fn all_urls_matches_everything() {
        for u in [
            "https://a.test/page",
            "http://localhost:3000/",
            "file:///etc/hosts",
            "about:blank",
        ] {
            assert!(matches(ALL_URLS, &url(u)), "{u}");
        }
        assert!(MatchPattern::new(ALL_URLS).unwrap().is_all_urls());
    }

    #[test]
    fn subdomain_wildcard() {
        let pattern = "https://*.example.com/*";
        assert!(matches(pattern, &url("https://sub.example.com/path?x=1")));
        assert!(!matches(pattern, &url("https://example.org/path")));
    }

    #[test]
    fn literal_pattern_requires_exact_equality() {
        let pattern = "https://a.test/page";
        assert!(matches(pattern, &url("https://a.test/page")));
        assert!(matches(pattern, &url("https://a.test/page?q=1#top")));
        assert!(!matches(pattern, &url("https://a.test/page/more")));
        assert!(!matches(pattern, &url("https://a.test/pag")));
        assert!(!matches(pattern, &url("http://a.test/page")));
    }

    #[test]
    fn matching_is_anchored() {
        // Without anchoring this would match as a substring.
        assert!(!matches("a.test/*", &url("https://a.test/page")));
        assert!(!matches("https://a.test", &url("https://a.test/")));
    }

    #[test]
    fn star_matches_empty_run() {
        assert!(matches("https://a.test/*", &url("https://a.test/")));
        assert!(matches("*", &url("https://a.test/")));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        // '.' must not act as "any character".
        assert!(!matches("https://a.test/*", &url("https://aXtest/page")));
        assert!(matches(
            "https://a.test/(x)+/*",
            &url("https://a.test/(x)+/y")
        ));
        assert!(!matches("https://a.test/(x)+/*", &url("https://a.test/xx/y")));
    }

    #[test]
    fn multiple_wildcards() {
        let pattern = "*://*/docs/*";
        assert!(matches(pattern, &url("https://host.test/docs/intro")));
        assert!(matches(pattern, &url("http://other:81/docs/")));
        assert!(!matches(pattern, &url("https://host.test/blog/intro")));
    }

    #[test]
    fn empty_pattern_is_rejected_and_never_matches() {
        let err = MatchPattern::new("").unwrap_err();
        assert_eq!(err.pattern, "");
        assert!(!matches("", &url("https://a.test/")));
    }

    #[test]
    fn pattern_round_trips_through_serde() {
        let pattern: MatchPattern = serde_json::from_str("\"https://*.a.test/*\"").unwrap();
        assert_eq!(pattern.as_str(), "https://*.a.test/*");
        assert_eq!(serde_json::to_string(&pattern).unwrap(), "\"https://*.a.test/*\"");
    }
}
