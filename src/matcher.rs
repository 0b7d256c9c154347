//! Subscription scope.
//!
//! A [`Matcher`] decides which event names a subscription receives. Matching
//! is a single exhaustive `match`; there is no per-variant dispatch.

use crate::{Error, Result};
use regex::Regex;
use std::fmt;

/// Which events a subscription receives.
#[derive(Debug, Clone, Default)]
pub enum Matcher {
    /// Only events whose name is identical
    Exact(String),
    /// Events whose name the regex finds a match in (unanchored)
    Pattern(Regex),
    /// Every event
    #[default]
    All,
}

impl Matcher {
    /// Match a single event name
    pub fn exact(name: impl Into<String>) -> Self {
        Matcher::Exact(name.into())
    }

    /// Compile a pattern matcher, failing on malformed input
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(pattern)
            .map(Matcher::Pattern)
            .map_err(|source| Error::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Match every event whose name starts with `prefix`
    pub fn prefix(prefix: &str) -> Result<Self> {
        Self::pattern(&format!("^{}", regex::escape(prefix)))
    }

    /// Check whether `name` is in scope
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Exact(expected) => expected == name,
            Matcher::Pattern(regex) => regex.is_match(name),
            Matcher::All => true,
        }
    }

    /// True for an `Exact` matcher naming exactly `name`
    pub fn is_exact(&self, name: &str) -> bool {
        matches!(self, Matcher::Exact(expected) if expected == name)
    }
}

impl From<&str> for Matcher {
    fn from(name: &str) -> Self {
        Matcher::Exact(name.to_string())
    }
}

impl From<String> for Matcher {
    fn from(name: String) -> Self {
        Matcher::Exact(name)
    }
}

impl From<Regex> for Matcher {
    fn from(regex: Regex) -> Self {
        Matcher::Pattern(regex)
    }
}

impl<T: Into<Matcher>> From<Option<T>> for Matcher {
    fn from(matcher: Option<T>) -> Self {
        matcher.map_or(Matcher::All, Into::into)
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(name) => write!(f, "{}", name),
            Matcher::Pattern(regex) => write!(f, "/{}/", regex.as_str()),
            Matcher::All => write!(f, "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_matches_identical_only() {
        let matcher = Matcher::exact("render");
        assert!(matcher.matches("render"));
        assert!(!matcher.matches("render.partial"));
        assert!(!matcher.matches("Render"));
        assert!(matcher.is_exact("render"));
    }

    #[test]
    fn test_pattern_matches_prefix() {
        let matcher = Matcher::pattern(r"^sql\.").unwrap();
        assert!(matcher.matches("sql.query"));
        assert!(!matcher.matches("http.request"));
        assert!(!matcher.is_exact("sql.query"));
    }

    #[test]
    fn test_pattern_is_unanchored() {
        let matcher = Matcher::pattern("cache").unwrap();
        assert!(matcher.matches("cache_read.active_support"));
        assert!(matcher.matches("read.cache"));
    }

    #[test]
    fn test_prefix_escapes_metacharacters() {
        let matcher = Matcher::prefix("sql.").unwrap();
        assert!(matcher.matches("sql.query"));
        assert!(!matcher.matches("sqlxquery"));
    }

    #[test]
    fn test_malformed_pattern_fails() {
        let err = Matcher::pattern("sql.(").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "sql.("));
    }

    #[test]
    fn test_conversions() {
        assert!(matches!(Matcher::from("x"), Matcher::Exact(_)));
        assert!(matches!(Matcher::from(None::<&str>), Matcher::All));
        assert!(matches!(Matcher::from(Some("x")), Matcher::Exact(_)));
        assert!(matches!(Matcher::default(), Matcher::All));
        assert_eq!(Matcher::pattern("^a").unwrap().to_string(), "/^a/");
    }

    proptest! {
        #[test]
        fn all_matches_any_name(name in ".*") {
            prop_assert!(Matcher::All.matches(&name));
        }

        #[test]
        fn exact_matches_itself(name in "[a-z_.]{0,24}", other in "[a-z_.]{0,24}") {
            let matcher = Matcher::exact(name.clone());
            prop_assert!(matcher.matches(&name));
            prop_assert_eq!(matcher.matches(&other), name == other);
        }

        #[test]
        fn prefix_agrees_with_starts_with(prefix in "[a-z.]{1,8}", name in "[a-z.]{0,16}") {
            let matcher = Matcher::prefix(&prefix).unwrap();
            prop_assert_eq!(matcher.matches(&name), name.starts_with(&prefix));
        }
    }
}
