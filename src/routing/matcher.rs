//! Route matching logic.
//!
//! # Responsibilities
//! - Match request path prefixes (case-sensitive, plain string prefix)
//! - Pick the most specific rule when several keys match
//!
//! # Design Decisions
//! - Longest matching key wins
//! - Equal-length matches resolve to the first inserted key
//! - No regex, a linear scan over the table is enough for typical route counts

use crate::routing::rule::{ProxyRule, ProxyTable};

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns true if `path` starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// The most specific table entry whose key is a prefix of `path`.
pub fn longest_match<'a>(table: &'a ProxyTable, path: &str) -> Option<(&'a str, &'a ProxyRule)> {
    let mut best: Option<(&str, &ProxyRule)> = None;
    for (key, rule) in table.iter() {
        if !PathPrefixMatcher::new(key).matches(path) {
            continue;
        }
        match best {
            Some((current, _)) if current.len() >= key.len() => {}
            _ => best = Some((key, rule)),
        }
    }
    best
}
