//! Proxy route lookup.
//!
//! # Responsibilities
//! - Own the normalized route proxy table
//! - Decide, per request path, whether to forward or resolve locally
//! - Remember every decision for the lifetime of the router
//!
//! # Design Decisions
//! - Immutable table after construction
//! - Decisions cached by request path with no eviction; the table never changes
//! - Explicit [`ProxyDecision::Local`] rather than a silent default

use dashmap::DashMap;

use crate::routing::matcher::longest_match;
use crate::routing::rule::ProxyTable;

/// Outcome of proxy resolution for one request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDecision {
    /// Not proxied: no key matched, or the most specific key is an ignore rule.
    Local,
    /// Forward to `url`, matched under `key`.
    Forward { key: String, url: String },
}

/// A decision together with whether it came from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub decision: ProxyDecision,
    pub cache_hit: bool,
}

/// Route proxy table plus its resolution cache.
#[derive(Debug, Default)]
pub struct ProxyRouter {
    table: ProxyTable,
    cache: DashMap<String, ProxyDecision>,
}

impl ProxyRouter {
    pub fn new(table: ProxyTable) -> Self {
        Self {
            table,
            cache: DashMap::new(),
        }
    }

    pub fn table(&self) -> &ProxyTable {
        &self.table
    }

    /// Resolve `request_path`, consulting and filling the cache.
    pub fn resolve(&self, request_path: &str) -> Resolved {
        if let Some(decision) = self.cache.get(request_path) {
            return Resolved {
                decision: decision.value().clone(),
                cache_hit: true,
            };
        }

        let decision = Self::decide(&self.table, request_path);
        self.cache.insert(request_path.to_string(), decision.clone());
        Resolved {
            decision,
            cache_hit: false,
        }
    }

    /// Uncached decision for `request_path` against `table`.
    pub fn decide(table: &ProxyTable, request_path: &str) -> ProxyDecision {
        match longest_match(table, request_path) {
            Some((key, rule)) => match rule.target(key, request_path) {
                Some(url) => ProxyDecision::Forward {
                    key: key.to_string(),
                    url,
                },
                None => ProxyDecision::Local,
            },
            None => ProxyDecision::Local,
        }
    }

    /// Number of cached decisions.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
