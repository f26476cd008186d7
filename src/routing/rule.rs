//! Proxy rules and the route proxy table.
//!
//! # Design Decisions
//! - Configuration shapes (`"url"`, `{ url, convert_path }`, `{ ignore }`) are
//!   normalized into [`ProxyRule`] once, when the table is built
//! - The table keeps insertion order; it is the tie-break for equal-length keys
//! - Re-inserting an existing key replaces the rule in place

use std::fmt;
use std::sync::Arc;

/// Computes the final target from `(matched_key, base_url, request_path)`.
pub type ConvertPath = Arc<dyn Fn(&str, &str, &str) -> String + Send + Sync>;

/// What to do with a request whose path starts with a table key.
#[derive(Clone)]
pub enum ProxyRule {
    /// Match, but resolve the request as a local file.
    Ignore,
    /// Forward the request to `url`.
    Redirect {
        url: String,
        convert_path: Option<ConvertPath>,
    },
}

impl ProxyRule {
    /// Forward to `url + request_path`.
    pub fn redirect(url: impl Into<String>) -> Self {
        ProxyRule::Redirect {
            url: url.into(),
            convert_path: None,
        }
    }

    /// Forward to whatever `convert_path(key, url, request_path)` returns.
    pub fn redirect_with<F>(url: impl Into<String>, convert_path: F) -> Self
    where
        F: Fn(&str, &str, &str) -> String + Send + Sync + 'static,
    {
        ProxyRule::Redirect {
            url: url.into(),
            convert_path: Some(Arc::new(convert_path)),
        }
    }

    /// The final URL for a request matched under `key`, or `None` for [`ProxyRule::Ignore`].
    pub fn target(&self, key: &str, request_path: &str) -> Option<String> {
        match self {
            ProxyRule::Ignore => None,
            ProxyRule::Redirect {
                url,
                convert_path: Some(convert),
            } => Some(convert(key, url, request_path)),
            ProxyRule::Redirect {
                url,
                convert_path: None,
            } => Some(format!("{url}{request_path}")),
        }
    }
}

impl fmt::Debug for ProxyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyRule::Ignore => f.write_str("Ignore"),
            ProxyRule::Redirect { url, convert_path } => f
                .debug_struct("Redirect")
                .field("url", url)
                .field("convert_path", &convert_path.as_ref().map(|_| "<fn>"))
                .finish(),
        }
    }
}

/// Path converter that drops the matched key before appending the rest of the path.
pub fn strip_prefix(key: &str, url: &str, request_path: &str) -> String {
    let rest = request_path.strip_prefix(key).unwrap_or(request_path);
    format!("{url}{rest}")
}

/// Ordered mapping from path prefix to [`ProxyRule`].
#[derive(Debug, Clone, Default)]
pub struct ProxyTable {
    entries: Vec<(String, ProxyRule)>,
}

impl ProxyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn route(mut self, prefix: impl Into<String>, rule: ProxyRule) -> Self {
        self.insert(prefix, rule);
        self
    }

    /// Insert a rule, replacing an existing rule for the same prefix without moving it.
    pub fn insert(&mut self, prefix: impl Into<String>, rule: ProxyRule) {
        let prefix = prefix.into();
        match self.entries.iter_mut().find(|(key, _)| *key == prefix) {
            Some(entry) => entry.1 = rule,
            None => self.entries.push((prefix, rule)),
        }
    }

    pub fn get(&self, prefix: &str) -> Option<&ProxyRule> {
        self.entries
            .iter()
            .find(|(key, _)| key == prefix)
            .map(|(_, rule)| rule)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProxyRule)> {
        self.entries.iter().map(|(key, rule)| (key.as_str(), rule))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ProxyRule)> for ProxyTable {
    fn from_iter<I: IntoIterator<Item = (K, ProxyRule)>>(iter: I) -> Self {
        let mut table = ProxyTable::new();
        for (prefix, rule) in iter {
            table.insert(prefix, rule);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_concatenates_literally() {
        let rule = ProxyRule::redirect("http://localhost:3000");
        assert_eq!(
            rule.target("/api", "/api/users"),
            Some("http://localhost:3000/api/users".to_string())
        );
    }

    #[test]
    fn test_convert_path_receives_key_url_and_path() {
        let rule = ProxyRule::redirect_with("http://backend", |key, url, path| {
            format!("{url}/v2{}?from={key}", &path[key.len()..])
        });
        assert_eq!(
            rule.target("/api", "/api/users"),
            Some("http://backend/v2/users?from=/api".to_string())
        );
    }

    #[test]
    fn test_ignore_has_no_target() {
        assert_eq!(ProxyRule::Ignore.target("/x", "/x/y"), None);
    }

    #[test]
    fn test_reinsert_keeps_position() {
        let table = ProxyTable::new()
            .route("/a", ProxyRule::redirect("http://a"))
            .route("/b", ProxyRule::redirect("http://b"))
            .route("/a", ProxyRule::Ignore);

        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["/a", "/b"]);
        assert!(matches!(table.get("/a"), Some(ProxyRule::Ignore)));
    }
}
