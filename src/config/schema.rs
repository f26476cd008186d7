//! Configuration schema definitions.
//!
//! This module defines the configuration structure of the shell host.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::routing::{ProxyRule, ProxyTable};
use crate::scheme::PrivilegeOverrides;

/// Root configuration for the shell host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ShellConfig {
    /// Loopback listener the host serves the scheme on.
    pub listener: ListenerConfig,

    /// The custom scheme and the bundle it serves.
    pub scheme: SchemeConfig,

    /// Path prefixes forwarded to a backing origin, in priority-neutral order.
    pub route_proxies: Vec<RouteProxyConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ShellConfig {
    /// Normalize the configured route proxies into a table.
    pub fn proxy_table(&self) -> ProxyTable {
        self.route_proxies
            .iter()
            .filter_map(|route| route.to_rule().map(|rule| (route.prefix.clone(), rule)))
            .collect()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8300").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8300".to_string(),
        }
    }
}

/// Custom scheme configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemeConfig {
    /// Scheme name without the `://` (e.g., "app").
    pub name: String,

    /// Directory the bundled web assets are served from.
    pub base_path: String,

    /// Page served for unmatched resources, relative to `base_path`.
    pub error_page: String,

    /// Emit per-request trace events. Noisy, meant for debugging.
    pub log_requests: bool,

    /// Overrides applied on top of the default scheme privileges.
    pub privileges: PrivilegeOverrides,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            name: "app".to_string(),
            base_path: ".dist/electron/.output/public".to_string(),
            error_page: "404.html".to_string(),
            log_requests: false,
            privileges: PrivilegeOverrides::default(),
        }
    }
}

/// A single route proxy entry.
///
/// ```toml
/// [[route_proxies]]
/// prefix = "/api"
/// url = "http://localhost:3000"
///
/// [[route_proxies]]
/// prefix = "/api/local"
/// ignore = true
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteProxyConfig {
    /// Request path prefix to match.
    pub prefix: String,

    /// Base URL requests are forwarded to.
    #[serde(default)]
    pub url: Option<String>,

    /// Serve matching requests locally instead of proxying them.
    #[serde(default)]
    pub ignore: bool,

    /// Remove the matched prefix before appending the request path to `url`.
    #[serde(default)]
    pub strip_prefix: bool,
}

impl RouteProxyConfig {
    /// The tagged rule this entry describes, or `None` when it describes nothing.
    pub fn to_rule(&self) -> Option<ProxyRule> {
        if self.ignore {
            return Some(ProxyRule::Ignore);
        }
        let url = self.url.clone()?;
        Some(if self.strip_prefix {
            ProxyRule::redirect_with(url, crate::routing::rule::strip_prefix)
        } else {
            ProxyRule::redirect(url)
        })
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: ShellConfig = toml::from_str("").unwrap();
        assert_eq!(config.scheme.name, "app");
        assert_eq!(config.scheme.error_page, "404.html");
        assert!(config.route_proxies.is_empty());
        assert!(config.proxy_table().is_empty());
    }

    #[test]
    fn test_route_proxies_keep_order() {
        let config: ShellConfig = toml::from_str(
            r#"
            [[route_proxies]]
            prefix = "/api"
            url = "http://localhost:3000"

            [[route_proxies]]
            prefix = "/api/local"
            ignore = true

            [[route_proxies]]
            prefix = "/auth"
            url = "http://localhost:4000"
            strip_prefix = true
            "#,
        )
        .unwrap();

        let table = config.proxy_table();
        let keys: Vec<&str> = table.keys().collect();
        assert_eq!(keys, vec!["/api", "/api/local", "/auth"]);
        assert!(matches!(table.get("/api/local"), Some(ProxyRule::Ignore)));
        assert_eq!(
            table.get("/auth").unwrap().target("/auth", "/auth/login"),
            Some("http://localhost:4000/login".to_string())
        );
    }
}
