//! Environment lookups.
//!
//! The router and the path resolver only ever ask "is this variable set" or
//! "what is its value". Routing both questions through [`EnvSource`] lets
//! tests pin the environment without mutating the process-wide one.

use std::collections::HashMap;

/// Variables whose presence indicates that a backing server origin is configured.
pub const BACKEND_ORIGIN_VARS: [&str; 3] = ["PUBLIC_SERVER_URL", "VITE_DEV_SERVER_URL", "VITE_DEV_URL"];

/// Where environment variables are read from.
#[derive(Debug, Clone, Default)]
pub enum EnvSource {
    /// The real process environment.
    #[default]
    Process,
    /// A fixed set of variables.
    Fixed(HashMap<String, String>),
}

impl EnvSource {
    /// Build a fixed environment from key/value pairs.
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// An environment with no variables set.
    pub fn empty() -> Self {
        Self::Fixed(HashMap::new())
    }

    /// Value of `key`, if set and valid unicode.
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            EnvSource::Process => std::env::var(key).ok(),
            EnvSource::Fixed(vars) => vars.get(key).cloned(),
        }
    }

    /// Whether `key` is set at all.
    pub fn is_set(&self, key: &str) -> bool {
        match self {
            EnvSource::Process => std::env::var_os(key).is_some(),
            EnvSource::Fixed(vars) => vars.contains_key(key),
        }
    }

    /// Whether any backend origin indicator is present.
    pub fn has_backend_origin(&self) -> bool {
        BACKEND_ORIGIN_VARS.iter().any(|key| self.is_set(key))
    }
}
