//! Privileged scheme descriptors.
//!
//! Shells must learn which custom schemes behave like a standard web origin
//! before any window is created. [`privileged_scheme`] builds that descriptor:
//! everything a bundled web app needs is on, while CSP bypass and CORS stay
//! off unless overridden.

use serde::{Deserialize, Serialize};

/// Capabilities granted to a custom scheme by the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemePrivileges {
    pub standard: bool,
    pub secure: bool,
    #[serde(rename = "bypassCSP")]
    pub bypass_csp: bool,
    pub allow_service_workers: bool,
    #[serde(rename = "supportFetchAPI")]
    pub support_fetch_api: bool,
    pub cors_enabled: bool,
    pub stream: bool,
    pub code_cache: bool,
}

impl Default for SchemePrivileges {
    fn default() -> Self {
        Self {
            standard: true,
            secure: true,
            bypass_csp: false,
            allow_service_workers: true,
            support_fetch_api: true,
            cors_enabled: false,
            stream: true,
            code_cache: true,
        }
    }
}

/// Per-flag overrides; `None` keeps the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeOverrides {
    pub standard: Option<bool>,
    pub secure: Option<bool>,
    pub bypass_csp: Option<bool>,
    pub allow_service_workers: Option<bool>,
    pub support_fetch_api: Option<bool>,
    pub cors_enabled: Option<bool>,
    pub stream: Option<bool>,
    pub code_cache: Option<bool>,
}

impl PrivilegeOverrides {
    /// Apply the set overrides onto `base`.
    pub fn apply(&self, base: SchemePrivileges) -> SchemePrivileges {
        SchemePrivileges {
            standard: self.standard.unwrap_or(base.standard),
            secure: self.secure.unwrap_or(base.secure),
            bypass_csp: self.bypass_csp.unwrap_or(base.bypass_csp),
            allow_service_workers: self.allow_service_workers.unwrap_or(base.allow_service_workers),
            support_fetch_api: self.support_fetch_api.unwrap_or(base.support_fetch_api),
            cors_enabled: self.cors_enabled.unwrap_or(base.cors_enabled),
            stream: self.stream.unwrap_or(base.stream),
            code_cache: self.code_cache.unwrap_or(base.code_cache),
        }
    }
}

/// A scheme and the privileges to register it with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomScheme {
    pub scheme: String,
    pub privileges: SchemePrivileges,
}

/// Descriptor for registering `scheme` as privileged.
pub fn privileged_scheme(scheme: impl Into<String>, overrides: PrivilegeOverrides) -> CustomScheme {
    CustomScheme {
        scheme: scheme.into(),
        privileges: overrides.apply(SchemePrivileges::default()),
    }
}
