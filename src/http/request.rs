//! Intercepted requests and the fields forwarded from them.
//!
//! # Design Decisions
//! - A [`SchemeRequest`] carries everything the host knows about a request
//! - Only the allow-listed fields survive into a [`RequestInit`] for an
//!   outbound fetch; method, body and navigation flags never pass through
//! - Request paths are taken from the URL pathname and percent-decoded;
//!   the host part is ignored

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

/// A request received under a registered scheme.
#[derive(Debug, Clone)]
pub struct SchemeRequest {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub destination: Option<String>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<String>,
    pub mode: Option<String>,
    pub credentials: Option<String>,
    pub cache: Option<String>,
    pub redirect: Option<String>,
    pub integrity: Option<String>,
    pub keepalive: bool,
    pub is_reload_navigation: bool,
    pub is_history_navigation: bool,
    pub body: Bytes,
}

impl SchemeRequest {
    /// A bodiless GET for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: HeaderMap::new(),
            destination: None,
            referrer: None,
            referrer_policy: None,
            mode: None,
            credentials: None,
            cache: None,
            redirect: None,
            integrity: None,
            keepalive: false,
            is_reload_navigation: false,
            is_history_navigation: false,
            body: Bytes::new(),
        }
    }

    /// The subset of this request that may be forwarded to an outbound fetch.
    pub fn forwardable(&self) -> RequestInit {
        RequestInit {
            headers: self.headers.clone(),
            destination: self.destination.clone(),
            referrer: self.referrer.clone(),
            referrer_policy: self.referrer_policy.clone(),
            mode: self.mode.clone(),
            credentials: self.credentials.clone(),
            cache: self.cache.clone(),
            redirect: self.redirect.clone(),
            integrity: self.integrity.clone(),
            keepalive: self.keepalive,
            bypass_custom_handlers: false,
        }
    }
}

/// Options for an outbound fetch.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub headers: HeaderMap,
    pub destination: Option<String>,
    pub referrer: Option<String>,
    pub referrer_policy: Option<String>,
    pub mode: Option<String>,
    pub credentials: Option<String>,
    pub cache: Option<String>,
    pub redirect: Option<String>,
    pub integrity: Option<String>,
    pub keepalive: bool,
    /// Skip custom scheme handlers, including the one issuing this fetch.
    pub bypass_custom_handlers: bool,
}

impl RequestInit {
    /// Empty options with handler bypass enabled, for reading bundled files.
    pub fn bypass() -> Self {
        Self {
            bypass_custom_handlers: true,
            ..Self::default()
        }
    }
}

/// The URL of a request could not be turned into a path.
#[derive(Debug, Error)]
pub enum RequestPathError {
    #[error("Invalid request url: {0}")]
    Parse(#[from] url::ParseError),
    #[error("Request path is not valid UTF-8 once decoded: {0}")]
    Encoding(#[from] std::str::Utf8Error),
}

/// Percent-decoded pathname of `url`.
pub fn request_path(url: &str) -> Result<String, RequestPathError> {
    let parsed = Url::parse(url)?;
    let decoded = percent_decode_str(parsed.path()).decode_utf8()?;
    Ok(decoded.into_owned())
}
