//! Outbound fetch capability.
//!
//! # Responsibilities
//! - Fetch `http:` and `https:` URLs for proxied requests
//! - Read `file:` URLs for bundled assets
//! - Hand URLs under a registered custom scheme back to that scheme's handler,
//!   unless the caller asked to bypass custom handlers
//!
//! # Design Decisions
//! - No timeouts and no retries: a hung backend hangs the request
//! - Proxied requests are sent as GET with the forwarded headers; allow-listed
//!   fields with a wire form (`referrer`, `destination`, `mode`, `cache`) become
//!   headers, the rest are only meaningful to custom [`Fetcher`]s
//! - Registry access is held weakly: the registry owns the handlers that own
//!   the fetcher

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderName, HeaderValue, Request, Response, StatusCode};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::Url;

use crate::http::request::{RequestInit, SchemeRequest};
use crate::http::response::content_type_for;
use crate::scheme::{SchemeError, SchemeHandle, SchemeRegistry};

/// Failure of an outbound fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid url: {0}")]
    InvalidUrl(String),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("Failed to build request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("Handler for {scheme} failed: {source}")]
    Handler {
        scheme: String,
        #[source]
        source: Box<SchemeError>,
    },
}

/// Performs an outbound fetch for a URL.
#[async_trait]
pub trait Fetcher: Send + Sync + fmt::Debug {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<Response<Body>, FetchError>;
}

/// Default [`Fetcher`]: hyper client for `http:`/`https:`, disk reads for `file:`.
#[derive(Debug, Clone)]
pub struct NetFetcher {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    registry: Option<Weak<SchemeRegistry>>,
}

impl Default for NetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NetFetcher {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(https_connector());
        Self {
            client,
            registry: None,
        }
    }

    /// Let URLs under schemes registered in `registry` be served by their handlers.
    pub fn with_registry(mut self, registry: &Arc<SchemeRegistry>) -> Self {
        self.registry = Some(Arc::downgrade(registry));
        self
    }

    async fn fetch_file(&self, url: &Url) -> Result<Response<Body>, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let bytes = tokio::fs::read(&path).await.map_err(|source| FetchError::Io {
            path: path.clone(),
            source,
        })?;

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type_for(&path))
            .header(header::CONTENT_LENGTH, bytes.len())
            .body(Body::from(bytes))?;
        Ok(response)
    }

    async fn fetch_http(&self, url: &Url, init: RequestInit) -> Result<Response<Body>, FetchError> {
        let mut request = Request::get(url.as_str()).body(Body::empty())?;

        let headers = request.headers_mut();
        for (name, value) in init.headers.iter() {
            headers.append(name.clone(), value.clone());
        }
        insert_field(headers, header::REFERER, init.referrer.as_deref());
        insert_field(headers, HeaderName::from_static("sec-fetch-dest"), init.destination.as_deref());
        insert_field(headers, HeaderName::from_static("sec-fetch-mode"), init.mode.as_deref());
        let cache_control = match init.cache.as_deref() {
            Some("no-store") => Some("no-store"),
            Some("no-cache") | Some("reload") => Some("no-cache"),
            _ => None,
        };
        insert_field(headers, header::CACHE_CONTROL, cache_control);

        let response: Response<Incoming> = self.client.request(request).await?;
        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    fn registry(&self) -> Option<Arc<SchemeRegistry>> {
        self.registry.as_ref().and_then(Weak::upgrade)
    }
}

/// TLS connector trusting the platform roots, or the bundled webpki roots
/// when none can be loaded. Plain `http:` still goes through it.
fn https_connector() -> HttpsConnector<HttpConnector> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    let builder = match HttpsConnectorBuilder::new().with_native_roots() {
        Ok(builder) => builder,
        Err(err) => {
            tracing::warn!(error = %err, "No native root certificates, using webpki roots");
            HttpsConnectorBuilder::new().with_webpki_roots()
        }
    };
    builder.https_or_http().enable_all_versions().build()
}

fn insert_field(headers: &mut axum::http::HeaderMap, name: HeaderName, value: Option<&str>) {
    if let Some(value) = value.and_then(|v| HeaderValue::from_str(v).ok()) {
        headers.insert(name, value);
    }
}

#[async_trait]
impl Fetcher for NetFetcher {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<Response<Body>, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        let scheme = parsed.scheme().to_string();

        if !init.bypass_custom_handlers {
            if let Some(registry) = self.registry().filter(|r| r.is_handled(&scheme)) {
                let mut request = SchemeRequest::get(url);
                request.headers = init.headers;
                request.destination = init.destination;
                request.referrer = init.referrer;
                request.referrer_policy = init.referrer_policy;
                request.mode = init.mode;
                request.credentials = init.credentials;
                request.cache = init.cache;
                request.redirect = init.redirect;
                request.integrity = init.integrity;
                request.keepalive = init.keepalive;

                return match registry.dispatch(request).await {
                    Some(Ok(response)) => Ok(response),
                    Some(Err(err)) => Err(FetchError::Handler {
                        scheme,
                        source: Box::new(err),
                    }),
                    None => Err(FetchError::UnsupportedScheme(scheme)),
                };
            }
        }

        match scheme.as_str() {
            "file" => self.fetch_file(&parsed).await,
            "http" | "https" => self.fetch_http(&parsed, init).await,
            _ => Err(FetchError::UnsupportedScheme(scheme)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<p>hi</p>").unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let response = NetFetcher::new()
            .fetch(url.as_str(), RequestInit::bypass())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "text/html");
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<p>hi</p>");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("nope.html")).unwrap();

        let err = NetFetcher::new()
            .fetch(url.as_str(), RequestInit::bypass())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
    }

    #[tokio::test]
    async fn test_https_goes_to_the_client() {
        // Nothing listens on port 1, so the client reports a connect failure.
        let err = NetFetcher::new()
            .fetch("https://127.0.0.1:1/api/users", RequestInit::bypass())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Upstream(_)), "{err:?}");
    }

    #[tokio::test]
    async fn test_unknown_scheme_without_registry() {
        let err = NetFetcher::new()
            .fetch("app://bundle/index.html", RequestInit::default())
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::UnsupportedScheme(s) if s == "app"));
    }
}
