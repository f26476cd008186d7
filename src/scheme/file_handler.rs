//! Handler for the `file` scheme.
//!
//! A lighter sibling of the scheme router for shells that load the bundle
//! through `file://` URLs: no caches, no error page, and a failed read is
//! answered with a 404 carrying the failure text.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Response, StatusCode};
use percent_encoding::percent_decode_str;
use url::Url;

use crate::files::safety::local_target;
use crate::http::fetch::{FetchError, Fetcher};
use crate::http::request::{RequestInit, SchemeRequest};
use crate::http::response;
use crate::routing::{ProxyDecision, ProxyRouter, ProxyTable};
use crate::scheme::registry::SchemeHandle;
use crate::scheme::types::{HandlerResult, RegisterError, SchemeHandler};

pub const FILE_SCHEME: &str = "file";

/// Serves `file://` requests from `base_path`, forwarding proxied prefixes.
#[derive(Debug)]
pub struct FileSchemeHandler {
    base_path: PathBuf,
    table: ProxyTable,
    fetcher: Arc<dyn Fetcher>,
}

/// Install a [`FileSchemeHandler`] for the `file` scheme on `handle`.
pub fn register_file_handler<H>(
    handle: &H,
    base_path: impl Into<PathBuf>,
    table: ProxyTable,
    fetcher: Arc<dyn Fetcher>,
) -> Result<Arc<FileSchemeHandler>, RegisterError>
where
    H: SchemeHandle + ?Sized,
{
    let handler = Arc::new(FileSchemeHandler {
        base_path: base_path.into(),
        table,
        fetcher,
    });
    handle.handle(FILE_SCHEME, handler.clone())?;
    Ok(handler)
}

#[async_trait]
impl SchemeHandler for FileSchemeHandler {
    async fn handle(&self, request: SchemeRequest) -> HandlerResult {
        let raw = request.url.strip_prefix("file://").unwrap_or(&request.url);
        let path = percent_decode_str(raw).decode_utf8_lossy().into_owned();

        if let ProxyDecision::Forward { url, .. } = ProxyRouter::decide(&self.table, &path) {
            tracing::trace!(path = %path, final_url = %url, "Forwarding file request");
            return Ok(self.fetcher.fetch(&url, RequestInit::default()).await?);
        }

        let target = match local_target(&self.base_path, &path) {
            Ok(target) => target,
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "Rejected file request");
                return Ok(response::unsafe_path());
            }
        };

        let fetched = match Url::from_file_path(&target.original) {
            Ok(url) => self.fetcher.fetch(url.as_str(), RequestInit::bypass()).await,
            Err(()) => Err(FetchError::InvalidUrl(target.original.display().to_string())),
        };

        match fetched {
            Ok(response) => Ok(response),
            Err(err) => {
                let mut not_found = Response::new(Body::from(err.to_string()));
                *not_found.status_mut() = StatusCode::NOT_FOUND;
                Ok(not_found)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::fetch::NetFetcher;
    use crate::routing::ProxyRule;
    use crate::scheme::registry::SchemeRegistry;
    use crate::scheme::types::SchemeError;

    #[tokio::test]
    async fn test_serves_relative_to_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "home").unwrap();

        let registry = SchemeRegistry::new();
        register_file_handler(&registry, dir.path(), ProxyTable::new(), Arc::new(NetFetcher::new()))
            .unwrap();

        let response = registry
            .dispatch(SchemeRequest::get("file:///index.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"home");
    }

    #[tokio::test]
    async fn test_missing_file_is_404_with_reason() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SchemeRegistry::new();
        register_file_handler(&registry, dir.path(), ProxyTable::new(), Arc::new(NetFetcher::new()))
            .unwrap();

        let response = registry
            .dispatch(SchemeRequest::get("file:///missing.js"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("missing.js"));
    }

    #[tokio::test]
    async fn test_proxy_prefix_is_forwarded() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SchemeRegistry::new();
        let table = ProxyTable::new().route("/api", ProxyRule::redirect("http://127.0.0.1:1"));
        register_file_handler(&registry, dir.path(), table, Arc::new(NetFetcher::new())).unwrap();

        let result = registry
            .dispatch(SchemeRequest::get("file:///api/users"))
            .await
            .unwrap();
        assert!(matches!(result, Err(SchemeError::Fetch(FetchError::Upstream(_)))));
    }
}
