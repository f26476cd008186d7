//! Scheme request router.
//!
//! Every request under the registered scheme produces exactly one outcome:
//! a proxied response, a bundled file, the error page, a 400 for an unsafe
//! or unparsable path, or a [`SchemeError`].
//!
//! # Data Flow
//! ```text
//! SchemeRequest
//!     → error page path (resolved once, memoized)
//!     → request path (URL pathname, percent-decoded)
//!     → ProxyRouter (cached by request path)
//!         Forward → fetch(final url, allow-listed fields) → response as-is
//!         Local   ↓
//!     → local_target (lexical join, reject escapes → 400)
//!     → FileResolver (cached by request URL)
//!         Some(path) → fetch(file url, bypass) → response
//!         None       → fetch(error page, bypass) → response
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use tokio::sync::OnceCell;
use url::Url;

use crate::config::env::EnvSource;
use crate::files::fs::{FileSystem, TokioFs};
use crate::files::resolver::FileResolver;
use crate::files::safety::{join_lexical, local_target};
use crate::http::fetch::{FetchError, Fetcher, NetFetcher};
use crate::http::request::{request_path, RequestInit, SchemeRequest};
use crate::http::response;
use crate::routing::{ProxyDecision, ProxyRouter, ProxyTable};
use crate::scheme::registry::SchemeHandle;
use crate::scheme::types::{HandlerResult, RegisterError, SchemeError, SchemeHandler};

/// Cache key the error page is resolved under. Cannot collide with a request URL.
pub const ERROR_PAGE_CACHE_KEY: &str = "404.html";

/// Default error page, relative to the base path.
pub const DEFAULT_ERROR_PAGE: &str = "404.html";

/// Optional knobs for [`register_handler`].
#[derive(Debug, Clone)]
pub struct RouterOptions {
    /// Emit trace/error events per request. Leave off outside debugging.
    pub log_requests: bool,
    /// Page served for unmatched resources, relative to the base path.
    pub error_page: String,
    /// Where backend origin indicators are read from.
    pub env: EnvSource,
    /// Outbound fetch capability. Defaults to a [`NetFetcher`] without registry access.
    pub fetcher: Option<Arc<dyn Fetcher>>,
    /// Stat capability. Defaults to [`TokioFs`].
    pub fs: Option<Arc<dyn FileSystem>>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            log_requests: false,
            error_page: DEFAULT_ERROR_PAGE.to_string(),
            env: EnvSource::Process,
            fetcher: None,
            fs: None,
        }
    }
}

impl RouterOptions {
    pub fn log_requests(mut self, enabled: bool) -> Self {
        self.log_requests = enabled;
        self
    }

    pub fn error_page(mut self, page: impl Into<String>) -> Self {
        self.error_page = page.into();
        self
    }

    pub fn env(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }
}

/// Install a [`SchemeRouter`] for `scheme` on `handle`.
///
/// Fails if `scheme` already has a handler, or if `table` is non-empty while
/// no backend origin indicator is set. `base_path` is not checked here; a
/// missing directory shows up per request as unresolved files.
pub fn register_handler<H>(
    handle: &H,
    scheme: &str,
    base_path: impl Into<PathBuf>,
    table: ProxyTable,
    options: RouterOptions,
) -> Result<Arc<SchemeRouter>, RegisterError>
where
    H: SchemeHandle + ?Sized,
{
    if handle.is_handled(scheme) {
        return Err(RegisterError::DuplicateHandler(scheme.to_string()));
    }
    if !table.is_empty() && !options.env.has_backend_origin() {
        return Err(RegisterError::MissingBackendConfiguration);
    }

    let router = Arc::new(SchemeRouter::new(scheme, base_path.into(), table, options));
    handle.handle(scheme, router.clone())?;

    tracing::info!(
        scheme = %scheme,
        base_path = %router.base_path.display(),
        proxies = router.proxies.table().len(),
        "Scheme router registered"
    );
    Ok(router)
}

/// Static file server plus reverse proxy for one custom scheme.
#[derive(Debug)]
pub struct SchemeRouter {
    scheme: String,
    base_path: PathBuf,
    error_page: String,
    log_requests: bool,
    proxies: ProxyRouter,
    files: FileResolver,
    fetcher: Arc<dyn Fetcher>,
    error_page_path: OnceCell<Option<PathBuf>>,
}

impl SchemeRouter {
    fn new(scheme: &str, base_path: PathBuf, table: ProxyTable, options: RouterOptions) -> Self {
        let fs = options.fs.unwrap_or_else(|| Arc::new(TokioFs));
        let fetcher = options
            .fetcher
            .unwrap_or_else(|| Arc::new(NetFetcher::new()));
        Self {
            scheme: scheme.to_string(),
            base_path,
            error_page: options.error_page,
            log_requests: options.log_requests,
            proxies: ProxyRouter::new(table),
            files: FileResolver::new(fs),
            fetcher,
            error_page_path: OnceCell::new(),
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Route one request.
    pub async fn route(&self, request: SchemeRequest) -> HandlerResult {
        let error_page = self.error_page_path().await;

        let request_path = match request_path(&request.url) {
            Ok(path) => path,
            Err(err) => {
                if self.log_requests {
                    tracing::error!(request_url = %request.url, error = %err, "Bad request url");
                }
                return Ok(response::invalid_url());
            }
        };

        let resolved = self.proxies.resolve(&request_path);
        if self.log_requests && resolved.cache_hit {
            tracing::trace!(
                request_path = %request_path,
                decision = ?resolved.decision,
                "Proxy cache hit"
            );
        }

        if let ProxyDecision::Forward { key, url } = resolved.decision {
            if self.log_requests {
                tracing::trace!(
                    request_url = %request.url,
                    proxy_key = %key,
                    request_path = %request_path,
                    final_url = %url,
                    "Fetching via proxy"
                );
            }
            return self
                .fetcher
                .fetch(&url, request.forwardable())
                .await
                .map_err(|err| {
                    if self.log_requests {
                        tracing::error!(request_url = %request.url, final_url = %url, error = %err, "Proxy fetch failed");
                    }
                    SchemeError::Fetch(err)
                });
        }

        let target = match local_target(&self.base_path, &request_path) {
            Ok(target) => target,
            Err(err) => {
                if self.log_requests {
                    tracing::error!(
                        request_url = %request.url,
                        method = %request.method,
                        referrer = ?request.referrer,
                        is_reload_navigation = request.is_reload_navigation,
                        is_history_navigation = request.is_history_navigation,
                        request_path = %request_path,
                        original_path = %err.resolved.display(),
                        relative_path = %err.relative.display(),
                        "Bad request, unsafe path"
                    );
                }
                return Ok(response::unsafe_path());
            }
        };

        let resolution = self
            .files
            .path_to_serve(&target.original, &target.with_index, &request.url)
            .await;
        if self.log_requests {
            tracing::trace!(
                request_url = %request.url,
                original_path = %target.original.display(),
                kind = ?resolution.kind,
                cache_hit = resolution.cache_hit,
                result = ?resolution.path,
                "Resolved local path"
            );
        }

        match resolution.path {
            Some(path) => {
                if self.log_requests {
                    tracing::trace!(request_url = %request.url, path = %path.display(), "Fetching file");
                }
                self.fetch_local(&path, &request.url).await
            }
            None => {
                let error_page = error_page.ok_or_else(|| {
                    SchemeError::ErrorPageMissing(join_lexical(&self.base_path, &self.error_page))
                })?;
                if self.log_requests {
                    tracing::error!(
                        request_url = %request.url,
                        original_path = %target.original.display(),
                        with_index = %target.with_index.display(),
                        error_page = %error_page.display(),
                        "No file found"
                    );
                }
                self.fetch_local(&error_page, &request.url).await
            }
        }
    }

    /// The error page location, resolved on first use and never again.
    async fn error_page_path(&self) -> Option<PathBuf> {
        self.error_page_path
            .get_or_init(|| async {
                let original = join_lexical(&self.base_path, &self.error_page);
                let with_index = original.join("index.html");
                self.files
                    .path_to_serve(&original, &with_index, ERROR_PAGE_CACHE_KEY)
                    .await
                    .path
            })
            .await
            .clone()
    }

    // Bypass keeps a `file`-scheme router from intercepting its own reads.
    async fn fetch_local(&self, path: &Path, request_url: &str) -> HandlerResult {
        let url = Url::from_file_path(path)
            .map_err(|_| FetchError::InvalidUrl(path.display().to_string()))?;
        self.fetcher
            .fetch(url.as_str(), RequestInit::bypass())
            .await
            .map_err(|err| {
                if self.log_requests {
                    tracing::error!(request_url = %request_url, final_url = %url, error = %err, "Fetch error");
                }
                SchemeError::Fetch(err)
            })
    }
}

#[async_trait]
impl SchemeHandler for SchemeRouter {
    async fn handle(&self, request: SchemeRequest) -> HandlerResult {
        self.route(request).await
    }
}

/// Collapse a handler outcome into a response.
///
/// Fatal errors become 500, fetch failures 502, both with a JSON error body.
pub fn into_response(result: HandlerResult) -> Response<Body> {
    match result {
        Ok(response) => response,
        Err(err) => {
            let status = if err.is_fatal() {
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            } else {
                axum::http::StatusCode::BAD_GATEWAY
            };
            response::json_error(status, &err.to_string())
        }
    }
}
