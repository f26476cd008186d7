//! HTTP host for registered schemes.
//!
//! # Responsibilities
//! - Accept plain HTTP requests and re-address them under the served scheme
//! - Carry request headers and fetch metadata into a [`SchemeRequest`]
//! - Dispatch through the [`SchemeRegistry`] and write the outcome back
//! - Wire up middleware (request ID, tracing)
//! - Stop serving on Ctrl+C or when a handler reports a fatal error

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::http::request::SchemeRequest;
use crate::http::response;
use crate::lifecycle::Shutdown;
use crate::scheme::router::into_response;
use crate::scheme::SchemeRegistry;

/// Host every request is addressed to once re-written under the scheme.
pub const BUNDLE_HOST: &str = "bundle";

/// Largest request body read into a [`SchemeRequest`].
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SchemeRegistry>,
    pub scheme: String,
    pub shutdown: Arc<Shutdown>,
}

/// HTTP server fronting one registered scheme.
pub struct HttpServer {
    state: AppState,
}

impl HttpServer {
    pub fn new(registry: Arc<SchemeRegistry>, scheme: impl Into<String>, shutdown: Arc<Shutdown>) -> Self {
        Self {
            state: AppState {
                registry,
                scheme: scheme.into(),
                shutdown,
            },
        }
    }

    /// Build the Axum router with all middleware layers.
    pub fn into_router(self) -> Router {
        Router::new()
            .fallback(scheme_handler)
            .with_state(self.state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let shutdown = self.state.shutdown.clone();
        tracing::info!(
            address = %addr,
            scheme = %self.state.scheme,
            "HTTP server starting"
        );

        axum::serve(listener, self.into_router())
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn scheme_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request = match to_scheme_request(&state.scheme, request).await {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    let url = request.url.clone();

    match state.registry.dispatch(request).await {
        None => {
            tracing::warn!(url = %url, "No handler for scheme");
            response::json_error(StatusCode::NOT_FOUND, "No handler for scheme").into_response()
        }
        Some(Err(err)) if err.is_fatal() => {
            tracing::error!(url = %url, error = %err, "Fatal scheme error");
            let response = into_response(Err(err));
            state.shutdown.trigger("fatal scheme error");
            response
        }
        Some(result) => {
            if let Err(err) = &result {
                tracing::warn!(url = %url, error = %err, "Scheme fetch failed");
            }
            into_response(result)
        }
    }
}

/// Re-address an HTTP request as `<scheme>://bundle<path?query>`.
pub async fn to_scheme_request(scheme: &str, request: Request<Body>) -> Result<SchemeRequest, Response> {
    let (parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|_| response::json_error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"))?;

    let mut scheme_request = SchemeRequest::get(format!("{scheme}://{BUNDLE_HOST}{path_and_query}"));
    scheme_request.method = parts.method;
    scheme_request.referrer = header_str(&parts.headers, header::REFERER);
    scheme_request.referrer_policy = header_str(&parts.headers, HeaderName::from_static("referrer-policy"));
    scheme_request.destination = header_str(&parts.headers, HeaderName::from_static("sec-fetch-dest"));
    scheme_request.mode = header_str(&parts.headers, HeaderName::from_static("sec-fetch-mode"));
    scheme_request.is_reload_navigation = scheme_request.mode.as_deref() == Some("navigate")
        && header_str(&parts.headers, header::CACHE_CONTROL).as_deref() == Some("max-age=0");
    scheme_request.headers = forwardable_headers(&parts.headers);
    scheme_request.body = body;
    Ok(scheme_request)
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn forwardable_headers(headers: &HeaderMap) -> HeaderMap {
    let mut kept = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        let name_str = name.as_str();
        if HOP_BY_HOP.contains(&name_str) || name == header::HOST || name == header::CONTENT_LENGTH {
            continue;
        }
        kept.append(name.clone(), value.clone());
    }
    kept
}

/// Wait for Ctrl+C or a triggered [`Shutdown`].
async fn shutdown_signal(shutdown: Arc<Shutdown>) {
    let mut rx = shutdown.subscribe();
    if shutdown.is_triggered() {
        return;
    }

    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutdown signal received"),
        _ = rx.recv() => tracing::info!("Shutdown requested"),
    }
}
