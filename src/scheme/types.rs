//! Handler contract and error definitions.

use std::path::PathBuf;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use thiserror::Error;

use crate::http::fetch::FetchError;
use crate::http::request::SchemeRequest;

/// What a scheme handler produces for one request.
///
/// `Err` takes the place of a response when a fetch fails; hosts decide how
/// to present it.
pub type HandlerResult = Result<Response<Body>, SchemeError>;

/// Answers requests made under a custom scheme.
#[async_trait]
pub trait SchemeHandler: Send + Sync {
    async fn handle(&self, request: SchemeRequest) -> HandlerResult;
}

/// Errors raised while installing a handler. Both are fatal at startup.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// The scheme already has a handler.
    #[error("Protocol {0} is already handled.")]
    DuplicateHandler(String),

    /// Proxy routes exist but no backend origin indicator is set.
    #[error(
        "Proxy routes are defined but none of PUBLIC_SERVER_URL, VITE_DEV_SERVER_URL or VITE_DEV_URL is set. \
         Proxied routes have nowhere to go."
    )]
    MissingBackendConfiguration,
}

/// Per-request failures that cannot be expressed as a response.
#[derive(Debug, Error)]
pub enum SchemeError {
    /// The error page does not exist under the base path. A build defect.
    #[error("Error page {} does not exist. Was it excluded from the build?", .0.display())]
    ErrorPageMissing(PathBuf),

    /// The outbound or local fetch failed; the raw failure is passed through.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl SchemeError {
    /// Whether the hosting process should stop serving.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SchemeError::ErrorPageMissing(_))
    }
}
