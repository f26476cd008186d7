//! Response construction.
//!
//! # Responsibilities
//! - Build the JSON error responses the router and host return
//! - Pick a content type for files read from disk

use std::path::Path;

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode};
use serde_json::json;

/// Body message for a request that escapes the base directory.
pub const UNSAFE_PATH: &str = "Bad Request - Unsafe Path";

/// Body message for a request whose URL cannot be parsed or decoded.
pub const INVALID_URL: &str = "Bad Request - Invalid Url";

/// `{"error": message}` with a JSON content type.
pub fn json_error(status: StatusCode, message: &str) -> Response<Body> {
    let body = json!({ "error": message }).to_string();
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

pub fn unsafe_path() -> Response<Body> {
    json_error(StatusCode::BAD_REQUEST, UNSAFE_PATH)
}

pub fn invalid_url() -> Response<Body> {
    json_error(StatusCode::BAD_REQUEST, INVALID_URL)
}

/// Content type for a file, from its extension.
pub fn content_type_for(path: &Path) -> HeaderValue {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    HeaderValue::from_str(mime.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"))
}
