//! HTTP handling subsystem.
//!
//! # Data Flow
//! ```text
//! Host request (server.rs)
//!     → request.rs (SchemeRequest, request path)
//!     → scheme handler
//!         → fetch.rs (proxied http, bundled files, nested schemes)
//!         → response.rs (JSON errors, content types)
//!     → Send to client
//! ```

pub mod fetch;
pub mod request;
pub mod response;
pub mod server;

pub use fetch::{FetchError, Fetcher, NetFetcher};
pub use request::{request_path, RequestInit, SchemeRequest};
pub use server::HttpServer;
