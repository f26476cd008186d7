//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured fields, request URL/path as context)
//!
//! Consumers:
//!     → logging.rs (fmt subscriber, EnvFilter)
//!     → tower-http TraceLayer spans around every host request
//! ```
//!
//! # Design Decisions
//! - Per-request router events are opt-in (`log_requests`) since a single
//!   page load can issue hundreds of requests
//! - Logging never changes control flow

pub mod logging;

pub use logging::init_logging;
