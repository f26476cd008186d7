//! Custom-scheme request routing for desktop web shells.
//!
//! A shell registers a scheme (e.g. `app://`) and hands every request made
//! under it to a [`SchemeRouter`], which serves the bundled web app from disk
//! and forwards configured path prefixes to a backing HTTP origin.
//!
//! # Architecture Overview
//!
//! ```text
//!     Shell / HTTP host                ┌──────────────────────────────────────┐
//!     ─────────────────────────────────┼─▶ scheme registry ─▶ SchemeRouter    │
//!                                      │                        │             │
//!                                      │        ┌───────────────┴──────┐      │
//!                                      │        ▼                      ▼      │
//!                                      │   routing (proxy        files (safety│
//!                                      │   table + cache)        + resolver)  │
//!                                      │        │                      │      │
//!                                      │        ▼                      ▼      │
//!     Response                         │   http::fetch (http:, file:, nested  │
//!     ◀────────────────────────────────┼── schemes with bypass)               │
//!                                      │                                      │
//!                                      │  config · ipc · desktop · lifecycle  │
//!                                      │  · observability                     │
//!                                      └──────────────────────────────────────┘
//! ```

pub mod config;
pub mod desktop;
pub mod files;
pub mod http;
pub mod ipc;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod scheme;

pub use config::schema::ShellConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use scheme::{register_handler, RouterOptions, SchemeRegistry, SchemeRouter};
