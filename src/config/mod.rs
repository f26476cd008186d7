//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ShellConfig (validated, immutable)
//!     → proxy table, router options, privileges
//!
//! Process environment
//!     → env.rs (backend origin indicators)
//!     → paths.rs (window url, public server url, asset dirs)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the router caches are never invalidated,
//!   so there is no reload path
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod paths;
pub mod schema;
pub mod validation;

pub use env::EnvSource;
pub use loader::{load_config, ConfigError};
pub use paths::{resolve_app_paths, AppPaths, BuildLayout, PathOverrides, PathsError};
pub use schema::{ListenerConfig, ObservabilityConfig, RouteProxyConfig, SchemeConfig, ShellConfig};
pub use validation::ValidationError;
