//! App path resolution.
//!
//! Computes where the shell loads its window from, where the public server
//! lives, and where the bundled assets and preload script sit on disk.
//!
//! Overrides are only honoured when passed in explicitly; production builds
//! never pick them up from the environment on their own.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::env::EnvSource;

/// Caller-supplied overrides, typically wired to `OVERRIDE_*` variables.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub window_url: Option<String>,
    pub public_server_url: Option<String>,
}

/// Values baked into the shell at build time.
#[derive(Debug, Clone, Default)]
pub struct BuildLayout {
    /// Route appended to dev or override window URLs (e.g. "/app").
    pub route: String,
    /// Page loaded under the scheme in production builds.
    pub prod_url: Option<String>,
    /// Public asset directory, relative to the app directory.
    pub public_dir: String,
    /// Compiled shell directory, relative to the app directory.
    pub build_dir: Option<String>,
    pub production: bool,
}

impl BuildLayout {
    /// Read the layout from `APP_ROUTE`, `APP_PROD_URL`, `APP_PUBLIC_DIR`,
    /// `APP_BUILD_DIR` and `NODE_ENV`.
    pub fn from_env(env: &EnvSource) -> Self {
        Self {
            route: env.get("APP_ROUTE").unwrap_or_default(),
            prod_url: env.get("APP_PROD_URL"),
            public_dir: env.get("APP_PUBLIC_DIR").unwrap_or_default(),
            build_dir: env.get("APP_BUILD_DIR"),
            production: env.get("NODE_ENV").as_deref() == Some("production"),
        }
    }
}

/// Resolved locations for one shell launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub window_url: String,
    pub public_server_url: String,
    pub public_dir: PathBuf,
    pub preload_path: PathBuf,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathsError {
    #[error("publicServerUrl could not be determined.")]
    MissingServerUrl,

    #[error("window url could not be determined: no override, no dev server and no production layout")]
    Undetermined,
}

/// Resolve the paths for a shell serving `protocol`.
pub fn resolve_app_paths(
    protocol: &str,
    overrides: &PathOverrides,
    layout: &BuildLayout,
    env: &EnvSource,
    app_dir: &Path,
) -> Result<AppPaths, PathsError> {
    let public_dir = app_dir.join(&layout.public_dir);
    let preload_path = app_dir
        .join(layout.build_dir.as_deref().unwrap_or_default())
        .join("preload.cjs");

    let public_server_url = overrides
        .public_server_url
        .clone()
        .or_else(|| env.get("PUBLIC_SERVER_URL"))
        .or_else(|| env.get("VITE_DEV_SERVER_URL"))
        .filter(|url| !url.is_empty())
        .ok_or(PathsError::MissingServerUrl)?;

    let dev_server = env.get("VITE_DEV_SERVER_URL");
    let window_url = if let Some(window_url) = overrides.window_url.as_deref().filter(|u| !u.is_empty()) {
        format!("{window_url}{}", layout.route)
    } else if let Some(dev_server) = dev_server.filter(|_| layout.production) {
        format!("{dev_server}{}", layout.route)
    } else if let (Some(prod_url), Some(_)) = (&layout.prod_url, &layout.build_dir) {
        // Plain concatenation: joining would collapse the double slash.
        format!("{protocol}://bundle/{prod_url}")
    } else {
        return Err(PathsError::Undetermined);
    };

    Ok(AppPaths {
        window_url,
        public_server_url,
        public_dir,
        preload_path,
    })
}
