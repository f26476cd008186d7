//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every route proxy entry must describe a rule
//! - Validate value formats (bind address, scheme name, log level)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShellConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ShellConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("invalid scheme name '{0}'")]
    InvalidSchemeName(String),

    #[error("scheme base_path must not be empty")]
    EmptyBasePath,

    #[error("scheme error_page must not be empty")]
    EmptyErrorPage,

    #[error("route proxy #{0} has an empty prefix")]
    EmptyPrefix(usize),

    #[error("route proxy '{0}' has neither url nor ignore = true")]
    MissingTarget(String),

    #[error("route proxy '{0}' url must be an http url")]
    InvalidProxyUrl(String),

    #[error("route proxy '{0}' is defined more than once")]
    DuplicatePrefix(String),

    #[error("invalid log level '{0}'")]
    InvalidLogLevel(String),
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &ShellConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }

    if !is_scheme_name(&config.scheme.name) {
        errors.push(ValidationError::InvalidSchemeName(config.scheme.name.clone()));
    }
    if config.scheme.base_path.is_empty() {
        errors.push(ValidationError::EmptyBasePath);
    }
    if config.scheme.error_page.is_empty() {
        errors.push(ValidationError::EmptyErrorPage);
    }

    let mut seen = HashSet::new();
    for (index, route) in config.route_proxies.iter().enumerate() {
        if route.prefix.is_empty() {
            errors.push(ValidationError::EmptyPrefix(index));
            continue;
        }
        if !seen.insert(route.prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(route.prefix.clone()));
        }
        match (&route.url, route.ignore) {
            (None, false) => errors.push(ValidationError::MissingTarget(route.prefix.clone())),
            (Some(url), false) if !url.starts_with("http://") && !url.starts_with("https://") => {
                errors.push(ValidationError::InvalidProxyUrl(route.prefix.clone()))
            }
            _ => {}
        }
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::InvalidLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )
fn is_scheme_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
