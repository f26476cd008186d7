//! Scheme handler registry.
//!
//! # Responsibilities
//! - Hold at most one handler per scheme
//! - Route a request to the handler for its URL scheme
//!
//! # Design Decisions
//! - Scheme names are case-insensitive (stored lowercase)
//! - Registration is check-and-insert in one step, so two racing
//!   registrations cannot both succeed
//! - Handlers are cloned out of the map before awaiting them

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::http::request::SchemeRequest;
use crate::scheme::types::{HandlerResult, RegisterError, SchemeHandler};

/// Capability to intercept requests under a named scheme.
pub trait SchemeHandle {
    /// Whether `scheme` already has a handler.
    fn is_handled(&self, scheme: &str) -> bool;

    /// Install `handler` for `scheme`. Fails if one is already installed.
    fn handle(&self, scheme: &str, handler: Arc<dyn SchemeHandler>) -> Result<(), RegisterError>;
}

/// In-process [`SchemeHandle`] with request dispatch.
#[derive(Default)]
pub struct SchemeRegistry {
    handlers: DashMap<String, Arc<dyn SchemeHandler>>,
}

impl std::fmt::Debug for SchemeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let schemes: Vec<String> = self.handlers.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("SchemeRegistry").field("schemes", &schemes).finish()
    }
}

impl SchemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove the handler for `scheme`. Returns whether one was installed.
    pub fn unhandle(&self, scheme: &str) -> bool {
        self.handlers.remove(&scheme.to_ascii_lowercase()).is_some()
    }

    /// Run the handler registered for the request's scheme, if any.
    pub async fn dispatch(&self, request: SchemeRequest) -> Option<HandlerResult> {
        let scheme = scheme_of(&request.url)?;
        let handler = self.handlers.get(&scheme).map(|h| h.value().clone())?;
        Some(handler.handle(request).await)
    }
}

impl SchemeHandle for SchemeRegistry {
    fn is_handled(&self, scheme: &str) -> bool {
        self.handlers.contains_key(&scheme.to_ascii_lowercase())
    }

    fn handle(&self, scheme: &str, handler: Arc<dyn SchemeHandler>) -> Result<(), RegisterError> {
        match self.handlers.entry(scheme.to_ascii_lowercase()) {
            Entry::Occupied(_) => Err(RegisterError::DuplicateHandler(scheme.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(handler);
                tracing::debug!(scheme = %scheme, "Scheme handler installed");
                Ok(())
            }
        }
    }
}

fn scheme_of(url: &str) -> Option<String> {
    url.split_once(':')
        .map(|(scheme, _)| scheme.to_ascii_lowercase())
        .filter(|scheme| !scheme.is_empty())
}
