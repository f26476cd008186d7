//! Promise-style request/reply bridge.
//!
//! # Data Flow
//! ```text
//! caller side:
//!     BridgeClient::call(key, args)
//!         → pending[id] = oneshot
//!         → outbound channel: Request { key, id, args }
//!         ... transport ...
//!     BridgeClient::deliver(Reply { id, .. }) → resolves pending[id]
//!
//! answering side:
//!     ReplyRouter::respond(sender, Request) → handler for key → Reply
//! ```
//!
//! # Design Decisions
//! - Calls are correlated by a v4 UUID, never by key
//! - A call that times out or is cancelled is removed from the pending map;
//!   a late reply for it is dropped
//! - Handler failures travel as error replies, not transport failures

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Default time a call waits for its reply.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Identifies the window a request came from.
pub type WindowId = u64;

/// A message on the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BridgeMessage {
    #[serde(rename_all = "camelCase")]
    Request { key: String, id: Uuid, args: Vec<Value> },

    #[serde(rename_all = "camelCase")]
    Reply {
        key: String,
        id: Uuid,
        payload: Value,
        #[serde(default)]
        is_error: bool,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum BridgeError {
    #[error("Timeout for {0}")]
    Timeout(String),

    #[error("Remote error: {0}")]
    Remote(Value),

    #[error("Bridge closed")]
    Closed,
}

type Pending = oneshot::Sender<Result<Value, Value>>;

/// Calling side of the bridge.
#[derive(Debug)]
pub struct BridgeClient {
    outbound: mpsc::UnboundedSender<BridgeMessage>,
    pending: DashMap<Uuid, Pending>,
    timeout: Duration,
}

impl BridgeClient {
    /// Create a client and the receiver its requests are sent on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<BridgeMessage>) {
        let (outbound, rx) = mpsc::unbounded_channel();
        let client = Self {
            outbound,
            pending: DashMap::new(),
            timeout: DEFAULT_CALL_TIMEOUT,
        };
        (client, rx)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a request under `key` and wait for its reply.
    pub async fn call(&self, key: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        let id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);
        // Removes the entry however the call ends, including when it is dropped.
        let _pending = PendingGuard {
            pending: &self.pending,
            id,
        };

        tracing::debug!(key = %key, id = %id, "Bridge call sent");
        let request = BridgeMessage::Request {
            key: key.to_string(),
            id,
            args,
        };
        if self.outbound.send(request).is_err() {
            return Err(BridgeError::Closed);
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(Ok(payload))) => Ok(payload),
            Ok(Ok(Err(payload))) => Err(BridgeError::Remote(payload)),
            Ok(Err(_)) => Err(BridgeError::Closed),
            Err(_) => {
                tracing::warn!(key = %key, id = %id, "Bridge call timed out");
                Err(BridgeError::Timeout(key.to_string()))
            }
        }
    }

    /// Hand an incoming message to the call waiting for it. Returns whether one was.
    pub fn deliver(&self, message: BridgeMessage) -> bool {
        let BridgeMessage::Reply {
            id, payload, is_error, ..
        } = message
        else {
            return false;
        };
        let Some((_, tx)) = self.pending.remove(&id) else {
            tracing::debug!(id = %id, "Reply for unknown call dropped");
            return false;
        };
        let outcome = if is_error { Err(payload) } else { Ok(payload) };
        tx.send(outcome).is_ok()
    }

    /// Number of calls still waiting for a reply.
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }
}

struct PendingGuard<'a> {
    pending: &'a DashMap<Uuid, Pending>,
    id: Uuid,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.id);
    }
}

/// Answers requests sent under one key.
#[async_trait]
pub trait ReplyHandler: Send + Sync {
    /// `sender` is the window the request came from, if the transport knows it.
    async fn reply(&self, sender: Option<WindowId>, args: Vec<Value>) -> Result<Value, Value>;
}

/// Answering side of the bridge.
#[derive(Default)]
pub struct ReplyRouter {
    handlers: HashMap<String, Arc<dyn ReplyHandler>>,
}

impl ReplyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `key`, replacing any previous one.
    pub fn on(mut self, key: impl Into<String>, handler: Arc<dyn ReplyHandler>) -> Self {
        self.handlers.insert(key.into(), handler);
        self
    }

    /// Turn a request into its reply. Anything but a request yields `None`.
    pub async fn respond(&self, sender: Option<WindowId>, message: BridgeMessage) -> Option<BridgeMessage> {
        let BridgeMessage::Request { key, id, args } = message else {
            return None;
        };

        let outcome = match self.handlers.get(&key) {
            Some(handler) => handler.reply(sender, args).await,
            None => Err(Value::String(format!("No handler for {key}"))),
        };
        let (payload, is_error) = match outcome {
            Ok(payload) => (payload, false),
            Err(payload) => {
                tracing::error!(key = %key, id = %id, error = %payload, "Bridge handler failed");
                (payload, true)
            }
        };

        Some(BridgeMessage::Reply {
            key,
            id,
            payload,
            is_error,
        })
    }
}
