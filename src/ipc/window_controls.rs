//! Window-control actions over the bridge.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ipc::bridge::{ReplyHandler, WindowId};

/// Bridge key window-control requests are sent under.
pub const WINDOW_CONTROLS_KEY: &str = "window-control-action";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowAction {
    Close,
    Minimize,
    ToggleMaximize,
    TogglePin,
}

/// The window operations the actions need.
pub trait WindowControl: Send + Sync {
    fn close(&self);
    fn minimize(&self);
    fn is_maximized(&self) -> bool;
    fn maximize(&self);
    fn unmaximize(&self);
    fn is_always_on_top(&self) -> bool;
    fn set_always_on_top(&self, on_top: bool);
}

/// Finds the window a request should act on. Implementations usually fall
/// back to the focused window when the sender is unknown.
pub trait WindowLookup: Send + Sync {
    fn window(&self, sender: Option<WindowId>) -> Option<Arc<dyn WindowControl>>;
}

type ActionCallback = Arc<dyn Fn(WindowAction) + Send + Sync>;

/// [`ReplyHandler`] that applies a [`WindowAction`] to the requesting window.
pub struct WindowControlsHandler {
    lookup: Arc<dyn WindowLookup>,
    on_action: Option<ActionCallback>,
}

impl WindowControlsHandler {
    pub fn new(lookup: Arc<dyn WindowLookup>) -> Self {
        Self {
            lookup,
            on_action: None,
        }
    }

    /// Called after each applied action. Observes only.
    pub fn on_action<F>(mut self, callback: F) -> Self
    where
        F: Fn(WindowAction) + Send + Sync + 'static,
    {
        self.on_action = Some(Arc::new(callback));
        self
    }

    pub fn apply(window: &dyn WindowControl, action: WindowAction) {
        match action {
            WindowAction::Close => window.close(),
            WindowAction::Minimize => window.minimize(),
            WindowAction::ToggleMaximize => {
                if window.is_maximized() {
                    window.unmaximize()
                } else {
                    window.maximize()
                }
            }
            WindowAction::TogglePin => window.set_always_on_top(!window.is_always_on_top()),
        }
    }
}

#[async_trait]
impl ReplyHandler for WindowControlsHandler {
    async fn reply(&self, sender: Option<WindowId>, args: Vec<Value>) -> Result<Value, Value> {
        let window = self
            .lookup
            .window(sender)
            .ok_or_else(|| Value::String("No window to send reply to.".to_string()))?;

        let raw = args.into_iter().next().unwrap_or(Value::Null);
        let action: WindowAction = serde_json::from_value(raw.clone()).map_err(|_| {
            let shown = raw.as_str().map(str::to_string).unwrap_or_else(|| raw.to_string());
            Value::String(format!("Invalid action: {shown}"))
        })?;

        Self::apply(window.as_ref(), action);
        tracing::debug!(action = ?action, sender = ?sender, "Window action applied");
        if let Some(callback) = &self.on_action {
            callback(action);
        }
        Ok(Value::Null)
    }
}
