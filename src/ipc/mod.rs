//! Request/reply and broadcast messaging between the shell and its pages.
//!
//! Transport-agnostic: messages go out on a channel and come back through
//! [`BridgeClient::deliver`], so any IPC the shell offers can carry them.

pub mod bridge;
pub mod broadcast;
pub mod window_controls;

pub use bridge::{BridgeClient, BridgeError, BridgeMessage, ReplyHandler, ReplyRouter, WindowId};
pub use broadcast::{BroadcastHandlers, BroadcastMessage, BroadcastTarget, Broadcaster, ListenerId, WindowList};
pub use window_controls::{WindowAction, WindowControl, WindowControlsHandler, WindowLookup, WINDOW_CONTROLS_KEY};
