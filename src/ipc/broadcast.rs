//! One-way event fan-out to every open window.
//!
//! The sending side pushes `(key, event, args)` to each window a
//! [`WindowList`] reports. The receiving side keeps per-event listeners under
//! one key and calls them when a matching message arrives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An event sent under a broadcast key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub key: String,
    pub event: String,
    pub args: Vec<Value>,
}

/// A window that can receive broadcast messages.
pub trait BroadcastTarget: Send + Sync {
    fn send(&self, message: &BroadcastMessage);
}

/// Lists the windows a broadcast reaches. Asked again on every broadcast.
pub trait WindowList: Send + Sync {
    fn windows(&self) -> Vec<Arc<dyn BroadcastTarget>>;
}

/// Sends events under one key to every window.
#[derive(Clone)]
pub struct Broadcaster {
    key: String,
    windows: Arc<dyn WindowList>,
}

impl Broadcaster {
    pub fn new(key: impl Into<String>, windows: Arc<dyn WindowList>) -> Self {
        Self {
            key: key.into(),
            windows,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Send `event` with `args` to every current window. Returns how many were reached.
    pub fn broadcast(&self, event: &str, args: Vec<Value>) -> usize {
        let message = BroadcastMessage {
            key: self.key.clone(),
            event: event.to_string(),
            args,
        };
        let windows = self.windows.windows();
        for window in &windows {
            window.send(&message);
        }
        tracing::debug!(key = %self.key, event = %event, windows = windows.len(), "Event broadcast");
        windows.len()
    }
}

/// Handle returned by [`BroadcastHandlers::on`], used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Receiving side: listeners per event name for one broadcast key.
pub struct BroadcastHandlers {
    key: String,
    listeners: DashMap<String, Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl BroadcastHandlers {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            listeners: DashMap::new(),
            next_id: AtomicU64::new(0),
        }
    }

    /// Call `listener` with the event's args each time `event` arrives.
    pub fn on<F>(&self, event: impl Into<String>, listener: F) -> ListenerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(event.into())
            .or_default()
            .push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it was registered for `event`.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let Some(mut listeners) = self.listeners.get_mut(event) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        before != listeners.len()
    }

    /// Run the listeners for an incoming message. Messages under other keys
    /// are ignored. Returns how many listeners ran.
    pub fn dispatch(&self, message: &BroadcastMessage) -> usize {
        if message.key != self.key {
            return 0;
        }
        // Cloned out so a listener may call `on`/`off` without deadlocking.
        let listeners: Vec<Listener> = match self.listeners.get(&message.event) {
            Some(entry) => entry.iter().map(|(_, listener)| listener.clone()).collect(),
            None => return 0,
        };
        for listener in &listeners {
            listener(&message.args);
        }
        listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use serde_json::json;

    #[derive(Default)]
    struct Inbox(Mutex<Vec<BroadcastMessage>>);

    impl BroadcastTarget for Inbox {
        fn send(&self, message: &BroadcastMessage) {
            self.0.lock().unwrap().push(message.clone());
        }
    }

    struct Windows(Mutex<Vec<Arc<Inbox>>>);

    impl WindowList for Windows {
        fn windows(&self) -> Vec<Arc<dyn BroadcastTarget>> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|w| w.clone() as Arc<dyn BroadcastTarget>)
                .collect()
        }
    }

    #[test]
    fn test_broadcast_reaches_every_window() {
        let first = Arc::new(Inbox::default());
        let second = Arc::new(Inbox::default());
        let windows = Arc::new(Windows(Mutex::new(vec![first.clone(), second.clone()])));
        let broadcaster = Broadcaster::new("downloads", windows.clone());

        assert_eq!(broadcaster.broadcast("progress", vec![json!(50)]), 2);
        let expected = BroadcastMessage {
            key: "downloads".to_string(),
            event: "progress".to_string(),
            args: vec![json!(50)],
        };
        assert_eq!(*first.0.lock().unwrap(), vec![expected.clone()]);
        assert_eq!(*second.0.lock().unwrap(), vec![expected]);

        // Windows are listed again on each broadcast.
        windows.0.lock().unwrap().pop();
        assert_eq!(broadcaster.broadcast("done", vec![]), 1);
        assert_eq!(first.0.lock().unwrap().len(), 2);
        assert_eq!(second.0.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_listeners_on_and_off() {
        let handlers = BroadcastHandlers::new("downloads");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let id = {
            let seen = seen.clone();
            handlers.on("progress", move |args| seen.lock().unwrap().push(args.to_vec()))
        };
        let other = handlers.on("progress", |_| {});

        let message = BroadcastMessage {
            key: "downloads".to_string(),
            event: "progress".to_string(),
            args: vec![json!(10), json!("a.zip")],
        };
        assert_eq!(handlers.dispatch(&message), 2);
        assert_eq!(*seen.lock().unwrap(), vec![vec![json!(10), json!("a.zip")]]);

        assert!(handlers.off("progress", id));
        assert!(!handlers.off("progress", id));
        assert!(!handlers.off("done", other));
        assert_eq!(handlers.dispatch(&message), 1);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dispatch_ignores_other_keys_and_events() {
        let handlers = BroadcastHandlers::new("downloads");
        handlers.on("progress", |_| panic!("should not run"));

        let wrong_key = BroadcastMessage {
            key: "updates".to_string(),
            event: "progress".to_string(),
            args: vec![],
        };
        let unknown_event = BroadcastMessage {
            key: "downloads".to_string(),
            event: "done".to_string(),
            args: vec![],
        };
        assert_eq!(handlers.dispatch(&wrong_key), 0);
        assert_eq!(handlers.dispatch(&unknown_event), 0);
    }

    #[test]
    fn test_listener_may_register_during_dispatch() {
        let handlers = Arc::new(BroadcastHandlers::new("k"));
        {
            let inner = handlers.clone();
            handlers.on("e", move |_| {
                inner.on("e", |_| {});
            });
        }
        let message = BroadcastMessage {
            key: "k".to_string(),
            event: "e".to_string(),
            args: vec![],
        };
        assert_eq!(handlers.dispatch(&message), 1);
        assert_eq!(handlers.dispatch(&message), 2);
    }
}
