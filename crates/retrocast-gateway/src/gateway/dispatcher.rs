//! Named-event fan-out to registered callbacks.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

/// Callback invoked with an event name and its raw payload.
pub type EventCallback = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Wrap a closure as an [`EventCallback`].
///
/// Keep the returned handle around if you want to unsubscribe later:
/// identity is the `Arc` allocation, not the closure's code.
pub fn event_callback<F>(f: F) -> EventCallback
where
    F: Fn(&str, &Value) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Registry of event subscribers.
///
/// Named subscribers receive only their event; catch-all subscribers receive
/// every published event. Delivery order is named subscribers in
/// registration order, then catch-all subscribers in registration order.
/// `publish` works on a snapshot, so a callback may subscribe or unsubscribe
/// without deadlocking; the change applies from the next publish.
#[derive(Default)]
pub struct EventDispatcher {
    named: RwLock<HashMap<String, Vec<EventCallback>>>,
    catch_all: RwLock<Vec<EventCallback>>,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for `event`. Returns `false` if it was already registered.
    pub fn subscribe(&self, event: impl Into<String>, callback: EventCallback) -> bool {
        let mut named = self.named.write();
        let list = named.entry(event.into()).or_default();
        if list.iter().any(|cb| Arc::ptr_eq(cb, &callback)) {
            return false;
        }
        list.push(callback);
        true
    }

    /// Remove `callback` from `event`. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, event: &str, callback: &EventCallback) -> bool {
        let mut named = self.named.write();
        let Some(list) = named.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|cb| !Arc::ptr_eq(cb, callback));
        let removed = list.len() != before;
        if list.is_empty() {
            named.remove(event);
        }
        removed
    }

    /// Register `callback` for every event. Returns `false` if already registered.
    pub fn subscribe_all(&self, callback: EventCallback) -> bool {
        let mut catch_all = self.catch_all.write();
        if catch_all.iter().any(|cb| Arc::ptr_eq(cb, &callback)) {
            return false;
        }
        catch_all.push(callback);
        true
    }

    /// Remove a catch-all subscriber. Returns `false` if it was not registered.
    pub fn unsubscribe_all(&self, callback: &EventCallback) -> bool {
        let mut catch_all = self.catch_all.write();
        let before = catch_all.len();
        catch_all.retain(|cb| !Arc::ptr_eq(cb, callback));
        catch_all.len() != before
    }

    /// Deliver `payload` to every subscriber of `event`. Returns how many were called.
    ///
    /// Events with no subscribers are dropped silently.
    pub fn publish(&self, event: &str, payload: &Value) -> usize {
        let mut targets: Vec<EventCallback> = self
            .named
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default();
        targets.extend(self.catch_all.read().iter().cloned());

        for callback in &targets {
            callback(event, payload);
        }
        targets.len()
    }

    /// Number of named subscribers for `event`.
    #[must_use]
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.named.read().get(event).map_or(0, Vec::len)
    }

    /// Number of catch-all subscribers.
    #[must_use]
    pub fn catch_all_count(&self) -> usize {
        self.catch_all.read().len()
    }

    /// Drop every subscriber.
    pub fn clear(&self) {
        self.named.write().clear();
        self.catch_all.write().clear();
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let named = self.named.read();
        f.debug_struct("EventDispatcher")
            .field("events", &named.len())
            .field("named", &named.values().map(Vec::len).sum::<usize>())
            .field("catch_all", &self.catch_all.read().len())
            .finish()
    }
}
