//! State and event notifications, serialized behind a cancellation-aware gate.
//!
//! Every callback a collaborator registered runs while the gate is held.
//! Driver-side emissions re-check their cancellation token under the gate,
//! so once `disconnect` has taken the gate and cancelled the token, nothing
//! from that driver reaches a collaborator again. The gate is re-entrant so a
//! callback may call back into the client.

use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};
use retrocast_proto::GATEWAY_CLOSED;
use serde_json::Value;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::dispatcher::EventDispatcher;
use super::state::{AtomicConnectionState, ConnectionState};

/// Callback invoked on every connection state change.
pub type StateCallback = Arc<dyn Fn(ConnectionState) + Send + Sync>;

pub(crate) struct Notifier {
    gate: ReentrantMutex<()>,
    state: AtomicConnectionState,
    state_tx: watch::Sender<ConnectionState>,
    listeners: RwLock<Vec<StateCallback>>,
    dispatcher: Arc<EventDispatcher>,
}

impl Notifier {
    pub(crate) fn new(dispatcher: Arc<EventDispatcher>) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            gate: ReentrantMutex::new(()),
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
            state_tx,
            listeners: RwLock::new(Vec::new()),
            dispatcher,
        }
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state.load()
    }

    pub(crate) fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn dispatcher(&self) -> &Arc<EventDispatcher> {
        &self.dispatcher
    }

    pub(crate) fn add_listener(&self, listener: StateCallback) {
        self.listeners.write().push(listener);
    }

    /// Driver transition. Dropped if `token` is cancelled.
    pub(crate) fn transition(&self, token: &CancellationToken, state: ConnectionState) -> bool {
        let _gate = self.gate.lock();
        if token.is_cancelled() {
            return false;
        }
        self.apply(state)
    }

    /// Driver event delivery. Dropped if `token` is cancelled.
    pub(crate) fn publish(&self, token: &CancellationToken, event: &str, payload: &Value) -> usize {
        let _gate = self.gate.lock();
        if token.is_cancelled() {
            return 0;
        }
        self.dispatcher.publish(event, payload)
    }

    /// Retry budget exhausted: report `disconnected` and publish `GATEWAY_CLOSED`.
    pub(crate) fn closed(&self, token: &CancellationToken) {
        let _gate = self.gate.lock();
        if token.is_cancelled() {
            return;
        }
        self.apply(ConnectionState::Disconnected);
        self.dispatcher.publish(GATEWAY_CLOSED, &Value::Null);
    }

    /// Silence a driver without touching the state.
    pub(crate) fn retire(&self, token: &CancellationToken) {
        let _gate = self.gate.lock();
        token.cancel();
    }

    /// Client-side transition, not tied to any driver.
    pub(crate) fn set(&self, state: ConnectionState) -> bool {
        let _gate = self.gate.lock();
        self.apply(state)
    }

    /// Silence the driver (if any) and report `disconnected`, atomically.
    pub(crate) fn shutdown(&self, token: Option<&CancellationToken>) -> bool {
        let _gate = self.gate.lock();
        if let Some(token) = token {
            token.cancel();
        }
        self.apply(ConnectionState::Disconnected)
    }

    fn apply(&self, state: ConnectionState) -> bool {
        let previous = self.state.swap(state);
        if previous == state {
            return false;
        }
        info!(from = %previous, to = %state, "connection state changed");
        self.state_tx.send_replace(state);

        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            listener(state);
        }
        true
    }
}
