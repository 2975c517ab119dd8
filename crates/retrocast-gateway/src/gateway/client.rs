//! The caller-facing gateway client handle.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use retrocast_proto::{ClientFrame, PresenceStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::connection::Connection;
use super::dispatcher::{event_callback, EventCallback, EventDispatcher};
use super::heartbeat::HeartbeatMonitor;
use super::notify::{Notifier, StateCallback};
use super::reconnect::ReconnectPolicy;
use super::session::{Session, SharedSession};
use super::state::ConnectionState;
use crate::config::{parse_gateway_url, GatewayConfig};
use crate::error::GatewayError;

/// Handles to the driver task started by the latest `connect()`.
struct ActiveConnection {
    url: String,
    token: String,
    cancel: CancellationToken,
    outbound: mpsc::Sender<ClientFrame>,
    session: SharedSession,
    retry_attempts: Arc<AtomicU32>,
    task: JoinHandle<()>,
}

/// Realtime gateway client.
///
/// `connect` starts a background task that performs the handshake, keeps
/// the session alive with heartbeats, resumes after transport failures and
/// forwards dispatch events to the [`EventDispatcher`]. The handle itself is
/// synchronous and cheap to share behind an `Arc`.
///
/// Callbacks run on the connection task. Keep them short: a slow callback
/// holds up the connection and any concurrent `disconnect`.
pub struct GatewayClient {
    config: GatewayConfig,
    notifier: Arc<Notifier>,
    active: Mutex<Option<ActiveConnection>>,
}

impl Default for GatewayClient {
    fn default() -> Self {
        Self::new(GatewayConfig::default())
    }
}

impl GatewayClient {
    /// Create a disconnected client with its own dispatcher.
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Self::with_dispatcher(config, Arc::new(EventDispatcher::new()))
    }

    /// Create a disconnected client that publishes into `dispatcher`.
    #[must_use]
    pub fn with_dispatcher(config: GatewayConfig, dispatcher: Arc<EventDispatcher>) -> Self {
        if let Err(e) = config.validate() {
            warn!(error = %e, "gateway config failed validation");
        }
        Self {
            config,
            notifier: Arc::new(Notifier::new(dispatcher)),
            active: Mutex::new(None),
        }
    }

    /// Start connecting to `url`, authenticating with `token`.
    ///
    /// Returns once the connection task is spawned; progress is reported
    /// through state notifications. Calling this while a connection to the
    /// same URL with the same token is live or in progress does nothing.
    /// Otherwise any current connection is replaced; its session carries
    /// over (and will be resumed) only if the token is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidUrl`] for a non-websocket URL and
    /// [`GatewayError::NoRuntime`] when called outside a tokio runtime.
    pub fn connect(&self, url: &str, token: &str) -> Result<(), GatewayError> {
        parse_gateway_url(url)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| GatewayError::NoRuntime)?;

        let previous = {
            let mut active = self.active.lock();
            if let Some(current) = active.as_ref() {
                if current.url == url
                    && current.token == token
                    && !current.task.is_finished()
                    && self.notifier.state() != ConnectionState::Disconnected
                {
                    debug!(url, "already connected or connecting");
                    return Ok(());
                }
            }
            active.take()
        };

        let carried = match previous {
            Some(previous) => {
                self.notifier.retire(&previous.cancel);
                if previous.token == token {
                    previous.session.read().clone()
                } else {
                    Session::default()
                }
            }
            None => Session::default(),
        };

        let session: SharedSession = Arc::new(RwLock::new(carried));
        let retry_attempts = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        let (outbound_tx, outbound_rx) = mpsc::channel(self.config.dispatch.command_buffer.max(1));

        info!(url, "connecting to gateway");
        self.notifier.set(ConnectionState::Connecting);

        let connection = Connection {
            url: url.to_string(),
            token: token.to_string(),
            session: Arc::clone(&session),
            policy: ReconnectPolicy::new(self.config.reconnect.clone()),
            retry_attempts: Arc::clone(&retry_attempts),
            notifier: Arc::clone(&self.notifier),
            cancel: cancel.clone(),
            outbound: outbound_rx,
            heartbeat: HeartbeatMonitor::new(),
            ready_seen: false,
        };
        let task = runtime.spawn(connection.run());

        let replaced = self.active.lock().replace(ActiveConnection {
            url: url.to_string(),
            token: token.to_string(),
            cancel,
            outbound: outbound_tx,
            session,
            retry_attempts,
            task,
        });
        if let Some(stale) = replaced {
            self.notifier.retire(&stale.cancel);
        }

        Ok(())
    }

    /// Close the connection for good and forget the session.
    ///
    /// Safe to call at any time, including from inside a callback. No state
    /// or event notification from the closed connection is delivered after
    /// this returns.
    pub fn disconnect(&self) {
        let previous = self.active.lock().take();
        if self.notifier.shutdown(previous.as_ref().map(|active| &active.cancel)) {
            info!("disconnected from gateway");
        }
    }

    /// Announce a new presence for this user.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotConnected`] unless the session is ready,
    /// or [`GatewayError::QueueFull`] if the outbound queue is saturated.
    pub fn update_presence(&self, status: PresenceStatus) -> Result<(), GatewayError> {
        if self.state() != ConnectionState::Connected {
            return Err(GatewayError::NotConnected);
        }

        let active = self.active.lock();
        let active = active.as_ref().ok_or(GatewayError::NotConnected)?;
        active
            .outbound
            .try_send(ClientFrame::presence(status))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => GatewayError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => GatewayError::NotConnected,
            })?;

        debug!(%status, "presence update queued");
        Ok(())
    }

    /// Receive every dispatch event. Returns the handle needed to remove it.
    pub fn on_event<F>(&self, callback: F) -> EventCallback
    where
        F: Fn(&str, &serde_json::Value) + Send + Sync + 'static,
    {
        let callback = event_callback(callback);
        self.notifier.dispatcher().subscribe_all(Arc::clone(&callback));
        callback
    }

    /// Receive every connection state change.
    pub fn on_state_change<F>(&self, callback: F)
    where
        F: Fn(ConnectionState) + Send + Sync + 'static,
    {
        let callback: StateCallback = Arc::new(callback);
        self.notifier.add_listener(callback);
    }

    /// Register `callback` for one event name. See [`EventDispatcher::subscribe`].
    pub fn subscribe(&self, event: impl Into<String>, callback: EventCallback) -> bool {
        self.notifier.dispatcher().subscribe(event, callback)
    }

    /// See [`EventDispatcher::unsubscribe`].
    pub fn unsubscribe(&self, event: &str, callback: &EventCallback) -> bool {
        self.notifier.dispatcher().unsubscribe(event, callback)
    }

    /// The dispatcher this client publishes into.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<EventDispatcher> {
        Arc::clone(self.notifier.dispatcher())
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.notifier.state()
    }

    /// Whether the session is ready.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// A receiver that always holds the latest connection state.
    #[must_use]
    pub fn state_changes(&self) -> watch::Receiver<ConnectionState> {
        self.notifier.watch()
    }

    /// Session id from the latest READY, if the session is still resumable.
    #[must_use]
    pub fn session_id(&self) -> Option<String> {
        self.active
            .lock()
            .as_ref()
            .and_then(|active| active.session.read().session_id().map(str::to_owned))
    }

    /// Highest dispatch sequence seen on the current session.
    #[must_use]
    pub fn last_sequence(&self) -> Option<i64> {
        self.active
            .lock()
            .as_ref()
            .and_then(|active| active.session.read().last_sequence())
    }

    /// Heartbeat interval from the latest HELLO on the current session.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.active
            .lock()
            .as_ref()
            .and_then(|active| active.session.read().heartbeat_interval())
    }

    /// Retries consumed since the last READY.
    #[must_use]
    pub fn retry_attempts(&self) -> u32 {
        self.active
            .lock()
            .as_ref()
            .map_or(0, |active| active.retry_attempts.load(Ordering::SeqCst))
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

impl Drop for GatewayClient {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            self.notifier.retire(&active.cancel);
        }
    }
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("state", &self.state())
            .field("session_id", &self.session_id())
            .field("last_sequence", &self.last_sequence())
            .field("retry_attempts", &self.retry_attempts())
            .field("heartbeat_interval", &self.heartbeat_interval())
            .finish_non_exhaustive()
    }
}
