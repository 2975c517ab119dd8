//! Gateway websocket client.
//!
//! Manages the connection between a chat client and the realtime gateway:
//! handshake, heartbeats, session resume, reconnection with exponential
//! backoff and fan-out of dispatch events.

mod client;
mod connection;
mod dispatcher;
mod heartbeat;
mod notify;
mod reconnect;
mod session;
mod state;

// Re-export public types
pub use client::GatewayClient;
pub use dispatcher::{event_callback, EventCallback, EventDispatcher};
pub use heartbeat::{HeartbeatMonitor, HeartbeatSignal};
pub use notify::StateCallback;
pub use reconnect::{ReconnectConfig, ReconnectPolicy};
pub use session::Session;
pub use state::{AtomicConnectionState, ConnectionState};
