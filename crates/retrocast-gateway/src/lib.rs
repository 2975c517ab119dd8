//! Realtime gateway client for Retrocast.
//!
//! [`GatewayClient`] keeps one logical connection to the gateway alive:
//! it identifies or resumes, heartbeats on the server's interval, retries
//! with jittered exponential backoff, and forwards dispatch events to an
//! [`EventDispatcher`] once the session is ready.
//!
//! ```no_run
//! use retrocast_gateway::{GatewayClient, GatewayConfig};
//!
//! # async fn run() -> Result<(), retrocast_gateway::GatewayError> {
//! let client = GatewayClient::new(GatewayConfig::default());
//! client.on_event(|name, payload| println!("{name}: {payload}"));
//! client.connect("wss://chat.example.com/gateway", "token")?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod gateway;

pub use config::{parse_gateway_url, DispatchConfig, GatewayConfig};
pub use error::GatewayError;
pub use gateway::{
    event_callback, AtomicConnectionState, ConnectionState, EventCallback, EventDispatcher,
    GatewayClient, HeartbeatMonitor, HeartbeatSignal, ReconnectConfig, ReconnectPolicy, Session,
    StateCallback,
};
pub use retrocast_proto::{EventName, PresenceStatus, GATEWAY_CLOSED};
