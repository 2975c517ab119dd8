//! Connection state types.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// State of the gateway connection as seen by collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// No connection and none being attempted.
    Disconnected,
    /// Opening a transport for a fresh session.
    Connecting,
    /// Opening a transport to continue an existing session.
    Resuming,
    /// READY received; events are flowing.
    Connected,
}

impl ConnectionState {
    /// Lower-case name, as used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Resuming => "resuming",
            Self::Connected => "connected",
        }
    }

    /// Whether a connection attempt is in flight.
    #[must_use]
    pub const fn is_connecting(self) -> bool {
        matches!(self, Self::Connecting | Self::Resuming)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic wrapper for connection state.
#[derive(Debug)]
pub struct AtomicConnectionState(AtomicU32);

impl AtomicConnectionState {
    /// Create a new atomic state.
    #[must_use]
    pub const fn new(state: ConnectionState) -> Self {
        Self(AtomicU32::new(state as u32))
    }

    /// Load the current state.
    #[must_use]
    pub fn load(&self) -> ConnectionState {
        decode(self.0.load(Ordering::SeqCst))
    }

    /// Store a new state.
    pub fn store(&self, state: ConnectionState) {
        self.0.store(state as u32, Ordering::SeqCst);
    }

    /// Store a new state, returning the previous one.
    pub fn swap(&self, state: ConnectionState) -> ConnectionState {
        decode(self.0.swap(state as u32, Ordering::SeqCst))
    }
}

const fn decode(raw: u32) -> ConnectionState {
    match raw {
        0 => ConnectionState::Disconnected,
        1 => ConnectionState::Connecting,
        2 => ConnectionState::Resuming,
        _ => ConnectionState::Connected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_enum() {
        assert_eq!(ConnectionState::Disconnected as u32, 0);
        assert_eq!(ConnectionState::Connecting as u32, 1);
        assert_eq!(ConnectionState::Resuming as u32, 2);
        assert_eq!(ConnectionState::Connected as u32, 3);
    }

    #[test]
    fn test_atomic_connection_state() {
        let state = AtomicConnectionState::new(ConnectionState::Disconnected);
        assert_eq!(state.load(), ConnectionState::Disconnected);

        state.store(ConnectionState::Connecting);
        assert_eq!(state.load(), ConnectionState::Connecting);

        assert_eq!(
            state.swap(ConnectionState::Resuming),
            ConnectionState::Connecting
        );
        assert_eq!(state.load(), ConnectionState::Resuming);

        state.store(ConnectionState::Connected);
        assert_eq!(state.load(), ConnectionState::Connected);
    }

    #[test]
    fn test_is_connecting() {
        assert!(ConnectionState::Connecting.is_connecting());
        assert!(ConnectionState::Resuming.is_connecting());
        assert!(!ConnectionState::Connected.is_connecting());
        assert!(!ConnectionState::Disconnected.is_connecting());
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionState::Resuming.to_string(), "resuming");
    }
}
