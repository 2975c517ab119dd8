//! Error types for the gateway client.

use thiserror::Error;

/// Errors returned by caller-facing gateway operations.
///
/// Transport failures are not in here: once a connection attempt is under
/// way they feed the reconnection loop instead of surfacing to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The gateway URL is unusable.
    #[error("invalid gateway url: {0}")]
    InvalidUrl(String),

    /// The operation needs an established session.
    #[error("not connected to the gateway")]
    NotConnected,

    /// The outbound command queue is full.
    #[error("outbound queue is full")]
    QueueFull,

    /// `connect` was called outside a tokio runtime.
    #[error("no tokio runtime available to drive the connection")]
    NoRuntime,

    /// Protocol error.
    #[error("protocol error: {0}")]
    Protocol(#[from] retrocast_proto::ProtoError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrocast_proto::ProtoError;

    #[test]
    fn test_config_error_display() {
        let err = GatewayError::Config("max_attempts must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "configuration error: max_attempts must be greater than 0"
        );
    }

    #[test]
    fn test_invalid_url_display() {
        let err = GatewayError::InvalidUrl("http://example.com".to_string());
        assert_eq!(err.to_string(), "invalid gateway url: http://example.com");
    }

    #[test]
    fn test_not_connected_display() {
        assert_eq!(
            GatewayError::NotConnected.to_string(),
            "not connected to the gateway"
        );
    }

    #[test]
    fn test_protocol_error_from() {
        let err: GatewayError = ProtoError::MissingField("d").into();
        assert!(matches!(err, GatewayError::Protocol(_)));
        assert!(err.to_string().starts_with("protocol error:"));
    }
}
