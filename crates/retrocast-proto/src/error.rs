//! Error types for the retrocast-proto crate.

use thiserror::Error;

use crate::opcode::OpCode;

/// Errors that can occur while encoding or decoding gateway frames.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Failed to encode a frame.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Failed to decode a frame or payload.
    #[error("decoding error: {0}")]
    Decoding(String),

    /// A payload was required but the frame carried `null`.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A payload was read from a frame with the wrong op code.
    #[error("unexpected op code: expected {expected}, got {actual}")]
    UnexpectedOpCode {
        /// The op code the caller asked for.
        expected: OpCode,
        /// The raw op value found on the frame.
        actual: i64,
    },
}

impl From<serde_json::Error> for ProtoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoding_error_display() {
        let err = ProtoError::Decoding("expected value at line 1".to_string());
        assert_eq!(err.to_string(), "decoding error: expected value at line 1");
    }

    #[test]
    fn test_missing_field_display() {
        let err = ProtoError::MissingField("d");
        assert_eq!(err.to_string(), "missing required field: d");
    }

    #[test]
    fn test_unexpected_op_code_display() {
        let err = ProtoError::UnexpectedOpCode {
            expected: OpCode::Hello,
            actual: 0,
        };
        assert_eq!(err.to_string(), "unexpected op code: expected HELLO, got 0");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ProtoError = json_err.into();
        assert!(matches!(err, ProtoError::Decoding(_)));
    }
}
