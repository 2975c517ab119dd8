//! The gateway envelope and its codec.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;
use crate::opcode::OpCode;

/// A single gateway frame.
///
/// `sequence` and `event` are only meaningful on dispatch frames; [`decode`]
/// clears them on every other op so callers never have to re-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Raw op value. Kept as an integer so unknown ops survive decoding.
    pub op: i64,
    /// Payload body, `null` when absent.
    #[serde(rename = "d", default)]
    pub data: Value,
    /// Sequence number of a dispatch frame.
    #[serde(rename = "s", default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<i64>,
    /// Event name of a dispatch frame.
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

impl Envelope {
    /// Build a non-dispatch frame.
    #[must_use]
    pub fn new(op: OpCode, data: Value) -> Self {
        Self {
            op: i64::from(op.code()),
            data,
            sequence: None,
            event: None,
        }
    }

    /// Build a dispatch frame.
    #[must_use]
    pub fn dispatch(event: impl Into<String>, sequence: Option<i64>, data: Value) -> Self {
        Self {
            op: i64::from(OpCode::Dispatch.code()),
            data,
            sequence,
            event: Some(event.into()),
        }
    }

    /// Build a HELLO frame announcing the heartbeat interval in milliseconds.
    #[must_use]
    pub fn hello(heartbeat_interval_ms: u64) -> Self {
        Self::new(
            OpCode::Hello,
            serde_json::json!({ "heartbeat_interval": heartbeat_interval_ms }),
        )
    }

    /// Build a HEARTBEAT_ACK frame.
    #[must_use]
    pub fn heartbeat_ack() -> Self {
        Self::new(OpCode::HeartbeatAck, Value::Null)
    }

    /// Build a RECONNECT frame.
    #[must_use]
    pub fn reconnect() -> Self {
        Self::new(OpCode::Reconnect, Value::Null)
    }

    /// The op code, or `None` if the server sent a value this client does not know.
    #[must_use]
    pub const fn opcode(&self) -> Option<OpCode> {
        OpCode::from_code(self.op)
    }

    /// Whether this is a dispatch frame.
    #[must_use]
    pub const fn is_dispatch(&self) -> bool {
        self.op == OpCode::Dispatch as i64
    }

    /// Decode the payload body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::MissingField`] if the body is `null`, or
    /// [`ProtoError::Decoding`] if it does not have the shape of `T`.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, ProtoError> {
        if self.data.is_null() {
            return Err(ProtoError::MissingField("d"));
        }
        T::deserialize(&self.data).map_err(|e| ProtoError::Decoding(e.to_string()))
    }

    /// Decode the payload body into `T`, checking the op code first.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::UnexpectedOpCode`] if the frame is not `expected`,
    /// otherwise the same errors as [`Envelope::payload`].
    pub fn payload_for<T: DeserializeOwned>(&self, expected: OpCode) -> Result<T, ProtoError> {
        if self.opcode() != Some(expected) {
            return Err(ProtoError::UnexpectedOpCode {
                expected,
                actual: self.op,
            });
        }
        self.payload()
    }

    /// Serialize to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }
}

/// Decode one inbound frame.
///
/// Unknown op values decode successfully. Only bytes that are not a JSON
/// object with an integer `op` are rejected.
///
/// # Errors
///
/// Returns [`ProtoError::Decoding`] if the frame is not a valid envelope.
pub fn decode(raw: &[u8]) -> Result<Envelope, ProtoError> {
    let mut envelope: Envelope = serde_json::from_slice(raw)?;
    if !envelope.is_dispatch() {
        envelope.sequence = None;
        envelope.event = None;
    }
    Ok(envelope)
}

/// Decode one inbound text frame.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_str(raw: &str) -> Result<Envelope, ProtoError> {
    decode(raw.as_bytes())
}

#[derive(Serialize)]
struct Outbound<'a, T: Serialize> {
    op: u8,
    d: Option<&'a T>,
}

/// Encode one outbound frame.
///
/// An absent payload is written as `"d": null`; the key is never omitted.
///
/// # Errors
///
/// Returns [`ProtoError::Encoding`] if `payload` cannot be represented as JSON.
pub fn encode<T: Serialize>(op: OpCode, payload: Option<&T>) -> Result<String, ProtoError> {
    serde_json::to_string(&Outbound {
        op: op.code(),
        d: payload,
    })
    .map_err(|e| ProtoError::Encoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_decode_dispatch() {
        let raw = br#"{"op":0,"d":{"id":"1"},"s":42,"t":"MESSAGE_CREATE"}"#;
        let env = decode(raw).unwrap();

        assert_eq!(env.opcode(), Some(OpCode::Dispatch));
        assert_eq!(env.sequence, Some(42));
        assert_eq!(env.event.as_deref(), Some("MESSAGE_CREATE"));
        assert_eq!(env.data, json!({"id": "1"}));
    }

    #[test]
    fn test_decode_unknown_op_is_not_an_error() {
        let env = decode_str(r#"{"op":99,"d":null}"#).unwrap();
        assert_eq!(env.op, 99);
        assert_eq!(env.opcode(), None);
    }

    #[test]
    fn test_decode_missing_d_is_null() {
        let env = decode_str(r#"{"op":11}"#).unwrap();
        assert_eq!(env.opcode(), Some(OpCode::HeartbeatAck));
        assert!(env.data.is_null());
    }

    #[test]
    fn test_decode_strips_sequence_from_non_dispatch() {
        let env = decode_str(r#"{"op":10,"d":{"heartbeat_interval":1},"s":7,"t":"X"}"#).unwrap();
        assert_eq!(env.sequence, None);
        assert_eq!(env.event, None);
    }

    #[test]
    fn test_decode_null_sequence() {
        let env = decode_str(r#"{"op":0,"d":{},"s":null,"t":"READY"}"#).unwrap();
        assert_eq!(env.sequence, None);
        assert_eq!(env.event.as_deref(), Some("READY"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not json"), Err(ProtoError::Decoding(_))));
        assert!(matches!(decode(b"[1,2,3]"), Err(ProtoError::Decoding(_))));
        assert!(matches!(
            decode_str(r#"{"op":"hello"}"#),
            Err(ProtoError::Decoding(_))
        ));
        assert!(matches!(decode_str(r#"{"d":1}"#), Err(ProtoError::Decoding(_))));
    }

    #[test]
    fn test_encode_bare_heartbeat_keeps_d_key() {
        let json = encode::<i64>(OpCode::Heartbeat, None).unwrap();
        assert_eq!(json, r#"{"op":1,"d":null}"#);
    }

    #[test]
    fn test_encode_with_payload() {
        let json = encode(OpCode::Heartbeat, Some(&42_i64)).unwrap();
        assert_eq!(json, r#"{"op":1,"d":42}"#);
    }

    #[test]
    fn test_payload_null_is_missing_field() {
        let env = Envelope::heartbeat_ack();
        let err = env.payload::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, ProtoError::MissingField("d")));
    }

    #[test]
    fn test_payload_for_wrong_op() {
        let env = Envelope::heartbeat_ack();
        let err = env
            .payload_for::<serde_json::Value>(OpCode::Hello)
            .unwrap_err();
        assert!(matches!(
            err,
            ProtoError::UnexpectedOpCode {
                expected: OpCode::Hello,
                actual: 11
            }
        ));
    }

    #[test]
    fn test_dispatch_builder_serializes_s_and_t() {
        let env = Envelope::dispatch("READY", Some(1), json!({"session_id": "abc"}));
        let value: serde_json::Value = serde_json::from_str(&env.to_json().unwrap()).unwrap();
        assert_eq!(value["op"], 0);
        assert_eq!(value["s"], 1);
        assert_eq!(value["t"], "READY");
    }

    #[test]
    fn test_non_dispatch_builder_omits_s_and_t() {
        let json = Envelope::hello(41_250).to_json().unwrap();
        assert!(!json.contains("\"s\""));
        assert!(!json.contains("\"t\""));
        assert!(json.contains("41250"));
    }

    proptest! {
        #[test]
        fn decode_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
            let _ = decode(&bytes);
        }

        #[test]
        fn non_dispatch_frames_never_carry_a_sequence(op in 1i64..64, seq in any::<i64>()) {
            let raw = format!(r#"{{"op":{op},"d":null,"s":{seq},"t":"X"}}"#);
            let env = decode_str(&raw).unwrap();
            prop_assert_eq!(env.sequence, None);
            prop_assert_eq!(env.event, None);
        }
    }
}
