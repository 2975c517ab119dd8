//! Gateway op codes.

use std::fmt;

/// Op codes understood by the gateway.
///
/// The set is fixed by the wire contract. Frames carrying any other value are
/// still decodable (the raw integer is kept on the [`Envelope`](crate::Envelope))
/// but have no `OpCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Server-pushed event with a name and sequence number.
    Dispatch = 0,
    /// Liveness probe carrying the last seen sequence.
    Heartbeat = 1,
    /// Start a new session.
    Identify = 2,
    /// Client presence change.
    PresenceUpdate = 3,
    /// Voice state change. Accepted but unused by the client.
    VoiceStateUpdate = 4,
    /// Continue a previous session.
    Resume = 6,
    /// Server asks the client to reconnect.
    Reconnect = 7,
    /// First frame from the server, carries the heartbeat interval.
    Hello = 10,
    /// Server acknowledgement of a heartbeat.
    HeartbeatAck = 11,
}

impl OpCode {
    /// Every known op code, in wire order.
    pub const ALL: [Self; 9] = [
        Self::Dispatch,
        Self::Heartbeat,
        Self::Identify,
        Self::PresenceUpdate,
        Self::VoiceStateUpdate,
        Self::Resume,
        Self::Reconnect,
        Self::Hello,
        Self::HeartbeatAck,
    ];

    /// The integer sent on the wire.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Look up an op code by its wire value.
    #[must_use]
    pub const fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::Dispatch),
            1 => Some(Self::Heartbeat),
            2 => Some(Self::Identify),
            3 => Some(Self::PresenceUpdate),
            4 => Some(Self::VoiceStateUpdate),
            6 => Some(Self::Resume),
            7 => Some(Self::Reconnect),
            10 => Some(Self::Hello),
            11 => Some(Self::HeartbeatAck),
            _ => None,
        }
    }

    /// Upper-case protocol name, as used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dispatch => "DISPATCH",
            Self::Heartbeat => "HEARTBEAT",
            Self::Identify => "IDENTIFY",
            Self::PresenceUpdate => "PRESENCE_UPDATE",
            Self::VoiceStateUpdate => "VOICE_STATE_UPDATE",
            Self::Resume => "RESUME",
            Self::Reconnect => "RECONNECT",
            Self::Hello => "HELLO",
            Self::HeartbeatAck => "HEARTBEAT_ACK",
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(OpCode::Dispatch, 0 ; "dispatch")]
    #[test_case(OpCode::Heartbeat, 1 ; "heartbeat")]
    #[test_case(OpCode::Identify, 2 ; "identify")]
    #[test_case(OpCode::PresenceUpdate, 3 ; "presence update")]
    #[test_case(OpCode::VoiceStateUpdate, 4 ; "voice state update")]
    #[test_case(OpCode::Resume, 6 ; "resume")]
    #[test_case(OpCode::Reconnect, 7 ; "reconnect")]
    #[test_case(OpCode::Hello, 10 ; "hello")]
    #[test_case(OpCode::HeartbeatAck, 11 ; "heartbeat ack")]
    fn test_wire_values(op: OpCode, code: u8) {
        assert_eq!(op.code(), code);
        assert_eq!(OpCode::from_code(i64::from(code)), Some(op));
    }

    #[test_case(5 ; "gap between voice and resume")]
    #[test_case(8 ; "eight")]
    #[test_case(12 ; "past the end")]
    #[test_case(-1 ; "negative")]
    fn test_unknown_codes(code: i64) {
        assert_eq!(OpCode::from_code(code), None);
    }

    #[test]
    fn test_all_is_complete() {
        for op in OpCode::ALL {
            assert_eq!(OpCode::from_code(i64::from(op.code())), Some(op));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(OpCode::HeartbeatAck.to_string(), "HEARTBEAT_ACK");
        assert_eq!(OpCode::Hello.to_string(), "HELLO");
    }
}
