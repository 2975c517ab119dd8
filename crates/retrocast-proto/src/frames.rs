//! Handshake payloads and client-originated frames.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::envelope::encode;
use crate::error::ProtoError;
use crate::opcode::OpCode;
use crate::types::Snowflake;

/// Body of a HELLO frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloData {
    /// Heartbeat interval in milliseconds.
    pub heartbeat_interval: u64,
}

impl HelloData {
    /// The heartbeat interval as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns an error if the server announced an interval of zero.
    pub fn interval(&self) -> Result<Duration, ProtoError> {
        if self.heartbeat_interval == 0 {
            return Err(ProtoError::Decoding(
                "heartbeat_interval must be greater than 0".to_string(),
            ));
        }
        Ok(Duration::from_millis(self.heartbeat_interval))
    }
}

/// Body of an IDENTIFY frame.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyData {
    /// Bearer token.
    pub token: String,
}

impl fmt::Debug for IdentifyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentifyData")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Body of a RESUME frame.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeData {
    /// Bearer token.
    pub token: String,
    /// Session being resumed.
    pub session_id: String,
    /// Last sequence number the client saw.
    pub seq: i64,
}

impl fmt::Debug for ResumeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeData")
            .field("token", &"<redacted>")
            .field("session_id", &self.session_id)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Body of the READY dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyData {
    /// Session identifier to use for RESUME.
    pub session_id: String,
    /// The authenticated user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Snowflake>,
    /// Guilds the user belongs to.
    #[serde(default)]
    pub guilds: Vec<Snowflake>,
}

/// The part of READY the connection itself needs.
///
/// Every other field is ignored, whatever its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadySession {
    /// Session identifier to use for RESUME.
    pub session_id: String,
}

/// Presence a client may announce for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Available.
    Online,
    /// Away.
    Idle,
    /// Do not disturb.
    Dnd,
    /// Appear offline to others.
    Invisible,
}

impl PresenceStatus {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
            Self::Dnd => "dnd",
            Self::Invisible => "invisible",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PresenceStatus {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "online" => Ok(Self::Online),
            "idle" => Ok(Self::Idle),
            "dnd" => Ok(Self::Dnd),
            "invisible" => Ok(Self::Invisible),
            other => Err(ProtoError::Decoding(format!(
                "invalid presence status: {other}. Valid options: online, idle, dnd, invisible"
            ))),
        }
    }
}

/// Body of an outbound PRESENCE_UPDATE frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdateData {
    /// New status.
    pub status: PresenceStatus,
}

/// Frames the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientFrame {
    /// Liveness probe. `None` is sent as `"d": null`.
    Heartbeat {
        /// Last sequence seen, if any.
        sequence: Option<i64>,
    },
    /// Start a new session.
    Identify(IdentifyData),
    /// Continue an existing session.
    Resume(ResumeData),
    /// Change the client's presence.
    PresenceUpdate(PresenceUpdateData),
}

impl ClientFrame {
    /// Create a heartbeat frame.
    #[must_use]
    pub const fn heartbeat(sequence: Option<i64>) -> Self {
        Self::Heartbeat { sequence }
    }

    /// Create an identify frame.
    #[must_use]
    pub fn identify(token: impl Into<String>) -> Self {
        Self::Identify(IdentifyData {
            token: token.into(),
        })
    }

    /// Create a resume frame.
    #[must_use]
    pub fn resume(token: impl Into<String>, session_id: impl Into<String>, seq: i64) -> Self {
        Self::Resume(ResumeData {
            token: token.into(),
            session_id: session_id.into(),
            seq,
        })
    }

    /// Create a presence update frame.
    #[must_use]
    pub const fn presence(status: PresenceStatus) -> Self {
        Self::PresenceUpdate(PresenceUpdateData { status })
    }

    /// Op code this frame is sent with.
    #[must_use]
    pub const fn opcode(&self) -> OpCode {
        match self {
            Self::Heartbeat { .. } => OpCode::Heartbeat,
            Self::Identify(_) => OpCode::Identify,
            Self::Resume(_) => OpCode::Resume,
            Self::PresenceUpdate(_) => OpCode::PresenceUpdate,
        }
    }

    /// Serialize to the wire format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, ProtoError> {
        let op = self.opcode();
        match self {
            Self::Heartbeat { sequence } => encode(op, sequence.as_ref()),
            Self::Identify(data) => encode(op, Some(data)),
            Self::Resume(data) => encode(op, Some(data)),
            Self::PresenceUpdate(data) => encode(op, Some(data)),
        }
    }
}
