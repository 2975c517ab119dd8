//! Dispatch event names and typed decoders for the ID-only payloads.
//!
//! Entity payloads (`MESSAGE_CREATE`, `GUILD_UPDATE`, ...) carry full domain
//! objects and are left as raw JSON in [`DispatchEvent::Other`]; decoding
//! those is the job of whoever keeps the entity stores.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtoError;
use crate::frames::ReadyData;
use crate::types::Snowflake;

/// Name of the synthetic event published when the client gives up reconnecting.
pub const GATEWAY_CLOSED: &str = "GATEWAY_CLOSED";

macro_rules! event_names {
    ($($variant:ident => $wire:literal),+ $(,)?) => {
        /// Dispatch event names sent by the server.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum EventName {
            $(
                #[doc = concat!("`", $wire, "`")]
                $variant,
            )+
            /// Any name this client does not know.
            Other(String),
        }

        impl EventName {
            /// Wire name.
            #[must_use]
            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $wire,)+
                    Self::Other(name) => name,
                }
            }

            /// Look up a known name. Unknown names become [`EventName::Other`].
            #[must_use]
            pub fn parse(name: &str) -> Self {
                match name {
                    $($wire => Self::$variant,)+
                    other => Self::Other(other.to_string()),
                }
            }
        }
    };
}

event_names! {
    Ready => "READY",
    MessageCreate => "MESSAGE_CREATE",
    MessageUpdate => "MESSAGE_UPDATE",
    MessageDelete => "MESSAGE_DELETE",
    GuildCreate => "GUILD_CREATE",
    GuildUpdate => "GUILD_UPDATE",
    GuildDelete => "GUILD_DELETE",
    ChannelCreate => "CHANNEL_CREATE",
    ChannelUpdate => "CHANNEL_UPDATE",
    ChannelDelete => "CHANNEL_DELETE",
    GuildMemberAdd => "GUILD_MEMBER_ADD",
    GuildMemberRemove => "GUILD_MEMBER_REMOVE",
    GuildMemberUpdate => "GUILD_MEMBER_UPDATE",
    GuildRoleCreate => "GUILD_ROLE_CREATE",
    GuildRoleUpdate => "GUILD_ROLE_UPDATE",
    GuildRoleDelete => "GUILD_ROLE_DELETE",
    TypingStart => "TYPING_START",
    PresenceUpdate => "PRESENCE_UPDATE",
    VoiceStateUpdate => "VOICE_STATE_UPDATE",
    GuildBanAdd => "GUILD_BAN_ADD",
    GuildBanRemove => "GUILD_BAN_REMOVE",
    MessageReactionAdd => "MESSAGE_REACTION_ADD",
    MessageReactionRemove => "MESSAGE_REACTION_REMOVE",
}

impl EventName {
    /// Whether the name is one the server is known to send.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl FromStr for EventName {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `TYPING_START` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingStartData {
    /// Channel being typed in.
    pub channel_id: Snowflake,
    /// Guild owning the channel.
    pub guild_id: Snowflake,
    /// Who is typing.
    pub user_id: Snowflake,
    /// Unix timestamp in seconds.
    pub timestamp: i64,
}

/// `PRESENCE_UPDATE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdateEvent {
    /// User whose presence changed.
    pub user_id: Snowflake,
    /// New status, including `offline`.
    pub status: String,
}

/// `MESSAGE_DELETE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDeleteData {
    /// Deleted message.
    pub id: Snowflake,
    /// Channel it was in.
    pub channel_id: Snowflake,
}

/// `CHANNEL_DELETE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelDeleteData {
    /// Deleted channel.
    pub id: Snowflake,
    /// Guild it belonged to.
    pub guild_id: Snowflake,
}

/// `GUILD_DELETE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildDeleteData {
    /// Deleted or left guild.
    pub id: Snowflake,
}

/// `GUILD_MEMBER_REMOVE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildMemberRemoveData {
    /// Guild.
    pub guild_id: Snowflake,
    /// Removed member.
    pub user_id: Snowflake,
}

/// `GUILD_ROLE_DELETE` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuildRoleDeleteData {
    /// Guild.
    pub guild_id: Snowflake,
    /// Deleted role.
    pub role_id: Snowflake,
}

/// A dispatch event with its payload decoded where the shape is fixed.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    /// Session established.
    Ready(ReadyData),
    /// Someone started typing.
    TypingStart(TypingStartData),
    /// Someone's presence changed.
    PresenceUpdate(PresenceUpdateEvent),
    /// A message was deleted.
    MessageDelete(MessageDeleteData),
    /// A channel was deleted.
    ChannelDelete(ChannelDeleteData),
    /// A guild was deleted or left.
    GuildDelete(GuildDeleteData),
    /// A member left or was removed.
    GuildMemberRemove(GuildMemberRemoveData),
    /// A role was deleted.
    GuildRoleDelete(GuildRoleDeleteData),
    /// Anything else, payload untouched.
    Other {
        /// Event name.
        name: EventName,
        /// Raw payload.
        payload: Value,
    },
}

impl DispatchEvent {
    /// Decode a dispatch payload according to its event name.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decoding`] if a known fixed-shape event carries a
    /// payload of the wrong shape.
    pub fn parse(name: &str, payload: &Value) -> Result<Self, ProtoError> {
        let name = EventName::parse(name);
        Ok(match name {
            EventName::Ready => Self::Ready(from_payload(&name, payload)?),
            EventName::TypingStart => Self::TypingStart(from_payload(&name, payload)?),
            EventName::PresenceUpdate => Self::PresenceUpdate(from_payload(&name, payload)?),
            EventName::MessageDelete => Self::MessageDelete(from_payload(&name, payload)?),
            EventName::ChannelDelete => Self::ChannelDelete(from_payload(&name, payload)?),
            EventName::GuildDelete => Self::GuildDelete(from_payload(&name, payload)?),
            EventName::GuildMemberRemove => {
                Self::GuildMemberRemove(from_payload(&name, payload)?)
            }
            EventName::GuildRoleDelete => Self::GuildRoleDelete(from_payload(&name, payload)?),
            name => Self::Other {
                name,
                payload: payload.clone(),
            },
        })
    }

    /// The event's name.
    #[must_use]
    pub fn name(&self) -> EventName {
        match self {
            Self::Ready(_) => EventName::Ready,
            Self::TypingStart(_) => EventName::TypingStart,
            Self::PresenceUpdate(_) => EventName::PresenceUpdate,
            Self::MessageDelete(_) => EventName::MessageDelete,
            Self::ChannelDelete(_) => EventName::ChannelDelete,
            Self::GuildDelete(_) => EventName::GuildDelete,
            Self::GuildMemberRemove(_) => EventName::GuildMemberRemove,
            Self::GuildRoleDelete(_) => EventName::GuildRoleDelete,
            Self::Other { name, .. } => name.clone(),
        }
    }
}

fn from_payload<T: DeserializeOwned>(name: &EventName, payload: &Value) -> Result<T, ProtoError> {
    T::deserialize(payload).map_err(|e| ProtoError::Decoding(format!("{name} payload: {e}")))
}
