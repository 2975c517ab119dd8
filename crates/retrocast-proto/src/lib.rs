//! # retrocast-proto
//!
//! Wire protocol for the Retrocast realtime gateway.
//!
//! Every frame on the socket is a JSON [`Envelope`]:
//!
//! ```text
//! { "op": <int>, "d": <any|null>, "s": <int|null>, "t": <string|null> }
//! ```
//!
//! This crate only knows how to turn bytes into envelopes and back. Domain
//! payloads (messages, guilds, channels) stay as raw JSON and are decoded by
//! whoever subscribes to the event.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod events;
pub mod frames;
pub mod opcode;
pub mod types;

pub use envelope::{decode, decode_str, encode, Envelope};
pub use error::ProtoError;
pub use events::{
    ChannelDeleteData, DispatchEvent, EventName, GuildDeleteData, GuildMemberRemoveData,
    GuildRoleDeleteData, MessageDeleteData, PresenceUpdateEvent, TypingStartData, GATEWAY_CLOSED,
};
pub use frames::{
    ClientFrame, HelloData, IdentifyData, PresenceStatus, PresenceUpdateData, ReadyData, ReadySession,
    ResumeData,
};
pub use opcode::OpCode;
pub use types::Snowflake;
