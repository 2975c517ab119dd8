//! Shared identifier types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ProtoError;

/// Milliseconds between the Unix epoch and 2025-01-01T00:00:00Z.
pub const SNOWFLAKE_EPOCH_MS: i64 = 1_735_689_600_000;

/// A server-issued 64-bit identifier.
///
/// Serialized as a JSON string so JavaScript clients keep full precision.
/// Deserialization accepts either a string or a bare integer, because some
/// server payloads (the guild list in READY) still send numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Snowflake(i64);

impl Snowflake {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Creation time encoded in the upper 42 bits.
    #[must_use]
    pub fn timestamp(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis((self.0 >> 22) + SNOWFLAKE_EPOCH_MS)
    }
}

impl From<i64> for Snowflake {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl FromStr for Snowflake {
    type Err = ProtoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|e| ProtoError::Decoding(format!("invalid snowflake {s:?}: {e}")))
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(i64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(Self(n)),
        }
    }
}
