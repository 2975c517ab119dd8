//! Gateway client configuration.
//!
//! Loaded from TOML. Every section and key is optional; missing values fall
//! back to the production defaults.
//!
//! ```toml
//! [reconnect]
//! base_delay_ms = 1000
//! max_delay_ms = 60000
//! jitter_fraction = 0.1
//! max_attempts = 10
//!
//! [dispatch]
//! command_buffer = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;
use crate::gateway::ReconnectConfig;

/// Outbound queue settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Capacity of the queue between the client handle and the connection task.
    pub command_buffer: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            command_buffer: 256,
        }
    }
}

/// Main gateway client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Reconnection backoff.
    pub reconnect: ReconnectConfig,
    /// Outbound queue.
    pub dispatch: DispatchConfig,
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            GatewayError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self, GatewayError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| GatewayError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, GatewayError> {
        toml::to_string_pretty(self)
            .map_err(|e| GatewayError::Config(format!("failed to render TOML: {e}")))
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<(), GatewayError> {
        self.reconnect.validate()?;

        if self.dispatch.command_buffer == 0 {
            return Err(GatewayError::Config(
                "dispatch.command_buffer must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Parse a gateway URL, accepting only `ws://` and `wss://`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidUrl`] if the URL does not parse or uses
/// another scheme.
pub fn parse_gateway_url(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw).map_err(|e| GatewayError::InvalidUrl(format!("{raw}: {e}")))?;

    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(GatewayError::InvalidUrl(format!(
            "{raw}: scheme must be ws or wss, got {other}"
        ))),
    }
}
