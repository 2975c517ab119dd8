//! Reconnection configuration and exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Configuration for reconnection behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconnectConfig {
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on the un-jittered delay, in milliseconds.
    pub max_delay_ms: u64,
    /// Extra random delay as a fraction of the computed delay.
    pub jitter_fraction: f64,
    /// Retries allowed before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            jitter_fraction: 0.1,
            max_attempts: 10,
        }
    }
}

impl ReconnectConfig {
    /// Un-jittered delay for the given zero-based attempt number.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        let delay_ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }

    /// Check if another retry is allowed after `attempt` retries.
    #[must_use]
    pub const fn should_reconnect(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any value would make the backoff degenerate.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.base_delay_ms == 0 {
            return Err(GatewayError::Config(
                "reconnect.base_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.max_delay_ms < self.base_delay_ms {
            return Err(GatewayError::Config(
                "reconnect.max_delay_ms must be at least base_delay_ms".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err(GatewayError::Config(
                "reconnect.jitter_fraction must be between 0 and 1".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(GatewayError::Config(
                "reconnect.max_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Retry counter plus delay schedule for one logical connection.
///
/// Delays grow as `base * 2^attempt`, capped at `max_delay_ms`, then gain up
/// to `jitter_fraction` of themselves as uniform random jitter so a fleet of
/// clients does not reconnect in lockstep.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    config: ReconnectConfig,
    attempt: u32,
}

impl ReconnectPolicy {
    /// Create a policy with zero attempts used.
    #[must_use]
    pub const fn new(config: ReconnectConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// Retries consumed since the last reset.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Configured retry limit.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Forget all consumed retries.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    /// Whether another retry is allowed.
    #[must_use]
    pub const fn can_retry(&self) -> bool {
        self.config.should_reconnect(self.attempt)
    }

    /// Delay before the next retry. Consumes one attempt.
    pub fn next_delay(&mut self) -> Duration {
        self.next_delay_with(&mut rand::thread_rng())
    }

    /// Same as [`ReconnectPolicy::next_delay`] with a caller-supplied RNG.
    ///
    /// Never panics: a jitter fraction that is not a finite positive number
    /// adds no jitter, and jitter too large for a [`Duration`] is skipped.
    pub fn next_delay_with<R: Rng>(&mut self, rng: &mut R) -> Duration {
        let delay = self.config.delay_for_attempt(self.attempt);
        self.attempt = self.attempt.saturating_add(1);

        let max_jitter = delay.as_secs_f64() * self.config.jitter_fraction;
        if !max_jitter.is_finite() || max_jitter <= 0.0 {
            return delay;
        }

        Duration::try_from_secs_f64(rng.gen_range(0.0..=max_jitter))
            .ok()
            .and_then(|jitter| delay.checked_add(jitter))
            .unwrap_or(delay)
    }
}
