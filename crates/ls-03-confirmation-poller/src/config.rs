//! # Poller Configuration

use serde::{Deserialize, Serialize};
use shared_types::ConfigError;
use std::env;
use std::time::Duration;

/// Confirmation poller configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollerConfig {
    /// Probe invocations before giving up.
    pub max_attempts: u32,
    /// Pause between two invocations, in milliseconds.
    pub interval_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 15,
            interval_ms: 1000,
        }
    }
}

impl PollerConfig {
    /// Short bounds for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_attempts: 3,
            interval_ms: 10,
        }
    }

    /// Pause between invocations.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Worst-case wall clock spent sleeping: `(max_attempts - 1) * interval`.
    #[must_use]
    pub fn worst_case(&self) -> Duration {
        self.interval() * self.max_attempts.saturating_sub(1)
    }

    /// Reject unusable bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults overridden by `LS_CONFIRM_MAX_ATTEMPTS` and
    /// `LS_CONFIRM_INTERVAL_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("LS_CONFIRM_MAX_ATTEMPTS") {
            config.max_attempts = raw.parse().map_err(|_| ConfigError::Env {
                var: "LS_CONFIRM_MAX_ATTEMPTS",
                value: raw.clone(),
            })?;
        }
        if let Ok(raw) = env::var("LS_CONFIRM_INTERVAL_MS") {
            config.interval_ms = raw.parse().map_err(|_| ConfigError::Env {
                var: "LS_CONFIRM_INTERVAL_MS",
                value: raw.clone(),
            })?;
        }
        config.validate()?;
        Ok(config)
    }
}
