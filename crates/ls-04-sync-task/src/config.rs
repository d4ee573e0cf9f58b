//! # Sync Task Configuration

use serde::{Deserialize, Serialize};
use shared_types::ConfigError;
use std::env;

/// When a task gives up on a broken resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePolicy {
    /// Consecutive failed ticks that stop the task.
    pub max_consecutive_failures: u32,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self {
            max_consecutive_failures: 5,
        }
    }
}

impl FailurePolicy {
    /// Short streak for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            max_consecutive_failures: 2,
        }
    }

    /// Reject a zero threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid {
                field: "max_consecutive_failures",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults overridden by `LS_MAX_CONSECUTIVE_FAILURES`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut policy = Self::default();
        if let Ok(raw) = env::var("LS_MAX_CONSECUTIVE_FAILURES") {
            policy.max_consecutive_failures = raw.parse().map_err(|_| ConfigError::Env {
                var: "LS_MAX_CONSECUTIVE_FAILURES",
                value: raw.clone(),
            })?;
        }
        policy.validate()?;
        Ok(policy)
    }

    /// Whether `streak` consecutive failures stop the task.
    #[must_use]
    pub fn exhausted(&self, streak: u32) -> bool {
        streak >= self.max_consecutive_failures
    }
}
