//! # Supervisor Configuration

use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use shared_types::ConfigError;
use std::env;
use std::fmt;
use std::str::FromStr;

/// How a background context is isolated from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// Dedicated OS thread with its own current-thread runtime.
    #[default]
    Thread,
    /// Task on the caller's runtime.
    Task,
}

impl fmt::Display for Isolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thread => f.write_str("thread"),
            Self::Task => f.write_str("task"),
        }
    }
}

impl FromStr for Isolation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thread" => Ok(Self::Thread),
            "task" => Ok(Self::Task),
            _ => Err(ConfigError::Env {
                var: "LS_WORKER_ISOLATION",
                value: s.to_string(),
            }),
        }
    }
}

/// Worker supervisor configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Number of background contexts; task kinds are spread across them.
    pub contexts: usize,
    /// Context isolation.
    pub isolation: Isolation,
    /// Capacity of the command and event channels.
    pub channel_capacity: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            contexts: 1,
            isolation: Isolation::Thread,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SupervisorConfig {
    /// Two task-isolated contexts on the test runtime.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            contexts: 2,
            isolation: Isolation::Task,
            channel_capacity: 64,
        }
    }

    /// Reject empty pools and zero-capacity channels.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contexts == 0 {
            return Err(ConfigError::Invalid {
                field: "contexts",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "channel_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Defaults overridden by `LS_WORKER_CONTEXTS`, `LS_WORKER_ISOLATION` and
    /// `LS_CHANNEL_CAPACITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("LS_WORKER_CONTEXTS") {
            config.contexts = raw.parse().map_err(|_| ConfigError::Env {
                var: "LS_WORKER_CONTEXTS",
                value: raw.clone(),
            })?;
        }
        if let Ok(raw) = env::var("LS_WORKER_ISOLATION") {
            config.isolation = raw.parse()?;
        }
        if let Ok(raw) = env::var("LS_CHANNEL_CAPACITY") {
            config.channel_capacity = raw.parse().map_err(|_| ConfigError::Env {
                var: "LS_CHANNEL_CAPACITY",
                value: raw.clone(),
            })?;
        }
        config.validate()?;
        Ok(config)
    }
}
