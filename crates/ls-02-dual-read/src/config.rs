//! # Dual Read Configuration

use crate::domain::{ReadStrategy, Resolution};
use serde::{Deserialize, Serialize};
use shared_types::ConfigError;
use std::env;

/// Dual read configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DualReadConfig {
    /// Channels issued per fetch.
    pub strategy: ReadStrategy,
    /// When `fetch` returns.
    pub resolution: Resolution,
}

impl DualReadConfig {
    /// Race both channels; used where the UI wants the fast value immediately.
    #[must_use]
    pub fn racing() -> Self {
        Self {
            strategy: ReadStrategy::Both,
            resolution: Resolution::Race,
        }
    }

    /// Defaults overridden by `LS_READ_STRATEGY` and `LS_READ_RESOLUTION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("LS_READ_STRATEGY") {
            config.strategy = raw.parse().map_err(|_| ConfigError::Env {
                var: "LS_READ_STRATEGY",
                value: raw.clone(),
            })?;
        }
        if let Ok(raw) = env::var("LS_READ_RESOLUTION") {
            config.resolution = raw.parse().map_err(|_| ConfigError::Env {
                var: "LS_READ_RESOLUTION",
                value: raw.clone(),
            })?;
        }
        Ok(config)
    }
}
