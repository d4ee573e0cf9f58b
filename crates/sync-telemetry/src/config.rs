//! Telemetry configuration from environment variables.

use serde::{Deserialize, Serialize};
use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to JSON log lines
    pub service_name: String,

    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,

    /// Whether to write log lines to stdout at all
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "ledger-sync".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LS_SERVICE_NAME`: Service name (default: ledger-sync)
    /// - `LS_LOG_LEVEL`: Log level when `RUST_LOG` is unset (default: info)
    /// - `LS_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `LS_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("LS_SERVICE_NAME")
                .unwrap_or_else(|_| "ledger-sync".to_string()),

            log_level: env::var("LS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("LS_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("LS_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),
        }
    }

    /// Quiet configuration for tests.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            service_name: "ledger-sync-test".to_string(),
            log_level: "warn".to_string(),
            console_output: false,
            json_logs: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "ledger-sync");
        assert_eq!(config.log_level, "info");
        assert!(config.console_output);
        assert!(!config.json_logs);
    }

    #[test]
    fn test_for_testing_is_quiet() {
        let config = TelemetryConfig::for_testing();
        assert!(!config.console_output);
        assert_eq!(config.log_level, "warn");
    }
}
