//! # Sync Telemetry
//!
//! Logging and metrics for the ledger sync client.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sync_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     init_telemetry(&TelemetryConfig::from_env()).expect("telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Full filter directive, wins over `LS_LOG_LEVEL` |
//! | `LS_LOG_LEVEL` | `info` | Log level filter |
//! | `LS_JSON_LOGS` | `false` | JSON log lines |
//! | `LS_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `LS_SERVICE_NAME` | `ledger-sync` | Service name |

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{build_filter, init_logging};
pub use metrics::{
    gather_text, register_metrics, CONFIRMATION_ATTEMPTS, DUAL_READ_DROPPED_UNVERIFIED,
    SUPERVISOR_EVENTS_ROUTED, SYNC_DELIVERIES, SYNC_STALE_RESULTS, SYNC_TASKS_RUNNING, SYNC_TICKS,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    /// Metric registration or encoding failed.
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Register metrics, then install logging.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(())
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
