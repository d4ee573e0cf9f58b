//! Structured logging setup.
//!
//! One `tracing_subscriber` registry with an `EnvFilter` and either a pretty
//! or a JSON formatting layer. JSON lines carry:
//! - `timestamp`, `level`, `target`
//! - `fields.message` plus the structured fields of the call site
//! - `threadId`, so lines from different background contexts can be told apart

use crate::{TelemetryConfig, TelemetryError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter: `RUST_LOG` wins, then the configured level.
pub fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| TelemetryError::Config(e.to_string()))
}

/// Install the global subscriber.
///
/// Fails with [`TelemetryError::LoggingInit`] if a subscriber is already set.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = build_filter(config)?;

    if !config.console_output {
        return tracing_subscriber::registry()
            .with(filter)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()));
    }

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_current_span(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(true);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
    }
}

/// Log a sync event with the subsystem tag as a structured field.
#[macro_export]
macro_rules! log_sync_event {
    ($level:ident, $subsystem:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            subsystem = $subsystem,
            $($($field)*,)?
            $msg
        )
    };
}
