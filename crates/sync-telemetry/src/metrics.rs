//! Prometheus metrics for the sync core.
//!
//! All metrics follow the naming convention: `ls_<area>_<metric>_<unit>`
//!
//! Updates are fire-and-forget; nothing in the sync core depends on them.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Crate-level metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // SYNC TASK METRICS
    // =========================================================================

    /// Ticks by task kind and outcome
    pub static ref SYNC_TICKS: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_sync_ticks_total", "Sync task ticks by outcome"),
        &["kind", "outcome"]  // outcome: completed/failed/skipped/stale/halted
    ).expect("metric creation failed");

    /// Stale results discarded by the generation check
    pub static ref SYNC_STALE_RESULTS: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_sync_stale_results_total", "Results discarded after stop or restart"),
        &["kind"]
    ).expect("metric creation failed");

    /// Values delivered by kind and channel
    pub static ref SYNC_DELIVERIES: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_sync_deliveries_total", "Values delivered by sync tasks"),
        &["kind", "channel"]
    ).expect("metric creation failed");

    /// Tasks currently running
    pub static ref SYNC_TASKS_RUNNING: IntGauge = IntGauge::new(
        "ls_sync_tasks_running",
        "Sync tasks currently in the running state"
    ).expect("metric creation failed");

    // =========================================================================
    // SUPERVISOR METRICS
    // =========================================================================

    /// Worker events routed to handlers, by task kind
    pub static ref SUPERVISOR_EVENTS_ROUTED: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_supervisor_events_routed_total", "Worker events routed to handlers"),
        &["kind"]
    ).expect("metric creation failed");

    // =========================================================================
    // DUAL READ METRICS
    // =========================================================================

    /// Unverified deliveries dropped after a verified one
    pub static ref DUAL_READ_DROPPED_UNVERIFIED: IntCounter = IntCounter::new(
        "ls_dual_read_dropped_unverified_total",
        "Unverified deliveries dropped because a verified one came first"
    ).expect("metric creation failed");

    // =========================================================================
    // CONFIRMATION METRICS
    // =========================================================================

    /// Confirmation probe invocations by outcome
    pub static ref CONFIRMATION_ATTEMPTS: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_confirmation_attempts_total", "Confirmation probe invocations"),
        &["outcome"]  // outcome: success/retryable/fatal
    ).expect("metric creation failed");
}

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SYNC_TICKS.clone()),
        Box::new(SYNC_STALE_RESULTS.clone()),
        Box::new(SYNC_DELIVERIES.clone()),
        Box::new(SYNC_TASKS_RUNNING.clone()),
        Box::new(SUPERVISOR_EVENTS_ROUTED.clone()),
        Box::new(DUAL_READ_DROPPED_UNVERIFIED.clone()),
        Box::new(CONFIRMATION_ATTEMPTS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Encode all registered metrics in the Prometheus text format.
pub fn gather_text() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
