//! # Confirmation Poller
//!
//! Iterative bounded retry: call the probe, stop on success or a fatal
//! error, otherwise sleep and try again until the attempt budget is spent.

use crate::config::PollerConfig;
use crate::domain::{ConfirmationAttempt, ConfirmationOutcome, ProbeStatus};
use shared_types::ConfigError;
use std::future::Future;
use sync_telemetry::CONFIRMATION_ATTEMPTS;
use tracing::{debug, info, warn};

/// Waits for a second system to acknowledge an operation.
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationPoller {
    config: PollerConfig,
}

impl Default for ConfirmationPoller {
    fn default() -> Self {
        Self {
            config: PollerConfig::default(),
        }
    }
}

impl ConfirmationPoller {
    /// Create a poller; rejects a zero attempt budget.
    pub fn new(config: PollerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Bounds in use.
    #[must_use]
    pub fn config(&self) -> PollerConfig {
        self.config
    }

    /// Invoke `probe` until it succeeds, fails fatally, or `max_attempts`
    /// invocations were made. Never invokes `probe` more than `max_attempts`
    /// times and never sleeps after the last invocation.
    pub async fn confirm<T, E, F, Fut>(&self, mut probe: F) -> ConfirmationOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProbeStatus<T, E>>,
    {
        let mut attempt = ConfirmationAttempt::first(&self.config);
        loop {
            match probe().await {
                ProbeStatus::Success(value) => {
                    CONFIRMATION_ATTEMPTS.with_label_values(&["success"]).inc();
                    info!(attempt = attempt.attempt, "[ls-03] Operation confirmed");
                    return ConfirmationOutcome::Success(value);
                }
                ProbeStatus::Fatal(error) => {
                    CONFIRMATION_ATTEMPTS.with_label_values(&["fatal"]).inc();
                    warn!(attempt = attempt.attempt, "[ls-03] Confirmation failed fatally");
                    return ConfirmationOutcome::Fatal(error);
                }
                ProbeStatus::Retryable => {
                    CONFIRMATION_ATTEMPTS.with_label_values(&["retryable"]).inc();
                }
            }

            if attempt.is_last() {
                warn!(
                    attempts = attempt.attempt,
                    "[ls-03] Confirmation timed out"
                );
                return ConfirmationOutcome::Timeout {
                    attempts: attempt.attempt,
                };
            }

            debug!(
                attempt = attempt.attempt,
                remaining = attempt.remaining(),
                interval_ms = attempt.interval_ms,
                "[ls-03] Not confirmed yet, retrying"
            );
            tokio::time::sleep(self.config.interval()).await;
            attempt = attempt.next();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn retry_then_succeed(
        calls: &AtomicU32,
        retries: u32,
    ) -> impl FnMut() -> std::future::Ready<ProbeStatus<u32, String>> + '_ {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n <= retries {
                ProbeStatus::Retryable
            } else {
                ProbeStatus::Success(n)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_k_retries() {
        let poller = ConfirmationPoller::default();
        for k in [0u32, 1, 5, 14] {
            let calls = AtomicU32::new(0);
            let outcome = poller.confirm(retry_then_succeed(&calls, k)).await;
            assert_eq!(outcome, ConfirmationOutcome::Success(k + 1));
            assert_eq!(calls.load(Ordering::SeqCst), k + 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_retryable_times_out() {
        let poller = ConfirmationPoller::default();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let outcome = poller.confirm(retry_then_succeed(&calls, u32::MAX)).await;

        assert_eq!(outcome, ConfirmationOutcome::Timeout { attempts: 15 });
        assert_eq!(calls.load(Ordering::SeqCst), 15);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(14));
        assert!(elapsed < Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_returns_immediately() {
        let poller = ConfirmationPoller::default();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let outcome: ConfirmationOutcome<u32, String> = poller
            .confirm(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(ProbeStatus::Fatal("block is not a transfer".to_string()))
            })
            .await;

        assert_eq!(outcome.label(), "fatal");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_sleeps() {
        let poller = ConfirmationPoller::new(PollerConfig {
            max_attempts: 1,
            interval_ms: 1000,
        })
        .unwrap();
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let outcome = poller.confirm(retry_then_succeed(&calls, u32::MAX)).await;

        assert_eq!(outcome, ConfirmationOutcome::Timeout { attempts: 1 });
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_zero_budget_rejected() {
        let config = PollerConfig {
            max_attempts: 0,
            interval_ms: 1,
        };
        assert!(ConfirmationPoller::new(config).is_err());
    }
}
