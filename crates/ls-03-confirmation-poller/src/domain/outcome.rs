//! # Probe and Confirmation Outcomes

use crate::config::PollerConfig;
use shared_types::RemoteError;

/// What one probe invocation reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus<T, E> {
    /// The operation was acknowledged.
    Success(T),
    /// Not acknowledged yet; ask again later.
    Retryable,
    /// The operation can never be acknowledged.
    Fatal(E),
}

impl<T> ProbeStatus<T, RemoteError> {
    /// Map a remote reply: [`RemoteError::Processing`] is retryable, every
    /// other error is fatal.
    pub fn from_remote(result: Result<T, RemoteError>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(RemoteError::Processing) => Self::Retryable,
            Err(error) => Self::Fatal(error),
        }
    }
}

/// Final result of a confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome<T, E> {
    /// Acknowledged.
    Success(T),
    /// Still retryable after every allowed attempt.
    Timeout {
        /// Probe invocations made.
        attempts: u32,
    },
    /// The probe reported a fatal error.
    Fatal(E),
}

impl<T, E> ConfirmationOutcome<T, E> {
    /// Whether the operation was acknowledged.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Stable label for metrics and logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Timeout { .. } => "timeout",
            Self::Fatal(_) => "fatal",
        }
    }
}

/// Position inside one confirmation; owned by a single `confirm` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmationAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Attempt budget.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub interval_ms: u64,
}

impl ConfirmationAttempt {
    /// First attempt under `config`.
    #[must_use]
    pub fn first(config: &PollerConfig) -> Self {
        Self {
            attempt: 1,
            max_attempts: config.max_attempts,
            interval_ms: config.interval_ms,
        }
    }

    /// Attempts left after this one.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }

    /// Whether this is the last allowed attempt.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.remaining() == 0
    }

    /// The following attempt.
    #[must_use]
    pub fn next(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}
