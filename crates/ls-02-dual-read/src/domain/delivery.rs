//! # Deliveries
//!
//! What a fetch hands to its caller, one item per admitted branch.

use shared_types::{ReadChannel, RemoteError, SyncError, TrustedValue};

/// A failed branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    /// Channel of the failed branch.
    pub channel: ReadChannel,
    /// The remote error.
    pub error: RemoteError,
}

impl ReadFailure {
    /// Whether the trustworthy path failed.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        self.channel.is_verified()
    }

    /// Classify into the sync error taxonomy.
    #[must_use]
    pub fn into_sync_error(self) -> SyncError {
        SyncError::from_read(self.channel, self.error)
    }
}

/// One admitted branch result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered<T> {
    /// A value, tagged with its channel's trust level.
    Value(TrustedValue<T>),
    /// A failure, tagged with its channel.
    Failure(ReadFailure),
}

impl<T> Delivered<T> {
    /// Build from a branch outcome.
    pub fn from_branch(channel: ReadChannel, result: Result<T, RemoteError>) -> Self {
        match result {
            Ok(value) => Self::Value(TrustedValue::from_channel(value, channel)),
            Err(error) => Self::Failure(ReadFailure { channel, error }),
        }
    }

    /// Channel the delivery came from.
    pub fn channel(&self) -> ReadChannel {
        match self {
            Self::Value(value) => value.channel(),
            Self::Failure(failure) => failure.channel,
        }
    }
}

/// Summary of one `fetch` call, as far as it was observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchReport {
    /// Values handed to the sink.
    pub values: usize,
    /// Verified values handed to the sink.
    pub verified_values: usize,
    /// Unverified branch errors handed to the sink.
    pub unverified_errors: usize,
    /// The verified branch error, if it failed.
    pub verified_error: Option<RemoteError>,
    /// `true` once every issued branch settled.
    pub complete: bool,
}

impl FetchReport {
    /// Record a delivery.
    pub fn record<T>(&mut self, delivered: &Delivered<T>) {
        match delivered {
            Delivered::Value(value) => {
                self.values += 1;
                if value.verified {
                    self.verified_values += 1;
                }
            }
            Delivered::Failure(failure) if failure.is_verified() => {
                self.verified_error = Some(failure.error.clone());
            }
            Delivered::Failure(_) => self.unverified_errors += 1,
        }
    }

    /// Fold in the report of the branches that settled later.
    pub fn merge(&mut self, later: FetchReport) {
        self.values += later.values;
        self.verified_values += later.verified_values;
        self.unverified_errors += later.unverified_errors;
        if later.verified_error.is_some() {
            self.verified_error = later.verified_error;
        }
    }

    /// Whether nothing usable came back: no value was delivered and at least
    /// one branch failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.values == 0 && (self.unverified_errors > 0 || self.verified_error.is_some())
    }

    /// The error a task should surface for this fetch, if any. A verified
    /// failure always counts, even when the fast path delivered.
    #[must_use]
    pub fn failure(&self) -> Option<SyncError> {
        if let Some(error) = &self.verified_error {
            return Some(SyncError::VerifiedRead(error.clone()));
        }
        if self.is_failure() {
            return Some(SyncError::TransientRead {
                channel: ReadChannel::Unverified,
                source: RemoteError::Transport("all read branches failed".to_string()),
            });
        }
        None
    }
}
