//! # Sync Task Descriptors
//!
//! Identity and lifecycle types for the background sync tasks.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of sync task families. One value per family.
///
/// Adding a family is a compile-time change on both sides of the worker
/// boundary: every `match` on this enum is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Account balances.
    Balance,
    /// Account transaction history.
    Transactions,
    /// Canister cycles balances.
    Cycles,
    /// Canister health monitoring.
    Monitoring,
    /// Custom domain registration progress.
    CustomDomainRegistration,
}

impl TaskKind {
    /// All task kinds, in declaration order.
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Balance,
        TaskKind::Transactions,
        TaskKind::Cycles,
        TaskKind::Monitoring,
        TaskKind::CustomDomainRegistration,
    ];

    /// Stable wire tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Transactions => "transactions",
            Self::Cycles => "cycles",
            Self::Monitoring => "monitoring",
            Self::CustomDomainRegistration => "custom-domain-registration",
        }
    }

    /// Position in [`TaskKind::ALL`].
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Balance => 0,
            Self::Transactions => 1,
            Self::Cycles => 2,
            Self::Monitoring => 3,
            Self::CustomDomainRegistration => 4,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a wire tag names no known task kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTaskKind(pub String);

impl fmt::Display for UnknownTaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown task kind: {}", self.0)
    }
}

impl std::error::Error for UnknownTaskKind {}

impl FromStr for TaskKind {
    type Err = UnknownTaskKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownTaskKind(s.to_string()))
    }
}

/// Lifecycle operation requested for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOp {
    /// Start ticking (no-op when already running).
    Start,
    /// Stop ticking; in-flight work is neutralised, not aborted.
    Stop,
    /// Stop then start with a fresh generation.
    Restart,
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Never started.
    #[default]
    Idle,
    /// Ticking on its interval.
    Running,
    /// Stopped by request or by the failure policy.
    Stopped,
}

/// Monotonic counter stamped on a task's in-flight work.
///
/// Incremented on every start and restart. Results carrying an older
/// generation than the task's current one are discarded.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation following this one.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Snapshot of a sync task's identity and lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncTaskDescriptor {
    /// Human readable name, e.g. `"refresh balance"`.
    pub name: String,
    /// Tick interval in milliseconds.
    pub interval_ms: u64,
    /// Current status.
    pub status: TaskStatus,
    /// Current generation.
    pub generation: Generation,
}
