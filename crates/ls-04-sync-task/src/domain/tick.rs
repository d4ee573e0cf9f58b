//! # Ticks

use serde::{Deserialize, Serialize};
use shared_types::{Generation, TaskKind};

/// Identity of the tick a result belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickStamp {
    /// Task family.
    pub kind: TaskKind,
    /// Generation captured when the tick started.
    pub generation: Generation,
    /// Per-task request counter; grows across generations.
    pub request_id: u64,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Work finished and the task was still current.
    Completed,
    /// Work failed; the failure was absorbed.
    Failed {
        /// Consecutive failures so far.
        streak: u32,
    },
    /// Work failed often enough to stop the task.
    Halted,
    /// Stop or restart happened while the work ran; the result was dropped.
    Stale,
    /// The previous tick was still in flight.
    Skipped,
    /// The task is not running.
    Inactive,
}

impl TickOutcome {
    /// Stable label for metrics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed { .. } => "failed",
            Self::Halted => "halted",
            Self::Stale => "stale",
            Self::Skipped => "skipped",
            Self::Inactive => "inactive",
        }
    }
}
