//! # Task State
//!
//! Lifecycle counters shared between a task, its schedule and its in-flight
//! ticks.

use parking_lot::Mutex;
use shared_types::{Generation, TaskStatus};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

/// Shared lifecycle state of one task.
#[derive(Debug, Default)]
pub struct TaskState {
    status: Mutex<TaskStatus>,
    generation: AtomicU64,
    running: AtomicBool,
    failures: AtomicU32,
    request_seq: AtomicU64,
}

impl TaskState {
    /// Fresh idle state at generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        *self.status.lock()
    }

    /// Current generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    /// Running generation, or `None` when the task is not running.
    #[must_use]
    pub fn active_generation(&self) -> Option<Generation> {
        let status = self.status.lock();
        (*status == TaskStatus::Running).then(|| self.generation())
    }

    /// Whether results stamped with `generation` may still be delivered.
    #[must_use]
    pub fn is_current(&self, generation: Generation) -> bool {
        self.active_generation() == Some(generation)
    }

    /// Transition to `Running` with a fresh generation. Returns `None` if
    /// already running. `on_start` runs while the transition is held.
    pub fn begin(&self, on_start: impl FnOnce(Generation)) -> Option<Generation> {
        let mut status = self.status.lock();
        if *status == TaskStatus::Running {
            return None;
        }
        let generation = Generation(self.generation.fetch_add(1, Ordering::SeqCst) + 1);
        self.failures.store(0, Ordering::SeqCst);
        *status = TaskStatus::Running;
        on_start(generation);
        Some(generation)
    }

    /// Transition to `Stopped`, only if running `generation` (or any
    /// generation when `None`). `on_stop` runs while the transition is held.
    pub fn end(&self, generation: Option<Generation>, on_stop: impl FnOnce()) -> bool {
        let mut status = self.status.lock();
        if *status != TaskStatus::Running {
            return false;
        }
        if generation.is_some_and(|g| g != self.generation()) {
            return false;
        }
        *status = TaskStatus::Stopped;
        on_stop();
        true
    }

    /// Claim the in-flight slot; `None` if a tick is already running.
    #[must_use]
    pub fn try_claim(&self) -> Option<RunningGuard<'_>> {
        if self.running.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(RunningGuard {
            running: &self.running,
        })
    }

    /// Whether a tick is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Draw the next request id.
    pub fn next_request_id(&self) -> u64 {
        self.request_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a failed tick; returns the streak.
    pub fn record_failure(&self) -> u32 {
        self.failures.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Reset the failure streak.
    pub fn record_success(&self) {
        self.failures.store(0, Ordering::SeqCst);
    }

    /// Current failure streak.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }
}

/// Holds the in-flight slot; releases it on every exit path.
#[derive(Debug)]
pub struct RunningGuard<'a> {
    running: &'a AtomicBool,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}
