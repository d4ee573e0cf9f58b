//! # Sync Task
//!
//! A named, intervalled, cancellable unit of repeated work.
//!
//! - `start` is idempotent; it bumps the generation, ticks immediately and
//!   then every interval.
//! - A tick that finds the previous one still in flight is skipped. When
//!   `start` finds a tick of an older generation in flight, its immediate
//!   tick runs as soon as that tick finishes.
//! - `stop` cancels the schedule but never interrupts an in-flight tick;
//!   the tick's own generation check drops its late results.
//! - A streak of failed ticks stops the task and surfaces a terminal error.

use crate::application::TickHandle;
use crate::config::FailurePolicy;
use crate::domain::{TaskState, TickOutcome, TickStamp};
use crate::ports::{TaskSink, TaskWork};
use parking_lot::Mutex;
use shared_types::{Generation, SyncTaskDescriptor, TaskKind, TaskStatus};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use sync_telemetry::{SYNC_TASKS_RUNNING, SYNC_TICKS};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

struct Inner<O> {
    kind: TaskKind,
    interval_ms: AtomicU64,
    policy: FailurePolicy,
    state: Arc<TaskState>,
    work: Mutex<Arc<dyn TaskWork<O>>>,
    sink: Arc<dyn TaskSink<O>>,
    schedule: Mutex<Option<JoinHandle<()>>>,
    rearm: AtomicBool,
}

impl<O> Drop for Inner<O> {
    fn drop(&mut self) {
        if let Some(handle) = self.schedule.get_mut().take() {
            handle.abort();
        }
    }
}

/// Periodic background work for one [`TaskKind`].
pub struct SyncTask<O> {
    inner: Arc<Inner<O>>,
}

impl<O> Clone for SyncTask<O> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: Send + Sync + 'static> SyncTask<O> {
    /// Create an idle task. An interval of zero is treated as 1 ms.
    pub fn new(
        kind: TaskKind,
        interval_ms: u64,
        policy: FailurePolicy,
        work: Arc<dyn TaskWork<O>>,
        sink: Arc<dyn TaskSink<O>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                kind,
                interval_ms: AtomicU64::new(interval_ms.max(1)),
                policy,
                state: Arc::new(TaskState::new()),
                work: Mutex::new(work),
                sink,
                schedule: Mutex::new(None),
                rearm: AtomicBool::new(false),
            }),
        }
    }

    /// Task family; also the task name.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.inner.kind
    }

    /// Lifecycle status.
    #[must_use]
    pub fn status(&self) -> TaskStatus {
        self.inner.state.status()
    }

    /// Latest generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.inner.state.generation()
    }

    /// Whether a tick is in flight.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.inner.state.is_running()
    }

    /// Tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.inner.interval_ms.load(Ordering::SeqCst))
    }

    /// Snapshot of the task's identity and lifecycle.
    #[must_use]
    pub fn descriptor(&self) -> SyncTaskDescriptor {
        SyncTaskDescriptor {
            name: self.inner.kind.as_str().to_string(),
            interval_ms: self.inner.interval_ms.load(Ordering::SeqCst),
            status: self.status(),
            generation: self.generation(),
        }
    }

    /// Replace the work. Ticks started afterwards use it.
    pub fn set_work(&self, work: Arc<dyn TaskWork<O>>) {
        *self.inner.work.lock() = work;
    }

    /// Change the interval; applies from the next `start`.
    pub fn set_interval_ms(&self, interval_ms: u64) {
        self.inner
            .interval_ms
            .store(interval_ms.max(1), Ordering::SeqCst);
    }

    /// Start ticking. Returns the new generation, or `None` if the task was
    /// already running. Must be called inside a tokio runtime.
    pub fn start(&self) -> Option<Generation> {
        let period = self.interval();
        let generation = self.inner.state.begin(|_| {
            let handle = tokio::spawn(run_schedule(Arc::downgrade(&self.inner), period));
            *self.inner.schedule.lock() = Some(handle);
        })?;
        if self.inner.state.is_running() {
            self.inner.rearm.store(true, Ordering::SeqCst);
        }
        SYNC_TASKS_RUNNING.inc();
        info!(
            kind = %self.inner.kind,
            generation = %generation,
            interval_ms = period.as_millis() as u64,
            "[ls-04] Task started"
        );
        Some(generation)
    }

    /// Stop ticking. In-flight work is left alone. Returns `false` if the
    /// task was not running.
    pub fn stop(&self) -> bool {
        let stopped = self.inner.state.end(None, || self.abort_schedule());
        if stopped {
            SYNC_TASKS_RUNNING.dec();
            info!(
                kind = %self.inner.kind,
                generation = %self.generation(),
                "[ls-04] Task stopped"
            );
        }
        stopped
    }

    /// `stop` followed by `start`; returns the fresh generation. If a tick
    /// of the old generation is still in flight, the first tick of the new
    /// one runs when it finishes.
    pub fn restart(&self) -> Generation {
        self.stop();
        self.start().unwrap_or_else(|| self.generation())
    }

    /// Run one tick now, subject to the same rules as scheduled ticks.
    pub async fn tick(&self) -> TickOutcome {
        let inner = &self.inner;
        let Some(generation) = inner.state.active_generation() else {
            return self.finish(TickOutcome::Inactive);
        };
        let Some(guard) = inner.state.try_claim() else {
            debug!(kind = %inner.kind, "[ls-04] Previous tick in flight, skipping");
            return self.finish(TickOutcome::Skipped);
        };

        let outcome = self.run_claimed(generation).await;
        drop(guard);
        self.run_rearmed();
        self.finish(outcome)
    }

    async fn run_claimed(&self, generation: Generation) -> TickOutcome {
        let inner = &self.inner;
        let stamp = TickStamp {
            kind: inner.kind,
            generation,
            request_id: inner.state.next_request_id(),
        };
        let handle = TickHandle::new(stamp, Arc::clone(&inner.state), Arc::clone(&inner.sink));
        let work = Arc::clone(&*inner.work.lock());
        let result = work.run(&handle).await;

        if !inner.state.is_current(generation) {
            debug!(
                kind = %inner.kind,
                generation = %generation,
                request_id = stamp.request_id,
                "[ls-04] Tick outlived its generation"
            );
            return TickOutcome::Stale;
        }

        match result {
            Ok(()) => {
                inner.state.record_success();
                TickOutcome::Completed
            }
            Err(err) => {
                let streak = inner.state.record_failure();
                if !inner.policy.exhausted(streak) {
                    warn!(kind = %inner.kind, streak, error = %err, "[ls-04] Tick failed");
                    TickOutcome::Failed { streak }
                } else if self.halt(generation) {
                    error!(
                        kind = %inner.kind,
                        streak,
                        error = %err,
                        "[ls-04] Failure streak exhausted, task stopped"
                    );
                    handle.fail_terminal(err).await;
                    TickOutcome::Halted
                } else {
                    TickOutcome::Stale
                }
            }
        }
    }

    fn run_rearmed(&self) {
        if !self.inner.rearm.swap(false, Ordering::SeqCst) {
            return;
        }
        if self.inner.state.active_generation().is_some() {
            debug!(kind = %self.inner.kind, "[ls-04] Running tick skipped by start");
            spawn_tick(self.clone());
        }
    }

    fn halt(&self, generation: Generation) -> bool {
        let halted = self
            .inner
            .state
            .end(Some(generation), || self.abort_schedule());
        if halted {
            SYNC_TASKS_RUNNING.dec();
        }
        halted
    }

    fn abort_schedule(&self) {
        if let Some(handle) = self.inner.schedule.lock().take() {
            handle.abort();
        }
    }

    fn finish(&self, outcome: TickOutcome) -> TickOutcome {
        SYNC_TICKS
            .with_label_values(&[self.inner.kind.as_str(), outcome.label()])
            .inc();
        outcome
    }
}

async fn run_schedule<O: Send + Sync + 'static>(inner: Weak<Inner<O>>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        spawn_tick(SyncTask { inner });
    }
}

fn spawn_tick<O: Send + Sync + 'static>(task: SyncTask<O>) {
    tokio::spawn(async move {
        task.tick().await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FnWork, RecordingTaskSink};
    use shared_types::{ReadChannel, RemoteError, SyncError, TrustedValue};
    use std::future::Future;
    use std::sync::atomic::AtomicUsize;

    fn work<F, Fut>(f: F) -> Arc<dyn TaskWork<u64>>
    where
        F: Fn(TickHandle<u64>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), SyncError>> + Send + 'static,
    {
        Arc::new(FnWork::<F, u64>::new(f))
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn transient() -> SyncError {
        SyncError::from_read(ReadChannel::Unverified, RemoteError::Transport("reset".to_string()))
    }

    fn counting_task(
        interval_ms: u64,
        delay_ms: u64,
    ) -> (SyncTask<u64>, Arc<RecordingTaskSink<u64>>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        let sink = Arc::new(RecordingTaskSink::<u64>::new());
        let counter = Arc::clone(&runs);
        let task = SyncTask::new(
            TaskKind::Balance,
            interval_ms,
            FailurePolicy::default(),
            work(move |tick| {
                let counter = Arc::clone(&counter);
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) as u64 + 1;
                    tokio::time::sleep(ms(delay_ms)).await;
                    tick.deliver(TrustedValue::verified(n)).await;
                    Ok(())
                }
            }),
            sink.clone(),
        );
        (task, sink, runs)
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_immediately_then_every_interval() {
        let (task, sink, runs) = counting_task(100, 0);
        assert_eq!(task.start(), Some(Generation(1)));

        tokio::time::sleep(ms(350)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 4);
        let ids: Vec<u64> = sink.values().iter().map(|(s, _)| s.request_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        task.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_idempotent() {
        let (task, _sink, _runs) = counting_task(100, 0);
        assert_eq!(task.start(), Some(Generation(1)));
        assert_eq!(task.start(), None);
        assert_eq!(task.generation(), Generation(1));
        assert_eq!(task.status(), TaskStatus::Running);
        task.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_overlapping_ticks() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        let runs = Arc::new(AtomicUsize::new(0));
        let (f, m, r) = (in_flight.clone(), max_seen.clone(), runs.clone());
        let task = SyncTask::new(
            TaskKind::Cycles,
            100,
            FailurePolicy::default(),
            work(move |_tick| {
                let (f, m, r) = (f.clone(), m.clone(), r.clone());
                async move {
                    let now = f.fetch_add(1, Ordering::SeqCst) + 1;
                    m.fetch_max(now, Ordering::SeqCst);
                    r.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(ms(250)).await;
                    f.fetch_sub(1, Ordering::SeqCst);
                    Ok(())
                }
            }),
            Arc::new(RecordingTaskSink::<u64>::new()),
        );

        task.start();
        tokio::time::sleep(ms(1000)).await;
        task.stop();

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        let runs = runs.load(Ordering::SeqCst);
        assert!((2..=4).contains(&runs), "runs = {runs}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_discards_in_flight_result() {
        let (task, sink, _runs) = counting_task(1000, 100);
        task.start();
        tokio::time::sleep(ms(50)).await;
        assert!(task.is_in_flight());

        assert_eq!(task.restart(), Generation(2));
        tokio::time::sleep(ms(1200)).await;

        let values = sink.values();
        assert!(!values.is_empty());
        assert!(values.iter().all(|(s, _)| s.generation == Generation(2)));
        task.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_ticks_once_old_tick_finishes() {
        let (task, sink, runs) = counting_task(1000, 100);
        task.start();
        tokio::time::sleep(ms(50)).await;
        assert_eq!(task.restart(), Generation(2));

        // Old tick ends at 100 ms; the new generation's first tick runs then
        // instead of a full interval later.
        tokio::time::sleep(ms(250)).await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
        let values = sink.values();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].0.generation, Generation(2));
        task.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_neutralizes_in_flight_tick() {
        let (task, sink, runs) = counting_task(1000, 100);
        task.start();
        tokio::time::sleep(ms(50)).await;
        assert!(task.stop());
        assert!(!task.stop());

        tokio::time::sleep(ms(2000)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(sink.values().is_empty());
        assert_eq!(task.status(), TaskStatus::Stopped);
        assert_eq!(task.generation(), Generation(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_streak_stops_task() {
        let sink = Arc::new(RecordingTaskSink::<u64>::new());
        let task = SyncTask::new(
            TaskKind::Monitoring,
            100,
            FailurePolicy::for_testing(),
            work(|_tick| async { Err(transient()) }),
            sink.clone(),
        );

        task.start();
        tokio::time::sleep(ms(550)).await;

        assert_eq!(task.status(), TaskStatus::Stopped);
        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].2);
        assert_eq!(failures[0].1, transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_streak() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let task = SyncTask::new(
            TaskKind::Transactions,
            100,
            FailurePolicy::for_testing(),
            work(move |_tick| {
                let n = c.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n % 2 == 0 {
                        Err(transient())
                    } else {
                        Ok(())
                    }
                }
            }),
            Arc::new(RecordingTaskSink::<u64>::new()),
        );

        task.start();
        tokio::time::sleep(ms(1050)).await;
        assert_eq!(task.status(), TaskStatus::Running);
        assert!(calls.load(Ordering::SeqCst) >= 10);
        task.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_work_applies_to_next_tick() {
        let (task, sink, _runs) = counting_task(1000, 0);
        task.start();
        tokio::time::sleep(ms(10)).await;
        task.set_work(work(|tick| async move {
            tick.deliver(TrustedValue::unverified(99)).await;
            Ok(())
        }));
        tokio::time::sleep(ms(1000)).await;

        let values = sink.values();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1].1, TrustedValue::unverified(99));
        task.stop();
    }

    #[tokio::test]
    async fn test_tick_inactive_before_start() {
        let (task, _sink, runs) = counting_task(1000, 0);
        assert_eq!(task.tick().await, TickOutcome::Inactive);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_descriptor() {
        let (task, _sink, _runs) = counting_task(250, 0);
        let descriptor = task.descriptor();
        assert_eq!(descriptor.name, "balance");
        assert_eq!(descriptor.interval_ms, 250);
        assert_eq!(descriptor.status, TaskStatus::Idle);
        assert_eq!(descriptor.generation, Generation(0));
    }
}
