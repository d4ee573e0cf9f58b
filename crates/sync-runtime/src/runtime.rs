//! # Sync Runtime
//!
//! Drives one [`SyncContext`]: hydrates the store, starts every configured
//! task, honours stop requests from the store binding, logs a periodic
//! summary and persists snapshots on shutdown.
//!
//! ## Startup Sequence
//!
//! 1. Hydrate the reconciled store from snapshots
//! 2. Start one task per configured resource
//! 3. Spawn the stop-request loop
//! 4. Spawn the summary loop
//!
//! ## Shutdown Sequence
//!
//! 1. Signal the background loops
//! 2. Shut the worker supervisor down
//! 3. Persist the store

use crate::container::SyncContext;
use crate::errors::RuntimeError;
use crate::wiring::StopRequests;
use parking_lot::Mutex;
use shared_types::{CanisterId, CyclesBalance, EntityId, TaskKind, TrustedValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// How long a background loop gets to exit after the shutdown signal.
const LOOP_GRACE: Duration = Duration::from_secs(1);

/// Counts of what the store currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSummary {
    /// Accounts with a balance.
    pub balances: usize,
    /// Transactions across all accounts.
    pub transactions: usize,
    /// Canisters with a cycles balance.
    pub cycles: usize,
    /// Canisters with a health status.
    pub monitoring: usize,
    /// Domains with a registration state.
    pub registrations: usize,
    /// Events routed by the supervisor so far.
    pub events_routed: u64,
    /// Kinds whose last result was a failure.
    pub failing: Vec<TaskKind>,
}

/// The running client.
pub struct SyncRuntime {
    context: Arc<SyncContext>,
    shutdown_tx: watch::Sender<bool>,
    loops: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl SyncRuntime {
    /// Wrap a built context. Nothing runs until [`SyncRuntime::start`].
    #[must_use]
    pub fn new(context: SyncContext) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            context: Arc::new(context),
            shutdown_tx,
            loops: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// The context this runtime drives.
    #[must_use]
    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    /// Hydrate, start every configured task and spawn the background loops.
    /// Starting twice is a no-op.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let hydrated = self.context.state().hydrate(self.context.snapshots())?;
        let specs = self.context.config().task_specs();
        for spec in &specs {
            self.context.supervisor().start(spec.clone()).await?;
        }

        let mut loops = self.loops.lock();
        if let Some(requests) = self.context.take_stop_requests() {
            loops.push(self.spawn_stop_loop(requests));
        }
        loops.push(self.spawn_summary_loop());

        info!(hydrated, tasks = specs.len(), "[runtime] Sync runtime started");
        Ok(())
    }

    fn spawn_stop_loop(&self, mut requests: StopRequests) -> JoinHandle<()> {
        let context = Arc::clone(&self.context);
        let mut shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    request = requests.recv() => {
                        let Some(kind) = request else { break };
                        match context.supervisor().stop(kind).await {
                            Ok(()) => info!(kind = %kind, "[runtime] Task stopped on request"),
                            Err(err) => warn!(kind = %kind, error = %err, "[runtime] Failed to stop task"),
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    fn spawn_summary_loop(&self) -> JoinHandle<()> {
        let context = Arc::clone(&self.context);
        let mut shutdown = self.shutdown_tx.subscribe();
        let period = Duration::from_millis(context.config().summary_interval_ms.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let summary = summarize(&context);
                        info!(
                            balances = summary.balances,
                            transactions = summary.transactions,
                            cycles = summary.cycles,
                            monitoring = summary.monitoring,
                            registrations = summary.registrations,
                            events_routed = summary.events_routed,
                            failing = ?summary.failing,
                            "[runtime] Store summary"
                        );
                    }
                    _ = shutdown.changed() => break,
                }
            }
        })
    }

    /// Current store counts.
    #[must_use]
    pub fn summary(&self) -> StoreSummary {
        summarize(&self.context)
    }

    /// Wait until the minter credits the top-up in `block_index`, then record
    /// the confirmed balance as verified.
    pub async fn confirm_top_up(
        &self,
        canister: &CanisterId,
        block_index: u64,
    ) -> Result<CyclesBalance, RuntimeError> {
        let balance = self.context.top_up().confirm(canister, block_index).await?;
        self.context
            .state()
            .cycles
            .set(EntityId::from(canister), TrustedValue::verified(balance));
        info!(canister = %canister, cycles = balance.cycles, block_index, "[runtime] Top-up recorded");
        Ok(balance)
    }

    /// Stop everything and persist the store. Returns how many entries were
    /// persisted. Safe to call more than once.
    pub async fn shutdown(&self) -> Result<usize, RuntimeError> {
        info!("[runtime] Initiating graceful shutdown");
        self.shutdown_tx.send_replace(true);

        let shutdown = self.context.supervisor().shutdown().await;

        let loops: Vec<JoinHandle<()>> = self.loops.lock().drain(..).collect();
        for mut handle in loops {
            if tokio::time::timeout(LOOP_GRACE, &mut handle).await.is_err() {
                handle.abort();
            }
        }

        let persisted = self.context.state().persist(self.context.snapshots())?;
        shutdown?;
        info!(persisted, "[runtime] Shutdown complete");
        Ok(persisted)
    }
}

fn summarize(context: &SyncContext) -> StoreSummary {
    let state = context.state();
    StoreSummary {
        balances: state.balances.len(),
        transactions: state
            .transactions
            .ids()
            .iter()
            .map(|id| state.transactions.get(id).len())
            .sum(),
        cycles: state.cycles.len(),
        monitoring: state.monitoring.len(),
        registrations: state.registrations.len(),
        events_routed: context.supervisor().events_routed(),
        failing: TaskKind::ALL
            .into_iter()
            .filter(|kind| state.last_error(*kind).is_some())
            .collect(),
    }
}
