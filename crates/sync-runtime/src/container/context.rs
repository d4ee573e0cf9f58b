//! # Sync Context
//!
//! The one registry object of the client. Built once at startup and passed
//! by reference to everything that needs shared infrastructure; there are no
//! process-wide singletons.
//!
//! ## Construction Order
//!
//! ```text
//! 1. validate SyncConfig
//! 2. LedgerState + SnapshotStore
//! 3. WorkerSupervisor (spawns contexts + demultiplexer)
//! 4. store binding (supervisor events -> LedgerState)
//! 5. TopUpConfirmation over the minter port
//! ```

use crate::adapters::SnapshotBackend;
use crate::container::config::SyncConfig;
use crate::errors::RuntimeError;
use crate::wiring::{bind_store, LedgerState, StopRequests};
use ls_01_reconciled_store::SnapshotStore;
use ls_02_dual_read::DualReadExecutor;
use ls_03_confirmation_poller::{ConfirmationPoller, CyclesMinter, TopUpConfirmation};
use ls_05_worker_supervisor::{LedgerReader, WorkerSupervisor};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

/// Shared infrastructure of one client instance.
pub struct SyncContext {
    config: SyncConfig,
    state: Arc<LedgerState>,
    snapshots: SnapshotStore<SnapshotBackend>,
    supervisor: WorkerSupervisor,
    top_up: TopUpConfirmation<dyn CyclesMinter>,
    stop_requests: Mutex<Option<StopRequests>>,
}

impl SyncContext {
    /// Build every component. Must be called inside a tokio runtime.
    pub fn build(
        config: SyncConfig,
        reader: Arc<dyn LedgerReader>,
        minter: Arc<dyn CyclesMinter>,
    ) -> Result<Self, RuntimeError> {
        config.validate()?;

        let state = Arc::new(LedgerState::new());
        let backend = SnapshotBackend::open(config.snapshot_path.clone())?;
        let durable = backend.is_durable();
        let snapshots = SnapshotStore::new(backend);

        let supervisor = WorkerSupervisor::spawn(
            config.supervisor.clone(),
            reader,
            DualReadExecutor::new(config.dual_read),
            config.failure_policy,
        )?;
        let stop_requests = bind_store(&supervisor, Arc::clone(&state));

        let top_up = TopUpConfirmation::new(minter, ConfirmationPoller::new(config.poller)?);

        info!(
            contexts = config.supervisor.contexts,
            isolation = %config.supervisor.isolation,
            durable_snapshots = durable,
            "[runtime] Sync context built"
        );
        Ok(Self {
            config,
            state,
            snapshots,
            supervisor,
            top_up,
            stop_requests: Mutex::new(Some(stop_requests)),
        })
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The reconciled store.
    #[must_use]
    pub fn state(&self) -> &Arc<LedgerState> {
        &self.state
    }

    /// Snapshot persistence.
    #[must_use]
    pub fn snapshots(&self) -> &SnapshotStore<SnapshotBackend> {
        &self.snapshots
    }

    /// The worker supervisor.
    #[must_use]
    pub fn supervisor(&self) -> &WorkerSupervisor {
        &self.supervisor
    }

    /// Top-up confirmation flow.
    #[must_use]
    pub fn top_up(&self) -> &TopUpConfirmation<dyn CyclesMinter> {
        &self.top_up
    }

    /// Take the stop-request receiver; `None` after the first call.
    pub fn take_stop_requests(&self) -> Option<StopRequests> {
        self.stop_requests.lock().take()
    }
}
