//! # Store Binding
//!
//! Applies demultiplexed worker events to the reconciled store.
//!
//! ```text
//! WorkerSupervisor ──Envelope──▶ StoreBinding ──▶ LedgerState
//!                                     │             ├── balances      (ValueStore)
//!                                     │             ├── transactions  (ListStore)
//!                                     │             ├── cycles        (ValueStore)
//!                                     │             ├── monitoring    (ValueStore)
//!                                     │             └── registrations (ValueStore)
//!                                     └──settled──▶ stop requests
//! ```
//!
//! Single values go through the guarded `apply` so an unverified result never
//! overwrites a newer verified one. Transaction pages are prepended when
//! unverified and reconciled when verified, which drops the unverified items
//! the verified page disproves.

use ls_01_reconciled_store::{
    now_ms, ApplyOutcome, KeyValueStore, ListStore, SnapshotStore, StoreError, ValueStore,
};
use ls_05_worker_supervisor::WorkerSupervisor;
use parking_lot::Mutex;
use shared_bus::{Delivery, Envelope, SyncData, WorkerEvent};
use shared_types::{
    Balance, CyclesBalance, EntityId, ErrorEnvelope, Generation, MonitoringStatus,
    RegistrationState, TaskKind, Transaction, TransactionId, TrustedValue,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// What one event did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUpdate {
    /// A single value write and its guard outcome.
    Value {
        /// Resource kind.
        kind: TaskKind,
        /// Guard outcome.
        outcome: ApplyOutcome,
    },
    /// A transaction page was merged.
    Transactions {
        /// Unverified items removed because a verified page disproved them.
        removed: Vec<TransactionId>,
    },
    /// A failure was recorded.
    Failure {
        /// Resource kind.
        kind: TaskKind,
        /// Whether the task stopped itself.
        terminal: bool,
    },
    /// The event came from a generation older than one already seen.
    Stale,
}

/// Every reconciled resource the client keeps.
#[derive(Default)]
pub struct LedgerState {
    /// Account balances.
    pub balances: ValueStore<Balance>,
    /// Account transactions, newest first.
    pub transactions: ListStore<Transaction>,
    /// Canister cycles.
    pub cycles: ValueStore<CyclesBalance>,
    /// Canister health.
    pub monitoring: ValueStore<MonitoringStatus>,
    /// Custom domain registrations, keyed by domain.
    pub registrations: ValueStore<RegistrationState>,
    generations: Mutex<HashMap<TaskKind, Generation>>,
    errors: Mutex<HashMap<TaskKind, ErrorEnvelope>>,
}

impl LedgerState {
    /// Empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one worker event.
    pub fn apply(&self, event: &WorkerEvent) -> StoreUpdate {
        let kind = event.kind();
        if !self.admit(kind, event.generation()) {
            debug!(kind = %kind, generation = %event.generation(), "[runtime] Dropping event of an old generation");
            return StoreUpdate::Stale;
        }
        match event {
            WorkerEvent::Delivered(delivery) => self.apply_delivery(delivery),
            WorkerEvent::Failed { kind, error, .. } => {
                if error.terminal {
                    error!(kind = %kind, category = ?error.category, message = %error.message, "[runtime] Task halted");
                } else {
                    warn!(kind = %kind, category = ?error.category, message = %error.message, "[runtime] Task reported failure");
                }
                self.errors.lock().insert(*kind, error.clone());
                StoreUpdate::Failure {
                    kind: *kind,
                    terminal: error.terminal,
                }
            }
        }
    }

    fn admit(&self, kind: TaskKind, generation: Generation) -> bool {
        let mut generations = self.generations.lock();
        let newest = generations.entry(kind).or_insert(generation);
        if generation < *newest {
            return false;
        }
        *newest = generation;
        true
    }

    fn apply_delivery(&self, delivery: &Delivery) -> StoreUpdate {
        let request_id = delivery.request_id;
        let verified = delivery.value.verified;
        let data = &delivery.value.value;
        let entity = data.entity_id();
        if verified {
            self.errors.lock().remove(&data.kind());
        }

        let outcome = match data {
            SyncData::Balance(update) => self.balances.apply(
                entity,
                TrustedValue::new(update.balance, verified),
                request_id,
            ),
            SyncData::Cycles(update) => self.cycles.apply(
                entity,
                TrustedValue::new(update.cycles, verified),
                request_id,
            ),
            SyncData::Monitoring(status) => self.monitoring.apply(
                entity,
                TrustedValue::new(status.clone(), verified),
                request_id,
            ),
            SyncData::CustomDomainRegistration(registration) => self.registrations.apply(
                entity,
                TrustedValue::new(registration.state.clone(), verified),
                request_id,
            ),
            SyncData::Transactions(update) => {
                let removed = if verified {
                    self.transactions
                        .reconcile_verified(entity, request_id, update.transactions.clone())
                } else {
                    let items = update
                        .transactions
                        .iter()
                        .cloned()
                        .map(TrustedValue::unverified)
                        .collect();
                    self.transactions.prepend(entity, items, Some(request_id));
                    Vec::new()
                };
                return StoreUpdate::Transactions { removed };
            }
        };
        StoreUpdate::Value {
            kind: data.kind(),
            outcome,
        }
    }

    /// Last unresolved failure of `kind`; cleared by its next verified value.
    #[must_use]
    pub fn last_error(&self, kind: TaskKind) -> Option<ErrorEnvelope> {
        self.errors.lock().get(&kind).cloned()
    }

    /// Whether `domain` reached a terminal registration state on a
    /// verified read.
    #[must_use]
    pub fn registration_settled(&self, domain: &str) -> bool {
        self.registrations
            .get(&EntityId::new(domain))
            .is_some_and(|state| state.verified && state.value.is_terminal())
    }

    /// Seed every store from `snapshots`. Returns how many entries were
    /// hydrated.
    pub fn hydrate<S: KeyValueStore>(&self, snapshots: &SnapshotStore<S>) -> Result<usize, StoreError> {
        let hydrated = snapshots.hydrate_values(TaskKind::Balance, &self.balances)?
            + snapshots.hydrate_lists(TaskKind::Transactions, &self.transactions)?
            + snapshots.hydrate_values(TaskKind::Cycles, &self.cycles)?
            + snapshots.hydrate_values(TaskKind::Monitoring, &self.monitoring)?
            + snapshots.hydrate_values(TaskKind::CustomDomainRegistration, &self.registrations)?;
        info!(hydrated, "[runtime] Store hydrated from snapshots");
        Ok(hydrated)
    }

    /// Persist every store into `snapshots`. Returns how many entries were
    /// written.
    pub fn persist<S: KeyValueStore>(&self, snapshots: &SnapshotStore<S>) -> Result<usize, StoreError> {
        let persisted = snapshots.persist_values(TaskKind::Balance, &self.balances)?
            + snapshots.persist_lists(TaskKind::Transactions, &self.transactions, now_ms())?
            + snapshots.persist_values(TaskKind::Cycles, &self.cycles)?
            + snapshots.persist_values(TaskKind::Monitoring, &self.monitoring)?
            + snapshots.persist_values(TaskKind::CustomDomainRegistration, &self.registrations)?;
        debug!(persisted, "[runtime] Store persisted");
        Ok(persisted)
    }
}

/// Receives the kinds whose task should be stopped because their work is
/// done, e.g. a settled domain registration.
pub type StopRequests = mpsc::UnboundedReceiver<TaskKind>;

/// Route every task kind's events into `state`.
pub fn bind_store(supervisor: &WorkerSupervisor, state: Arc<LedgerState>) -> StopRequests {
    let (stop_tx, stop_rx) = mpsc::unbounded_channel();
    for kind in TaskKind::ALL {
        let state = Arc::clone(&state);
        let stop_tx = stop_tx.clone();
        supervisor.on(
            kind,
            Arc::new(move |envelope: &Envelope| {
                let update = state.apply(&envelope.event);
                if let (
                    WorkerEvent::Delivered(delivery),
                    StoreUpdate::Value { outcome, .. },
                ) = (&envelope.event, &update)
                {
                    if let SyncData::CustomDomainRegistration(registration) = &delivery.value.value {
                        if outcome.is_applied()
                            && delivery.value.verified
                            && registration.state.is_terminal()
                        {
                            info!(domain = %registration.domain, "[runtime] Registration settled, stopping its task");
                            let _ = stop_tx.send(TaskKind::CustomDomainRegistration);
                        }
                    }
                }
            }),
        );
    }
    stop_rx
}
