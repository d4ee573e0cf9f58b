//! # Task Work
//!
//! One [`TaskWork`] per [`TaskKind`](shared_types::TaskKind), built from the
//! kind's parameters.
//!
//! | Kind | Reads |
//! |------|-------|
//! | balance | dual read per account |
//! | transactions | dual read of items since the last verified tip |
//! | cycles | dual read per canister |
//! | monitoring | verified call per canister |
//! | custom-domain-registration | single verified call, wire-shaped reply |

pub mod balance;
pub mod custom_domain;
pub mod cycles;
pub mod monitoring;
pub mod transactions;

pub use balance::BalanceWork;
pub use custom_domain::CustomDomainWork;
pub use cycles::CyclesWork;
pub use monitoring::MonitoringWork;
pub use transactions::TransactionsWork;

use crate::ports::LedgerReader;
use async_trait::async_trait;
use ls_02_dual_read::{DeliverySink, DualReadExecutor, ReadFailure};
use ls_04_sync_task::{TaskWork, TickHandle};
use shared_bus::{SyncData, TaskParams};
use shared_types::{SyncError, TrustedValue};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// Build the work for `params`.
pub fn build_work(
    params: &TaskParams,
    reader: Arc<dyn LedgerReader>,
    executor: DualReadExecutor,
) -> Arc<dyn TaskWork<SyncData>> {
    match params {
        TaskParams::Balance(p) => Arc::new(BalanceWork::new(p.clone(), reader, executor)),
        TaskParams::Transactions(p) => {
            Arc::new(TransactionsWork::new(p.clone(), reader, executor))
        }
        TaskParams::Cycles(p) => Arc::new(CyclesWork::new(p.clone(), reader, executor)),
        TaskParams::Monitoring(p) => Arc::new(MonitoringWork::new(p.clone(), reader)),
        TaskParams::CustomDomainRegistration(p) => {
            Arc::new(CustomDomainWork::new(p.clone(), reader))
        }
    }
}

/// Bridges the deliveries of one fetch into the tick, wrapping each value
/// into its [`SyncData`] variant.
pub struct TickSink<T, F> {
    tick: TickHandle<SyncData>,
    wrap: F,
    _marker: PhantomData<fn(T)>,
}

impl<T, F> TickSink<T, F> {
    /// Create a sink for `tick`.
    pub fn new(tick: &TickHandle<SyncData>, wrap: F) -> Self {
        Self {
            tick: tick.clone(),
            wrap,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> DeliverySink<T> for TickSink<T, F>
where
    T: Send + 'static,
    F: Fn(T) -> SyncData + Send + Sync + 'static,
{
    async fn on_value(&self, value: TrustedValue<T>) {
        self.tick.deliver(value.map(|v| (self.wrap)(v))).await;
    }

    async fn on_error(&self, failure: &ReadFailure) {
        report_branch_failure(&self.tick, failure).await;
    }
}

/// Surface a failed read branch as a non-terminal tick failure.
pub(crate) async fn report_branch_failure(tick: &TickHandle<SyncData>, failure: &ReadFailure) {
    warn!(
        kind = %tick.kind(),
        channel = %failure.channel,
        error = %failure.error,
        "[ls-05] Read branch failed"
    );
    tick.report(failure.clone().into_sync_error()).await;
}

/// First error wins; later entities are still read.
#[derive(Debug, Default)]
pub(crate) struct FailureSlot(Option<SyncError>);

impl FailureSlot {
    pub(crate) fn record(&mut self, error: Option<SyncError>) {
        if self.0.is_none() {
            self.0 = error;
        }
    }

    pub(crate) fn into_result(self) -> Result<(), SyncError> {
        self.0.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RegistrationError;
    use crate::ports::MockLedgerReader;
    use ls_04_sync_task::{FailurePolicy, RecordingTaskSink, SyncTask, TaskSink};
    use shared_bus::{BalanceParams, CustomDomainParams, MonitoringParams, TransactionsParams};
    use shared_types::{
        AccountId, CanisterId, MonitoringStatus, RegistrationState, RemoteResult, RunState,
        TaskKind, Transaction, TransactionId,
    };
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    async fn run_once(
        kind: TaskKind,
        work: Arc<dyn TaskWork<SyncData>>,
    ) -> Arc<RecordingTaskSink<SyncData>> {
        let sink = Arc::new(RecordingTaskSink::new());
        let task = SyncTask::new(
            kind,
            60_000,
            FailurePolicy::default(),
            work,
            Arc::clone(&sink) as Arc<dyn TaskSink<SyncData>>,
        );
        task.start();
        tokio::time::sleep(Duration::from_millis(100)).await;
        task.stop();
        sink
    }

    fn tx(id: u64) -> Transaction {
        Transaction {
            id: TransactionId(id),
            from: AccountId::new("alice"),
            to: AccountId::new("bob"),
            amount_e8s: 1_000,
            fee_e8s: 10_000,
            memo: id,
            timestamp_ms: id,
        }
    }


    #[tokio::test(start_paused = true)]
    async fn test_balance_reads_every_account_on_both_channels() {
        let reader = Arc::new(MockLedgerReader::with_delays(1, 5));
        reader.set_balance(&AccountId::new("alice"), 10);
        reader.set_balance(&AccountId::new("bob"), 20);
        let params = TaskParams::Balance(BalanceParams {
            accounts: vec![AccountId::new("alice"), AccountId::new("bob")],
        });

        let work = build_work(&params, reader, DualReadExecutor::default());
        let sink = run_once(TaskKind::Balance, work).await;

        let values: Vec<(String, bool)> = sink
            .values()
            .into_iter()
            .map(|(_, value)| (value.value.entity_id().as_str().to_string(), value.verified))
            .collect();
        assert_eq!(
            values,
            vec![
                ("alice".to_string(), false),
                ("alice".to_string(), true),
                ("bob".to_string(), false),
                ("bob".to_string(), true),
            ]
        );
        assert!(sink.failures().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_branches_are_reported_non_terminal() {
        let reader = Arc::new(MockLedgerReader::with_delays(1, 5));
        reader.should_fail.store(true, Ordering::SeqCst);
        let params = TaskParams::Balance(BalanceParams {
            accounts: vec![AccountId::new("alice")],
        });

        let work = build_work(&params, reader, DualReadExecutor::default());
        let sink = run_once(TaskKind::Balance, work).await;

        let failures = sink.failures();
        assert_eq!(failures.len(), 2);
        assert!(failures.iter().all(|(_, _, terminal)| !terminal));
        assert!(failures.iter().any(|(_, error, _)| error.is_verified()));
        assert!(sink.values().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transactions_tip_follows_verified_page_only() {
        let reader = Arc::new(MockLedgerReader::with_delays(1, 5));
        let alice = AccountId::new("alice");
        reader.push_transaction(&alice, tx(1));
        reader.push_transaction(&alice, tx(2));
        reader.forge_transaction(&alice, tx(99));
        let work = Arc::new(TransactionsWork::new(
            TransactionsParams {
                account: alice,
                page_size: 10,
            },
            reader,
            DualReadExecutor::default(),
        ));

        let dyn_work: Arc<dyn TaskWork<SyncData>> = Arc::clone(&work) as _;
        let sink = run_once(TaskKind::Transactions, dyn_work).await;

        assert_eq!(work.verified_tip(), Some(TransactionId(2)));
        let pages: Vec<(bool, Vec<u64>)> = sink
            .values()
            .into_iter()
            .map(|(_, value)| match value.value {
                SyncData::Transactions(update) => (
                    value.verified,
                    update.transactions.iter().map(|tx| tx.id.0).collect(),
                ),
                other => panic!("unexpected data {other:?}"),
            })
            .collect();
        assert_eq!(pages, vec![(false, vec![99, 2, 1]), (true, vec![2, 1])]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitoring_is_verified_only() {
        let reader = Arc::new(MockLedgerReader::new());
        let canister = CanisterId::new("c1");
        reader.set_status(MonitoringStatus {
            canister: canister.clone(),
            state: RunState::Running,
            cycles: 5,
            memory_bytes: 1024,
            idle_cycles_burned_per_day: 1,
        });
        let params = TaskParams::Monitoring(MonitoringParams {
            canisters: vec![canister, CanisterId::new("missing")],
        });

        let work = build_work(
            &params,
            Arc::clone(&reader) as Arc<dyn LedgerReader>,
            DualReadExecutor::default(),
        );
        let sink = run_once(TaskKind::Monitoring, work).await;

        let values = sink.values();
        assert_eq!(values.len(), 1);
        assert!(values[0].1.verified);
        assert_eq!(sink.failures().len(), 1);
        assert_eq!(reader.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_domain_converts_wire_reply() {
        let reader = Arc::new(MockLedgerReader::new());
        reader.script_registration(
            "app.example.org",
            vec![RemoteResult::Ok(RegistrationState::Available)],
        );
        reader.script_registration(
            "gone.example.org",
            vec![RemoteResult::Err(RegistrationError::NotFound)],
        );

        let ok = build_work(
            &TaskParams::CustomDomainRegistration(CustomDomainParams {
                domain: "app.example.org".to_string(),
            }),
            Arc::clone(&reader) as Arc<dyn LedgerReader>,
            DualReadExecutor::default(),
        );
        let sink = run_once(TaskKind::CustomDomainRegistration, ok).await;
        match &sink.values()[0].1.value {
            SyncData::CustomDomainRegistration(registration) => {
                assert_eq!(registration.state, RegistrationState::Available);
            }
            other => panic!("unexpected data {other:?}"),
        }

        let missing = build_work(
            &TaskParams::CustomDomainRegistration(CustomDomainParams {
                domain: "gone.example.org".to_string(),
            }),
            reader,
            DualReadExecutor::default(),
        );
        let sink = run_once(TaskKind::CustomDomainRegistration, missing).await;
        assert!(sink.values().is_empty());
        let failures = sink.failures();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0].1, SyncError::VerifiedRead(_)));
    }
}
