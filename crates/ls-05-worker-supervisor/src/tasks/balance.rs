//! # Balance Work

use super::{FailureSlot, TickSink};
use crate::ports::LedgerReader;
use async_trait::async_trait;
use ls_02_dual_read::{DualReadExecutor, FnProbe};
use ls_04_sync_task::{TaskWork, TickHandle};
use shared_bus::{BalanceParams, BalanceUpdate, SyncData};
use shared_types::{Balance, ReadChannel, SyncError};
use std::sync::Arc;

/// Refreshes the balance of every configured account.
pub struct BalanceWork {
    params: BalanceParams,
    reader: Arc<dyn LedgerReader>,
    executor: DualReadExecutor,
}

impl BalanceWork {
    /// Create the work.
    pub fn new(params: BalanceParams, reader: Arc<dyn LedgerReader>, executor: DualReadExecutor) -> Self {
        Self {
            params,
            reader,
            executor,
        }
    }
}

#[async_trait]
impl TaskWork<SyncData> for BalanceWork {
    async fn run(&self, tick: &TickHandle<SyncData>) -> Result<(), SyncError> {
        let mut pending = Vec::new();
        for account in &self.params.accounts {
            let reader = Arc::clone(&self.reader);
            let target = account.clone();
            let probe = Arc::new(FnProbe::<_, Balance>::new(move |channel: ReadChannel| {
                let reader = Arc::clone(&reader);
                let target = target.clone();
                async move { reader.balance(&target, channel).await }
            }));
            let owner = account.clone();
            let sink = Arc::new(TickSink::new(tick, move |balance: Balance| {
                SyncData::Balance(BalanceUpdate {
                    account: owner.clone(),
                    balance,
                })
            }));
            pending.push(self.executor.fetch(probe, sink).await);
        }
        // The tick stays in flight until every read settled.
        let mut failure = FailureSlot::default();
        for fetch in pending {
            failure.record(fetch.settle().await.failure());
        }
        failure.into_result()
    }
}
