//! # Cycles Work

use super::{FailureSlot, TickSink};
use crate::ports::LedgerReader;
use async_trait::async_trait;
use ls_02_dual_read::{DualReadExecutor, FnProbe};
use ls_04_sync_task::{TaskWork, TickHandle};
use shared_bus::{CyclesParams, CyclesUpdate, SyncData};
use shared_types::{CyclesBalance, ReadChannel, SyncError};
use std::sync::Arc;

/// Refreshes the cycles balance of every configured canister.
pub struct CyclesWork {
    params: CyclesParams,
    reader: Arc<dyn LedgerReader>,
    executor: DualReadExecutor,
}

impl CyclesWork {
    /// Create the work.
    pub fn new(params: CyclesParams, reader: Arc<dyn LedgerReader>, executor: DualReadExecutor) -> Self {
        Self {
            params,
            reader,
            executor,
        }
    }
}

#[async_trait]
impl TaskWork<SyncData> for CyclesWork {
    async fn run(&self, tick: &TickHandle<SyncData>) -> Result<(), SyncError> {
        let mut pending = Vec::new();
        for canister in &self.params.canisters {
            let reader = Arc::clone(&self.reader);
            let target = canister.clone();
            let probe = Arc::new(FnProbe::<_, CyclesBalance>::new(
                move |channel: ReadChannel| {
                    let reader = Arc::clone(&reader);
                    let target = target.clone();
                    async move { reader.cycles(&target, channel).await }
                },
            ));
            let owner = canister.clone();
            let sink = Arc::new(TickSink::new(tick, move |cycles: CyclesBalance| {
                SyncData::Cycles(CyclesUpdate {
                    canister: owner.clone(),
                    cycles,
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
