//! # Transactions Work
//!
//! Polls for transactions newer than the last verified tip. Unverified pages
//! are shown at once; the verified page of the same tick later reconciles
//! them, dropping any unverified item it does not contain.

use super::report_branch_failure;
use crate::ports::LedgerReader;
use async_trait::async_trait;
use ls_02_dual_read::{DeliverySink, DualReadExecutor, FnProbe, ReadFailure};
use ls_04_sync_task::{TaskWork, TickHandle};
use parking_lot::Mutex;
use shared_bus::{SyncData, TransactionsParams, TransactionsUpdate};
use shared_types::{AccountId, ReadChannel, SyncError, Transaction, TransactionId, TrustedValue};
use std::sync::Arc;
use tracing::debug;

type Tip = Arc<Mutex<Option<TransactionId>>>;

/// Polls new transactions of one account.
pub struct TransactionsWork {
    params: TransactionsParams,
    reader: Arc<dyn LedgerReader>,
    executor: DualReadExecutor,
    tip: Tip,
}

impl TransactionsWork {
    /// Create the work; the first tick reads the newest page.
    pub fn new(
        params: TransactionsParams,
        reader: Arc<dyn LedgerReader>,
        executor: DualReadExecutor,
    ) -> Self {
        Self {
            params,
            reader,
            executor,
            tip: Arc::new(Mutex::new(None)),
        }
    }

    /// Newest transaction id confirmed by a verified read.
    #[must_use]
    pub fn verified_tip(&self) -> Option<TransactionId> {
        *self.tip.lock()
    }
}

#[async_trait]
impl TaskWork<SyncData> for TransactionsWork {
    async fn run(&self, tick: &TickHandle<SyncData>) -> Result<(), SyncError> {
        let since = self.verified_tip();
        let reader = Arc::clone(&self.reader);
        let account = self.params.account.clone();
        let page_size = self.params.page_size;
        let probe = Arc::new(FnProbe::<_, Vec<Transaction>>::new(
            move |channel: ReadChannel| {
                let reader = Arc::clone(&reader);
                let account = account.clone();
                async move {
                    reader
                        .transactions(&account, since, page_size, channel)
                        .await
                }
            },
        ));
        let sink = Arc::new(TipSink {
            tick: tick.clone(),
            account: self.params.account.clone(),
            tip: Arc::clone(&self.tip),
        });
        match self.executor.fetch(probe, sink).await.settle().await.failure() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

struct TipSink {
    tick: TickHandle<SyncData>,
    account: AccountId,
    tip: Tip,
}

#[async_trait]
impl DeliverySink<Vec<Transaction>> for TipSink {
    async fn on_value(&self, page: TrustedValue<Vec<Transaction>>) {
        let newest = page.value.iter().map(|tx| tx.id).max();
        let verified = page.verified;
        let update = page.map(|transactions| {
            SyncData::Transactions(TransactionsUpdate {
                account: self.account.clone(),
                transactions,
            })
        });
        if !self.tick.deliver(update).await || !verified {
            return;
        }
        if let Some(newest) = newest {
            let mut tip = self.tip.lock();
            if tip.map_or(true, |current| newest > current) {
                debug!(account = %self.account, tip = %newest, "[ls-05] Verified tip advanced");
                *tip = Some(newest);
            }
        }
    }

    async fn on_error(&self, failure: &ReadFailure) {
        report_branch_failure(&self.tick, failure).await;
    }
}
