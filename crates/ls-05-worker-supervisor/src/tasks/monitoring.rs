//! # Monitoring Work
//!
//! Canister status is only served by a verified call; no dual read.

use super::FailureSlot;
use crate::ports::LedgerReader;
use async_trait::async_trait;
use ls_04_sync_task::{TaskWork, TickHandle};
use shared_bus::{MonitoringParams, SyncData};
use shared_types::{SyncError, TrustedValue};
use std::sync::Arc;
use tracing::warn;

/// Refreshes the status of every monitored canister.
pub struct MonitoringWork {
    params: MonitoringParams,
    reader: Arc<dyn LedgerReader>,
}

impl MonitoringWork {
    /// Create the work.
    pub fn new(params: MonitoringParams, reader: Arc<dyn LedgerReader>) -> Self {
        Self { params, reader }
    }
}

#[async_trait]
impl TaskWork<SyncData> for MonitoringWork {
    async fn run(&self, tick: &TickHandle<SyncData>) -> Result<(), SyncError> {
        let mut failure = FailureSlot::default();
        for canister in &self.params.canisters {
            match self.reader.canister_status(canister).await {
                Ok(status) => {
                    tick.deliver(TrustedValue::verified(SyncData::Monitoring(status)))
                        .await;
                }
                Err(err) => {
                    warn!(canister = %canister, error = %err, "[ls-05] Canister status failed");
                    let error = SyncError::VerifiedRead(err);
                    tick.report(error.clone()).await;
                    failure.record(Some(error));
                }
            }
        }
        failure.into_result()
    }
}
