//! # Custom Domain Registration Work
//!
//! Polls the registration service with a single verified call. The reply
//! arrives in its `{"Ok"|"Err"}` wire shape and is converted here, once.

use crate::ports::LedgerReader;
use async_trait::async_trait;
use ls_04_sync_task::{TaskWork, TickHandle};
use shared_bus::{CustomDomainParams, SyncData};
use shared_types::{DomainRegistration, ReadChannel, SyncError};
use std::sync::Arc;
use tracing::{info, warn};

/// Polls the registration state of one domain.
pub struct CustomDomainWork {
    params: CustomDomainParams,
    reader: Arc<dyn LedgerReader>,
}

impl CustomDomainWork {
    /// Create the work.
    pub fn new(params: CustomDomainParams, reader: Arc<dyn LedgerReader>) -> Self {
        Self { params, reader }
    }
}

#[async_trait]
impl TaskWork<SyncData> for CustomDomainWork {
    async fn run(&self, tick: &TickHandle<SyncData>) -> Result<(), SyncError> {
        let domain = &self.params.domain;
        let reply = self
            .reader
            .registration_status(domain)
            .await
            .and_then(|wire| wire.into_trusted(ReadChannel::Verified));

        match reply {
            Ok(state) => {
                if state.value.is_terminal() {
                    info!(domain = %domain, state = ?state.value, "[ls-05] Registration settled");
                }
                let registration = state.map(|state| {
                    SyncData::CustomDomainRegistration(DomainRegistration {
                        domain: domain.clone(),
                        state,
                    })
                });
                tick.deliver(registration).await;
                Ok(())
            }
            Err(err) => {
                warn!(domain = %domain, error = %err, "[ls-05] Registration poll failed");
                let error = SyncError::VerifiedRead(err);
                tick.report(error.clone()).await;
                Err(error)
            }
        }
    }
}
