//! # Outbound Ports
//!
//! The remote ledger and the services next to it, as seen by the sync tasks.

use crate::domain::RegistrationError;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{
    AccountId, Balance, CanisterId, CyclesBalance, MonitoringStatus, ReadChannel,
    RegistrationState, RemoteError, RemoteResult, Transaction, TransactionId,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Read access to the ledger and its companion services.
#[async_trait]
pub trait LedgerReader: Send + Sync {
    /// Balance of `account`.
    async fn balance(&self, account: &AccountId, channel: ReadChannel)
        -> Result<Balance, RemoteError>;

    /// Up to `limit` transactions of `account` newer than `since`, newest
    /// first.
    async fn transactions(
        &self,
        account: &AccountId,
        since: Option<TransactionId>,
        limit: u32,
        channel: ReadChannel,
    ) -> Result<Vec<Transaction>, RemoteError>;

    /// Cycles held by `canister`.
    async fn cycles(
        &self,
        canister: &CanisterId,
        channel: ReadChannel,
    ) -> Result<CyclesBalance, RemoteError>;

    /// Status of `canister`; only available as a verified call.
    async fn canister_status(&self, canister: &CanisterId) -> Result<MonitoringStatus, RemoteError>;

    /// Registration state of `domain` in the registration service's wire
    /// shape. The outer error is transport-level.
    async fn registration_status(
        &self,
        domain: &str,
    ) -> Result<RemoteResult<RegistrationState, RegistrationError>, RemoteError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockLedgerState {
    balances: HashMap<AccountId, Balance>,
    unverified_balances: HashMap<AccountId, Balance>,
    transactions: HashMap<AccountId, Vec<Transaction>>,
    forged: HashMap<AccountId, Vec<Transaction>>,
    cycles: HashMap<CanisterId, CyclesBalance>,
    statuses: HashMap<CanisterId, MonitoringStatus>,
    registrations: HashMap<String, VecDeque<RemoteResult<RegistrationState, RegistrationError>>>,
}

/// In-memory ledger with per-channel latency.
pub struct MockLedgerReader {
    unverified_delay: Duration,
    verified_delay: Duration,
    state: Mutex<MockLedgerState>,
    calls: AtomicUsize,
    /// Fail every call with a transport error.
    pub should_fail: AtomicBool,
}

impl Default for MockLedgerReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLedgerReader {
    /// Mock answering immediately on both channels.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delays(0, 0)
    }

    /// Mock answering after the given delays in milliseconds.
    #[must_use]
    pub fn with_delays(unverified_ms: u64, verified_ms: u64) -> Self {
        Self {
            unverified_delay: Duration::from_millis(unverified_ms),
            verified_delay: Duration::from_millis(verified_ms),
            state: Mutex::new(MockLedgerState::default()),
            calls: AtomicUsize::new(0),
            should_fail: AtomicBool::new(false),
        }
    }

    /// Set the balance both channels report.
    pub fn set_balance(&self, account: &AccountId, e8s: u64) {
        self.state
            .lock()
            .balances
            .insert(account.clone(), Balance::new(e8s));
    }

    /// Make the unverified channel report a different balance.
    pub fn set_unverified_balance(&self, account: &AccountId, e8s: u64) {
        self.state
            .lock()
            .unverified_balances
            .insert(account.clone(), Balance::new(e8s));
    }

    /// Record a real transaction.
    pub fn push_transaction(&self, account: &AccountId, transaction: Transaction) {
        self.state
            .lock()
            .transactions
            .entry(account.clone())
            .or_default()
            .push(transaction);
    }

    /// Record a transaction only the unverified channel reports.
    pub fn forge_transaction(&self, account: &AccountId, transaction: Transaction) {
        self.state
            .lock()
            .forged
            .entry(account.clone())
            .or_default()
            .push(transaction);
    }

    /// Set the cycles both channels report.
    pub fn set_cycles(&self, canister: &CanisterId, cycles: u64) {
        self.state
            .lock()
            .cycles
            .insert(canister.clone(), CyclesBalance::new(cycles));
    }

    /// Set the status of a canister.
    pub fn set_status(&self, status: MonitoringStatus) {
        self.state
            .lock()
            .statuses
            .insert(status.canister.clone(), status);
    }

    /// Script the answers for `domain`; the last one repeats.
    pub fn script_registration(
        &self,
        domain: &str,
        replies: Vec<RemoteResult<RegistrationState, RegistrationError>>,
    ) {
        self.state
            .lock()
            .registrations
            .insert(domain.to_string(), replies.into());
    }

    /// Calls received so far, all methods and channels.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, channel: ReadChannel) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = match channel {
            ReadChannel::Unverified => self.unverified_delay,
            ReadChannel::Verified => self.verified_delay,
        };
        tokio::time::sleep(delay).await;
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("mock ledger unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerReader for MockLedgerReader {
    async fn balance(
        &self,
        account: &AccountId,
        channel: ReadChannel,
    ) -> Result<Balance, RemoteError> {
        self.enter(channel).await?;
        let state = self.state.lock();
        if !channel.is_verified() {
            if let Some(balance) = state.unverified_balances.get(account) {
                return Ok(*balance);
            }
        }
        state
            .balances
            .get(account)
            .copied()
            .ok_or_else(|| RemoteError::NotFound(account.to_string()))
    }

    async fn transactions(
        &self,
        account: &AccountId,
        since: Option<TransactionId>,
        limit: u32,
        channel: ReadChannel,
    ) -> Result<Vec<Transaction>, RemoteError> {
        self.enter(channel).await?;
        let state = self.state.lock();
        let real = state.transactions.get(account).into_iter().flatten();
        let forged = state
            .forged
            .get(account)
            .filter(|_| !channel.is_verified())
            .into_iter()
            .flatten();
        let mut page: Vec<Transaction> = real
            .chain(forged)
            .filter(|tx| since.map_or(true, |tip| tx.id > tip))
            .cloned()
            .collect();
        page.sort_by(|a, b| b.id.cmp(&a.id));
        page.truncate(limit as usize);
        Ok(page)
    }

    async fn cycles(
        &self,
        canister: &CanisterId,
        channel: ReadChannel,
    ) -> Result<CyclesBalance, RemoteError> {
        self.enter(channel).await?;
        self.state
            .lock()
            .cycles
            .get(canister)
            .copied()
            .ok_or_else(|| RemoteError::NotFound(canister.to_string()))
    }

    async fn canister_status(&self, canister: &CanisterId) -> Result<MonitoringStatus, RemoteError> {
        self.enter(ReadChannel::Verified).await?;
        self.state
            .lock()
            .statuses
            .get(canister)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(canister.to_string()))
    }

    async fn registration_status(
        &self,
        domain: &str,
    ) -> Result<RemoteResult<RegistrationState, RegistrationError>, RemoteError> {
        self.enter(ReadChannel::Verified).await?;
        let mut state = self.state.lock();
        let Some(replies) = state.registrations.get_mut(domain) else {
            return Ok(RemoteResult::Err(RegistrationError::NotFound));
        };
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        Ok(reply.unwrap_or(RemoteResult::Err(RegistrationError::NotFound)))
    }
}
