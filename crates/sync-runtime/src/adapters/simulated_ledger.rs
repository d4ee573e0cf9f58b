//! # Simulated Ledger
//!
//! In-process stand-in for the remote ledger, the cycles minter and the
//! domain registration service.
//!
//! - Unverified reads answer fast and, with `forge_probability`, lie.
//! - Verified reads answer slower and travel as a [`CertifiedReply`]: the
//!   JSON payload plus a SHA-256 certificate that is checked before the
//!   payload is decoded.
//! - Top-ups answer `Processing` a configured number of times before the
//!   cycles are credited.
//! - Registrations advance one state per poll until `Available`.

use async_trait::async_trait;
use ls_03_confirmation_poller::CyclesMinter;
use ls_05_worker_supervisor::{LedgerReader, RegistrationError};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{
    AccountId, Balance, CanisterId, ConfigError, CyclesBalance, MonitoringStatus, ReadChannel,
    RegistrationState, RemoteError, RemoteResult, RunState, Transaction, TransactionId,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

use crate::container::config::{parse_var, SyncConfig};

/// Transfer fee in e8s.
pub const TRANSFER_FEE_E8S: u64 = 10_000;

const SEED_BALANCE_E8S: u64 = 10_000_000_000;
const SEED_CYCLES: u64 = 5_000_000_000_000;
const SEED_TOP_UP_CYCLES: u64 = 1_000_000_000_000;

/// Latency and honesty of the simulated ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedLedgerConfig {
    /// Lower bound of unverified latency.
    pub unverified_min_ms: u64,
    /// Upper bound of unverified latency.
    pub unverified_max_ms: u64,
    /// Lower bound of verified latency.
    pub verified_min_ms: u64,
    /// Upper bound of verified latency.
    pub verified_max_ms: u64,
    /// Chance that an unverified read returns forged data.
    pub forge_probability: f64,
    /// `Processing` replies a top-up gets before it is credited.
    pub top_up_pending_polls: u32,
    /// Seed for reproducible runs.
    pub seed: Option<u64>,
}

impl Default for SimulatedLedgerConfig {
    fn default() -> Self {
        Self {
            unverified_min_ms: 5,
            unverified_max_ms: 25,
            verified_min_ms: 80,
            verified_max_ms: 250,
            forge_probability: 0.0,
            top_up_pending_polls: 3,
            seed: None,
        }
    }
}

impl SimulatedLedgerConfig {
    /// Fixed latencies (10 ms / 50 ms), honest, seeded.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            unverified_min_ms: 10,
            unverified_max_ms: 10,
            verified_min_ms: 50,
            verified_max_ms: 50,
            forge_probability: 0.0,
            top_up_pending_polls: 2,
            seed: Some(7),
        }
    }

    /// Defaults overridden by `LS_LEDGER_UNVERIFIED_MS`,
    /// `LS_LEDGER_VERIFIED_MS` (upper bounds), `LS_LEDGER_FORGE_PROBABILITY`
    /// and `LS_LEDGER_SEED`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(max) = parse_var("LS_LEDGER_UNVERIFIED_MS")? {
            config.unverified_max_ms = max;
            config.unverified_min_ms = config.unverified_min_ms.min(max);
        }
        if let Some(max) = parse_var("LS_LEDGER_VERIFIED_MS")? {
            config.verified_max_ms = max;
            config.verified_min_ms = config.verified_min_ms.min(max);
        }
        if let Some(probability) = parse_var("LS_LEDGER_FORGE_PROBABILITY")? {
            config.forge_probability = probability;
        }
        config.seed = parse_var("LS_LEDGER_SEED")?;
        config.validate()?;
        Ok(config)
    }

    /// Check bounds and probability.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.forge_probability) {
            return Err(ConfigError::Invalid {
                field: "forge_probability",
                reason: "must be within 0..=1".to_string(),
            });
        }
        if self.unverified_min_ms > self.unverified_max_ms
            || self.verified_min_ms > self.verified_max_ms
        {
            return Err(ConfigError::Invalid {
                field: "latency",
                reason: "minimum exceeds maximum".to_string(),
            });
        }
        Ok(())
    }
}

/// A verified reply: JSON payload and its certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifiedReply {
    /// JSON encoded value.
    pub payload: String,
    /// Hex SHA-256 of the payload.
    pub certificate: String,
}

impl CertifiedReply {
    /// Certify `value`.
    pub fn certify<T: Serialize>(value: &T) -> Result<Self, RemoteError> {
        let payload = serde_json::to_string(value)
            .map_err(|e| RemoteError::Transport(format!("encode failed: {e}")))?;
        let certificate = digest(&payload);
        Ok(Self {
            payload,
            certificate,
        })
    }

    /// Check the certificate, then decode.
    pub fn verify<T: DeserializeOwned>(self) -> Result<T, RemoteError> {
        if digest(&self.payload) != self.certificate {
            return Err(RemoteError::Certificate("digest mismatch".to_string()));
        }
        serde_json::from_str(&self.payload)
            .map_err(|e| RemoteError::Certificate(format!("undecodable payload: {e}")))
    }
}

fn digest(payload: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload.as_bytes());
    hex::encode(hasher.finalize())
}

struct CanisterBook {
    cycles: u64,
    state: RunState,
    memory_bytes: u64,
    burn_per_day: u64,
}

struct PendingTopUp {
    canister: CanisterId,
    cycles: u64,
    remaining: u32,
}

#[derive(Default)]
struct LedgerBook {
    balances: HashMap<AccountId, Balance>,
    transactions: Vec<Transaction>,
    next_block: u64,
    canisters: HashMap<CanisterId, CanisterBook>,
    registrations: HashMap<String, RegistrationState>,
    top_ups: HashMap<u64, PendingTopUp>,
}

impl LedgerBook {
    fn mint_block(&mut self) -> u64 {
        self.next_block += 1;
        self.next_block
    }
}

/// The simulated ledger.
pub struct SimulatedLedger {
    config: SimulatedLedgerConfig,
    book: Mutex<LedgerBook>,
    rng: Mutex<StdRng>,
    corrupt_certificates: AtomicBool,
    unverified_calls: AtomicU64,
    verified_calls: AtomicU64,
}

impl SimulatedLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new(config: SimulatedLedgerConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            book: Mutex::new(LedgerBook::default()),
            rng: Mutex::new(rng),
            corrupt_certificates: AtomicBool::new(false),
            unverified_calls: AtomicU64::new(0),
            verified_calls: AtomicU64::new(0),
        }
    }

    /// Ledger holding every account, canister, domain and top-up that
    /// `config` syncs, plus one transfer per account pair so histories are
    /// not empty.
    #[must_use]
    pub fn seeded(config: &SyncConfig) -> Self {
        let ledger = Self::new(config.ledger.clone());
        for account in &config.accounts {
            ledger.seed_account(account, SEED_BALANCE_E8S);
        }
        for pair in config.accounts.windows(2) {
            if let Err(err) = ledger.transfer(&pair[0], &pair[1], SEED_BALANCE_E8S / 100, 0) {
                debug!(error = %err, "[ledger] Seed transfer skipped");
            }
        }
        for canister in &config.canisters {
            ledger.seed_canister(canister, SEED_CYCLES);
        }
        if let Some(domain) = &config.custom_domain {
            ledger.register_domain(domain);
        }
        if let (Some(block), Some(canister)) = (config.top_up_block, config.top_up_target()) {
            ledger.seed_top_up(block, &canister, SEED_TOP_UP_CYCLES);
        }
        info!(
            accounts = config.accounts.len(),
            canisters = config.canisters.len(),
            "[ledger] Simulated ledger seeded"
        );
        ledger
    }

    /// Credit `e8s` to `account` out of thin air.
    pub fn seed_account(&self, account: &AccountId, e8s: u64) {
        let mut book = self.book.lock();
        let balance = book.balances.entry(account.clone()).or_default();
        balance.e8s = balance.e8s.saturating_add(e8s);
    }

    /// Create a running canister holding `cycles`.
    pub fn seed_canister(&self, canister: &CanisterId, cycles: u64) {
        self.book.lock().canisters.insert(
            canister.clone(),
            CanisterBook {
                cycles,
                state: RunState::Running,
                memory_bytes: 4 * 1024 * 1024,
                burn_per_day: 1_000_000,
            },
        );
    }

    /// Submit a custom domain registration.
    pub fn register_domain(&self, domain: &str) {
        self.book
            .lock()
            .registrations
            .insert(domain.to_string(), RegistrationState::Submitted);
    }

    /// Move `amount_e8s` plus the fee from one account to another.
    pub fn transfer(
        &self,
        from: &AccountId,
        to: &AccountId,
        amount_e8s: u64,
        memo: u64,
    ) -> Result<TransactionId, RemoteError> {
        let mut book = self.book.lock();
        let debit = amount_e8s.saturating_add(TRANSFER_FEE_E8S);
        let available = book.balances.get(from).map_or(0, |b| b.e8s);
        if available < debit {
            return Err(RemoteError::Rejected(format!(
                "insufficient funds: {available} < {debit}"
            )));
        }
        book.balances.entry(from.clone()).or_default().e8s -= debit;
        book.balances.entry(to.clone()).or_default().e8s += amount_e8s;
        let id = TransactionId(book.mint_block());
        book.transactions.push(Transaction {
            id,
            from: from.clone(),
            to: to.clone(),
            amount_e8s,
            fee_e8s: TRANSFER_FEE_E8S,
            memo,
            timestamp_ms: ls_01_reconciled_store::now_ms(),
        });
        debug!(from = %from, to = %to, amount_e8s, block = id.0, "[ledger] Transfer");
        Ok(id)
    }

    /// Record a top-up of `cycles` for `canister`; returns its block index.
    pub fn submit_top_up(&self, canister: &CanisterId, cycles: u64) -> u64 {
        let block = self.book.lock().mint_block();
        self.seed_top_up(block, canister, cycles);
        block
    }

    /// Record a top-up at a known block index, e.g. one submitted before
    /// this process started.
    pub fn seed_top_up(&self, block: u64, canister: &CanisterId, cycles: u64) {
        let mut book = self.book.lock();
        book.next_block = book.next_block.max(block);
        book.top_ups.insert(
            block,
            PendingTopUp {
                canister: canister.clone(),
                cycles,
                remaining: self.config.top_up_pending_polls,
            },
        );
        info!(canister = %canister, cycles, block, "[ledger] Top-up pending");
    }

    /// One step of background activity: a random transfer between two
    /// funded accounts and a day's burn of every canister's cycles.
    pub fn advance(&self) {
        let accounts: Vec<AccountId> = self.book.lock().balances.keys().cloned().collect();
        if accounts.len() >= 2 {
            let (from, to, amount, memo) = {
                let mut rng = self.rng.lock();
                let from = rng.gen_range(0..accounts.len());
                let to = (from + rng.gen_range(1..accounts.len())) % accounts.len();
                (from, to, rng.gen_range(1_000..100_000u64), rng.gen::<u64>())
            };
            if let Err(err) = self.transfer(&accounts[from], &accounts[to], amount, memo) {
                debug!(error = %err, "[ledger] Simulated transfer skipped");
            }
        }
        for canister in self.book.lock().canisters.values_mut() {
            canister.cycles = canister.cycles.saturating_sub(canister.burn_per_day);
        }
    }

    /// Make every verified reply fail its certificate check.
    pub fn set_corrupt_certificates(&self, corrupt: bool) {
        self.corrupt_certificates.store(corrupt, Ordering::SeqCst);
    }

    /// Unverified calls served.
    #[must_use]
    pub fn unverified_calls(&self) -> u64 {
        self.unverified_calls.load(Ordering::Relaxed)
    }

    /// Verified calls served.
    #[must_use]
    pub fn verified_calls(&self) -> u64 {
        self.verified_calls.load(Ordering::Relaxed)
    }

    fn should_forge(&self) -> bool {
        self.config.forge_probability > 0.0
            && self.rng.lock().gen_bool(self.config.forge_probability)
    }

    async fn delay(&self, channel: ReadChannel) {
        let (min, max, counter) = match channel {
            ReadChannel::Unverified => (
                self.config.unverified_min_ms,
                self.config.unverified_max_ms,
                &self.unverified_calls,
            ),
            ReadChannel::Verified => (
                self.config.verified_min_ms,
                self.config.verified_max_ms,
                &self.verified_calls,
            ),
        };
        counter.fetch_add(1, Ordering::Relaxed);
        let ms = self.rng.lock().gen_range(min..=max);
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Serve `read` on `channel`. Verified answers go through a certificate.
    async fn serve<T, F>(&self, channel: ReadChannel, read: F) -> Result<T, RemoteError>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(&mut LedgerBook) -> Result<T, RemoteError> + Send,
    {
        self.delay(channel).await;
        let value = read(&mut self.book.lock())?;
        if !channel.is_verified() {
            return Ok(value);
        }
        let mut reply = CertifiedReply::certify(&value)?;
        if self.corrupt_certificates.load(Ordering::SeqCst) {
            reply.certificate = digest("tampered");
        }
        reply.verify()
    }
}

#[async_trait]
impl LedgerReader for SimulatedLedger {
    async fn balance(
        &self,
        account: &AccountId,
        channel: ReadChannel,
    ) -> Result<Balance, RemoteError> {
        let balance = self
            .serve(channel, |book| {
                book.balances
                    .get(account)
                    .copied()
                    .ok_or_else(|| RemoteError::NotFound(account.to_string()))
            })
            .await?;
        if !channel.is_verified() && self.should_forge() {
            let bonus = self.rng.lock().gen_range(1..1_000_000u64);
            return Ok(Balance::new(balance.e8s.saturating_add(bonus)));
        }
        Ok(balance)
    }

    async fn transactions(
        &self,
        account: &AccountId,
        since: Option<TransactionId>,
        limit: u32,
        channel: ReadChannel,
    ) -> Result<Vec<Transaction>, RemoteError> {
        let mut page: Vec<Transaction> = self
            .serve(channel, |book| {
                Ok(book
                    .transactions
                    .iter()
                    .rev()
                    .filter(|tx| &tx.from == account || &tx.to == account)
                    .filter(|tx| since.map_or(true, |tip| tx.id > tip))
                    .take(limit as usize)
                    .cloned()
                    .collect())
            })
            .await?;
        if !channel.is_verified() && self.should_forge() {
            let newest = page.first().map_or(since.map_or(0, |tip| tip.0), |tx| tx.id.0);
            let forged = Transaction {
                id: TransactionId(newest + 1_000),
                from: AccountId::new("forger"),
                to: account.clone(),
                amount_e8s: 1_000_000_000,
                fee_e8s: 0,
                memo: 0,
                timestamp_ms: ls_01_reconciled_store::now_ms(),
            };
            debug!(account = %account, id = forged.id.0, "[ledger] Forging unverified transaction");
            page.insert(0, forged);
            page.truncate(limit as usize);
        }
        Ok(page)
    }

    async fn cycles(
        &self,
        canister: &CanisterId,
        channel: ReadChannel,
    ) -> Result<CyclesBalance, RemoteError> {
        self.serve(channel, |book| {
            book.canisters
                .get(canister)
                .map(|c| CyclesBalance::new(c.cycles))
                .ok_or_else(|| RemoteError::NotFound(canister.to_string()))
        })
        .await
    }

    async fn canister_status(&self, canister: &CanisterId) -> Result<MonitoringStatus, RemoteError> {
        self.serve(ReadChannel::Verified, |book| {
            book.canisters
                .get(canister)
                .map(|c| MonitoringStatus {
                    canister: canister.clone(),
                    state: c.state,
                    cycles: c.cycles,
                    memory_bytes: c.memory_bytes,
                    idle_cycles_burned_per_day: c.burn_per_day,
                })
                .ok_or_else(|| RemoteError::NotFound(canister.to_string()))
        })
        .await
    }

    async fn registration_status(
        &self,
        domain: &str,
    ) -> Result<RemoteResult<RegistrationState, RegistrationError>, RemoteError> {
        self.serve(ReadChannel::Verified, |book| {
            let Some(state) = book.registrations.get_mut(domain) else {
                return Ok(RemoteResult::Err(RegistrationError::NotFound));
            };
            let current = state.clone();
            *state = match &current {
                RegistrationState::Submitted => RegistrationState::PendingChallenge,
                RegistrationState::PendingChallenge => RegistrationState::Processing,
                RegistrationState::Processing | RegistrationState::Available => {
                    RegistrationState::Available
                }
                RegistrationState::Failed { reason } => RegistrationState::Failed {
                    reason: reason.clone(),
                },
            };
            Ok(RemoteResult::Ok(current))
        })
        .await
    }
}

#[async_trait]
impl CyclesMinter for SimulatedLedger {
    async fn notify_top_up(
        &self,
        canister: &CanisterId,
        block_index: u64,
    ) -> Result<CyclesBalance, RemoteError> {
        self.serve(ReadChannel::Verified, |book| {
            let Some(pending) = book.top_ups.get_mut(&block_index) else {
                return Err(RemoteError::Rejected(format!("unknown block {block_index}")));
            };
            if &pending.canister != canister {
                return Err(RemoteError::Rejected(format!(
                    "block {block_index} does not top up {canister}"
                )));
            }
            if pending.remaining > 0 {
                pending.remaining -= 1;
                return Err(RemoteError::Processing);
            }
            let credit = pending.cycles;
            book.top_ups.remove(&block_index);
            let target = book
                .canisters
                .get_mut(canister)
                .ok_or_else(|| RemoteError::NotFound(canister.to_string()))?;
            target.cycles = target.cycles.saturating_add(credit);
            Ok(CyclesBalance::new(target.cycles))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> SimulatedLedger {
        let ledger = SimulatedLedger::new(SimulatedLedgerConfig::for_testing());
        ledger.seed_account(&AccountId::new("alice"), 1_000_000);
        ledger.seed_account(&AccountId::new("bob"), 0);
        ledger.seed_canister(&CanisterId::new("c1"), 5_000);
        ledger
    }

    #[test]
    fn test_certificate_round_trip_and_tamper() {
        let reply = CertifiedReply::certify(&Balance::new(42)).unwrap();
        assert_eq!(reply.clone().verify::<Balance>().unwrap(), Balance::new(42));

        let mut tampered = reply;
        tampered.payload = r#"{"e8s":43}"#.to_string();
        assert!(matches!(
            tampered.verify::<Balance>(),
            Err(RemoteError::Certificate(_))
        ));
    }

    #[test]
    fn test_transfer_moves_funds_and_fee() {
        let ledger = ledger();
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        let id = ledger.transfer(&alice, &bob, 100_000, 1).unwrap();
        assert_eq!(id, TransactionId(1));

        let book = ledger.book.lock();
        assert_eq!(book.balances[&alice].e8s, 1_000_000 - 100_000 - TRANSFER_FEE_E8S);
        assert_eq!(book.balances[&bob].e8s, 100_000);
        drop(book);

        assert!(ledger.transfer(&bob, &alice, 100_000, 2).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_verified_read_is_slower() {
        let ledger = ledger();
        let alice = AccountId::new("alice");
        let start = tokio::time::Instant::now();
        ledger.balance(&alice, ReadChannel::Unverified).await.unwrap();
        let fast = start.elapsed();
        ledger.balance(&alice, ReadChannel::Verified).await.unwrap();
        let slow = start.elapsed() - fast;
        assert!(fast >= Duration::from_millis(10) && fast < Duration::from_millis(20));
        assert!(slow >= Duration::from_millis(50) && slow < Duration::from_millis(60));
        assert_eq!((ledger.unverified_calls(), ledger.verified_calls()), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_certificate_fails_verified_only() {
        let ledger = ledger();
        ledger.set_corrupt_certificates(true);
        let alice = AccountId::new("alice");
        assert!(ledger.balance(&alice, ReadChannel::Unverified).await.is_ok());
        assert!(matches!(
            ledger.balance(&alice, ReadChannel::Verified).await,
            Err(RemoteError::Certificate(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_forged_transactions_never_verified() {
        let config = SimulatedLedgerConfig {
            forge_probability: 1.0,
            ..SimulatedLedgerConfig::for_testing()
        };
        let ledger = SimulatedLedger::new(config);
        let alice = AccountId::new("alice");
        let bob = AccountId::new("bob");
        ledger.seed_account(&alice, 1_000_000);
        ledger.transfer(&alice, &bob, 1_000, 0).unwrap();

        let unverified = ledger
            .transactions(&alice, None, 10, ReadChannel::Unverified)
            .await
            .unwrap();
        let verified = ledger
            .transactions(&alice, None, 10, ReadChannel::Verified)
            .await
            .unwrap();
        assert_eq!(unverified.len(), 2);
        assert_eq!(unverified[0].id, TransactionId(1_001));
        assert_eq!(verified.len(), 1);
        assert_eq!(verified[0].id, TransactionId(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_top_up_processing_then_credited() {
        let ledger = ledger();
        let canister = CanisterId::new("c1");
        let block = ledger.submit_top_up(&canister, 1_000);

        for _ in 0..2 {
            assert_eq!(
                ledger.notify_top_up(&canister, block).await,
                Err(RemoteError::Processing)
            );
        }
        assert_eq!(
            ledger.notify_top_up(&canister, block).await,
            Ok(CyclesBalance::new(6_000))
        );
        assert!(matches!(
            ledger.notify_top_up(&canister, block).await,
            Err(RemoteError::Rejected(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registration_advances_per_poll() {
        let ledger = ledger();
        ledger.register_domain("app.example.org");
        let mut seen = Vec::new();
        for _ in 0..5 {
            match ledger.registration_status("app.example.org").await.unwrap() {
                RemoteResult::Ok(state) => seen.push(state),
                RemoteResult::Err(err) => panic!("unexpected {err:?}"),
            }
        }
        assert_eq!(
            seen,
            vec![
                RegistrationState::Submitted,
                RegistrationState::PendingChallenge,
                RegistrationState::Processing,
                RegistrationState::Available,
                RegistrationState::Available,
            ]
        );
        assert_eq!(
            ledger.registration_status("other.org").await.unwrap(),
            RemoteResult::Err(RegistrationError::NotFound)
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulatedLedgerConfig::default().validate().is_ok());
        let bad = SimulatedLedgerConfig {
            forge_probability: 1.5,
            ..SimulatedLedgerConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_seeded_from_config() {
        let mut config = SyncConfig::for_testing();
        config.accounts = vec![AccountId::new("alice"), AccountId::new("bob")];
        config.custom_domain = Some("example.org".to_string());
        config.top_up_block = Some(42);
        let ledger = SimulatedLedger::seeded(&config);

        let bob = ledger
            .balance(&AccountId::new("bob"), ReadChannel::Verified)
            .await
            .unwrap();
        assert_eq!(bob.e8s, SEED_BALANCE_E8S + SEED_BALANCE_E8S / 100);
        let history = ledger
            .transactions(&AccountId::new("alice"), None, 10, ReadChannel::Verified)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(
            ledger.registration_status("example.org").await.unwrap(),
            RemoteResult::Ok(RegistrationState::Submitted)
        );
        assert_eq!(
            ledger.notify_top_up(&CanisterId::new("c1"), 42).await,
            Err(RemoteError::Processing)
        );
    }
}
