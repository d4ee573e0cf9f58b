//! # Runtime Configuration
//!
//! Unified configuration for every subsystem plus what the runtime itself
//! syncs: accounts, canisters, a custom domain, intervals and persistence.

use crate::adapters::SimulatedLedgerConfig;
use ls_02_dual_read::DualReadConfig;
use ls_03_confirmation_poller::PollerConfig;
use ls_04_sync_task::FailurePolicy;
use ls_05_worker_supervisor::SupervisorConfig;
use shared_bus::{
    BalanceParams, CustomDomainParams, CyclesParams, MonitoringParams, TaskParams, TaskSpec,
    TransactionsParams,
};
use shared_types::{AccountId, CanisterId, ConfigError, TaskKind};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use sync_telemetry::TelemetryConfig;

/// Tick interval per task kind, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskIntervals {
    /// Balance refresh.
    pub balance_ms: u64,
    /// Transaction polling.
    pub transactions_ms: u64,
    /// Cycles refresh.
    pub cycles_ms: u64,
    /// Canister monitoring.
    pub monitoring_ms: u64,
    /// Custom domain registration polling.
    pub custom_domain_ms: u64,
}

impl Default for TaskIntervals {
    fn default() -> Self {
        Self {
            balance_ms: 10_000,
            transactions_ms: 10_000,
            cycles_ms: 30_000,
            monitoring_ms: 60_000,
            custom_domain_ms: 5_000,
        }
    }
}

impl TaskIntervals {
    /// Interval of `kind`.
    #[must_use]
    pub fn for_kind(&self, kind: TaskKind) -> u64 {
        match kind {
            TaskKind::Balance => self.balance_ms,
            TaskKind::Transactions => self.transactions_ms,
            TaskKind::Cycles => self.cycles_ms,
            TaskKind::Monitoring => self.monitoring_ms,
            TaskKind::CustomDomainRegistration => self.custom_domain_ms,
        }
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Accounts whose balances are synced. The first one also has its
    /// transactions followed.
    pub accounts: Vec<AccountId>,
    /// Canisters whose cycles and health are synced.
    pub canisters: Vec<CanisterId>,
    /// Custom domain whose registration is polled until it settles.
    pub custom_domain: Option<String>,
    /// Transactions fetched per tick.
    pub page_size: u32,
    /// Tick intervals.
    pub intervals: TaskIntervals,
    /// Snapshot file; in-memory snapshots when unset.
    pub snapshot_path: Option<PathBuf>,
    /// Ledger block of a top-up to confirm at startup.
    pub top_up_block: Option<u64>,
    /// Canister credited by that top-up; defaults to the first canister.
    pub top_up_canister: Option<CanisterId>,
    /// How often the runtime logs a store summary.
    pub summary_interval_ms: u64,
    /// Dual read behaviour.
    pub dual_read: DualReadConfig,
    /// Confirmation polling.
    pub poller: PollerConfig,
    /// Task failure policy.
    pub failure_policy: FailurePolicy,
    /// Background contexts.
    pub supervisor: SupervisorConfig,
    /// Simulated ledger used by the binary.
    pub ledger: SimulatedLedgerConfig,
    /// Logging.
    pub telemetry: TelemetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            accounts: vec![AccountId::new("alice"), AccountId::new("bob")],
            canisters: vec![CanisterId::new("ryjl3-tyaaa-aaaaa-aaaba-cai")],
            custom_domain: None,
            page_size: 50,
            intervals: TaskIntervals::default(),
            snapshot_path: None,
            top_up_block: None,
            top_up_canister: None,
            summary_interval_ms: 15_000,
            dual_read: DualReadConfig::default(),
            poller: PollerConfig::default(),
            failure_policy: FailurePolicy::default(),
            supervisor: SupervisorConfig::default(),
            ledger: SimulatedLedgerConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Small, fast configuration for tests: task contexts, short intervals,
    /// one account and one canister.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            accounts: vec![AccountId::new("alice")],
            canisters: vec![CanisterId::new("c1")],
            custom_domain: None,
            page_size: 10,
            intervals: TaskIntervals {
                balance_ms: 100,
                transactions_ms: 100,
                cycles_ms: 100,
                monitoring_ms: 100,
                custom_domain_ms: 100,
            },
            snapshot_path: None,
            top_up_block: None,
            top_up_canister: None,
            summary_interval_ms: 1_000,
            dual_read: DualReadConfig::default(),
            poller: PollerConfig::for_testing(),
            failure_policy: FailurePolicy::for_testing(),
            supervisor: SupervisorConfig::for_testing(),
            ledger: SimulatedLedgerConfig::for_testing(),
            telemetry: TelemetryConfig::for_testing(),
        }
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.top_up_block.is_some() && self.top_up_target().is_none() {
            return Err(ConfigError::Invalid {
                field: "top_up_canister",
                reason: "a top-up needs a canister to credit".to_string(),
            });
        }
        self.poller.validate()?;
        self.failure_policy.validate()?;
        self.supervisor.validate()?;
        self.ledger.validate()?;
        Ok(())
    }

    /// Canister credited by the configured top-up.
    #[must_use]
    pub fn top_up_target(&self) -> Option<CanisterId> {
        self.top_up_canister
            .clone()
            .or_else(|| self.canisters.first().cloned())
    }

    /// Specs of every task this configuration enables.
    #[must_use]
    pub fn task_specs(&self) -> Vec<TaskSpec> {
        let mut specs = Vec::new();
        let mut push = |params: TaskParams| {
            let interval_ms = self.intervals.for_kind(params.kind());
            specs.push(TaskSpec::new(params, interval_ms));
        };
        if !self.accounts.is_empty() {
            push(TaskParams::Balance(BalanceParams {
                accounts: self.accounts.clone(),
            }));
        }
        if let Some(account) = self.accounts.first() {
            push(TaskParams::Transactions(TransactionsParams {
                account: account.clone(),
                page_size: self.page_size,
            }));
        }
        if !self.canisters.is_empty() {
            push(TaskParams::Cycles(CyclesParams {
                canisters: self.canisters.clone(),
            }));
            push(TaskParams::Monitoring(MonitoringParams {
                canisters: self.canisters.clone(),
            }));
        }
        if let Some(domain) = &self.custom_domain {
            push(TaskParams::CustomDomainRegistration(CustomDomainParams {
                domain: domain.clone(),
            }));
        }
        specs
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LS_ACCOUNTS`, `LS_CANISTERS`: comma separated ids
    /// - `LS_CUSTOM_DOMAIN`: domain to poll
    /// - `LS_PAGE_SIZE`: transactions per tick
    /// - `LS_INTERVAL_{BALANCE,TRANSACTIONS,CYCLES,MONITORING,CUSTOM_DOMAIN}_MS`
    /// - `LS_SNAPSHOT_PATH`: snapshot file
    /// - `LS_TOP_UP_BLOCK`, `LS_TOP_UP_CANISTER`: top-up to confirm
    /// - `LS_SUMMARY_INTERVAL_MS`: summary log period
    ///
    /// Subsystem sections read their own variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(raw) = env::var("LS_ACCOUNTS") {
            config.accounts = split_list(&raw).map(AccountId::new).collect();
        }
        if let Ok(raw) = env::var("LS_CANISTERS") {
            config.canisters = split_list(&raw).map(CanisterId::new).collect();
        }
        if let Ok(raw) = env::var("LS_CUSTOM_DOMAIN") {
            config.custom_domain = Some(raw).filter(|domain| !domain.is_empty());
        }
        if let Some(page_size) = parse_var("LS_PAGE_SIZE")? {
            config.page_size = page_size;
        }

        let intervals = &mut config.intervals;
        for (var, slot) in [
            ("LS_INTERVAL_BALANCE_MS", &mut intervals.balance_ms),
            ("LS_INTERVAL_TRANSACTIONS_MS", &mut intervals.transactions_ms),
            ("LS_INTERVAL_CYCLES_MS", &mut intervals.cycles_ms),
            ("LS_INTERVAL_MONITORING_MS", &mut intervals.monitoring_ms),
            ("LS_INTERVAL_CUSTOM_DOMAIN_MS", &mut intervals.custom_domain_ms),
        ] {
            if let Some(value) = parse_var(var)? {
                *slot = value;
            }
        }

        config.snapshot_path = env::var("LS_SNAPSHOT_PATH").ok().map(PathBuf::from);
        config.top_up_block = parse_var("LS_TOP_UP_BLOCK")?;
        config.top_up_canister = env::var("LS_TOP_UP_CANISTER").ok().map(CanisterId::new);
        if let Some(period) = parse_var("LS_SUMMARY_INTERVAL_MS")? {
            config.summary_interval_ms = period;
        }

        config.dual_read = DualReadConfig::from_env()?;
        config.poller = PollerConfig::from_env()?;
        config.failure_policy = FailurePolicy::from_env()?;
        config.supervisor = SupervisorConfig::from_env()?;
        config.ledger = SimulatedLedgerConfig::from_env()?;
        config.telemetry = TelemetryConfig::from_env();
        config.validate()?;
        Ok(config)
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|item| !item.is_empty())
}

pub(crate) fn parse_var<T: FromStr>(var: &'static str) -> Result<Option<T>, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value: raw }),
        Err(_) => Ok(None),
    }
}
