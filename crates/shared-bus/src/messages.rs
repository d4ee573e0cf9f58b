//! # Worker Messages
//!
//! Closed sum types for both directions of the context boundary.
//!
//! - Inbound (supervisor to context): [`WorkerCommand`]
//! - Outbound (context to supervisor): [`WorkerEvent`]
//!
//! Every payload is typed per [`TaskKind`]. A new kind is added by extending
//! [`TaskParams`] and [`SyncData`]; the exhaustive matches below then fail to
//! compile until both sides handle it.

use serde::{Deserialize, Serialize};
use shared_types::{
    AccountId, Balance, CanisterId, CyclesBalance, DomainRegistration, EntityId, ErrorEnvelope,
    Generation, MonitoringStatus, TaskKind, TaskOp, Transaction, TrustedValue,
};

// =============================================================================
// TASK PARAMETERS
// =============================================================================

/// Accounts whose balances are refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceParams {
    /// Accounts to refresh, one dual read per account per tick.
    pub accounts: Vec<AccountId>,
}

/// Account whose transaction history is followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionsParams {
    /// Account to follow.
    pub account: AccountId,
    /// Maximum transactions fetched per tick.
    pub page_size: u32,
}

/// Canisters whose cycles balances are refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclesParams {
    /// Canisters to refresh.
    pub canisters: Vec<CanisterId>,
}

/// Canisters whose health is monitored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringParams {
    /// Canisters to monitor.
    pub canisters: Vec<CanisterId>,
}

/// Custom domain whose registration is polled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomDomainParams {
    /// The domain being registered.
    pub domain: String,
}

/// Kind-specific parameters of a sync task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskParams {
    /// See [`BalanceParams`].
    Balance(BalanceParams),
    /// See [`TransactionsParams`].
    Transactions(TransactionsParams),
    /// See [`CyclesParams`].
    Cycles(CyclesParams),
    /// See [`MonitoringParams`].
    Monitoring(MonitoringParams),
    /// See [`CustomDomainParams`].
    CustomDomainRegistration(CustomDomainParams),
}

impl TaskParams {
    /// The task kind these parameters belong to.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Balance(_) => TaskKind::Balance,
            Self::Transactions(_) => TaskKind::Transactions,
            Self::Cycles(_) => TaskKind::Cycles,
            Self::Monitoring(_) => TaskKind::Monitoring,
            Self::CustomDomainRegistration(_) => TaskKind::CustomDomainRegistration,
        }
    }

    /// Serialise without a kind tag; the tag travels beside the payload.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Balance(p) => serde_json::to_value(p),
            Self::Transactions(p) => serde_json::to_value(p),
            Self::Cycles(p) => serde_json::to_value(p),
            Self::Monitoring(p) => serde_json::to_value(p),
            Self::CustomDomainRegistration(p) => serde_json::to_value(p),
        }
    }

    /// Decode the parameters of `kind`.
    pub fn from_value(kind: TaskKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            TaskKind::Balance => Self::Balance(serde_json::from_value(value)?),
            TaskKind::Transactions => Self::Transactions(serde_json::from_value(value)?),
            TaskKind::Cycles => Self::Cycles(serde_json::from_value(value)?),
            TaskKind::Monitoring => Self::Monitoring(serde_json::from_value(value)?),
            TaskKind::CustomDomainRegistration => {
                Self::CustomDomainRegistration(serde_json::from_value(value)?)
            }
        })
    }
}

/// Everything a context needs to run one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Kind-specific parameters.
    pub params: TaskParams,
    /// Tick interval in milliseconds.
    pub interval_ms: u64,
}

impl TaskSpec {
    /// Create a task spec.
    #[must_use]
    pub fn new(params: TaskParams, interval_ms: u64) -> Self {
        Self {
            params,
            interval_ms,
        }
    }

    /// The task kind.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        self.params.kind()
    }
}

// =============================================================================
// INBOUND: SUPERVISOR -> CONTEXT
// =============================================================================

/// Command sent to a background context.
///
/// There is no shutdown command: a context exits when its command channel
/// closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Start the task (no-op when it is already running).
    Start(TaskSpec),
    /// Stop the task of this kind.
    Stop(TaskKind),
    /// Replace the task's parameters, then stop and start it.
    Restart(TaskSpec),
}

impl WorkerCommand {
    /// Task kind the command is addressed to.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Start(spec) | Self::Restart(spec) => spec.kind(),
            Self::Stop(kind) => *kind,
        }
    }

    /// Lifecycle operation requested.
    #[must_use]
    pub fn op(&self) -> TaskOp {
        match self {
            Self::Start(_) => TaskOp::Start,
            Self::Stop(_) => TaskOp::Stop,
            Self::Restart(_) => TaskOp::Restart,
        }
    }
}

// =============================================================================
// OUTBOUND: CONTEXT -> SUPERVISOR
// =============================================================================

/// Latest balance of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// The account.
    pub account: AccountId,
    /// Its balance.
    pub balance: Balance,
}

/// Transactions of one account, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsUpdate {
    /// The account.
    pub account: AccountId,
    /// Transactions newer than the last verified tip, newest first.
    pub transactions: Vec<Transaction>,
}

/// Latest cycles balance of one canister.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CyclesUpdate {
    /// The canister.
    pub canister: CanisterId,
    /// Its cycles balance.
    pub cycles: CyclesBalance,
}

/// Data produced by one task delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncData {
    /// Balance of one account.
    Balance(BalanceUpdate),
    /// New transactions of one account.
    Transactions(TransactionsUpdate),
    /// Cycles of one canister.
    Cycles(CyclesUpdate),
    /// Health of one canister.
    Monitoring(MonitoringStatus),
    /// Registration state of one custom domain.
    CustomDomainRegistration(DomainRegistration),
}

impl SyncData {
    /// The task kind that produced this data.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Balance(_) => TaskKind::Balance,
            Self::Transactions(_) => TaskKind::Transactions,
            Self::Cycles(_) => TaskKind::Cycles,
            Self::Monitoring(_) => TaskKind::Monitoring,
            Self::CustomDomainRegistration(_) => TaskKind::CustomDomainRegistration,
        }
    }

    /// The store entity this data belongs to.
    #[must_use]
    pub fn entity_id(&self) -> EntityId {
        match self {
            Self::Balance(u) => EntityId::from(&u.account),
            Self::Transactions(u) => EntityId::from(&u.account),
            Self::Cycles(u) => EntityId::from(&u.canister),
            Self::Monitoring(s) => EntityId::from(&s.canister),
            Self::CustomDomainRegistration(r) => EntityId::new(r.domain.clone()),
        }
    }

    /// Serialise without a kind tag.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Balance(u) => serde_json::to_value(u),
            Self::Transactions(u) => serde_json::to_value(u),
            Self::Cycles(u) => serde_json::to_value(u),
            Self::Monitoring(s) => serde_json::to_value(s),
            Self::CustomDomainRegistration(r) => serde_json::to_value(r),
        }
    }

    /// Decode the data of `kind`.
    pub fn from_value(kind: TaskKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            TaskKind::Balance => Self::Balance(serde_json::from_value(value)?),
            TaskKind::Transactions => Self::Transactions(serde_json::from_value(value)?),
            TaskKind::Cycles => Self::Cycles(serde_json::from_value(value)?),
            TaskKind::Monitoring => Self::Monitoring(serde_json::from_value(value)?),
            TaskKind::CustomDomainRegistration => {
                Self::CustomDomainRegistration(serde_json::from_value(value)?)
            }
        })
    }
}

/// A value delivered by a task tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Generation of the task when the tick started.
    pub generation: Generation,
    /// Per-task monotonically increasing tick id.
    pub request_id: u64,
    /// The value with its trust level.
    pub value: TrustedValue<SyncData>,
}

/// Event sent from a background context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// A tick delivered a value.
    Delivered(Delivery),
    /// A tick failed. `error.terminal` is set when the task stopped itself.
    Failed {
        /// Task kind.
        kind: TaskKind,
        /// Generation of the task when the tick started.
        generation: Generation,
        /// The error.
        error: ErrorEnvelope,
    },
}

impl WorkerEvent {
    /// Task kind the event comes from.
    #[must_use]
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Delivered(delivery) => delivery.value.value.kind(),
            Self::Failed { kind, .. } => *kind,
        }
    }

    /// Generation stamped on the event.
    #[must_use]
    pub fn generation(&self) -> Generation {
        match self {
            Self::Delivered(delivery) => delivery.generation,
            Self::Failed { generation, .. } => *generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_kind_and_op() {
        let spec = TaskSpec::new(
            TaskParams::CustomDomainRegistration(CustomDomainParams {
                domain: "app.example.org".to_string(),
            }),
            5_000,
        );
        let cmd = WorkerCommand::Restart(spec);
        assert_eq!(cmd.kind(), TaskKind::CustomDomainRegistration);
        assert_eq!(cmd.op(), TaskOp::Restart);
        assert_eq!(WorkerCommand::Stop(TaskKind::Cycles).op(), TaskOp::Stop);
    }

    #[test]
    fn test_sync_data_entity_ids() {
        let data = SyncData::Balance(BalanceUpdate {
            account: AccountId::new("acc-1"),
            balance: Balance::new(10),
        });
        assert_eq!(data.kind(), TaskKind::Balance);
        assert_eq!(data.entity_id(), EntityId::new("acc-1"));
    }

    #[test]
    fn test_params_decode_uses_kind() {
        let value = serde_json::json!({ "account": "acc-9", "pageSize": 20 });
        let params = TaskParams::from_value(TaskKind::Transactions, value.clone()).unwrap();
        assert_eq!(params.kind(), TaskKind::Transactions);
        assert_eq!(params.to_value().unwrap(), value);

        // Same payload is not a valid balance payload.
        assert!(TaskParams::from_value(TaskKind::Balance, value).is_err());
    }
}
