//! # Core Domain Entities
//!
//! Identifiers and the resources the client keeps in sync.
//!
//! ## Clusters
//!
//! - **Identity**: `AccountId`, `CanisterId`, `LedgerId`, `EntityId`
//! - **Ledger**: `Balance`, `Transaction`, `TransactionId`
//! - **Compute**: `CyclesBalance`, `MonitoringStatus`, `RunState`
//! - **Registration**: `DomainRegistration`, `RegistrationState`

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte hash (SHA-256).
pub type Hash = [u8; 32];

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create an id from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw id.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Ledger account identifier (hex account id or principal subaccount).
    AccountId
);
string_id!(
    /// Canister (smart contract) identifier.
    CanisterId
);
string_id!(
    /// Identifier of a ledger instance (one per token).
    LedgerId
);
string_id!(
    /// Key under which the reconciled store keeps a resource.
    ///
    /// Every entity id is owned by exactly one sync task.
    EntityId
);

impl From<&AccountId> for EntityId {
    fn from(id: &AccountId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&CanisterId> for EntityId {
    fn from(id: &CanisterId) -> Self {
        Self(id.0.clone())
    }
}

impl From<&LedgerId> for EntityId {
    fn from(id: &LedgerId) -> Self {
        Self(id.0.clone())
    }
}

// =============================================================================
// CLUSTER B: LEDGER
// =============================================================================

/// Token balance of an account, in e8s (1 token = 10^8 e8s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Balance {
    /// Amount in e8s.
    pub e8s: u64,
}

impl Balance {
    /// Create a balance.
    pub const fn new(e8s: u64) -> Self {
        Self { e8s }
    }
}

/// Position of a transaction in the ledger. Higher is newer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ledger transfer touching a synced account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Ledger block index; unique per ledger.
    pub id: TransactionId,
    /// Sender.
    pub from: AccountId,
    /// Receiver.
    pub to: AccountId,
    /// Amount in e8s.
    pub amount_e8s: u64,
    /// Fee in e8s.
    pub fee_e8s: u64,
    /// Caller supplied memo.
    pub memo: u64,
    /// Ledger timestamp, milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

// =============================================================================
// CLUSTER C: COMPUTE
// =============================================================================

/// Cycles held by a canister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CyclesBalance {
    /// Cycles.
    pub cycles: u64,
}

impl CyclesBalance {
    /// Create a cycles balance.
    pub const fn new(cycles: u64) -> Self {
        Self { cycles }
    }
}

/// Run state of a canister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Executing messages.
    Running,
    /// Draining in-flight messages before stopping.
    Stopping,
    /// Not executing messages.
    Stopped,
}

/// Health snapshot of a monitored canister.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    /// Canister being monitored.
    pub canister: CanisterId,
    /// Run state.
    pub state: RunState,
    /// Cycles balance.
    pub cycles: u64,
    /// Memory footprint in bytes.
    pub memory_bytes: u64,
    /// Cycles burned per day at the current rate.
    pub idle_cycles_burned_per_day: u64,
}

// =============================================================================
// CLUSTER D: CUSTOM DOMAIN REGISTRATION
// =============================================================================

/// Progress of a custom domain registration with the boundary nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RegistrationState {
    /// Accepted, nothing done yet.
    Submitted,
    /// Waiting for the DNS challenge to validate.
    PendingChallenge,
    /// Certificate being issued.
    Processing,
    /// Domain is live.
    Available,
    /// Registration failed permanently.
    Failed {
        /// Reason given by the registration service.
        reason: String,
    },
}

impl RegistrationState {
    /// Whether polling can stop.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Available | Self::Failed { .. })
    }
}

/// Registration state of one custom domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRegistration {
    /// The domain, e.g. `app.example.org`.
    pub domain: String,
    /// Current state.
    pub state: RegistrationState,
}
