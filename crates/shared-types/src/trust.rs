//! # Trust Levels
//!
//! The remote ledger offers two read channels: a fast unverified query and a
//! slower verified (certified) read. Values keep a record of the channel they
//! were read from for their whole lifetime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The read channel a value was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadChannel {
    /// Fast, cheap, not cryptographically checked.
    Unverified,
    /// Slow, certified by the remote system and checked locally.
    Verified,
}

impl ReadChannel {
    /// Both channels, unverified first.
    pub const ALL: [ReadChannel; 2] = [ReadChannel::Unverified, ReadChannel::Verified];

    /// Map a `verified` flag to its channel.
    #[must_use]
    pub fn from_verified(verified: bool) -> Self {
        if verified {
            Self::Verified
        } else {
            Self::Unverified
        }
    }

    /// Whether this is the verified channel.
    #[must_use]
    pub fn is_verified(self) -> bool {
        matches!(self, Self::Verified)
    }

    /// Stable lowercase label, used in logs and metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unverified => "unverified",
            Self::Verified => "verified",
        }
    }
}

impl fmt::Display for ReadChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value tagged with the trust level of the channel that produced it.
///
/// Once a verified value has been delivered for a request, no later
/// unverified value of the same request may replace it. Verified values
/// replace each other outright; they are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedValue<T> {
    /// The payload.
    pub value: T,
    /// `true` when the payload came from the verified channel.
    pub verified: bool,
}

impl<T> TrustedValue<T> {
    /// Create a value with an explicit trust level.
    pub fn new(value: T, verified: bool) -> Self {
        Self { value, verified }
    }

    /// Create a value read from the verified channel.
    pub fn verified(value: T) -> Self {
        Self::new(value, true)
    }

    /// Create a value read from the unverified channel.
    pub fn unverified(value: T) -> Self {
        Self::new(value, false)
    }

    /// Wrap a value read from `channel`.
    pub fn from_channel(value: T, channel: ReadChannel) -> Self {
        Self::new(value, channel.is_verified())
    }

    /// The channel this value was read from.
    pub fn channel(&self) -> ReadChannel {
        ReadChannel::from_verified(self.verified)
    }

    /// Transform the payload, keeping the trust level.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> TrustedValue<U> {
        TrustedValue {
            value: f(self.value),
            verified: self.verified,
        }
    }

    /// Borrow the payload, keeping the trust level.
    pub fn as_ref(&self) -> TrustedValue<&T> {
        TrustedValue {
            value: &self.value,
            verified: self.verified,
        }
    }

    /// Unwrap the payload, discarding the trust level.
    pub fn into_inner(self) -> T {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_round_trip_flag() {
        assert_eq!(ReadChannel::from_verified(true), ReadChannel::Verified);
        assert_eq!(ReadChannel::from_verified(false), ReadChannel::Unverified);
        assert!(ReadChannel::Verified.is_verified());
        assert!(!ReadChannel::Unverified.is_verified());
    }

    #[test]
    fn test_trusted_value_map_keeps_trust() {
        let value = TrustedValue::verified(21u64).map(|v| v * 2);
        assert_eq!(value.value, 42);
        assert!(value.verified);
        assert_eq!(value.channel(), ReadChannel::Verified);
    }

    #[test]
    fn test_trusted_value_serde_shape() {
        let json = serde_json::to_value(TrustedValue::unverified(7u64)).unwrap();
        assert_eq!(json, serde_json::json!({ "value": 7, "verified": false }));
    }
}
