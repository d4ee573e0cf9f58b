//! # Read Policy
//!
//! Which channels run, and when `fetch` returns.

use serde::{Deserialize, Serialize};
use shared_types::ReadChannel;
use std::fmt;
use std::str::FromStr;

/// Which read channels a fetch issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadStrategy {
    /// Unverified (query) channel only.
    QueryOnly,
    /// Verified (update) channel only.
    UpdateOnly,
    /// Both channels concurrently.
    #[default]
    Both,
}

impl ReadStrategy {
    /// Channels issued under this strategy.
    #[must_use]
    pub fn channels(self) -> &'static [ReadChannel] {
        match self {
            Self::QueryOnly => &[ReadChannel::Unverified],
            Self::UpdateOnly => &[ReadChannel::Verified],
            Self::Both => &ReadChannel::ALL,
        }
    }
}

/// When `fetch` returns control to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// After the first settled branch; later branches still deliver.
    Race,
    /// After every branch settled.
    #[default]
    AllSettled,
}

/// Unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown read policy: {}", self.0)
    }
}

impl std::error::Error for UnknownPolicy {}

impl FromStr for ReadStrategy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "query_only" | "query" => Ok(Self::QueryOnly),
            "update_only" | "update" => Ok(Self::UpdateOnly),
            "both" => Ok(Self::Both),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

impl FromStr for Resolution {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "race" => Ok(Self::Race),
            "all_settled" | "allsettled" => Ok(Self::AllSettled),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_channels() {
        assert_eq!(ReadStrategy::QueryOnly.channels(), &[ReadChannel::Unverified]);
        assert_eq!(ReadStrategy::UpdateOnly.channels(), &[ReadChannel::Verified]);
        assert_eq!(ReadStrategy::Both.channels().len(), 2);
    }

    #[test]
    fn test_parse_policies() {
        assert_eq!("Both".parse::<ReadStrategy>().unwrap(), ReadStrategy::Both);
        assert_eq!("race".parse::<Resolution>().unwrap(), Resolution::Race);
        assert!("fastest".parse::<Resolution>().is_err());
    }
}
