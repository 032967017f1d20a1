//! Connection-selection strategies
//!
//! Centralizes the closed strategy set so registration can validate
//! against it in one place.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RouteError;

/// Reserved operation identifier: matches every operation that has no
/// entry of its own in a routing table.
pub const ALL_OPERATIONS: &str = "all";

/// Connection-selection strategy for one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStrategy {
    /// The primary (write) connection
    Master,
    /// A sticky replica, chosen once and reused
    Persistent,
    /// A replica chosen per call
    Random,
}

impl ConnectionStrategy {
    /// The recognized strategy names, for error messages
    pub const ALLOWED: &'static str = "master, persistent, random";

    /// Strategy name for logging and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStrategy::Master => "master",
            ConnectionStrategy::Persistent => "persistent",
            ConnectionStrategy::Random => "random",
        }
    }
}

impl std::fmt::Display for ConnectionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionStrategy {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(ConnectionStrategy::Master),
            "persistent" => Ok(ConnectionStrategy::Persistent),
            "random" => Ok(ConnectionStrategy::Random),
            other => Err(RouteError::invalid_strategy(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recognized_strategies() {
        assert_eq!(
            "master".parse::<ConnectionStrategy>().unwrap(),
            ConnectionStrategy::Master
        );
        assert_eq!(
            "persistent".parse::<ConnectionStrategy>().unwrap(),
            ConnectionStrategy::Persistent
        );
        assert_eq!(
            "random".parse::<ConnectionStrategy>().unwrap(),
            ConnectionStrategy::Random
        );
    }

    #[test]
    fn test_parse_rejects_unknown_strategy() {
        let err = "primary".parse::<ConnectionStrategy>().unwrap_err();
        match err {
            RouteError::InvalidStrategy { value, allowed } => {
                assert_eq!(value, "primary");
                assert!(allowed.contains("master"));
                assert!(allowed.contains("persistent"));
                assert!(allowed.contains("random"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_display_round_trip() {
        for strategy in [
            ConnectionStrategy::Master,
            ConnectionStrategy::Persistent,
            ConnectionStrategy::Random,
        ] {
            let parsed: ConnectionStrategy = strategy.to_string().parse().unwrap();
            assert_eq!(parsed, strategy);
        }
    }

    #[test]
    fn test_serde_lowercase_names() {
        let json = serde_json::to_string(&ConnectionStrategy::Persistent).unwrap();
        assert_eq!(json, "\"persistent\"");
    }
}
