//! Error types for the routing policy engine

use thiserror::Error;

use crate::strategy::ConnectionStrategy;

/// Result alias for routing operations
pub type RouteResult<T> = Result<T, RouteError>;

/// Routing error types
#[derive(Debug, Error)]
pub enum RouteError {
    /// A configured strategy name is not in the recognized set.
    /// Raised at registration/parse time; the offending entry is never written.
    #[error("invalid connection strategy `{value}`, allowed: {allowed}")]
    InvalidStrategy {
        value: String,
        allowed: &'static str,
    },

    /// Malformed routing configuration (syntax, not strategy names)
    #[error("invalid routing configuration: {0}")]
    InvalidConfig(String),

    /// No connection is available for the requested strategy
    #[error("no replica available for strategy `{0}`")]
    NoReplicaAvailable(ConnectionStrategy),
}

impl RouteError {
    /// Build an `InvalidStrategy` error for an unrecognized strategy name
    pub fn invalid_strategy(value: impl Into<String>) -> Self {
        Self::InvalidStrategy {
            value: value.into(),
            allowed: ConnectionStrategy::ALLOWED,
        }
    }
}
