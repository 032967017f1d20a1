//! Declarative routing configuration
//!
//! Rules map one or more operation identifiers (or the `"all"` wildcard)
//! to a strategy name. String-valued strategies are validated as a whole
//! before anything is applied, so an invalid rule set never leaves a
//! routing table partially updated.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RouteError, RouteResult};
use crate::strategy::ConnectionStrategy;

/// One or more operation identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Operations {
    /// A single identifier (or the `"all"` wildcard)
    One(String),
    /// A list of identifiers sharing a strategy
    Many(Vec<String>),
}

impl Operations {
    /// The identifiers named by this entry
    pub fn names(&self) -> Vec<String> {
        match self {
            Operations::One(name) => vec![name.clone()],
            Operations::Many(names) => names.clone(),
        }
    }
}

/// A single routing rule: operations → strategy name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Operations this rule covers
    pub operations: Operations,

    /// Strategy name, one of `master`, `persistent`, `random`
    pub strategy: String,
}

/// An ordered set of routing rules
///
/// Later rules overwrite earlier ones for the same identifier, matching
/// the overwrite semantics of table registration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutingRules {
    rules: Vec<RoutingRule>,
}

impl RoutingRules {
    /// Create an empty rule set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for a list of operations (builder style)
    pub fn route<I, S>(mut self, operations: I, strategy: ConnectionStrategy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.push(RoutingRule {
            operations: Operations::Many(operations.into_iter().map(Into::into).collect()),
            strategy: strategy.as_str().to_string(),
        });
        self
    }

    /// Add a wildcard rule covering every operation without its own entry
    pub fn route_all(self, strategy: ConnectionStrategy) -> Self {
        self.route([crate::strategy::ALL_OPERATIONS], strategy)
    }

    /// Parse a rule set from JSON
    pub fn from_json(json: &str) -> RouteResult<Self> {
        let rules: Self = serde_json::from_str(json)
            .map_err(|e| RouteError::InvalidConfig(e.to_string()))?;
        // Surface bad strategy names at load time, not at first apply
        rules.parse()?;
        Ok(rules)
    }

    /// Validate every rule, yielding `(identifiers, strategy)` pairs
    ///
    /// Fails on the first unrecognized strategy name without yielding
    /// anything, so callers can apply all-or-nothing.
    pub fn parse(&self) -> RouteResult<Vec<(Vec<String>, ConnectionStrategy)>> {
        let mut parsed = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let strategy: ConnectionStrategy = rule.strategy.parse()?;
            parsed.push((rule.operations.names(), strategy));
        }
        debug!(rules = parsed.len(), "Routing rules validated");
        Ok(parsed)
    }

    /// Number of rules in the set
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
