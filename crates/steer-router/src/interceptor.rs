//! Request interception
//!
//! Wraps each inbound operation invocation: decides the effective
//! strategy, scopes the invocation with it, and leaves the context slot
//! exactly as it found it. This is the explicit hook a dispatch
//! framework calls instead of invoking the operation directly.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, trace};

use steer_core::ConnectionStrategy;

use crate::context::run_with_strategy;
use crate::session::{NextRequestStore, SessionId};
use crate::table::PolicyRegistry;

/// How the effective strategy for an operation was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyDecision {
    /// The session's deferred-master flag was armed; forced to master
    DeferredMaster,
    /// The operation has its own table entry
    ByOperation(ConnectionStrategy),
    /// The wildcard entry applied
    ByWildcard(ConnectionStrategy),
    /// No entry matched; the operation runs unscoped
    NoPolicy,
}

impl StrategyDecision {
    /// The strategy to scope with, if any
    pub fn strategy(&self) -> Option<ConnectionStrategy> {
        match self {
            StrategyDecision::DeferredMaster => Some(ConnectionStrategy::Master),
            StrategyDecision::ByOperation(s) | StrategyDecision::ByWildcard(s) => Some(*s),
            StrategyDecision::NoPolicy => None,
        }
    }
}

impl std::fmt::Display for StrategyDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyDecision::DeferredMaster => write!(f, "deferred-master"),
            StrategyDecision::ByOperation(s) => write!(f, "operation:{s}"),
            StrategyDecision::ByWildcard(s) => write!(f, "wildcard:{s}"),
            StrategyDecision::NoPolicy => write!(f, "no-policy"),
        }
    }
}

/// Wraps inbound operations with strategy resolution and scoping
pub struct RequestInterceptor {
    registry: Arc<PolicyRegistry>,
    store: Arc<dyn NextRequestStore>,
}

impl RequestInterceptor {
    /// Create an interceptor over a registry and a next-request store
    pub fn new(registry: Arc<PolicyRegistry>, store: Arc<dyn NextRequestStore>) -> Self {
        Self { registry, store }
    }

    /// Decide the effective strategy for one operation
    ///
    /// Consumes the session's deferred-master flag when armed, so call
    /// this once per request.
    pub fn decide(&self, handler: &str, operation: &str, session: SessionId) -> StrategyDecision {
        if self.store.take(session) {
            debug!(%session, handler, operation, "Deferred-master flag consumed, forcing master");
            return StrategyDecision::DeferredMaster;
        }

        let table = self.registry.table(handler);
        if let Some(strategy) = table.get(operation) {
            StrategyDecision::ByOperation(strategy)
        } else if let Some(strategy) = table.wildcard() {
            StrategyDecision::ByWildcard(strategy)
        } else {
            StrategyDecision::NoPolicy
        }
    }

    /// Wrap one inbound operation's execution
    ///
    /// Errors from `invoke` propagate unchanged; the context slot is
    /// restored before they reach the caller.
    pub async fn intercept<F>(
        &self,
        handler: &str,
        operation: &str,
        session: SessionId,
        invoke: F,
    ) -> F::Output
    where
        F: Future,
    {
        let decision = self.decide(handler, operation, session);
        trace!(handler, operation, %decision, "Operation routed");

        match decision.strategy() {
            Some(strategy) => run_with_strategy(strategy, invoke).await,
            None => invoke.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::active_strategy;
    use crate::session::MemoryNextRequestStore;
    use steer_core::RoutingRules;

    fn interceptor_with_rules() -> (RequestInterceptor, Arc<MemoryNextRequestStore>) {
        let registry = Arc::new(PolicyRegistry::new());
        registry
            .register(
                "orders",
                &RoutingRules::new()
                    .route_all(ConnectionStrategy::Persistent)
                    .route(["save", "delete"], ConnectionStrategy::Master),
            )
            .unwrap();

        let store = Arc::new(MemoryNextRequestStore::new());
        (
            RequestInterceptor::new(registry, store.clone()),
            store,
        )
    }

    #[tokio::test]
    async fn test_scopes_resolved_strategy() {
        let (interceptor, _) = interceptor_with_rules();
        let session = SessionId::new();

        let seen = interceptor
            .intercept("orders", "save", session, async { active_strategy() })
            .await;
        assert_eq!(seen, Some(ConnectionStrategy::Master));

        let seen = interceptor
            .intercept("orders", "index", session, async { active_strategy() })
            .await;
        assert_eq!(seen, Some(ConnectionStrategy::Persistent));
    }

    #[tokio::test]
    async fn test_unmatched_operation_runs_unscoped() {
        let registry = Arc::new(PolicyRegistry::new());
        let store = Arc::new(MemoryNextRequestStore::new());
        let interceptor = RequestInterceptor::new(registry, store);

        let seen = interceptor
            .intercept("orders", "index", SessionId::new(), async {
                active_strategy()
            })
            .await;
        assert_eq!(seen, None);
    }

    #[tokio::test]
    async fn test_context_restored_after_intercept() {
        let (interceptor, _) = interceptor_with_rules();

        interceptor
            .intercept("orders", "save", SessionId::new(), async {})
            .await;
        assert_eq!(active_strategy(), None);
    }

    #[tokio::test]
    async fn test_error_propagates_unchanged() {
        let (interceptor, _) = interceptor_with_rules();

        let result: Result<(), String> = interceptor
            .intercept("orders", "save", SessionId::new(), async {
                Err("constraint violation".to_string())
            })
            .await;

        assert_eq!(result, Err("constraint violation".to_string()));
        assert_eq!(active_strategy(), None);
    }

    #[tokio::test]
    async fn test_deferred_flag_forces_master_once() {
        let (interceptor, store) = interceptor_with_rules();
        let session = SessionId::new();
        store.arm(session);

        // First request: forced to master despite the table saying persistent
        let seen = interceptor
            .intercept("orders", "index", session, async { active_strategy() })
            .await;
        assert_eq!(seen, Some(ConnectionStrategy::Master));

        // Second request: back to the table's answer
        let seen = interceptor
            .intercept("orders", "index", session, async { active_strategy() })
            .await;
        assert_eq!(seen, Some(ConnectionStrategy::Persistent));
    }

    #[tokio::test]
    async fn test_decision_reports_source() {
        let (interceptor, store) = interceptor_with_rules();
        let session = SessionId::new();

        assert_eq!(
            interceptor.decide("orders", "save", session),
            StrategyDecision::ByOperation(ConnectionStrategy::Master)
        );
        assert_eq!(
            interceptor.decide("orders", "index", session),
            StrategyDecision::ByWildcard(ConnectionStrategy::Persistent)
        );
        assert_eq!(
            interceptor.decide("unknown", "index", session),
            StrategyDecision::NoPolicy
        );

        store.arm(session);
        assert_eq!(
            interceptor.decide("orders", "index", session),
            StrategyDecision::DeferredMaster
        );
    }
}
