//! Scoped connection context
//!
//! One task-local slot holding the strategy currently in effect for the
//! executing operation. The slot is per-task, never process-wide, so
//! concurrent requests cannot observe each other's strategy.
//!
//! Restoration is structural: `run_with_strategy` scopes the slot around
//! a future, and the scope ends when the future does, whether it
//! completed, returned an error, panicked, or was cancelled. Nested
//! scopes shadow the outer value and restore it on exit (LIFO).

use std::future::Future;

use steer_core::ConnectionStrategy;

tokio::task_local! {
    static ACTIVE_STRATEGY: ConnectionStrategy;
}

/// Run `work` with `strategy` in effect for its duration
///
/// The sole mutator of the context slot. Returns or propagates whatever
/// `work` produces, unchanged; the outer strategy (or "unset") is back
/// in effect as soon as this returns.
pub async fn run_with_strategy<F>(strategy: ConnectionStrategy, work: F) -> F::Output
where
    F: Future,
{
    ACTIVE_STRATEGY.scope(strategy, work).await
}

/// The strategy currently in effect, or `default` when none is
///
/// Read by the connection pool to pick a physical connection.
pub fn current_strategy(default: ConnectionStrategy) -> ConnectionStrategy {
    ACTIVE_STRATEGY.try_with(|s| *s).unwrap_or(default)
}

/// The strategy currently in effect, if any
pub fn active_strategy() -> Option<ConnectionStrategy> {
    ACTIVE_STRATEGY.try_with(|s| *s).ok()
}
