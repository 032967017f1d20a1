//! Redirect consistency guard
//!
//! A write under the master strategy may not yet be visible on replicas
//! when the handler redirects (post-redirect-get). The guard observes
//! the strategy active *at redirect time*: if it is master, it arms the
//! session's deferred-master flag so the next request reads from the
//! primary and the client sees its own write. Persistent and random
//! reads never arm it; only master operations are guaranteed fresh.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use steer_core::ConnectionStrategy;

use crate::context::active_strategy;
use crate::session::{NextRequestStore, SessionId};

/// Arms the deferred-master flag when redirecting under master
pub struct RedirectGuard {
    store: Arc<dyn NextRequestStore>,
}

impl RedirectGuard {
    /// Create a guard over a next-request store
    pub fn new(store: Arc<dyn NextRequestStore>) -> Self {
        Self { store }
    }

    /// Arm the flag if master is active, then perform the redirect
    ///
    /// Must be called while the in-flight operation's scope is still
    /// active; `redirect` is the framework's real redirect side effect.
    pub async fn on_redirect<F>(&self, session: SessionId, redirect: F) -> F::Output
    where
        F: Future,
    {
        if active_strategy() == Some(ConnectionStrategy::Master) {
            debug!(%session, "Redirect under master strategy, arming deferred-master flag");
            self.store.arm(session);
        }
        redirect.await
    }
}
