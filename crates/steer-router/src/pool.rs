//! Replica pool boundary
//!
//! The policy core only ever supplies a strategy; turning it into a
//! physical connection lives behind `ReplicaPool`. `StaticReplicaSet`
//! is the reference implementation over a fixed set of handles.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use tracing::trace;

use steer_core::{ConnectionStrategy, RouteError, RouteResult};

use crate::context::current_strategy;

/// Opaque handle to a physical database connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHandle {
    /// Connection target, e.g. `primary` or `replica-2`
    pub name: Arc<str>,
    /// Whether this handle points at the primary
    pub is_primary: bool,
}

impl ConnectionHandle {
    /// Handle for the primary (write) connection
    pub fn primary(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            is_primary: true,
        }
    }

    /// Handle for a read replica
    pub fn replica(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            is_primary: false,
        }
    }
}

/// Maps a strategy to a usable database connection
#[async_trait]
pub trait ReplicaPool: Send + Sync {
    /// Return a connection appropriate for `strategy`
    async fn acquire(&self, strategy: ConnectionStrategy) -> RouteResult<ConnectionHandle>;

    /// Acquire using the strategy currently in scope, or `default`
    async fn acquire_current(
        &self,
        default: ConnectionStrategy,
    ) -> RouteResult<ConnectionHandle> {
        self.acquire(current_strategy(default)).await
    }
}

/// Fixed set of pre-built handles: one primary plus zero or more replicas
///
/// `Persistent` picks one replica at random the first time and reuses it
/// for the lifetime of the set; `Random` picks per call. With no
/// replicas configured, read strategies fall back to the primary unless
/// the set was built with `strict_reads`.
pub struct StaticReplicaSet {
    primary: ConnectionHandle,
    replicas: Vec<ConnectionHandle>,
    /// Sticky replica index, chosen once
    sticky: Mutex<Option<usize>>,
    /// Fail instead of falling back to the primary for read strategies
    strict_reads: bool,
}

impl StaticReplicaSet {
    /// Create a set from a primary handle and replica handles
    pub fn new(primary: ConnectionHandle, replicas: Vec<ConnectionHandle>) -> Self {
        Self {
            primary,
            replicas,
            sticky: Mutex::new(None),
            strict_reads: false,
        }
    }

    /// Build from names: one primary plus named replicas
    pub fn from_names<I, S>(primary: &str, replicas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            ConnectionHandle::primary(primary),
            replicas
                .into_iter()
                .map(|n| ConnectionHandle::replica(n.as_ref()))
                .collect(),
        )
    }

    /// Fail read strategies when no replica is configured, instead of
    /// falling back to the primary
    pub fn strict_reads(mut self) -> Self {
        self.strict_reads = true;
        self
    }

    /// Number of configured replicas
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    fn replica_for(&self, strategy: ConnectionStrategy) -> RouteResult<ConnectionHandle> {
        if self.replicas.is_empty() {
            if self.strict_reads {
                return Err(RouteError::NoReplicaAvailable(strategy));
            }
            trace!(%strategy, "No replicas configured, using primary");
            return Ok(self.primary.clone());
        }

        let index = match strategy {
            ConnectionStrategy::Persistent => {
                let mut sticky = self.sticky.lock();
                *sticky
                    .get_or_insert_with(|| rand::thread_rng().gen_range(0..self.replicas.len()))
            }
            _ => rand::thread_rng().gen_range(0..self.replicas.len()),
        };

        let handle = self.replicas[index].clone();
        trace!(%strategy, connection = %handle.name, "Replica selected");
        Ok(handle)
    }
}

#[async_trait]
impl ReplicaPool for StaticReplicaSet {
    async fn acquire(&self, strategy: ConnectionStrategy) -> RouteResult<ConnectionHandle> {
        match strategy {
            ConnectionStrategy::Master => Ok(self.primary.clone()),
            ConnectionStrategy::Persistent | ConnectionStrategy::Random => {
                self.replica_for(strategy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::run_with_strategy;

    fn replica_set() -> StaticReplicaSet {
        StaticReplicaSet::from_names("primary", ["replica-1", "replica-2", "replica-3"])
    }

    #[tokio::test]
    async fn test_master_acquires_primary() {
        let pool = replica_set();
        let handle = pool.acquire(ConnectionStrategy::Master).await.unwrap();
        assert!(handle.is_primary);
        assert_eq!(&*handle.name, "primary");
    }

    #[tokio::test]
    async fn test_persistent_is_sticky() {
        let pool = replica_set();
        let first = pool.acquire(ConnectionStrategy::Persistent).await.unwrap();

        for _ in 0..10 {
            let again = pool.acquire(ConnectionStrategy::Persistent).await.unwrap();
            assert_eq!(again, first);
        }
        assert!(!first.is_primary);
    }

    #[tokio::test]
    async fn test_random_picks_a_replica() {
        let pool = replica_set();

        for _ in 0..10 {
            let handle = pool.acquire(ConnectionStrategy::Random).await.unwrap();
            assert!(!handle.is_primary);
            assert!(handle.name.starts_with("replica-"));
        }
    }

    #[tokio::test]
    async fn test_no_replicas_falls_back_to_primary() {
        let pool = StaticReplicaSet::from_names("primary", Vec::<String>::new());

        for strategy in [ConnectionStrategy::Persistent, ConnectionStrategy::Random] {
            let handle = pool.acquire(strategy).await.unwrap();
            assert!(handle.is_primary);
        }
    }

    #[tokio::test]
    async fn test_strict_reads_fail_without_replicas() {
        let pool = StaticReplicaSet::from_names("primary", Vec::<String>::new()).strict_reads();

        let err = pool.acquire(ConnectionStrategy::Random).await.unwrap_err();
        assert!(matches!(
            err,
            RouteError::NoReplicaAvailable(ConnectionStrategy::Random)
        ));
    }

    #[tokio::test]
    async fn test_acquire_current_reads_the_scope() {
        let pool = replica_set();

        let handle = run_with_strategy(ConnectionStrategy::Master, async {
            pool.acquire_current(ConnectionStrategy::Random).await
        })
        .await
        .unwrap();
        assert!(handle.is_primary);

        // Outside any scope the default applies
        let handle = pool
            .acquire_current(ConnectionStrategy::Random)
            .await
            .unwrap();
        assert!(!handle.is_primary);
    }
}
