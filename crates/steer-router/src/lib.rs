//! Steer Router - Connection Routing Policy Engine
//!
//! Decides, per outgoing database operation, which physical connection
//! (master/primary, a sticky "persistent" replica, or a randomly chosen
//! replica) should service it.
//!
//! # Architecture
//!
//! ```text
//! Inbound operation ("orders", "save")
//!     │
//!     ▼
//! ┌─────────────────────────┐
//! │   RequestInterceptor    │  Consumes deferred-master flag, else
//! │   (Which strategy?)     │  resolves handler table: exact → "all"
//! └───────────┬─────────────┘
//!             │ run_with_strategy
//!             ▼
//! ┌─────────────────────────┐
//! │   Scoped context        │  Task-local slot, LIFO nesting,
//! │   (active strategy)     │  restored on every exit path
//! └───────────┬─────────────┘
//!             │ current_strategy
//!             ▼
//! ┌─────────────────────────┐
//! │   ReplicaPool           │  Maps strategy → physical connection
//! │   (Which connection?)   │
//! └─────────────────────────┘
//! ```
//!
//! A redirect issued while the master strategy is active arms the
//! session's deferred-master flag (`RedirectGuard`), so the very next
//! request of the same session reads from the primary and sees its
//! own write despite replication lag.
//!
//! # Example
//!
//! ```rust,ignore
//! use steer_core::{ConnectionStrategy, RoutingRules};
//! use steer_router::{PolicyRegistry, RequestInterceptor, MemoryNextRequestStore};
//!
//! let registry = Arc::new(PolicyRegistry::new());
//! registry.register("orders", &RoutingRules::new()
//!     .route_all(ConnectionStrategy::Persistent)
//!     .route(["save", "delete"], ConnectionStrategy::Master))?;
//!
//! let interceptor = RequestInterceptor::new(registry, store);
//! let response = interceptor.intercept("orders", "save", session, handle()).await;
//! ```

// Core modules
mod context;
mod interceptor;
mod pool;
mod redirect;
mod session;
mod table;

// Re-exports: Scoped context
pub use context::{active_strategy, current_strategy, run_with_strategy};

// Re-exports: Routing tables
pub use table::{PolicyRegistry, RoutingTable};

// Re-exports: Request wrapping
pub use interceptor::{RequestInterceptor, StrategyDecision};
pub use redirect::RedirectGuard;

// Re-exports: Cross-request state
pub use session::{MemoryNextRequestStore, NextRequestStore, SessionId};

// Re-exports: Pool boundary
pub use pool::{ConnectionHandle, ReplicaPool, StaticReplicaSet};
