//! Cross-request state for the deferred-master override
//!
//! The flag must survive exactly one request round trip: armed when a
//! redirect is issued under the master strategy, consumed at the start
//! of the next request of the same session.

use std::collections::HashSet;
use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one client session across requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a fresh session id
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Per-session storage for the deferred-master flag
///
/// `take` is read-and-clear: an armed flag is honored by exactly one
/// request. Implementations back this with whatever survives the
/// request boundary (session store, cookie, cache).
pub trait NextRequestStore: Send + Sync {
    /// Arm the flag for a session's next request
    fn arm(&self, session: SessionId);

    /// Consume the flag: returns whether it was armed, clearing it
    fn take(&self, session: SessionId) -> bool;
}

/// In-process reference store
#[derive(Debug, Default)]
pub struct MemoryNextRequestStore {
    armed: Mutex<HashSet<SessionId>>,
}

impl MemoryNextRequestStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl NextRequestStore for MemoryNextRequestStore {
    fn arm(&self, session: SessionId) {
        self.armed.lock().insert(session);
    }

    fn take(&self, session: SessionId) -> bool {
        self.armed.lock().remove(&session)
    }
}
