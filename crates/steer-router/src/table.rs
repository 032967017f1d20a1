//! Routing tables
//!
//! Maps operation identifiers to connection strategies, with a `"all"`
//! wildcard fallback, and manages one table per handler with
//! clone-on-first-access inheritance from a declared parent.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, trace};

use steer_core::{ConnectionStrategy, RouteResult, RoutingRules, ALL_OPERATIONS};

/// Mapping from operation identifier to connection strategy
///
/// At most one strategy per identifier; later registrations overwrite
/// earlier ones.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: HashMap<String, ConnectionStrategy>,
}

impl RoutingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy for one or more operation identifiers
    pub fn register<I, S>(&mut self, operations: I, strategy: ConnectionStrategy)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for operation in operations {
            self.entries.insert(operation.into(), strategy);
        }
    }

    /// Apply a declarative rule set, all-or-nothing
    ///
    /// The rules are validated as a whole first; on error the table is
    /// left untouched.
    pub fn apply(&mut self, rules: &RoutingRules) -> RouteResult<()> {
        for (operations, strategy) in rules.parse()? {
            self.register(operations, strategy);
        }
        Ok(())
    }

    /// Exact-match lookup, no wildcard fallback
    pub fn get(&self, operation: &str) -> Option<ConnectionStrategy> {
        self.entries.get(operation).copied()
    }

    /// The wildcard entry, if registered
    pub fn wildcard(&self) -> Option<ConnectionStrategy> {
        self.entries.get(ALL_OPERATIONS).copied()
    }

    /// Resolve an operation: exact match, then wildcard, then none
    pub fn resolve(&self, operation: &str) -> Option<ConnectionStrategy> {
        self.get(operation).or_else(|| self.wildcard())
    }

    /// Number of registered entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Per-handler routing tables with parent inheritance
///
/// A handler's table is materialized lazily on first access: deep-cloned
/// from the nearest ancestor that has a table, or created empty. The
/// clone happens exactly once per handler; afterwards child and parent
/// tables evolve independently.
///
/// Registration is expected to complete before traffic; the lock makes
/// late registration safe regardless.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    tables: HashMap<String, RoutingTable>,
    parents: HashMap<String, String>,
}

impl PolicyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a handler's parent for table inheritance
    ///
    /// Takes effect on the handler's first table access; re-declaring a
    /// parent after the table was materialized has no effect on it.
    pub fn declare(&self, handler: &str, parent: &str) {
        let mut inner = self.inner.write();
        inner.parents.insert(handler.to_string(), parent.to_string());
        trace!(handler, parent, "Handler parent declared");
    }

    /// Register a declarative rule set into a handler's table
    ///
    /// Validates the whole rule set before writing anything, so an
    /// invalid strategy name leaves existing entries unchanged.
    pub fn register(&self, handler: &str, rules: &RoutingRules) -> RouteResult<()> {
        let parsed = rules.parse()?;
        let mut inner = self.inner.write();
        let table = Self::materialize(&mut inner, handler);
        for (operations, strategy) in parsed {
            table.register(operations, strategy);
        }
        debug!(handler, entries = table.len(), "Routing rules registered");
        Ok(())
    }

    /// Register a strategy for operations of a handler
    pub fn register_operations<I, S>(&self, handler: &str, operations: I, strategy: ConnectionStrategy)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.write();
        Self::materialize(&mut inner, handler).register(operations, strategy);
    }

    /// Snapshot of a handler's table, materializing it if needed
    pub fn table(&self, handler: &str) -> RoutingTable {
        if let Some(table) = self.inner.read().tables.get(handler) {
            return table.clone();
        }
        let mut inner = self.inner.write();
        Self::materialize(&mut inner, handler).clone()
    }

    /// Resolve an operation against a handler's table
    pub fn resolve(&self, handler: &str, operation: &str) -> Option<ConnectionStrategy> {
        if let Some(table) = self.inner.read().tables.get(handler) {
            return table.resolve(operation);
        }
        let mut inner = self.inner.write();
        Self::materialize(&mut inner, handler).resolve(operation)
    }

    /// Materialize a handler's table: clone the nearest ancestor's, or
    /// start empty. Exactly once per handler.
    fn materialize<'a>(inner: &'a mut RegistryInner, handler: &str) -> &'a mut RoutingTable {
        if !inner.tables.contains_key(handler) {
            let inherited = Self::nearest_ancestor_table(inner, handler);
            let table = match inherited {
                Some((ancestor, table)) => {
                    trace!(handler, ancestor = %ancestor, "Table inherited from ancestor");
                    table
                }
                None => RoutingTable::new(),
            };
            inner.tables.insert(handler.to_string(), table);
        }
        inner.tables.get_mut(handler).unwrap()
    }

    /// Walk the parent chain for the first materialized table
    fn nearest_ancestor_table(
        inner: &RegistryInner,
        handler: &str,
    ) -> Option<(String, RoutingTable)> {
        let mut current = handler;
        // Bounded walk in case a parent declaration forms a cycle
        for _ in 0..=inner.parents.len() {
            let parent = inner.parents.get(current)?;
            if let Some(table) = inner.tables.get(parent.as_str()) {
                return Some((parent.clone(), table.clone()));
            }
            current = parent;
        }
        None
    }
}
