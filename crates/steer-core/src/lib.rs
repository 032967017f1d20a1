//! Steer Core - Shared library for the routing policy engine
//!
//! This crate provides the types shared by the policy engine and the
//! services embedding it:
//!
//! - `ConnectionStrategy`: the closed set of connection-selection strategies
//! - `RouteError`: error taxonomy for configuration and pool boundaries
//! - `RoutingRules`: declarative operation → strategy configuration

pub mod config;
pub mod error;
pub mod strategy;

pub use config::{RoutingRule, RoutingRules};
pub use error::{RouteError, RouteResult};
pub use strategy::{ConnectionStrategy, ALL_OPERATIONS};
