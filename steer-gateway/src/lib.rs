//! Steer Gateway - Simulated dispatch front end
//!
//! Stands in for the external dispatch framework at the policy engine's
//! boundary:
//! - every inbound operation is invoked through `RequestInterceptor`
//! - every redirect goes through `RedirectGuard`
//! - database access acquires its connection from a `StaticReplicaSet`
//!   using the strategy currently in scope

use std::sync::Arc;

use tracing::{info, trace};

use steer_core::{ConnectionStrategy, RouteResult, RoutingRules};
use steer_router::{
    ConnectionHandle, MemoryNextRequestStore, PolicyRegistry, RedirectGuard, ReplicaPool,
    RequestInterceptor, SessionId, StaticReplicaSet,
};

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Node ID
    pub node_id: String,

    /// Handler name the routing rules are registered under
    pub handler: String,

    /// Primary connection name
    pub primary: String,

    /// Replica connection names
    pub replicas: Vec<String>,

    /// Routing rules for the handler
    pub rules: RoutingRules,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            node_id: uuid::Uuid::new_v4().to_string(),
            handler: "app".to_string(),
            primary: "primary".to_string(),
            replicas: vec!["replica-1".to_string(), "replica-2".to_string()],
            rules: RoutingRules::new()
                .route_all(ConnectionStrategy::Persistent)
                .route(["save", "delete"], ConnectionStrategy::Master),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables
    ///
    /// Invalid routing rules fail here, before any traffic is served.
    pub fn from_env() -> RouteResult<Self> {
        let mut config = GatewayConfig::default();

        if let Ok(node_id) = std::env::var("STEER_NODE_ID") {
            config.node_id = node_id;
        }

        if let Ok(handler) = std::env::var("STEER_HANDLER") {
            config.handler = handler;
        }

        if let Ok(primary) = std::env::var("STEER_PRIMARY") {
            config.primary = primary;
        }

        if let Ok(replicas) = std::env::var("STEER_REPLICAS") {
            config.replicas = replicas
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(rules) = std::env::var("STEER_RULES") {
            config.rules = RoutingRules::from_json(&rules)?;
        }

        Ok(config)
    }
}

/// Outcome of one simulated request
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// Operation that was serviced
    pub operation: String,

    /// Connection that serviced it
    pub connection: ConnectionHandle,

    /// Whether a redirect was issued
    pub redirected: bool,
}

/// Gateway node: interceptor, redirect guard and replica set wired up
pub struct Gateway {
    config: GatewayConfig,
    interceptor: RequestInterceptor,
    guard: RedirectGuard,
    pool: Arc<StaticReplicaSet>,
}

impl Gateway {
    /// Create a gateway, registering the configured routing rules
    pub fn new(config: GatewayConfig) -> RouteResult<Self> {
        info!(
            node_id = %config.node_id,
            handler = %config.handler,
            replicas = config.replicas.len(),
            "Creating gateway node"
        );

        let registry = Arc::new(PolicyRegistry::new());
        registry.register(&config.handler, &config.rules)?;

        let store = Arc::new(MemoryNextRequestStore::new());
        let pool = Arc::new(StaticReplicaSet::from_names(
            &config.primary,
            &config.replicas,
        ));

        Ok(Self {
            interceptor: RequestInterceptor::new(registry, store.clone()),
            guard: RedirectGuard::new(store),
            pool,
            config,
        })
    }

    /// Service one inbound operation for a session
    ///
    /// `redirect_after` simulates the handler ending in a redirect
    /// response, as in post-redirect-get.
    pub async fn handle(
        &self,
        session: SessionId,
        operation: &str,
        redirect_after: bool,
    ) -> RouteResult<RequestOutcome> {
        self.interceptor
            .intercept(&self.config.handler, operation, session, async {
                // Unscoped operations use the plain default connection
                let connection = self
                    .pool
                    .acquire_current(ConnectionStrategy::Master)
                    .await?;

                info!(operation, connection = %connection.name, "Operation serviced");

                if redirect_after {
                    self.guard
                        .on_redirect(session, async {
                            trace!(operation, "Redirect issued");
                        })
                        .await;
                }

                Ok(RequestOutcome {
                    operation: operation.to_string(),
                    connection,
                    redirected: redirect_after,
                })
            })
            .await
    }

    /// Run a short scripted request sequence, demonstrating the
    /// write-then-redirect consistency path
    pub async fn run(&self) -> RouteResult<()> {
        info!(node_id = %self.config.node_id, "Gateway started");

        let session = SessionId::new();

        self.handle(session, "index", false).await?;
        self.handle(session, "save", true).await?;

        // The request following the redirect reads from the primary
        let followup = self.handle(session, "show", false).await?;
        info!(
            connection = %followup.connection.name,
            "Post-redirect read serviced by primary: {}",
            followup.connection.is_primary
        );

        self.handle(session, "show", false).await?;

        Ok(())
    }

    /// Get node ID
    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }
}
