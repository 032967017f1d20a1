//! Steer Gateway - Main entry point

use steer_gateway::{Gateway, GatewayConfig};
use tracing::Level;
use tracing_subscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load configuration from environment; invalid rules fail fast
    let config = GatewayConfig::from_env()?;

    // Create and run the gateway
    let gateway = Gateway::new(config)?;
    gateway.run().await?;

    Ok(())
}
