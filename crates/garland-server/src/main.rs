//! # Garland Server
//!
//! Realtime shared-canvas server: each channel is a small collaborative
//! canvas whose members place decorations and see each other's changes live.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! garland
//!
//! # Run with custom config
//! garland  # reads garland.toml from the working directory if present
//!
//! # Run with environment variables
//! GARLAND_PORT=8080 GARLAND_HOST=0.0.0.0 garland
//! ```

mod config;
mod handlers;
mod metrics;
mod nickname;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "garland=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting Garland server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
