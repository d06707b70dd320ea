//! # Duet Server
//!
//! Anonymous one-to-one pairing and signaling relay server.
//!
//! ## Usage
//!
//! ```bash
//! # Run with default settings
//! duet
//!
//! # Run with a config file in the search path
//! duet   # reads duet.toml, /etc/duet/duet.toml, ~/.config/duet/duet.toml
//!
//! # Run with environment variables
//! DUET_PORT=3000 DUET_HOST=0.0.0.0 duet
//! ```

mod config;
mod handlers;
mod metrics;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duet=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::load()?;

    tracing::info!("Starting Duet server on {}:{}", config.host, config.port);

    // Initialize metrics
    metrics::init_metrics();

    // Start the server
    handlers::run_server(config).await?;

    Ok(())
}
