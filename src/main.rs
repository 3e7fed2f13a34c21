//! AngelCoin Oracle Server
//!
//! Verifies mission claims and records reward mints

use std::path::PathBuf;

use angel_oracle::{server, Config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting AngelCoin Oracle Server");

    let config_path = std::env::var("ORACLE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));
    let config = Config::load_from(&config_path)?;

    // Chain connectivity is checked here; an unreachable node aborts startup
    let state = server::build_state(&config).await.map_err(|e| {
        error!("Oracle bootstrap failed: {:#}", e);
        e
    })?;

    server::run_server(&config.server.host, config.server.port, state).await?;

    Ok(())
}
