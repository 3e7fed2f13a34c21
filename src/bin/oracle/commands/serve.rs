//! Serve command - run the oracle HTTP server

use std::path::Path;

use angel_oracle::{server, Config};
use anyhow::Result;

pub async fn run(config_path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = Config::load_from(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let state = server::build_state(&config).await?;
    server::run_server(&config.server.host, config.server.port, state).await
}
