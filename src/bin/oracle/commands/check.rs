//! Check command - chain connectivity bootstrap

use std::path::Path;
use std::time::Duration;

use crate::style::*;
use angel_oracle::chain;
use angel_oracle::contract::MINT_FUNCTION;
use angel_oracle::Config;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

pub async fn run(config_path: &Path) -> Result<()> {
    print_header("Chain Connectivity");

    let config = Config::load_from(config_path)?;
    println!("RPC:       {}", config.chain.rpc_url);
    println!("Contract:  {}", truncate_address(&config.chain.contract_address));
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Connecting to node...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = chain::bootstrap(&config.chain, None).await;
    spinner.finish_and_clear();

    let connection = result?;
    print_success(&format!("Connected to network: {}", connection.chain_id));

    if let Some(address) = &config.chain.oracle_address {
        print_info(&format!(
            "Oracle account {} next nonce {}",
            truncate_address(address),
            connection.starting_nonce
        ));
    }

    match &connection.contract {
        Some(abi) if abi.has_function(MINT_FUNCTION) => {
            print_success(&format!("Contract interface exposes {}", MINT_FUNCTION))
        }
        Some(_) => print_warning(&format!("Contract interface has no {}", MINT_FUNCTION)),
        None => print_warning("No contract interface configured"),
    }

    if config.chain.dry_run {
        print_info("Dry run is enabled; mints are recorded but not sent.");
    }

    Ok(())
}
