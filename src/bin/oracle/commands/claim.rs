//! Claim commands - offline claim evaluation

use std::path::Path;

use crate::style::*;
use angel_oracle::{mission_id, Claim, ClaimDispatcher, Config};
use anyhow::{Context, Result};
use serde_json::Value;

/// Read inline JSON or `@path`.
fn read_claim(input: &str) -> Result<Value> {
    let content = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read claim file {}", path))?,
        None => input.to_string(),
    };
    serde_json::from_str(&content).context("Claim is not valid JSON")
}

pub fn run(config_path: &Path, input: &str) -> Result<()> {
    let config = Config::load_from(config_path)?;
    let dispatcher = ClaimDispatcher::new(config.mission_registry()?);

    let raw = read_claim(input)?;
    let decision = dispatcher.handle_claim(&raw);

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

pub fn run_mission_id(input: &str) -> Result<()> {
    let raw = read_claim(input)?;
    let claim = Claim::from_json(&raw)?;

    print_header("Mission Id");
    println!("Wallet:        {}", truncate_address(&claim.wallet));
    println!("Mission type:  {}", claim.mission_type);
    println!("Mission id:    {}", style_cyan(&mission_id::mission_id_for(&claim)));
    Ok(())
}
