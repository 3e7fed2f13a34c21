//! Config command - show the effective configuration

use std::path::Path;

use crate::style::*;
use angel_oracle::Config;
use anyhow::Result;

pub fn run(config_path: &Path) -> Result<()> {
    print_header("Oracle Configuration");

    if !config_path.exists() {
        print_info(&format!(
            "{} not found, showing built-in defaults",
            config_path.display()
        ));
    }

    let config = Config::load_from(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config.public_summary())?);

    println!();
    println!("{}", style_bold("Registered Missions:"));
    for mission in config.mission_registry()?.missions() {
        println!("  {:>4}  {}", mission.mission_type.value(), mission.validator);
    }

    Ok(())
}
