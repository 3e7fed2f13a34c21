//! AngelCoin Oracle CLI
//!
//! Operator tooling for the AngelCoin oracle.

mod commands;
mod style;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use style::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "oracle")]
#[command(author = "AngelCoin")]
#[command(version)]
#[command(about = "AngelCoin Oracle - Verify missions and mint rewards", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the oracle configuration file
    #[arg(
        short,
        long,
        env = "ORACLE_CONFIG",
        default_value = "config.toml",
        global = true
    )]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the chain node and print its chain id
    #[command(visible_alias = "c")]
    Check,

    /// Evaluate a claim (inline JSON or @file) and print the decision
    Claim {
        /// Claim JSON, or @path to a file containing it
        claim: String,
    },

    /// Print the mission id a claim would be minted under
    #[command(visible_alias = "id")]
    MissionId {
        /// Claim JSON, or @path to a file containing it
        claim: String,
    },

    /// Show the effective configuration
    Config,

    /// Run the oracle HTTP server
    #[command(visible_alias = "s")]
    Serve {
        /// Host to bind
        #[arg(long, env = "ORACLE_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "ORACLE_PORT")]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.verbose || matches!(cli.command, Commands::Serve { .. }) {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    let result = match cli.command {
        Commands::Check => commands::check::run(&cli.config).await,
        Commands::Claim { claim } => commands::claim::run(&cli.config, &claim),
        Commands::MissionId { claim } => commands::claim::run_mission_id(&claim),
        Commands::Config => commands::config::run(&cli.config),
        Commands::Serve { host, port } => {
            print_banner();
            commands::serve::run(&cli.config, host, port).await
        }
    };

    if let Err(e) = result {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

pub fn print_banner() {
    println!();
    println!("  {}", style_cyan(&style_bold("AngelCoin Oracle")));
    println!("  {}", style_dim(&format!("v{}", VERSION)));
    println!();
}
