//! Configuration management
//!
//! Loads configuration from config.toml with support for:
//! - Server binding settings
//! - Chain endpoint and contract location
//! - Mission ledger location
//! - Mission type registrations
//!
//! The signing credential is deliberately absent; see [`crate::credential`].

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::claim::MissionType;
use crate::error::OracleError;
use crate::mission::{MissionKind, MissionRegistry};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub chain: ChainConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub missions: Vec<MissionConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Chain endpoint and contract configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// Compiled ABI or build artifact for the reward contract
    #[serde(default)]
    pub contract_abi_path: Option<PathBuf>,
    /// Account whose nonce orders mint transactions
    #[serde(default)]
    pub oracle_address: Option<String>,
    /// Prepare and record mints without sending them
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Only present to reject configs that try to carry a key
    #[serde(default, skip_serializing)]
    private_key: Option<toml::Value>,
}

fn default_dry_run() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    10
}

/// Mission ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("oracle.db"),
        }
    }
}

/// One mission type registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionConfig {
    pub mission_type: u64,
    pub kind: MissionKind,
}

impl Config {
    /// Load from config.toml or use defaults
    pub fn load() -> Result<Self> {
        Self::load_from("config.toml")
    }

    /// Load from specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            Self::parse(&content).context("Failed to parse config file")?
        } else {
            // Use embedded default config
            Self::parse(DEFAULT_CONFIG).context("Failed to parse default config")?
        };

        Ok(config.with_env_overrides())
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.chain.private_key.is_some() {
            bail!(
                "chain.private_key must not be stored in configuration; use {} or {}",
                crate::credential::PRIVATE_KEY_ENV,
                crate::credential::PRIVATE_KEY_FILE_ENV
            );
        }
        Ok(config)
    }

    /// Environment variables take precedence over file values
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env("ORACLE_RPC_URL") {
            self.chain.rpc_url = url;
        }
        if let Some(addr) = non_empty_env("ORACLE_CONTRACT_ADDRESS") {
            self.chain.contract_address = addr;
        }
        if let Some(host) = non_empty_env("ORACLE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = non_empty_env("ORACLE_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(path) = non_empty_env("ORACLE_DB_PATH") {
            self.storage.path = PathBuf::from(path);
        }
        self
    }

    /// Build the validator registry described by `[[missions]]`
    pub fn mission_registry(&self) -> Result<MissionRegistry, OracleError> {
        let mut registry = MissionRegistry::new();
        for mission in &self.missions {
            registry.register(MissionType(mission.mission_type), mission.kind.validator())?;
        }
        Ok(registry)
    }

    /// Configuration safe to show to clients
    pub fn public_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "server": self.server,
            "chain": {
                "rpc_url": self.chain.rpc_url,
                "contract_address": self.chain.contract_address,
                "contract_abi_path": self.chain.contract_abi_path,
                "oracle_address": self.chain.oracle_address,
                "dry_run": self.chain.dry_run,
                "timeout_secs": self.chain.timeout_secs,
            },
            "storage": self.storage,
            "missions": self.missions,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for Config {
    fn default() -> Self {
        // The embedded default config is part of the crate; fall back to an
        // equivalent literal if it were ever broken.
        Self::parse(DEFAULT_CONFIG).unwrap_or_else(|_| Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            chain: ChainConfig {
                rpc_url: "http://127.0.0.1:8545".to_string(),
                contract_address: "0x0000000000000000000000000000000000000000".to_string(),
                contract_abi_path: None,
                oracle_address: None,
                dry_run: true,
                timeout_secs: 10,
                private_key: None,
            },
            storage: StorageConfig::default(),
            missions: MissionKind::ALL
                .iter()
                .map(|kind| MissionConfig {
                    mission_type: kind.default_mission_type().value(),
                    kind: *kind,
                })
                .collect(),
        })
    }
}
