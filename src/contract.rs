//! Contract interface (ABI) loading
//!
//! Accepts either a bare ABI array or a compiled build artifact that carries
//! the ABI under an `abi` key.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

pub const MINT_FUNCTION: &str = "mintForMission";

#[derive(Debug, Clone)]
pub struct ContractInterface {
    entries: Vec<Value>,
}

impl ContractInterface {
    pub fn from_value(value: Value) -> Result<Self> {
        let entries = match value {
            Value::Array(entries) => entries,
            Value::Object(mut obj) => match obj.remove("abi") {
                Some(Value::Array(entries)) => entries,
                _ => bail!("Build artifact has no 'abi' array"),
            },
            _ => bail!("Contract interface must be an array or an artifact object"),
        };
        Ok(Self { entries })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract ABI {}", path.display()))?;
        let value: Value =
            serde_json::from_str(&content).context("Failed to parse contract ABI")?;
        Self::from_value(value)
    }

    pub fn functions(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.get("type").and_then(|t| t.as_str()) == Some("function"))
            .filter_map(|e| e.get("name").and_then(|n| n.as_str()))
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions().any(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
