//! Signing credential loading
//!
//! The account key is only ever read from the environment or a key file and
//! lives inside a [`SecretString`] so it cannot end up in logs.

use anyhow::{bail, Context, Result};
use secrecy::{ExposeSecret, SecretString};
use std::path::Path;
use tracing::info;

pub const PRIVATE_KEY_ENV: &str = "ORACLE_PRIVATE_KEY";
pub const PRIVATE_KEY_FILE_ENV: &str = "ORACLE_PRIVATE_KEY_FILE";

/// A 32-byte hex signing key.
pub struct AccountCredential {
    key: SecretString,
}

impl std::fmt::Debug for AccountCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccountCredential([REDACTED])")
    }
}

impl AccountCredential {
    /// Parse and validate raw key material.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            // Never echo the input back.
            bail!("Account credential must be 32 bytes of hex");
        }

        Ok(Self {
            key: SecretString::new(hex_part.to_ascii_lowercase()),
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file {}", path.display()))?;
        Self::parse(&content)
    }

    /// Load from `ORACLE_PRIVATE_KEY` or `ORACLE_PRIVATE_KEY_FILE`.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(PRIVATE_KEY_ENV) {
            Ok(raw) if !raw.trim().is_empty() => {
                info!("Account credential loaded from {}", PRIVATE_KEY_ENV);
                return Self::parse(&raw).map(Some);
            }
            _ => {}
        }

        match std::env::var(PRIVATE_KEY_FILE_ENV) {
            Ok(path) if !path.trim().is_empty() => {
                info!("Account credential loaded from key file");
                Self::from_file(path.trim()).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Key bytes for a signer.
    pub fn to_bytes(&self) -> Result<[u8; 32]> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(self.key.expose_secret(), &mut out)
            .context("Account credential is not valid hex")?;
        Ok(out)
    }
}
