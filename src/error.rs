//! Oracle error taxonomy

use thiserror::Error;

/// Message returned to callers for any structurally invalid claim.
pub const INVALID_CLAIM_FORMAT: &str = "Invalid claim format";

/// Errors raised while turning a claim into a mint.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Invalid claim format: {0}")]
    MalformedClaim(String),
    #[error("No validator registered for mission type {0}")]
    UnrecognizedMissionType(u64),
    #[error("Validator '{name}' for mission type {mission_type} is not implemented")]
    UnimplementedValidator { mission_type: u64, name: String },
    #[error("Connectivity failure: {0}")]
    ConnectivityFailure(String),
    #[error("Mission {0} was already processed")]
    DuplicateMission(String),
    #[error("Mission type {0} is registered twice")]
    DuplicateRegistration(u64),
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors from the chain JSON-RPC client.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Malformed RPC response: {0}")]
    MalformedResponse(String),
    #[error("No account credential is available to sign transactions")]
    MissingSigner,
    #[error("Transaction submission is not supported by this client")]
    SubmissionUnsupported,
}

impl From<reqwest::Error> for ChainError {
    fn from(e: reqwest::Error) -> Self {
        ChainError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OracleError>;
