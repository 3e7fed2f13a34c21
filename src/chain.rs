//! Chain connectivity
//!
//! The oracle talks to the node through the narrow [`ChainClient`] trait so
//! the validation core can be exercised without a network. The JSON-RPC
//! implementation covers the read-only calls; signing and broadcasting are
//! left to a future client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::claim::MissionType;
use crate::config::ChainConfig;
use crate::contract::{ContractInterface, MINT_FUNCTION};
use crate::credential::AccountCredential;
use crate::error::{ChainError, OracleError};

/// Everything needed to call `mintForMission(to, amount, missionType, missionId)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintIntent {
    pub contract_address: String,
    pub to: String,
    pub amount_wei: u128,
    pub mission_type: MissionType,
    pub mission_id: String,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub tx_hash: String,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Network chain identifier.
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Pending transaction count for `address`.
    async fn transaction_count(&self, address: &str) -> Result<u64, ChainError>;

    /// Sign and broadcast a mint.
    async fn submit_mint(&self, intent: &MintIntent) -> Result<MintReceipt, ChainError>;
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Ethereum JSON-RPC 2.0 over HTTP.
pub struct JsonRpcChainClient {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
    signer: Option<AccountCredential>,
}

impl JsonRpcChainClient {
    pub fn new(url: &str, timeout: Duration) -> Self {
        // Build HTTP client with timeout, falling back to default client if builder fails
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            url: url.to_string(),
            next_id: AtomicU64::new(1),
            signer: None,
        }
    }

    /// Attach the account credential used to sign mints.
    pub fn with_signer(mut self, credential: AccountCredential) -> Self {
        self.signer = Some(credential);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("RPC {} (id {})", method, id);
        let resp = self.client.post(&self.url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ChainError::Transport(format!("HTTP {}: {}", status, text)));
        }

        let parsed: RpcResponse = resp
            .json()
            .await
            .map_err(|e| ChainError::MalformedResponse(e.to_string()))?;

        if let Some(err) = parsed.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        parsed
            .result
            .ok_or_else(|| ChainError::MalformedResponse(format!("{} returned no result", method)))
    }
}

/// Parse an Ethereum hex quantity such as `"0xaa36a7"`.
pub fn parse_quantity(value: &Value) -> Result<u64, ChainError> {
    let s = value
        .as_str()
        .ok_or_else(|| ChainError::MalformedResponse(format!("expected hex string, got {}", value)))?;
    let digits = s
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::MalformedResponse(format!("missing 0x prefix: {}", s)))?;
    if digits.is_empty() {
        return Err(ChainError::MalformedResponse("empty quantity".to_string()));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| ChainError::MalformedResponse(format!("bad quantity {}: {}", s, e)))
}

#[async_trait]
impl ChainClient for JsonRpcChainClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        let result = self.call("eth_chainId", json!([])).await?;
        parse_quantity(&result)
    }

    async fn transaction_count(&self, address: &str) -> Result<u64, ChainError> {
        let result = self
            .call("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        parse_quantity(&result)
    }

    async fn submit_mint(&self, intent: &MintIntent) -> Result<MintReceipt, ChainError> {
        if self.signer.is_none() {
            warn!(
                "Refusing to broadcast mint for mission {}: no signer available",
                intent.mission_id
            );
            return Err(ChainError::MissingSigner);
        }
        warn!(
            "Transaction signing is not available; mint for mission {} was not broadcast",
            intent.mission_id
        );
        Err(ChainError::SubmissionUnsupported)
    }
}

/// Result of a successful connectivity bootstrap.
pub struct ChainConnection {
    pub client: Box<dyn ChainClient>,
    pub chain_id: u64,
    /// Next nonce for the oracle account, when one is configured
    pub starting_nonce: u64,
    pub contract: Option<ContractInterface>,
}

impl std::fmt::Debug for ChainConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainConnection")
            .field("chain_id", &self.chain_id)
            .field("starting_nonce", &self.starting_nonce)
            .field("contract_entries", &self.contract.as_ref().map(|c| c.len()))
            .finish()
    }
}

/// Connect to the configured node and check it is alive.
///
/// The credential, when given, moves into the client that signs mints.
pub async fn bootstrap(
    config: &ChainConfig,
    credential: Option<AccountCredential>,
) -> Result<ChainConnection, OracleError> {
    let mut client =
        JsonRpcChainClient::new(&config.rpc_url, Duration::from_secs(config.timeout_secs));
    if let Some(credential) = credential {
        client = client.with_signer(credential);
    }
    bootstrap_with(Box::new(client), config).await
}

/// Bootstrap using an already constructed client.
pub async fn bootstrap_with(
    client: Box<dyn ChainClient>,
    config: &ChainConfig,
) -> Result<ChainConnection, OracleError> {
    // Live mints are ordered by the signing account's nonce on the node
    if !config.dry_run && config.oracle_address.is_none() {
        return Err(OracleError::Configuration(
            "chain.oracle_address is required when dry_run is disabled".to_string(),
        ));
    }

    let chain_id = client.chain_id().await.map_err(|e| {
        OracleError::ConnectivityFailure(format!(
            "failed to reach node at {}: {}",
            config.rpc_url, e
        ))
    })?;
    info!("Connected to network: {}", chain_id);

    let starting_nonce = match &config.oracle_address {
        Some(address) => {
            let nonce = client.transaction_count(address).await?;
            info!("Oracle account {} next nonce {}", address, nonce);
            nonce
        }
        None => 0,
    };

    let contract = match &config.contract_abi_path {
        Some(path) => {
            let abi = ContractInterface::load(path)
                .map_err(|e| OracleError::Configuration(format!("{:#}", e)))?;
            if !abi.has_function(MINT_FUNCTION) {
                warn!(
                    "Contract interface {} has no {} function",
                    path.display(),
                    MINT_FUNCTION
                );
            }
            Some(abi)
        }
        None => None,
    };

    Ok(ChainConnection {
        client,
        chain_id,
        starting_nonce,
        contract,
    })
}
