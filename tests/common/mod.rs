//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use angel_oracle::{
    ChainClient, ChainError, ClaimDispatcher, ClaimPipeline, MintIntent, MintReceipt,
    MissionLedger, MissionRegistry, MissionType, MissionValidator, OracleError, Payload,
    PipelineSettings, ValidationResult,
};
use async_trait::async_trait;
use parking_lot::Mutex;

/// Accepts any claim carrying `"approved": true` for a fixed reward.
pub struct ApprovalValidator {
    pub reward_wei: u128,
}

impl MissionValidator for ApprovalValidator {
    fn name(&self) -> &str {
        "approval"
    }

    fn evaluate(
        &self,
        _mission_type: MissionType,
        _wallet: &str,
        payload: &Payload,
    ) -> Result<ValidationResult, OracleError> {
        let approved = payload
            .get("approved")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        Ok(if approved {
            ValidationResult::valid(self.reward_wei)
        } else {
            ValidationResult::invalid()
        })
    }
}

/// In-process chain double that records submitted intents.
#[derive(Default)]
pub struct MockChain {
    pub submitted: Arc<Mutex<Vec<MintIntent>>>,
    pub fail_submissions: bool,
}

#[async_trait]
impl ChainClient for MockChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(31337)
    }

    async fn transaction_count(&self, _address: &str) -> Result<u64, ChainError> {
        Ok(7)
    }

    async fn submit_mint(&self, intent: &MintIntent) -> Result<MintReceipt, ChainError> {
        if self.fail_submissions {
            return Err(ChainError::Rpc {
                code: -32000,
                message: "nonce too low".to_string(),
            });
        }
        self.submitted.lock().push(intent.clone());
        Ok(MintReceipt {
            tx_hash: format!("0x{:064x}", intent.nonce),
        })
    }
}

pub const APPROVAL_MISSION: u64 = 9;
pub const REWARD_WEI: u128 = 5_000_000_000_000_000_000;

pub fn registry() -> MissionRegistry {
    let mut registry = MissionRegistry::with_defaults();
    registry
        .register(
            MissionType(APPROVAL_MISSION),
            Box::new(ApprovalValidator {
                reward_wei: REWARD_WEI,
            }),
        )
        .unwrap();
    registry
}

pub fn pipeline(chain: MockChain, dry_run: bool) -> (ClaimPipeline, Arc<MissionLedger>) {
    let ledger = Arc::new(MissionLedger::in_memory().unwrap());
    let pipeline = pipeline_on(Box::new(chain), ledger.clone(), dry_run);
    (pipeline, ledger)
}

/// Pipeline over an existing ledger, e.g. a file shared between runs.
pub fn pipeline_on(
    chain: Box<dyn ChainClient>,
    ledger: Arc<MissionLedger>,
    dry_run: bool,
) -> ClaimPipeline {
    ClaimPipeline::new(
        ClaimDispatcher::new(registry()),
        ledger,
        chain,
        PipelineSettings {
            contract_address: "0x00000000000000000000000000000000000000aa".to_string(),
            dry_run,
            starting_nonce: 7,
        },
    )
}
