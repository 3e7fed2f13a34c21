//! Mint pipeline
//!
//! Takes an accepted decision through replay protection and nonce assignment
//! to a mint submission. One claim is processed at a time; callers share the
//! pipeline behind a mutex, which makes it the single point of nonce control
//! for the oracle account.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::chain::{ChainClient, MintIntent};
use crate::claim::Claim;
use crate::decision::Decision;
use crate::dispatcher::ClaimDispatcher;
use crate::error::OracleError;
use crate::mission_id::{mission_id_for, normalize_wallet};
use crate::storage::{MissionLedger, ProcessedMission, STATUS_DRY_RUN, STATUS_PENDING};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MintStatus {
    Malformed,
    Rejected,
    Duplicate,
    DryRun,
    Submitted,
}

impl MintStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MintStatus::Malformed => "malformed",
            MintStatus::Rejected => "rejected",
            MintStatus::Duplicate => "duplicate",
            MintStatus::DryRun => "dry-run",
            MintStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for MintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to a claim end to end.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    #[serde(flatten)]
    pub decision: Decision,
    pub status: MintStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl ClaimOutcome {
    fn without_mint(decision: Decision, status: MintStatus) -> Self {
        Self {
            decision,
            status,
            mission_id: None,
            nonce: None,
            tx_hash: None,
        }
    }
}

/// Sequential nonce allocation for one signing account.
#[derive(Debug, Clone)]
pub struct NonceManager {
    next: u64,
}

impl NonceManager {
    pub fn new(starting_nonce: u64) -> Self {
        Self {
            next: starting_nonce,
        }
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn reserve(&mut self) -> u64 {
        let nonce = self.next;
        self.next += 1;
        nonce
    }

    /// Give back the most recently reserved nonce after a failed submission.
    pub fn release(&mut self, nonce: u64) {
        if nonce + 1 == self.next {
            self.next = nonce;
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub contract_address: String,
    pub dry_run: bool,
    pub starting_nonce: u64,
}

pub struct ClaimPipeline {
    dispatcher: Arc<ClaimDispatcher>,
    ledger: Arc<MissionLedger>,
    chain: Box<dyn ChainClient>,
    contract_address: String,
    dry_run: bool,
    nonces: NonceManager,
}

impl ClaimPipeline {
    pub fn new(
        dispatcher: impl Into<Arc<ClaimDispatcher>>,
        ledger: Arc<MissionLedger>,
        chain: Box<dyn ChainClient>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            dispatcher: dispatcher.into(),
            ledger,
            chain,
            contract_address: settings.contract_address,
            dry_run: settings.dry_run,
            nonces: NonceManager::new(settings.starting_nonce),
        }
    }

    pub fn dispatcher(&self) -> &ClaimDispatcher {
        &self.dispatcher
    }

    /// Handle for validation that must not wait on the mint lock.
    pub fn shared_dispatcher(&self) -> Arc<ClaimDispatcher> {
        self.dispatcher.clone()
    }

    pub fn ledger(&self) -> &MissionLedger {
        &self.ledger
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn next_nonce(&self) -> u64 {
        self.nonces.peek()
    }

    /// Validate a raw claim and, when accepted, mint for it.
    pub async fn process(&mut self, raw: &Value) -> Result<ClaimOutcome, OracleError> {
        let (claim, decision) = self.dispatcher.evaluate(raw);

        let Some(claim) = claim else {
            return Ok(ClaimOutcome::without_mint(decision, MintStatus::Malformed));
        };
        if !decision.is_accepted() {
            return Ok(ClaimOutcome::without_mint(decision, MintStatus::Rejected));
        }

        self.mint(&claim, decision).await
    }

    async fn mint(&mut self, claim: &Claim, decision: Decision) -> Result<ClaimOutcome, OracleError> {
        let mission_id = mission_id_for(claim);
        let reward_wei = decision.reward_wei.unwrap_or(0);

        // A dry run never minted anything, so only live rows block a live mint
        let seen = if self.dry_run {
            self.ledger.contains(&mission_id)
        } else {
            self.ledger.is_minted(&mission_id)
        }
        .map_err(storage_error)?;
        if seen {
            return Ok(duplicate(mission_id));
        }

        let nonce = self.nonces.reserve();
        let intent = MintIntent {
            contract_address: self.contract_address.clone(),
            to: normalize_wallet(&claim.wallet),
            amount_wei: reward_wei,
            mission_type: claim.mission_type,
            mission_id: mission_id.clone(),
            nonce,
        };
        let mut record = ProcessedMission {
            mission_id: mission_id.clone(),
            wallet: intent.to.clone(),
            mission_type: claim.mission_type.value(),
            reward_wei,
            nonce,
            status: STATUS_DRY_RUN.to_string(),
            tx_hash: None,
            recorded_at: Utc::now(),
        };

        if self.dry_run {
            info!(
                "Dry run: would mint {} wei to {} for mission {} (nonce {})",
                intent.amount_wei, intent.to, intent.mission_id, intent.nonce
            );
            if let Err(e) = self.ledger.record(&record) {
                self.nonces.release(nonce);
                return Err(storage_error(e));
            }
            return Ok(ClaimOutcome {
                decision,
                status: MintStatus::DryRun,
                mission_id: Some(mission_id),
                nonce: Some(nonce),
                tx_hash: None,
            });
        }

        // The pending row goes in before broadcast so a replay cannot mint
        // again even if the ledger fails afterwards.
        record.status = STATUS_PENDING.to_string();
        match self.ledger.begin_mint(&record) {
            Ok(true) => {}
            Ok(false) => {
                self.nonces.release(nonce);
                return Ok(duplicate(mission_id));
            }
            Err(e) => {
                self.nonces.release(nonce);
                return Err(storage_error(e));
            }
        }

        let receipt = match self.chain.submit_mint(&intent).await {
            Ok(receipt) => receipt,
            Err(e) => {
                self.nonces.release(nonce);
                error!("Mint submission for mission {} failed: {}", mission_id, e);
                if let Err(err) = self.ledger.abort_mint(&mission_id) {
                    error!("Failed to clear pending mission {}: {:#}", mission_id, err);
                }
                return Err(e.into());
            }
        };

        info!(
            "Submitted mint for mission {} in tx {}",
            mission_id, receipt.tx_hash
        );
        match self.ledger.complete_mint(&mission_id, &receipt.tx_hash) {
            Ok(true) => {}
            Ok(false) => warn!("Mission {} was not pending when its mint completed", mission_id),
            // The mint is on its way; the pending row still blocks replays
            Err(e) => error!(
                "Failed to record tx {} for mission {}: {:#}",
                receipt.tx_hash, mission_id, e
            ),
        }

        Ok(ClaimOutcome {
            decision,
            status: MintStatus::Submitted,
            mission_id: Some(mission_id),
            nonce: Some(nonce),
            tx_hash: Some(receipt.tx_hash),
        })
    }
}

fn duplicate(mission_id: String) -> ClaimOutcome {
    warn!("{}, ignoring replay", OracleError::DuplicateMission(mission_id.clone()));
    ClaimOutcome {
        mission_id: Some(mission_id),
        ..ClaimOutcome::without_mint(Decision::rejected(), MintStatus::Duplicate)
    }
}

fn storage_error(e: anyhow::Error) -> OracleError {
    OracleError::Storage(format!("{:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nonce_reserve_and_release() {
        let mut nonces = NonceManager::new(5);
        assert_eq!(nonces.reserve(), 5);
        assert_eq!(nonces.reserve(), 6);

        nonces.release(6);
        assert_eq!(nonces.peek(), 6);

        // Only the latest reservation can be returned
        nonces.release(4);
        assert_eq!(nonces.peek(), 6);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(MintStatus::DryRun.to_string(), "dry-run");
        assert_eq!(
            serde_json::to_value(MintStatus::Duplicate).unwrap(),
            serde_json::json!("duplicate")
        );
    }
}
