//! End-to-end claim handling scenarios

mod common;

use std::sync::Arc;

use angel_oracle::storage::{STATUS_DRY_RUN, STATUS_PENDING, STATUS_SUBMITTED};
use angel_oracle::{
    ChainClient, ChainError, ClaimDispatcher, Decision, MintIntent, MintReceipt, MintStatus,
    MissionLedger, MissionRegistry, OracleError,
};
use async_trait::async_trait;
use common::{MockChain, APPROVAL_MISSION, REWARD_WEI};
use parking_lot::Mutex;
use serde_json::{json, Value};

fn empty_dispatcher() -> ClaimDispatcher {
    ClaimDispatcher::new(MissionRegistry::new())
}

// ============================================================================
// DISPATCHER
// ============================================================================

#[test]
fn unregistered_mission_type_is_not_valid() {
    let decision = empty_dispatcher().handle_claim(&json!({
        "wallet": "0xABC",
        "missionType": 1,
        "payload": {}
    }));
    assert_eq!(
        serde_json::to_value(&decision).unwrap(),
        json!({"ok": true, "valid": false, "rewardWei": 0})
    );
}

#[test]
fn empty_wallet_is_malformed() {
    let decision = empty_dispatcher().handle_claim(&json!({
        "wallet": "",
        "missionType": 1,
        "payload": {}
    }));
    assert_eq!(
        serde_json::to_value(&decision).unwrap(),
        json!({"ok": false, "error": "Invalid claim format"})
    );
}

#[test]
fn missing_wallet_and_negative_type_is_malformed() {
    let decision = empty_dispatcher().handle_claim(&json!({"missionType": -1}));
    assert_eq!(
        serde_json::to_value(&decision).unwrap(),
        json!({"ok": false, "error": "Invalid claim format"})
    );
}

#[test]
fn structural_failures_never_reach_validators() {
    let dispatcher = ClaimDispatcher::new(common::registry());
    let claims = [
        json!({"missionType": APPROVAL_MISSION, "payload": {"approved": true}}),
        json!({"wallet": "  ", "missionType": APPROVAL_MISSION, "payload": {"approved": true}}),
        json!({"wallet": "0xABC", "missionType": -3, "payload": {"approved": true}}),
        json!({"wallet": "0xABC", "missionType": "nine", "payload": {"approved": true}}),
        json!({"wallet": "0xABC", "payload": {"approved": true}}),
        json!([1, 2, 3]),
    ];
    for claim in claims {
        assert_eq!(dispatcher.handle_claim(&claim), Decision::malformed(), "{}", claim);
    }
}

#[test]
fn validation_is_idempotent() {
    let dispatcher = ClaimDispatcher::new(common::registry());
    let claim = json!({
        "wallet": "0xABC",
        "missionType": APPROVAL_MISSION,
        "payload": {"approved": true}
    });

    let first = dispatcher.handle_claim(&claim);
    let second = dispatcher.handle_claim(&claim);
    assert_eq!(first, second);
    assert_eq!(first, Decision::accepted(REWARD_WEI));
}

#[test]
fn builtin_mission_types_are_unverifiable() {
    let dispatcher = ClaimDispatcher::new(MissionRegistry::with_defaults());
    for mission_type in 1..=3 {
        let decision = dispatcher.handle_claim(&json!({
            "wallet": " 0x2177b5c7712d3ec53a2f2d47107e2611169c1a45",
            "missionType": mission_type,
            "payload": {"taskId": "example_task", "answer": "a"}
        }));
        assert_eq!(decision, Decision::rejected());
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

fn approved_claim() -> Value {
    json!({
        "wallet": "0xABCDEF0000000000000000000000000000000001",
        "missionType": APPROVAL_MISSION,
        "payload": {"approved": true, "taskId": "t-1"}
    })
}

#[tokio::test]
async fn dry_run_records_mission_once() {
    let (mut pipeline, ledger) = common::pipeline(MockChain::default(), true);

    let first = pipeline.process(&approved_claim()).await.unwrap();
    assert_eq!(first.status, MintStatus::DryRun);
    assert_eq!(first.nonce, Some(7));
    assert!(first.decision.is_accepted());
    let mission_id = first.mission_id.clone().unwrap();
    assert!(ledger.contains(&mission_id).unwrap());

    // Replay of the same claim, with keys in a different order
    let replay = json!({
        "payload": {"taskId": "t-1", "approved": true},
        "missionType": APPROVAL_MISSION,
        "wallet": "0xabcdef0000000000000000000000000000000001"
    });
    let second = pipeline.process(&replay).await.unwrap();
    assert_eq!(second.status, MintStatus::Duplicate);
    assert_eq!(second.mission_id.as_deref(), Some(mission_id.as_str()));
    assert_eq!(second.decision, Decision::rejected());
    assert_eq!(ledger.count().unwrap(), 1);
    assert_eq!(pipeline.next_nonce(), 8);
}

#[tokio::test]
async fn rejected_and_malformed_claims_are_not_recorded() {
    let (mut pipeline, ledger) = common::pipeline(MockChain::default(), true);

    let rejected = pipeline
        .process(&json!({"wallet": "0xABC", "missionType": APPROVAL_MISSION, "payload": {}}))
        .await
        .unwrap();
    assert_eq!(rejected.status, MintStatus::Rejected);
    assert!(rejected.mission_id.is_none());

    let malformed = pipeline.process(&json!({"missionType": -1})).await.unwrap();
    assert_eq!(malformed.status, MintStatus::Malformed);
    assert_eq!(malformed.decision, Decision::malformed());

    assert_eq!(ledger.count().unwrap(), 0);
    assert_eq!(pipeline.next_nonce(), 7);
}

#[tokio::test]
async fn submissions_are_strictly_ordered() {
    let submitted = Arc::new(Mutex::new(Vec::new()));
    let chain = MockChain {
        submitted: submitted.clone(),
        fail_submissions: false,
    };
    let (mut pipeline, ledger) = common::pipeline(chain, false);

    for task in ["a", "b", "c"] {
        let outcome = pipeline
            .process(&json!({
                "wallet": "0xABC",
                "missionType": APPROVAL_MISSION,
                "payload": {"approved": true, "taskId": task}
            }))
            .await
            .unwrap();
        assert_eq!(outcome.status, MintStatus::Submitted);
        assert!(outcome.tx_hash.is_some());
    }

    let nonces: Vec<u64> = submitted.lock().iter().map(|i| i.nonce).collect();
    assert_eq!(nonces, vec![7, 8, 9]);
    assert!(submitted.lock().iter().all(|i| i.amount_wei == REWARD_WEI));
    assert!(submitted.lock().iter().all(|i| i.to == "0xabc"));
    assert_eq!(ledger.count().unwrap(), 3);
}

#[tokio::test]
async fn failed_submission_releases_nonce() {
    let chain = MockChain {
        fail_submissions: true,
        ..Default::default()
    };
    let (mut pipeline, ledger) = common::pipeline(chain, false);

    let err = pipeline.process(&approved_claim()).await.unwrap_err();
    assert!(matches!(err, OracleError::Chain(_)));
    assert_eq!(pipeline.next_nonce(), 7);
    assert_eq!(ledger.count().unwrap(), 0);
}

#[tokio::test]
async fn outcome_serializes_with_decision_fields() {
    let (mut pipeline, _ledger) = common::pipeline(MockChain::default(), true);
    let outcome = pipeline.process(&approved_claim()).await.unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["ok"], json!(true));
    assert_eq!(value["valid"], json!(true));
    assert_eq!(value["rewardWei"], json!(5_000_000_000_000_000_000u64));
    assert_eq!(value["status"], json!("dry-run"));
    assert!(value["missionId"].as_str().unwrap().starts_with("0x"));
    assert!(value.get("txHash").is_none());
}

#[tokio::test]
async fn dry_run_history_does_not_block_live_mint() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("oracle.db");

    let mission_id = {
        let ledger = Arc::new(MissionLedger::new(&path).unwrap());
        let mut dry = common::pipeline_on(Box::new(MockChain::default()), ledger, true);
        let outcome = dry.process(&approved_claim()).await.unwrap();
        assert_eq!(outcome.status, MintStatus::DryRun);
        outcome.mission_id.unwrap()
    };

    let submitted = Arc::new(Mutex::new(Vec::new()));
    let chain = MockChain {
        submitted: submitted.clone(),
        fail_submissions: false,
    };
    let ledger = Arc::new(MissionLedger::new(&path).unwrap());
    assert_eq!(ledger.get(&mission_id).unwrap().unwrap().status, STATUS_DRY_RUN);
    let mut live = common::pipeline_on(Box::new(chain), ledger.clone(), false);

    let outcome = live.process(&approved_claim()).await.unwrap();
    assert_eq!(outcome.status, MintStatus::Submitted);
    assert!(outcome.decision.is_accepted());
    assert_eq!(submitted.lock().len(), 1);

    let stored = ledger.get(&mission_id).unwrap().unwrap();
    assert_eq!(stored.status, STATUS_SUBMITTED);
    assert_eq!(stored.tx_hash, outcome.tx_hash);

    // Once minted for real, the mission is a replay
    let replay = live.process(&approved_claim()).await.unwrap();
    assert_eq!(replay.status, MintStatus::Duplicate);
    assert_eq!(submitted.lock().len(), 1);
    assert_eq!(ledger.count().unwrap(), 1);
}

/// Records the ledger status of each mission at the moment it is broadcast.
struct LedgerWatchingChain {
    ledger: Arc<MissionLedger>,
    seen: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ChainClient for LedgerWatchingChain {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(31337)
    }

    async fn transaction_count(&self, _address: &str) -> Result<u64, ChainError> {
        Ok(7)
    }

    async fn submit_mint(&self, intent: &MintIntent) -> Result<MintReceipt, ChainError> {
        let status = self
            .ledger
            .get(&intent.mission_id)
            .unwrap()
            .map(|m| m.status)
            .unwrap_or_default();
        self.seen.lock().push(status);
        Ok(MintReceipt {
            tx_hash: "0xfeed".to_string(),
        })
    }
}

#[tokio::test]
async fn mission_is_pending_before_broadcast() {
    let ledger = Arc::new(MissionLedger::in_memory().unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let chain = LedgerWatchingChain {
        ledger: ledger.clone(),
        seen: seen.clone(),
    };
    let mut pipeline = common::pipeline_on(Box::new(chain), ledger.clone(), false);

    let outcome = pipeline.process(&approved_claim()).await.unwrap();
    assert_eq!(outcome.status, MintStatus::Submitted);
    assert_eq!(*seen.lock(), vec![STATUS_PENDING.to_string()]);

    let stored = ledger.get(&outcome.mission_id.unwrap()).unwrap().unwrap();
    assert_eq!(stored.status, STATUS_SUBMITTED);
    assert_eq!(stored.tx_hash.as_deref(), Some("0xfeed"));
}
