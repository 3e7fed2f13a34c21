//! Deterministic mission identifiers
//!
//! `keccak256(wallet ‖ uint256(missionType) ‖ keccak256(canonical payload))`
//!
//! serde_json keeps object keys sorted, so serialising the payload gives a
//! canonical byte string regardless of the order the client sent.

use sha3::{Digest, Keccak256};

use crate::claim::{Claim, MissionType, Payload};

/// Lowercase `0x` hex addresses; leave other wallet formats untouched.
pub fn normalize_wallet(wallet: &str) -> String {
    let wallet = wallet.trim();
    let is_hex = wallet
        .strip_prefix("0x")
        .or_else(|| wallet.strip_prefix("0X"))
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_hexdigit()))
        .unwrap_or(false);

    if is_hex {
        wallet.to_ascii_lowercase()
    } else {
        wallet.to_string()
    }
}

pub fn payload_hash(payload: &Payload) -> [u8; 32] {
    // Serialising a Map of Values cannot fail.
    let canonical = serde_json::to_vec(payload).unwrap_or_default();
    Keccak256::digest(&canonical).into()
}

pub fn derive_mission_id(wallet: &str, mission_type: MissionType, payload: &Payload) -> String {
    let mut mission_word = [0u8; 32];
    mission_word[24..].copy_from_slice(&mission_type.value().to_be_bytes());

    let mut hasher = Keccak256::new();
    hasher.update(normalize_wallet(wallet).as_bytes());
    hasher.update(mission_word);
    hasher.update(payload_hash(payload));

    format!("0x{}", hex::encode(hasher.finalize()))
}

pub fn mission_id_for(claim: &Claim) -> String {
    derive_mission_id(&claim.wallet, claim.mission_type, &claim.payload)
}
