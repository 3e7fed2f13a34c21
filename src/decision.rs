//! Validation results and the dispatcher's final decision

use serde::{Deserialize, Serialize};

use crate::error::INVALID_CLAIM_FORMAT;

pub const MINT_NOTE: &str = "Accepted claim is eligible for a mintForMission transaction.";

/// Output of a mission validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub reward_wei: u128,
}

impl ValidationResult {
    pub fn valid(reward_wei: u128) -> Self {
        Self {
            valid: true,
            reward_wei,
        }
    }

    pub fn invalid() -> Self {
        Self {
            valid: false,
            reward_wei: 0,
        }
    }

    /// Only a valid result with a positive reward is honoured.
    pub fn is_rewardable(&self) -> bool {
        self.valid && self.reward_wei > 0
    }
}

/// The answer returned to a claimant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_wei: Option<u128>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Decision {
    pub fn malformed() -> Self {
        Self {
            ok: false,
            valid: None,
            reward_wei: None,
            error: Some(INVALID_CLAIM_FORMAT.to_string()),
            note: None,
        }
    }

    pub fn rejected() -> Self {
        Self {
            ok: true,
            valid: Some(false),
            reward_wei: Some(0),
            error: None,
            note: None,
        }
    }

    pub fn accepted(reward_wei: u128) -> Self {
        Self {
            ok: true,
            valid: Some(true),
            reward_wei: Some(reward_wei),
            error: None,
            note: Some(MINT_NOTE.to_string()),
        }
    }

    /// Collapse a validator result into a decision.
    pub fn from_result(result: ValidationResult) -> Self {
        if result.is_rewardable() {
            Self::accepted(result.reward_wei)
        } else {
            Self::rejected()
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.ok && self.valid == Some(true) && self.reward_wei.unwrap_or(0) > 0
    }
}
