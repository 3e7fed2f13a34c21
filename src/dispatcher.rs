//! Claim dispatcher
//!
//! Validates claim structure, routes to the registered mission validator and
//! assembles the final [`Decision`]. Holds no mutable state, so the same claim
//! always yields the same decision.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::claim::{Claim, MissionType, Payload};
use crate::decision::{Decision, ValidationResult};
use crate::error::OracleError;
use crate::mission::MissionRegistry;

pub struct ClaimDispatcher {
    registry: MissionRegistry,
}

impl ClaimDispatcher {
    pub fn new(registry: MissionRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MissionRegistry {
        &self.registry
    }

    /// Entry point for a raw JSON claim.
    pub fn handle_claim(&self, raw: &Value) -> Decision {
        self.evaluate(raw).1
    }

    /// Like [`handle_claim`](Self::handle_claim) but also returns the
    /// normalised claim when it was well formed.
    pub fn evaluate(&self, raw: &Value) -> (Option<Claim>, Decision) {
        let claim = match Claim::from_json(raw) {
            Ok(claim) => claim,
            Err(e) => {
                debug!("Rejecting claim: {}", e);
                return (None, Decision::malformed());
            }
        };

        let decision = self.decide(&claim);
        (Some(claim), decision)
    }

    /// Decide an already normalised claim.
    pub fn decide(&self, claim: &Claim) -> Decision {
        let result = self.validate_mission(&claim.wallet, claim.mission_type, &claim.payload);
        let decision = Decision::from_result(result);

        if decision.is_accepted() {
            info!(
                "Accepted mission type {} claim for {} ({} wei)",
                claim.mission_type,
                claim.wallet,
                result.reward_wei
            );
        } else if result.valid {
            warn!(
                "Validator for mission type {} approved {} with zero reward, rejecting",
                claim.mission_type, claim.wallet
            );
        }

        decision
    }

    /// Route to the validator registered for `mission_type`.
    ///
    /// Unknown mission types and validators that cannot reach a verdict both
    /// produce a plain invalid result.
    pub fn validate_mission(
        &self,
        wallet: &str,
        mission_type: MissionType,
        payload: &Payload,
    ) -> ValidationResult {
        let Some(validator) = self.registry.get(mission_type) else {
            debug!("{}", OracleError::UnrecognizedMissionType(mission_type.value()));
            return ValidationResult::invalid();
        };

        match validator.evaluate(mission_type, wallet, payload) {
            Ok(result) => result,
            Err(e @ OracleError::UnimplementedValidator { .. }) => {
                warn!("{}; claim from {} is unverifiable", e, wallet);
                ValidationResult::invalid()
            }
            Err(e) => {
                warn!(
                    "Validator '{}' failed for mission type {}: {}",
                    validator.name(),
                    mission_type,
                    e
                );
                ValidationResult::invalid()
            }
        }
    }
}
