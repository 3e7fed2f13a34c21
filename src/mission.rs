//! Mission validators and the registry that routes claims to them

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::claim::{MissionType, Payload};
use crate::decision::ValidationResult;
use crate::error::OracleError;

/// Evaluates the evidence for one mission type.
pub trait MissionValidator: Send + Sync {
    /// Human readable validator name.
    fn name(&self) -> &str;

    /// Check a claim's payload for `wallet`.
    ///
    /// Returning `Ok` with `valid: false` is an ordinary rejection. `Err`
    /// means the validator could not reach a verdict.
    fn evaluate(
        &self,
        mission_type: MissionType,
        wallet: &str,
        payload: &Payload,
    ) -> Result<ValidationResult, OracleError>;
}

/// Mission families known to the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissionKind {
    /// Completion of a data-labelling task
    DataTask,
    /// Verified charitable donation or other uplift action
    Uplift,
    /// Impact-investor commitment
    ImpactInvestor,
}

impl MissionKind {
    pub const ALL: [MissionKind; 3] = [
        MissionKind::DataTask,
        MissionKind::Uplift,
        MissionKind::ImpactInvestor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionKind::DataTask => "data-task",
            MissionKind::Uplift => "uplift",
            MissionKind::ImpactInvestor => "impact-investor",
        }
    }

    /// Conventional mission type number for this family.
    pub fn default_mission_type(&self) -> MissionType {
        match self {
            MissionKind::DataTask => MissionType(1),
            MissionKind::Uplift => MissionType(2),
            MissionKind::ImpactInvestor => MissionType(3),
        }
    }

    pub fn validator(&self) -> Box<dyn MissionValidator> {
        Box::new(UnimplementedValidator::new(self.as_str()))
    }
}

impl fmt::Display for MissionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder for a mission family whose verification rules do not exist yet.
#[derive(Debug, Clone)]
pub struct UnimplementedValidator {
    name: String,
}

impl UnimplementedValidator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl MissionValidator for UnimplementedValidator {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(
        &self,
        mission_type: MissionType,
        _wallet: &str,
        _payload: &Payload,
    ) -> Result<ValidationResult, OracleError> {
        Err(OracleError::UnimplementedValidator {
            mission_type: mission_type.value(),
            name: self.name.clone(),
        })
    }
}

/// Registered validator summary
#[derive(Debug, Clone, Serialize)]
pub struct RegisteredMission {
    pub mission_type: MissionType,
    pub validator: String,
}

/// Mapping from mission type to validator.
#[derive(Default)]
pub struct MissionRegistry {
    validators: BTreeMap<MissionType, Box<dyn MissionValidator>>,
}

impl MissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every known family under its conventional mission type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in MissionKind::ALL {
            registry
                .validators
                .insert(kind.default_mission_type(), kind.validator());
        }
        registry
    }

    pub fn register(
        &mut self,
        mission_type: MissionType,
        validator: Box<dyn MissionValidator>,
    ) -> Result<(), OracleError> {
        if self.validators.contains_key(&mission_type) {
            return Err(OracleError::DuplicateRegistration(mission_type.value()));
        }
        self.validators.insert(mission_type, validator);
        Ok(())
    }

    pub fn get(&self, mission_type: MissionType) -> Option<&dyn MissionValidator> {
        self.validators.get(&mission_type).map(|v| v.as_ref())
    }

    pub fn contains(&self, mission_type: MissionType) -> bool {
        self.validators.contains_key(&mission_type)
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    pub fn missions(&self) -> Vec<RegisteredMission> {
        self.validators
            .iter()
            .map(|(mission_type, v)| RegisteredMission {
                mission_type: *mission_type,
                validator: v.name().to_string(),
            })
            .collect()
    }
}

impl fmt::Debug for MissionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.validators.iter().map(|(k, v)| (k.value(), v.name())))
            .finish()
    }
}
