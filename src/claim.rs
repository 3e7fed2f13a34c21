//! Claim intake
//!
//! A claim arrives as loosely typed JSON:
//!
//! ```json
//! { "wallet": "0x...", "missionType": 1, "payload": { "taskId": "..." } }
//! ```
//!
//! [`Claim::from_json`] normalises it into a typed record or reports why it
//! is structurally invalid. No mission-specific checks happen here.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::OracleError;

/// Sentinel used when `missionType` is missing or cannot be parsed.
pub const INVALID_MISSION_TYPE: i64 = -1;

/// Mission-specific evidence attached to a claim.
pub type Payload = Map<String, Value>;

/// Integer tag selecting which validator applies to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionType(pub u64);

impl MissionType {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MissionType {
    fn from(v: u64) -> Self {
        MissionType(v)
    }
}

/// A structurally valid claim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub wallet: String,
    pub mission_type: MissionType,
    pub payload: Payload,
}

impl Claim {
    pub fn new(wallet: impl Into<String>, mission_type: u64, payload: Payload) -> Self {
        Self {
            wallet: wallet.into(),
            mission_type: MissionType(mission_type),
            payload,
        }
    }

    /// Normalise a raw JSON claim.
    pub fn from_json(raw: &Value) -> Result<Self, OracleError> {
        let obj = raw
            .as_object()
            .ok_or_else(|| OracleError::MalformedClaim("claim is not an object".to_string()))?;

        let wallet = match obj.get("wallet") {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(_) => {
                return Err(OracleError::MalformedClaim(
                    "wallet is not a string".to_string(),
                ))
            }
            None => String::new(),
        };
        if wallet.is_empty() {
            return Err(OracleError::MalformedClaim("missing wallet".to_string()));
        }

        let mission_type = obj
            .get("missionType")
            .map(parse_mission_type)
            .unwrap_or(INVALID_MISSION_TYPE);
        if mission_type < 0 {
            return Err(OracleError::MalformedClaim(
                "missionType must be a non-negative integer".to_string(),
            ));
        }

        let payload = match obj.get("payload") {
            None | Some(Value::Null) => Payload::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => {
                return Err(OracleError::MalformedClaim(
                    "payload is not an object".to_string(),
                ))
            }
        };

        Ok(Self {
            wallet,
            mission_type: MissionType(mission_type as u64),
            payload,
        })
    }
}

/// Parse a `missionType` value, returning the sentinel on failure.
pub fn parse_mission_type(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .unwrap_or(INVALID_MISSION_TYPE),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(INVALID_MISSION_TYPE),
        _ => INVALID_MISSION_TYPE,
    }
}
