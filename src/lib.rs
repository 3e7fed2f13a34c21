//! AngelCoin Oracle - Verify mission claims and prepare reward mints
//!
//! An off-chain oracle that checks whether a real-world mission (a donation,
//! a data-labelling task, ...) was completed and decides how much AngelCoin to
//! mint for it.
//!
//! # How it works
//!
//! 1. A client submits a claim `{ wallet, missionType, payload }`
//! 2. The dispatcher rejects structurally invalid claims outright
//! 3. The claim is routed to the validator registered for its mission type
//! 4. Valid claims with a positive reward are accepted
//! 5. Accepted claims get a deterministic mission id, are checked against the
//!    ledger for replays, receive the next nonce and become a mint intent
//!
//! # Safety measures
//!
//! - Unknown mission types are rejected, never guessed
//! - Non-positive rewards are never honoured
//! - Each mission id is minted at most once
//! - The signing credential never appears in config files or logs

pub mod chain;
pub mod claim;
pub mod config;
pub mod contract;
pub mod credential;
pub mod decision;
pub mod dispatcher;
pub mod error;
pub mod mission;
pub mod mission_id;
pub mod pipeline;
pub mod server;
pub mod storage;

pub use chain::{ChainClient, JsonRpcChainClient, MintIntent, MintReceipt};
pub use claim::{Claim, MissionType, Payload};
pub use config::Config;
pub use decision::{Decision, ValidationResult};
pub use dispatcher::ClaimDispatcher;
pub use error::{ChainError, OracleError};
pub use mission::{MissionKind, MissionRegistry, MissionValidator};
pub use mission_id::derive_mission_id;
pub use pipeline::{ClaimOutcome, ClaimPipeline, MintStatus, PipelineSettings};
pub use storage::MissionLedger;
