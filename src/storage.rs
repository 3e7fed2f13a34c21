//! Local ledger of processed missions
//!
//! Every mission id that made it through the mint pipeline is recorded here
//! so a replayed claim cannot be approved twice. Dry-run rows never block a
//! live mint; only `pending` and `submitted` rows do.

use anyhow::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const STATUS_DRY_RUN: &str = "dry-run";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_SUBMITTED: &str = "submitted";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS processed_missions (
    mission_id   TEXT PRIMARY KEY,
    wallet       TEXT NOT NULL,
    mission_type INTEGER NOT NULL,
    reward_wei   TEXT NOT NULL,
    nonce        INTEGER NOT NULL,
    status       TEXT NOT NULL,
    tx_hash      TEXT,
    recorded_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_processed_missions_wallet ON processed_missions(wallet);
"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMission {
    pub mission_id: String,
    pub wallet: String,
    pub mission_type: u64,
    pub reward_wei: u128,
    pub nonce: u64,
    pub status: String,
    pub tx_hash: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl ProcessedMission {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let reward: String = row.get(3)?;
        let recorded_at: String = row.get(7)?;
        Ok(Self {
            mission_id: row.get(0)?,
            wallet: row.get(1)?,
            mission_type: row.get::<_, i64>(2)? as u64,
            reward_wei: reward.parse::<u128>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
            })?,
            nonce: row.get::<_, i64>(4)? as u64,
            status: row.get(5)?,
            tx_hash: row.get(6)?,
            recorded_at: DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        7,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?
                .with_timezone(&Utc),
        })
    }
}

pub struct MissionLedger {
    conn: Mutex<Connection>,
}

impl MissionLedger {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.run_migrations()?;
        Ok(ledger)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.run_migrations()?;
        Ok(ledger)
    }

    fn run_migrations(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn contains(&self, mission_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM processed_missions WHERE mission_id = ?1",
            params![mission_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Whether a live mint was started or sent for this mission.
    pub fn is_minted(&self, mission_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM processed_missions WHERE mission_id = ?1 AND status IN (?2, ?3)",
            params![mission_id, STATUS_PENDING, STATUS_SUBMITTED],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Insert a mission; returns false if the id was already present.
    pub fn record(&self, mission: &ProcessedMission) -> Result<bool> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO processed_missions (mission_id, wallet, mission_type, reward_wei, nonce, status, tx_hash, recorded_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                mission.mission_id,
                mission.wallet,
                mission.mission_type as i64,
                mission.reward_wei.to_string(),
                mission.nonce as i64,
                mission.status,
                mission.tx_hash,
                mission.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Claim a mission for a live mint by writing a `pending` row.
    ///
    /// A dry-run row for the same id is replaced. Returns false if a live
    /// mint already owns the id.
    pub fn begin_mint(&self, mission: &ProcessedMission) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "INSERT INTO processed_missions (mission_id, wallet, mission_type, reward_wei, nonce, status, tx_hash, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7)
             ON CONFLICT(mission_id) DO UPDATE SET
                wallet = excluded.wallet,
                mission_type = excluded.mission_type,
                reward_wei = excluded.reward_wei,
                nonce = excluded.nonce,
                status = excluded.status,
                tx_hash = NULL,
                recorded_at = excluded.recorded_at
             WHERE processed_missions.status = ?8",
            params![
                mission.mission_id,
                mission.wallet,
                mission.mission_type as i64,
                mission.reward_wei.to_string(),
                mission.nonce as i64,
                STATUS_PENDING,
                mission.recorded_at.to_rfc3339(),
                STATUS_DRY_RUN,
            ],
        )?;
        Ok(changed > 0)
    }

    /// Promote a pending mint to `submitted` with its transaction hash.
    pub fn complete_mint(&self, mission_id: &str, tx_hash: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "UPDATE processed_missions SET status = ?2, tx_hash = ?3 WHERE mission_id = ?1 AND status = ?4",
            params![mission_id, STATUS_SUBMITTED, tx_hash, STATUS_PENDING],
        )?;
        Ok(changed > 0)
    }

    /// Drop a pending row after its submission failed.
    pub fn abort_mint(&self, mission_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn.execute(
            "DELETE FROM processed_missions WHERE mission_id = ?1 AND status = ?2",
            params![mission_id, STATUS_PENDING],
        )?;
        Ok(changed > 0)
    }

    pub fn get(&self, mission_id: &str) -> Result<Option<ProcessedMission>> {
        let conn = self.conn.lock();
        let mission = conn
            .query_row(
                "SELECT mission_id, wallet, mission_type, reward_wei, nonce, status, tx_hash, recorded_at
                 FROM processed_missions WHERE mission_id = ?1",
                params![mission_id],
                ProcessedMission::from_row,
            )
            .optional()?;
        Ok(mission)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM processed_missions", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Most recently recorded missions first
    pub fn recent(&self, limit: usize) -> Result<Vec<ProcessedMission>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT mission_id, wallet, mission_type, reward_wei, nonce, status, tx_hash, recorded_at
             FROM processed_missions ORDER BY recorded_at DESC, nonce DESC LIMIT ?1",
        )?;

        let missions = stmt
            .query_map(params![limit as i64], ProcessedMission::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(missions)
    }
}
