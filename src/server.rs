//! Oracle Server
//!
//! HTTP endpoints for claim submission and oracle introspection.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::chain;
use crate::config::Config;
use crate::credential::AccountCredential;
use crate::decision::Decision;
use crate::dispatcher::ClaimDispatcher;
use crate::error::OracleError;
use crate::mission::RegisteredMission;
use crate::pipeline::{ClaimOutcome, ClaimPipeline, PipelineSettings};
use crate::storage::{MissionLedger, ProcessedMission};

const DEFAULT_LEDGER_LIMIT: usize = 50;
const MAX_LEDGER_LIMIT: usize = 500;

pub struct AppState {
    /// Serializes claims; validation and introspection go through `dispatcher`
    pub pipeline: Mutex<ClaimPipeline>,
    pub dispatcher: Arc<ClaimDispatcher>,
    pub dry_run: bool,
    pub ledger: Arc<MissionLedger>,
    pub config_summary: Value,
    pub chain_id: u64,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        pipeline: ClaimPipeline,
        ledger: Arc<MissionLedger>,
        config_summary: Value,
        chain_id: u64,
    ) -> Self {
        Self {
            dispatcher: pipeline.shared_dispatcher(),
            dry_run: pipeline.is_dry_run(),
            pipeline: Mutex::new(pipeline),
            ledger,
            config_summary,
            chain_id,
            started_at: Instant::now(),
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config", get(config_handler))
        .route("/missions", get(missions_handler))
        .route("/validate", post(validate_handler))
        .route("/claim", post(claim_handler))
        .route("/ledger", get(ledger_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub uptime_secs: u64,
    pub version: String,
    pub chain_id: u64,
    pub dry_run: bool,
    pub processed_missions: u64,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        chain_id: state.chain_id,
        dry_run: state.dry_run,
        processed_missions: state.ledger.count().unwrap_or(0),
    })
}

async fn config_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.config_summary.clone())
}

async fn missions_handler(State(state): State<Arc<AppState>>) -> Json<Vec<RegisteredMission>> {
    Json(state.dispatcher.registry().missions())
}

async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Json(claim): Json<Value>,
) -> Json<Decision> {
    Json(state.dispatcher.handle_claim(&claim))
}

async fn claim_handler(
    State(state): State<Arc<AppState>>,
    Json(claim): Json<Value>,
) -> Result<Json<ClaimOutcome>, (StatusCode, Json<Value>)> {
    let mut pipeline = state.pipeline.lock().await;

    match pipeline.process(&claim).await {
        Ok(outcome) => {
            info!(
                "Claim processed: status={} mission={}",
                outcome.status,
                outcome.mission_id.as_deref().unwrap_or("-")
            );
            Ok(Json(outcome))
        }
        Err(e) => {
            error!("Claim processing error: {}", e);
            let status = match &e {
                OracleError::Chain(_) | OracleError::ConnectivityFailure(_) => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((status, Json(json!({ "ok": false, "error": e.to_string() }))))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LedgerQuery {
    pub limit: Option<usize>,
}

async fn ledger_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<Vec<ProcessedMission>>, (StatusCode, Json<Value>)> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LEDGER_LIMIT)
        .min(MAX_LEDGER_LIMIT);

    state.ledger.recent(limit).map(Json).map_err(|e| {
        error!("Failed to read ledger: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
    })
}

/// Wire up chain, ledger and validators from configuration.
///
/// Fails before any claim is accepted if the node cannot be reached.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let registry = config.mission_registry()?;
    info!("Registered {} mission types", registry.len());

    let credential = if config.chain.dry_run {
        None
    } else {
        match AccountCredential::from_env()? {
            Some(credential) => Some(credential),
            None => anyhow::bail!(
                "dry_run is disabled but no account credential was provided ({} or {})",
                crate::credential::PRIVATE_KEY_ENV,
                crate::credential::PRIVATE_KEY_FILE_ENV
            ),
        }
    };

    let connection = chain::bootstrap(&config.chain, credential).await?;

    let ledger = Arc::new(MissionLedger::new(&config.storage.path)?);
    info!("Mission ledger opened at {}", config.storage.path.display());

    let pipeline = ClaimPipeline::new(
        ClaimDispatcher::new(registry),
        ledger.clone(),
        connection.client,
        PipelineSettings {
            contract_address: config.chain.contract_address.clone(),
            dry_run: config.chain.dry_run,
            starting_nonce: connection.starting_nonce,
        },
    );

    Ok(Arc::new(AppState::new(
        pipeline,
        ledger,
        config.public_summary(),
        connection.chain_id,
    )))
}

/// Run the server
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!("Starting oracle server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
