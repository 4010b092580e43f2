//! # REST API
//!
//! Builds the axum router that exposes the ledger node's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                  | Description                              |
//! |--------|-----------------------|------------------------------------------|
//! | GET    | `/health`             | Liveness probe                           |
//! | GET    | `/mine`               | Mine and forge one block                 |
//! | POST   | `/transaction`        | Stage a transfer for the next block      |
//! | GET    | `/chain`              | Full chain and its length                |
//! | POST   | `/nodes/register`     | Register peers                           |
//! | GET    | `/nodes/resolve`      | Run conflict resolution against peers    |
//! | GET    | `/nodes`              | Registered peers                         |

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ledger_protocol::{Block, ChainResponse, Ledger, MiningError, MiningOptions, Transaction};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The ledger engine this node serves.
    pub ledger: Arc<Ledger>,
    /// Identifier credited with mining rewards.
    pub node_id: String,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
    /// Budget for a single `/mine` request. `None` mines until a proof is found.
    pub mining_timeout: Option<Duration>,
}

impl AppState {
    /// Brings the gauges in line with the ledger.
    fn refresh_gauges(&self) {
        self.metrics.chain_length.set(self.ledger.chain_len() as i64);
        self.metrics
            .pending_transactions
            .set(self.ledger.pending_len() as i64);
        self.metrics
            .registered_nodes
            .set(self.ledger.node_count() as i64);
    }
}

/// Generates a node identifier: a v4 UUID without hyphens.
pub fn new_node_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
///
/// The returned router is ready to be served on the configured port.
pub fn create_router(state: AppState) -> Router {
    state.refresh_gauges();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/mine", get(mine_handler))
        .route("/transaction", post(new_transaction_handler))
        .route("/chain", get(chain_handler))
        .route("/nodes", get(nodes_handler))
        .route("/nodes/register", post(register_nodes_handler))
        .route("/nodes/resolve", get(resolve_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /transaction`.
#[derive(Debug, Deserialize)]
pub struct NewTransactionRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: u64,
}

/// Body of `POST /nodes/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterNodesRequest {
    #[serde(default)]
    pub nodes: Vec<String>,
}

/// Response payload for `GET /mine`: a message followed by the block fields.
#[derive(Debug, Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    #[serde(flatten)]
    pub block: Block,
}

/// Response payload for `POST /transaction`.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response payload for `POST /nodes/register`.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterNodesResponse {
    pub message: String,
    /// Number of registered peers after this request.
    pub total: usize,
}

/// Response payload for `GET /nodes/resolve`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    /// `true` if the local chain was replaced by a peer's.
    pub replaced: bool,
    pub chain: Vec<Block>,
}

/// Response payload for `GET /nodes`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodesResponse {
    pub nodes: Vec<String>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn mining_status(err: &MiningError) -> StatusCode {
    match err {
        MiningError::StaleTip { .. } => StatusCode::CONFLICT,
        MiningError::Cancelled { .. } | MiningError::TimedOut { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        MiningError::Exhausted | MiningError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /mine` — searches for a proof off the runtime, credits this node
/// with the reward, and forges the block.
///
/// 409 if another block landed while mining, 503 if the mining timeout
/// elapsed.
async fn mine_handler(State(state): State<AppState>) -> Response {
    let options = MiningOptions {
        cancel: None,
        timeout: state.mining_timeout,
    };

    let started = Instant::now();
    let result = state.ledger.mine(&state.node_id, &options).await;
    state
        .metrics
        .mining_duration_seconds
        .observe(started.elapsed().as_secs_f64());

    match result {
        Ok(block) => {
            state.metrics.blocks_mined_total.inc();
            state.refresh_gauges();
            let resp = MineResponse {
                message: "New block forged".into(),
                block,
            };
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "mining failed");
            error_response(mining_status(&e), e.to_string())
        }
    }
}

/// `POST /transaction` — stages a transfer.
///
/// Any missing or mistyped field is a 400.
async fn new_transaction_handler(
    State(state): State<AppState>,
    body: Result<Json<NewTransactionRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "rejected transaction body");
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Missing values: {}", rejection.body_text()),
            );
        }
    };

    let index = state
        .ledger
        .create_transaction(Transaction::new(req.sender, req.recipient, req.amount));
    state.metrics.transactions_staged_total.inc();
    state.refresh_gauges();

    let resp = MessageResponse {
        message: format!("Transaction will be added to Block {}", index),
    };
    (StatusCode::CREATED, Json(resp)).into_response()
}

/// `GET /chain` — the full chain, genesis first.
async fn chain_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(ChainResponse::new(state.ledger.chain()))
}

/// `GET /nodes` — registered peers in canonical form.
async fn nodes_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(NodesResponse {
        nodes: state.ledger.nodes().into_iter().collect(),
    })
}

/// `POST /nodes/register` — registers every address in `nodes`.
///
/// The whole list is checked before anything is registered, so a single
/// bad address leaves the registry untouched.
async fn register_nodes_handler(
    State(state): State<AppState>,
    body: Result<Json<RegisterNodesRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    if req.nodes.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Error: Please supply a valid list of nodes",
        );
    }

    if let Err(e) = state.ledger.register_nodes(&req.nodes) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }
    state.refresh_gauges();

    let resp = RegisterNodesResponse {
        message: "New nodes have been added".into(),
        total: state.ledger.node_count(),
    };
    (StatusCode::CREATED, Json(resp)).into_response()
}

/// `GET /nodes/resolve` — adopts the longest valid peer chain, if longer.
async fn resolve_handler(State(state): State<AppState>) -> impl IntoResponse {
    let replaced = state.ledger.resolve_conflicts().await;
    state.metrics.resolutions_total.inc();
    if replaced {
        state.metrics.chain_replacements_total.inc();
    }
    state.refresh_gauges();

    let message = if replaced {
        "Our blockchain was replaced"
    } else {
        "Our chain is authoritative"
    };
    Json(ResolveResponse {
        message: message.into(),
        replaced,
        chain: state.ledger.chain(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
