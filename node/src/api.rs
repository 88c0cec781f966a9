//! # REST API
//!
//! Builds the axum router that exposes the gateway's HTTP interface.
//! All endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                   | Description                               |
//! |--------|------------------------|-------------------------------------------|
//! | GET    | `/health`              | Liveness probe plus upstream indexer health |
//! | GET    | `/balance/:address`    | Confirmed balance of an address           |
//! | GET    | `/utxos/:address`      | Spendable outputs of an address           |
//! | GET    | `/history/:address`    | Recent transactions (`limit`, `offset`)   |
//! | POST   | `/transactions/build`  | Build and sign without broadcasting       |
//! | POST   | `/send`                | Build, sign and broadcast                 |
//!
//! Every failure renders as `{"error": {"kind": ..., "message": ...}}`.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use zeroize::Zeroizing;

use kasgate_protocol::address::{Address, Prefix};
use kasgate_protocol::config::{format_sompi, DEFAULT_HISTORY_LIMIT};
use kasgate_protocol::indexer::{HistoryEntry, IndexerHealth, LedgerIndexer};
use kasgate_protocol::transfer::{ErrorKind, TransferEngine, TransferError, TransferRequest};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone. Everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The gateway's reported version string.
    pub version: String,
    /// The transfer pipeline, bound to the indexer and network.
    pub engine: TransferEngine,
    /// Signing key used when a send request carries none.
    pub default_private_key: Option<Arc<Zeroizing<String>>>,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    fn network(&self) -> Prefix {
        self.engine.network()
    }

    fn indexer(&self) -> &Arc<dyn LedgerIndexer> {
        self.engine.indexer()
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/balance/:address", get(balance_handler))
        .route("/utxos/:address", get(utxos_handler))
        .route("/history/:address", get(history_handler))
        .route("/transactions/build", post(build_handler))
        .route("/send", post(send_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A [`TransferError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub TransferError);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: String,
    pub message: String,
}

impl From<TransferError> for ApiError {
    fn from(err: TransferError) -> Self {
        Self(err)
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation | ErrorKind::InsufficientFunds | ErrorKind::Key => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::SigningFailed => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::UpstreamUnavailable | ErrorKind::BroadcastFailed => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let body = ErrorBody {
            error: ErrorDetail {
                kind: kind.as_str().to_string(),
                message: self.0.to_string(),
            },
        };
        (status_for(kind), Json(body)).into_response()
    }
}

fn parse_address(raw: &str, network: Prefix) -> Result<Address, ApiError> {
    Address::parse_for_network(raw, network)
        .map_err(|e| ApiError(TransferError::invalid_address("address", e)))
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /transactions/build` and `POST /send`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferBody {
    pub from: String,
    pub to: String,
    /// KAS.
    pub amount: f64,
    /// KAS.
    #[serde(default)]
    pub fee: f64,
    #[serde(default)]
    pub private_key: Option<String>,
}

/// Response payload for `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub network: String,
    pub indexer: Option<IndexerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexer_error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexerStatus {
    pub synced: bool,
    pub servers: usize,
}

impl From<IndexerHealth> for IndexerStatus {
    fn from(health: IndexerHealth) -> Self {
        Self {
            synced: health.synced,
            servers: health.servers,
        }
    }
}

/// Response payload for `GET /balance/:address`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub address: String,
    /// KAS, 8 decimals.
    pub balance: String,
    pub sompi: u64,
}

/// One entry of `GET /utxos/:address`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoView {
    pub transaction_id: String,
    pub index: u32,
    pub amount: String,
    pub script_public_key: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoListResponse {
    pub address: String,
    pub total: String,
    pub utxos: Vec<UtxoView>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub address: String,
    pub limit: u32,
    pub offset: u32,
    pub transactions: Vec<HistoryEntry>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health`. Always 200 while the process is up; the indexer's health
/// is reported alongside.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (indexer, indexer_error) = match state.indexer().health().await {
        Ok(health) => (Some(IndexerStatus::from(health)), None),
        Err(e) => {
            tracing::warn!(error = %e, "indexer health check failed");
            (None, Some(e.to_string()))
        }
    };
    let status = match &indexer {
        Some(s) if s.synced => "ok",
        _ => "degraded",
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: state.version.clone(),
        network: state.network().to_string(),
        indexer,
        indexer_error,
    })
}

/// `GET /balance/:address`
async fn balance_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let address = parse_address(&address, state.network())?;
    let sompi = state
        .indexer()
        .fetch_balance(&address)
        .await
        .map_err(TransferError::from)?;
    Ok(Json(BalanceResponse {
        address: address.to_string(),
        balance: format_sompi(sompi),
        sompi,
    }))
}

/// `GET /utxos/:address`
async fn utxos_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UtxoListResponse>, ApiError> {
    let address = parse_address(&address, state.network())?;
    let utxos = state
        .indexer()
        .fetch_utxos(&address)
        .await
        .map_err(TransferError::from)?;
    let total = utxos
        .iter()
        .fold(0u64, |acc, u| acc.saturating_add(u.amount));
    Ok(Json(UtxoListResponse {
        address: address.to_string(),
        total: format_sompi(total),
        utxos: utxos
            .into_iter()
            .map(|u| UtxoView {
                transaction_id: u.outpoint.transaction_id.to_hex(),
                index: u.outpoint.index,
                amount: format_sompi(u.amount),
                script_public_key: u.script_public_key.to_hex(),
            })
            .collect(),
    }))
}

/// `GET /history/:address?limit=&offset=`
async fn history_handler(
    Path(address): Path<String>,
    Query(query): Query<HistoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let address = parse_address(&address, state.network())?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let transactions = state
        .indexer()
        .history(&address, limit, offset)
        .await
        .map_err(TransferError::from)?;
    Ok(Json(HistoryResponse {
        address: address.to_string(),
        limit,
        offset,
        transactions,
    }))
}

/// Turns a request body into a pipeline request, falling back to the
/// configured signing key. A request with neither is left keyless; the
/// engine rejects it after the address and amount checks.
fn transfer_request(
    state: &AppState,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> Result<TransferRequest, TransferError> {
    let Json(body) = body.map_err(|e| TransferError::Validation(e.body_text()))?;
    let private_key = match (body.private_key, &state.default_private_key) {
        (Some(key), _) => Some(Zeroizing::new(key)),
        (None, Some(default)) => Some(Zeroizing::new(default.as_str().to_string())),
        (None, None) => None,
    };
    Ok(TransferRequest {
        from: body.from,
        to: body.to,
        amount: body.amount,
        fee: body.fee,
        private_key,
    })
}

/// `POST /transactions/build`. Dry run; nothing is broadcast.
async fn build_handler(
    State(state): State<AppState>,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> Response {
    let timer = state.metrics.transfer_latency_seconds.start_timer();
    let result = match transfer_request(&state, body) {
        Ok(request) => state.engine.build(request).await,
        Err(e) => Err(e),
    };
    timer.observe_duration();

    match result {
        Ok(preview) => {
            state.metrics.dry_run_builds_total.inc();
            Json(preview).into_response()
        }
        Err(e) => {
            state.metrics.record_failure(e.kind());
            tracing::info!(kind = %e.kind(), error = %e, "build rejected");
            ApiError(e).into_response()
        }
    }
}

/// `POST /send`. Full pipeline including broadcast.
async fn send_handler(
    State(state): State<AppState>,
    body: Result<Json<TransferBody>, JsonRejection>,
) -> Response {
    let timer = state.metrics.transfer_latency_seconds.start_timer();
    let result = match transfer_request(&state, body) {
        Ok(request) => state.engine.send(request).await,
        Err(e) => Err(e),
    };
    timer.observe_duration();

    match result {
        Ok(receipt) => {
            state.metrics.transfers_submitted_total.inc();
            Json(receipt).into_response()
        }
        Err(e) => {
            state.metrics.record_failure(e.kind());
            tracing::warn!(kind = %e.kind(), error = %e, "send failed");
            ApiError(e).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
