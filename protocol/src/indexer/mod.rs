//! # Ledger Indexer Boundary
//!
//! The engine never talks to a Kaspa node directly. It talks to a REST
//! indexer through the [`LedgerIndexer`] trait: fetch spendable outputs,
//! fetch a balance, broadcast a payload, and a couple of read-only extras
//! the HTTP API exposes.
//!
//! The trait is the seam for dependency injection. Production wires in
//! [`HttpIndexer`]; tests wire in an in-memory double that records calls.
//! Nothing here retries. A failed call surfaces to the caller as-is.

pub mod http;
pub mod schema;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::address::Address;
use crate::transaction::{BroadcastPayload, Utxo};

pub use http::{HttpIndexer, IndexerConfig};

/// Errors raised at the indexer boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexerError {
    /// The request never got an HTTP response: DNS, TLS, connect, timeout.
    #[error("indexer transport error: {0}")]
    Transport(String),

    /// The indexer answered with a non-success status.
    #[error("indexer returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body does not match the expected schema.
    #[error("unexpected indexer response: {0}")]
    Schema(String),

    /// The indexer accepted the request but refused the transaction.
    #[error("transaction rejected by indexer: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for IndexerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Schema(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// What the indexer says after accepting a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastAck {
    pub transaction_id: String,
}

/// One entry of an address's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub transaction_id: String,
    /// Block time in milliseconds since the Unix epoch.
    pub block_time: Option<u64>,
    pub is_accepted: bool,
    pub accepting_block_blue_score: Option<u64>,
}

/// Upstream health as reported by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerHealth {
    /// At least one backing node reports itself synced.
    pub synced: bool,
    pub servers: usize,
}

/// The collaborator operations the engine and the HTTP API depend on.
#[async_trait]
pub trait LedgerIndexer: Send + Sync {
    /// Spendable outputs of `address`, in the order the ledger returns them.
    async fn fetch_utxos(&self, address: &Address) -> Result<Vec<Utxo>, IndexerError>;

    /// Confirmed balance of `address` in sompi.
    async fn fetch_balance(&self, address: &Address) -> Result<u64, IndexerError>;

    /// Submits a signed transaction.
    async fn broadcast(&self, payload: &BroadcastPayload) -> Result<BroadcastAck, IndexerError>;

    /// Health of the indexer and the nodes behind it.
    async fn health(&self) -> Result<IndexerHealth, IndexerError>;

    /// A page of recent transactions touching `address`, newest first.
    async fn history(
        &self,
        address: &Address,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<HistoryEntry>, IndexerError>;
}
