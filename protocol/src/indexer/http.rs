//! [`LedgerIndexer`] over the public Kaspa REST API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::schema::{
    BalanceResponseDto, ErrorBodyDto, HealthResponseDto, SubmitResponseDto, TransactionDto,
    UtxoResponseDto,
};
use super::{BroadcastAck, HistoryEntry, IndexerError, IndexerHealth, LedgerIndexer};
use crate::address::Address;
use crate::config::{DEFAULT_INDEXER_URL, DEFAULT_UPSTREAM_TIMEOUT, MAX_HISTORY_LIMIT};
use crate::transaction::{BroadcastPayload, Utxo};

/// Where the indexer lives and how long we wait for it.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_INDEXER_URL.to_string(),
            timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }
}

/// HTTP client for the Kaspa REST indexer.
///
/// Cheap to clone; the underlying `reqwest::Client` shares its pool.
#[derive(Debug, Clone)]
pub struct HttpIndexer {
    base_url: String,
    client: Client,
}

impl HttpIndexer {
    pub fn new(config: IndexerConfig) -> Result<Self, IndexerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IndexerError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, IndexerError> {
        let url = self.url(path);
        debug!(%url, "indexer GET");
        let resp = self.client.get(&url).send().await?;
        decode(resp).await
    }
}

/// Turns an HTTP response into `T`, or into the matching [`IndexerError`].
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, IndexerError> {
    let status = resp.status();
    let body = resp.text().await?;
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBodyDto>(&body)
            .ok()
            .and_then(|e| e.message())
            .unwrap_or(body);
        return Err(IndexerError::Status {
            status: status.as_u16(),
            body: message,
        });
    }
    serde_json::from_str(&body).map_err(|e| IndexerError::Schema(e.to_string()))
}

#[async_trait]
impl LedgerIndexer for HttpIndexer {
    async fn fetch_utxos(&self, address: &Address) -> Result<Vec<Utxo>, IndexerError> {
        let entries: Vec<UtxoResponseDto> = self
            .get_json(&format!("/addresses/{address}/utxos"))
            .await?;
        entries.into_iter().map(UtxoResponseDto::into_utxo).collect()
    }

    async fn fetch_balance(&self, address: &Address) -> Result<u64, IndexerError> {
        let dto: BalanceResponseDto = self
            .get_json(&format!("/addresses/{address}/balance"))
            .await?;
        if dto.address != address.to_string() {
            warn!(requested = %address, returned = %dto.address, "indexer answered for another address");
            return Err(IndexerError::Schema(
                "balance response is for a different address".to_string(),
            ));
        }
        Ok(dto.balance)
    }

    async fn broadcast(&self, payload: &BroadcastPayload) -> Result<BroadcastAck, IndexerError> {
        let url = self.url("/transactions");
        debug!(%url, inputs = payload.transaction.inputs.len(), "indexer POST");
        let resp = self.client.post(&url).json(payload).send().await?;

        let status = resp.status();
        let body = resp.text().await?;
        let parsed = serde_json::from_str::<SubmitResponseDto>(&body);

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBodyDto>(&body)
                .ok()
                .and_then(|e| e.message())
                .unwrap_or(body);
            return Err(IndexerError::Status {
                status: status.as_u16(),
                body: message,
            });
        }

        let dto = parsed.map_err(|e| IndexerError::Schema(e.to_string()))?;
        if let Some(error) = dto.error.filter(|e| !e.is_empty()) {
            return Err(IndexerError::Rejected(error));
        }
        let transaction_id = dto
            .transaction_id
            .ok_or_else(|| IndexerError::Schema("missing transactionId".to_string()))?;
        Ok(BroadcastAck { transaction_id })
    }

    async fn health(&self) -> Result<IndexerHealth, IndexerError> {
        let dto: HealthResponseDto = self.get_json("/info/health").await?;
        Ok(dto.into())
    }

    async fn history(
        &self,
        address: &Address,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<HistoryEntry>, IndexerError> {
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);
        let path = format!(
            "/addresses/{address}/full-transactions?limit={limit}&offset={offset}&resolve_previous_outpoints=no"
        );
        let entries: Vec<TransactionDto> = self.get_json(&path).await?;
        Ok(entries.into_iter().map(HistoryEntry::from).collect())
    }
}
