//! Response schemas of the Kaspa REST indexer.
//!
//! Every response is decoded into one of these types and then converted
//! into engine types. Required fields are required: a missing or mistyped
//! field fails the decode with [`IndexerError::Schema`] instead of being
//! read as zero or empty. Unknown extra fields are ignored so the indexer
//! can grow without breaking us.

use serde::Deserialize;

use super::{HistoryEntry, IndexerError, IndexerHealth};
use crate::config::SCRIPT_PUBLIC_KEY_VERSION;
use crate::transaction::{Outpoint, ScriptPublicKey, TransactionId, Utxo};

// ---------------------------------------------------------------------------
// UTXOs: GET /addresses/{address}/utxos
// ---------------------------------------------------------------------------

/// Amounts arrive as decimal strings on current indexer versions and as
/// bare integers on older ones. Both are accepted, nothing else is.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountRepr {
    Text(String),
    Number(u64),
}

impl AmountRepr {
    fn to_sompi(&self) -> Result<u64, IndexerError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .parse()
                .map_err(|_| IndexerError::Schema(format!("amount '{s}' is not an integer"))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutpointDto {
    pub transaction_id: String,
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptPublicKeyDto {
    #[serde(default)]
    pub version: Option<u16>,
    pub script_public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoEntryDto {
    pub amount: AmountRepr,
    pub script_public_key: ScriptPublicKeyDto,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoResponseDto {
    pub outpoint: OutpointDto,
    pub utxo_entry: UtxoEntryDto,
}

impl UtxoResponseDto {
    pub fn into_utxo(self) -> Result<Utxo, IndexerError> {
        let transaction_id: TransactionId = self
            .outpoint
            .transaction_id
            .parse()
            .map_err(|e| IndexerError::Schema(format!("utxo outpoint: {e}")))?;
        let spk = &self.utxo_entry.script_public_key;
        let script_public_key = ScriptPublicKey::from_hex(
            spk.version.unwrap_or(SCRIPT_PUBLIC_KEY_VERSION),
            &spk.script_public_key,
        )
        .map_err(|e| IndexerError::Schema(format!("utxo script: {e}")))?;

        Ok(Utxo::new(
            Outpoint::new(transaction_id, self.outpoint.index),
            self.utxo_entry.amount.to_sompi()?,
            script_public_key,
        ))
    }
}

// ---------------------------------------------------------------------------
// Balance: GET /addresses/{address}/balance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponseDto {
    pub address: String,
    pub balance: u64,
}

// ---------------------------------------------------------------------------
// Broadcast: POST /transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponseDto {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Error bodies come back either as `{"error": ...}` or, from the web
/// framework's validation layer, as `{"detail": ...}` where `detail` can be a
/// string or a structured list.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBodyDto {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBodyDto {
    pub fn message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        match &self.detail {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Health: GET /info/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KaspadServerDto {
    pub is_synced: bool,
    #[serde(default)]
    pub is_utxo_indexed: Option<bool>,
    #[serde(default)]
    pub server_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponseDto {
    pub kaspad_servers: Vec<KaspadServerDto>,
}

impl From<HealthResponseDto> for IndexerHealth {
    fn from(dto: HealthResponseDto) -> Self {
        Self {
            synced: dto.kaspad_servers.iter().any(|s| s.is_synced),
            servers: dto.kaspad_servers.len(),
        }
    }
}

// ---------------------------------------------------------------------------
// History: GET /addresses/{address}/full-transactions
// ---------------------------------------------------------------------------

/// This endpoint uses snake_case field names, unlike the others.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDto {
    pub transaction_id: String,
    #[serde(default)]
    pub block_time: Option<u64>,
    pub is_accepted: bool,
    #[serde(default)]
    pub accepting_block_blue_score: Option<u64>,
}

impl From<TransactionDto> for HistoryEntry {
    fn from(dto: TransactionDto) -> Self {
        Self {
            transaction_id: dto.transaction_id,
            block_time: dto.block_time,
            is_accepted: dto.is_accepted,
            accepting_block_blue_score: dto.accepting_block_blue_score,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
