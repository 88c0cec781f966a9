//! Core value types for Kaspa transactions.
//!
//! These are the nouns of the engine: a transaction id, an outpoint that
//! points at a previous output, and the spendable [`Utxo`] the indexer hands
//! us. They are plain request-scoped values; nothing here outlives one build.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::script::ScriptPublicKey;
use super::TransactionError;
use crate::config::{HASH_LENGTH, SOMPI_PER_KAS};

// ---------------------------------------------------------------------------
// TransactionId
// ---------------------------------------------------------------------------

/// A 32-byte transaction id, rendered as 64 lowercase hex characters.
///
/// Kaspa renders hashes in natural byte order (no Bitcoin-style reversal),
/// so the hex string and the hashed bytes line up one to one.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TransactionId([u8; HASH_LENGTH]);

impl TransactionId {
    pub fn from_bytes(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for TransactionId {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| TransactionError::InvalidTransactionId {
            reason: e.to_string(),
        })?;
        let array: [u8; HASH_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
            TransactionError::InvalidTransactionId {
                reason: format!("expected {HASH_LENGTH} bytes, got {}", v.len()),
            }
        })?;
        Ok(Self(array))
    }
}

impl TryFrom<String> for TransactionId {
    type Error = TransactionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransactionId> for String {
    fn from(id: TransactionId) -> Self {
        id.to_hex()
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Outpoint
// ---------------------------------------------------------------------------

/// Reference to a previous output: `(transaction id, output index)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outpoint {
    pub transaction_id: TransactionId,
    pub index: u32,
}

impl Outpoint {
    pub fn new(transaction_id: TransactionId, index: u32) -> Self {
        Self {
            transaction_id,
            index,
        }
    }
}

impl fmt::Display for Outpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.index)
    }
}

// ---------------------------------------------------------------------------
// Utxo
// ---------------------------------------------------------------------------

/// A spendable output as reported by the ledger indexer.
///
/// Immutable once fetched. The selector reads these and the builder moves
/// the chosen ones into transaction inputs; the locking script travels with
/// them because the signature hash commits to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    pub outpoint: Outpoint,
    /// Value in sompi.
    pub amount: u64,
    pub script_public_key: ScriptPublicKey,
}

impl Utxo {
    pub fn new(outpoint: Outpoint, amount: u64, script_public_key: ScriptPublicKey) -> Self {
        Self {
            outpoint,
            amount,
            script_public_key,
        }
    }
}

// ---------------------------------------------------------------------------
// Amount conversion
// ---------------------------------------------------------------------------

/// Converts a user-supplied decimal KAS amount into integer sompi.
///
/// This is the only place a float ever touches money. The value is scaled by
/// 10^8 and rounded to the nearest sompi, which absorbs binary representation
/// error (`1.499999 * 1e8` is `149999900.00000002`, not an integer). Every
/// computation downstream works on the returned `u64`.
///
/// Rejects NaN, infinities, negatives and values that do not fit in `u64`.
/// Zero is accepted; whether zero is meaningful is the caller's call.
pub fn kas_to_sompi(kas: f64) -> Result<u64, TransactionError> {
    if !kas.is_finite() {
        return Err(TransactionError::InvalidAmount {
            reason: "amount must be a finite number".to_string(),
        });
    }
    if kas < 0.0 {
        return Err(TransactionError::InvalidAmount {
            reason: format!("amount must not be negative, got {kas}"),
        });
    }

    let scaled = (kas * SOMPI_PER_KAS as f64).round();
    // u64::MAX as f64 rounds up to 2^64, so `>=` is the correct bound.
    if scaled >= u64::MAX as f64 {
        return Err(TransactionError::InvalidAmount {
            reason: format!("amount {kas} is out of range"),
        });
    }
    Ok(scaled as u64)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
