//! Pipeline-level error taxonomy.
//!
//! Every failure the transfer pipeline can produce collapses into one of six
//! kinds. The kind is stable and machine-readable; the message is free-form
//! and may carry upstream detail.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::address::AddressError;
use crate::crypto::keys::KeyError;
use crate::indexer::IndexerError;
use crate::transaction::TransactionError;

/// Stable, serializable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InsufficientFunds,
    Key,
    SigningFailed,
    UpstreamUnavailable,
    BroadcastFailed,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Key => "key",
            Self::SigningFailed => "signing_failed",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::BroadcastFailed => "broadcast_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by [`super::TransferEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    /// Malformed address, bad amount or fee, sender equals recipient.
    /// Raised before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The sender's UTXOs cannot cover amount plus fee.
    #[error("insufficient funds: need {required} sompi, have {available} sompi")]
    InsufficientFunds { required: u64, available: u64 },

    /// The private key is malformed or does not control the sender address.
    #[error("key error: {0}")]
    Key(String),

    /// Digest computation or signing failed. Nothing was broadcast.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// The indexer could not be reached or answered with garbage.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The indexer refused or failed to relay the signed transaction.
    #[error("broadcast failed: {0}")]
    BroadcastFailed(String),
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::Key(_) => ErrorKind::Key,
            Self::SigningFailed(_) => ErrorKind::SigningFailed,
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::BroadcastFailed(_) => ErrorKind::BroadcastFailed,
        }
    }

    /// Tags an address error with the role of the address that failed.
    pub fn invalid_address(role: &str, err: AddressError) -> Self {
        Self::Validation(format!("{role} address: {err}"))
    }

    /// Wraps an indexer error from a broadcast call.
    pub fn broadcast(err: IndexerError) -> Self {
        Self::BroadcastFailed(err.to_string())
    }
}

impl From<KeyError> for TransferError {
    fn from(err: KeyError) -> Self {
        Self::Key(err.to_string())
    }
}

/// Fetch-side indexer failures. Broadcast failures go through
/// [`TransferError::broadcast`] instead.
impl From<IndexerError> for TransferError {
    fn from(err: IndexerError) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

impl From<TransactionError> for TransferError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::InsufficientFunds {
                required,
                available,
            } => Self::InsufficientFunds {
                required,
                available,
            },
            TransactionError::InvalidAmount { .. }
            | TransactionError::AmountOverflow
            | TransactionError::InvalidTransactionId { .. }
            | TransactionError::NoInputs => Self::Validation(err.to_string()),
            TransactionError::InputIndexOutOfRange { .. }
            | TransactionError::SigningFailed { .. }
            | TransactionError::MalformedSignatureScript { .. }
            | TransactionError::InvalidSignature { .. } => Self::SigningFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InsufficientFunds).unwrap();
        assert_eq!(json, "\"insufficient_funds\"");
        assert_eq!(
            serde_json::to_string(&ErrorKind::UpstreamUnavailable).unwrap(),
            format!("\"{}\"", ErrorKind::UpstreamUnavailable)
        );
    }

    #[test]
    fn transaction_errors_map_to_pipeline_kinds() {
        let insufficient: TransferError = TransactionError::InsufficientFunds {
            required: 10,
            available: 5,
        }
        .into();
        assert_eq!(insufficient.kind(), ErrorKind::InsufficientFunds);

        let signing: TransferError = TransactionError::SigningFailed {
            reason: "x".to_string(),
        }
        .into();
        assert_eq!(signing.kind(), ErrorKind::SigningFailed);

        let amount: TransferError = TransactionError::InvalidAmount {
            reason: "x".to_string(),
        }
        .into();
        assert_eq!(amount.kind(), ErrorKind::Validation);
    }

    #[test]
    fn indexer_errors_split_by_call_site() {
        let fetch: TransferError = IndexerError::Transport("timeout".to_string()).into();
        assert_eq!(fetch.kind(), ErrorKind::UpstreamUnavailable);

        let broadcast = TransferError::broadcast(IndexerError::Rejected("orphan".to_string()));
        assert_eq!(broadcast.kind(), ErrorKind::BroadcastFailed);
        assert!(broadcast.to_string().contains("orphan"));
    }

    #[test]
    fn key_error_message_does_not_echo_input() {
        let err: TransferError = KeyError::InvalidPrivateKey.into();
        assert_eq!(err.kind(), ErrorKind::Key);
        assert!(err.to_string().contains("invalid private key"));
    }
}
