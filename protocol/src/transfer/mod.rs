//! # Transfer Pipeline
//!
//! One canonical path from a payment request to a broadcast transaction:
//!
//! ```text
//! Validated ──> Selected ──> Built ──> Signed ──> Serialized ──> (Broadcast)
//! ```
//!
//! Strictly sequential, no branching back. Any stage failure aborts the
//! pipeline and returns a [`TransferError`]; nothing is partially signed and
//! nothing is partially broadcast.
//!
//! Validation happens entirely before the first network call. A malformed
//! address, a non-positive amount, a negative fee, a self-payment, a missing
//! key or a key that does not control the sender address all fail without
//! the indexer ever hearing about the request. Address and amount checks run
//! before the key is looked at.
//!
//! The signing key is split off the validated request and moved into
//! [`assemble`], which drops it once the last input is signed. Broadcast and
//! the follow-up balance lookup run without any key material in scope.
//!
//! The engine itself is stateless. It holds an injected [`LedgerIndexer`]
//! and the network it is bound to, both fixed at startup, and can serve any
//! number of concurrent requests.

pub mod error;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::address::{Address, Prefix};
use crate::config::format_sompi;
use crate::crypto::keys::SigningKey;
use crate::indexer::LedgerIndexer;
use crate::transaction::{
    kas_to_sompi, select_utxos, serialize, sign_transaction, verify_input, BroadcastPayload,
    SignedTransaction, TransactionBuilder, Utxo,
};

pub use error::{ErrorKind, TransferError};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A payment request as it arrives at the boundary: strings and floats.
///
/// The private key is held in a zeroizing buffer and is never printed by
/// `Debug`. Validation consumes the request, so the hex is wiped as soon as
/// it has been parsed.
pub struct TransferRequest {
    pub from: String,
    pub to: String,
    /// Amount in KAS.
    pub amount: f64,
    /// Fee in KAS.
    pub fee: f64,
    pub private_key: Option<Zeroizing<String>>,
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("amount", &self.amount)
            .field("fee", &self.fee)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// A request that passed validation: typed addresses and integer amounts.
/// Holds no key material.
#[derive(Debug, Clone)]
pub struct ValidatedTransfer {
    pub from: Address,
    pub to: Address,
    /// Sompi.
    pub amount: u64,
    /// Sompi.
    pub fee: u64,
}

impl ValidatedTransfer {
    /// Checks a request without touching the network.
    ///
    /// Returns the typed transfer and, separately, the signing key proven to
    /// control `from`. The key check runs last, so a request that is both
    /// malformed and keyless is reported as a validation error.
    pub fn validate(
        request: TransferRequest,
        network: Prefix,
    ) -> Result<(Self, SigningKey), TransferError> {
        let from = Address::parse_for_network(&request.from, network)
            .map_err(|e| TransferError::invalid_address("sender", e))?;
        let to = Address::parse_for_network(&request.to, network)
            .map_err(|e| TransferError::invalid_address("recipient", e))?;
        if from == to {
            return Err(TransferError::Validation(
                "recipient must differ from sender".to_string(),
            ));
        }

        if request.amount.is_nan() || request.amount <= 0.0 {
            return Err(TransferError::Validation(
                "amount must be greater than zero".to_string(),
            ));
        }
        if request.fee.is_nan() || request.fee < 0.0 {
            return Err(TransferError::Validation(
                "fee must not be negative".to_string(),
            ));
        }
        let amount = kas_to_sompi(request.amount)?;
        let fee = kas_to_sompi(request.fee)?;
        if amount == 0 {
            return Err(TransferError::Validation(
                "amount rounds to zero sompi".to_string(),
            ));
        }

        let private_key = request
            .private_key
            .ok_or_else(|| TransferError::Key("no private key supplied".to_string()))?;
        let key = SigningKey::from_hex(&private_key)?;
        if key.address(network) != from {
            return Err(TransferError::Key(
                "private key does not control the sender address".to_string(),
            ));
        }

        Ok((
            Self {
                from,
                to,
                amount,
                fee,
            },
            key,
        ))
    }

    /// `amount + fee` in sompi.
    pub fn target(&self) -> Result<u64, TransferError> {
        self.amount
            .checked_add(self.fee)
            .ok_or_else(|| TransferError::Validation("amount plus fee overflows".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Pure core
// ---------------------------------------------------------------------------

/// The output of the pure part of the pipeline.
#[derive(Debug, Clone)]
pub struct AssembledTransfer {
    pub signed: SignedTransaction,
    pub payload: BroadcastPayload,
}

/// Select, build, sign, serialize. No I/O.
///
/// Takes the key by value and drops it right after the signing pass, on
/// every path out of this function.
///
/// Every signature is checked against the recomputed digest before the
/// payload is handed back, so a payload that leaves this function is one a
/// node will accept as far as signatures go.
pub fn assemble(
    transfer: &ValidatedTransfer,
    candidates: &[Utxo],
    key: SigningKey,
) -> Result<AssembledTransfer, TransferError> {
    let selection = select_utxos(candidates, transfer.target()?)?;
    debug!(
        inputs = selection.inputs.len(),
        total = selection.total,
        "selected inputs"
    );

    let unsigned = TransactionBuilder::new(transfer.from.clone(), transfer.to.clone())
        .amount(transfer.amount)
        .fee(transfer.fee)
        .build(selection)?;
    debug!(
        outputs = unsigned.outputs.len(),
        forfeited = unsigned.forfeited_change(),
        "built transaction"
    );

    let signed = sign_transaction(unsigned, &key)?;
    let public_key = key.public_key();
    drop(key);
    for index in 0..signed.unsigned().inputs.len() {
        verify_input(&signed, index, &public_key)?;
    }

    let payload = serialize(&signed);
    debug!(id = %signed.transaction_id(), "serialized transaction");
    Ok(AssembledTransfer { signed, payload })
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Result of a dry-run build.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPreview {
    pub transaction_id: String,
    pub raw_transaction_hex: String,
    pub payload: BroadcastPayload,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub fee: String,
    pub charged: String,
    /// Change below the dust threshold that goes to the miner.
    pub forfeited_change: String,
    pub inputs: usize,
    pub outputs: usize,
}

/// Result of a completed send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub transaction_id: String,
    pub raw_transaction_hex: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    pub fee: String,
    pub charged: String,
    pub forfeited_change: String,
    /// Sender balance after the send; `None` if the lookup failed.
    pub remaining_balance: Option<String>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The transfer pipeline bound to one indexer and one network.
#[derive(Clone)]
pub struct TransferEngine {
    indexer: Arc<dyn LedgerIndexer>,
    network: Prefix,
}

impl TransferEngine {
    pub fn new(indexer: Arc<dyn LedgerIndexer>, network: Prefix) -> Self {
        Self { indexer, network }
    }

    pub fn network(&self) -> Prefix {
        self.network
    }

    pub fn indexer(&self) -> &Arc<dyn LedgerIndexer> {
        &self.indexer
    }

    /// Validates, fetches candidates and assembles. Shared by
    /// [`Self::build`] and [`Self::send`]. No key material outlives this
    /// call.
    async fn prepare(
        &self,
        request: TransferRequest,
    ) -> Result<(ValidatedTransfer, AssembledTransfer), TransferError> {
        let (transfer, key) = ValidatedTransfer::validate(request, self.network)?;
        debug!(from = %transfer.from, to = %transfer.to, amount = transfer.amount, fee = transfer.fee, "validated transfer");

        let candidates = self.indexer.fetch_utxos(&transfer.from).await?;
        debug!(candidates = candidates.len(), "fetched utxos");

        let assembled = assemble(&transfer, &candidates, key)?;
        Ok((transfer, assembled))
    }

    /// Runs the pipeline up to serialization and stops. Nothing is
    /// broadcast.
    pub async fn build(&self, request: TransferRequest) -> Result<TransferPreview, TransferError> {
        let (transfer, assembled) = self.prepare(request).await?;
        let unsigned = assembled.signed.unsigned();
        Ok(TransferPreview {
            transaction_id: assembled.signed.transaction_id().to_hex(),
            raw_transaction_hex: raw_hex(&assembled.payload)?,
            from: transfer.from.to_string(),
            to: transfer.to.to_string(),
            amount: format_sompi(transfer.amount),
            fee: format_sompi(transfer.fee),
            charged: format_sompi(transfer.amount + transfer.fee),
            forfeited_change: format_sompi(unsigned.forfeited_change()),
            inputs: unsigned.inputs.len(),
            outputs: unsigned.outputs.len(),
            payload: assembled.payload,
        })
    }

    /// Runs the full pipeline and broadcasts.
    pub async fn send(&self, request: TransferRequest) -> Result<TransferReceipt, TransferError> {
        let (transfer, assembled) = self.prepare(request).await?;
        let raw_transaction_hex = raw_hex(&assembled.payload)?;
        let local_id = assembled.signed.transaction_id().to_hex();

        let ack = self
            .indexer
            .broadcast(&assembled.payload)
            .await
            .map_err(TransferError::broadcast)?;
        if ack.transaction_id != local_id {
            warn!(local = %local_id, remote = %ack.transaction_id, "indexer reported a different transaction id");
        }
        info!(id = %ack.transaction_id, from = %transfer.from, to = %transfer.to, amount = transfer.amount, "transaction broadcast");

        let remaining_balance = match self.indexer.fetch_balance(&transfer.from).await {
            Ok(balance) => Some(format_sompi(balance)),
            Err(e) => {
                warn!(error = %e, "balance lookup after send failed");
                None
            }
        };

        let unsigned = assembled.signed.unsigned();
        Ok(TransferReceipt {
            transaction_id: ack.transaction_id,
            raw_transaction_hex,
            from: transfer.from.to_string(),
            to: transfer.to.to_string(),
            amount: format_sompi(transfer.amount),
            fee: format_sompi(transfer.fee),
            charged: format_sompi(transfer.amount + transfer.fee),
            forfeited_change: format_sompi(unsigned.forfeited_change()),
            remaining_balance,
        })
    }
}

fn raw_hex(payload: &BroadcastPayload) -> Result<String, TransferError> {
    payload
        .raw_transaction_hex()
        .map_err(|e| TransferError::SigningFailed(format!("serialization: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
