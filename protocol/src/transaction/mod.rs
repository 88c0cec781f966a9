//! # Transaction Module
//!
//! Construction, signing and serialization of Kaspa transactions. This is the
//! engine proper: everything in here is a pure function of its inputs, holds
//! no state across calls, and performs no I/O.
//!
//! ## Architecture
//!
//! ```text
//! types.rs: TransactionId, Outpoint, Utxo, decimal-to-sompi conversion
//! script.rs: ScriptPublicKey and signature script layout
//! selector.rs: greedy UTXO selection in ledger order
//! builder.rs: TransactionBuilder: outputs, change, dust forfeiture
//! sighash.rs: signature hash (sighash ALL) and transaction id
//! signing.rs: per-input Schnorr signing and verification
//! wire.rs: the JSON payload the indexer's broadcast endpoint accepts
//! ```
//!
//! ## Pipeline
//!
//! 1. **Select**: [`select_utxos`] picks inputs covering `amount + fee`.
//! 2. **Build**: [`TransactionBuilder`] lays out recipient and change outputs.
//! 3. **Sign**: [`sign_transaction`] attaches a signature script to every input.
//! 4. **Serialize**: [`serialize`] produces the [`BroadcastPayload`].
//!
//! Each stage consumes the previous stage's output. There is no way back and
//! no partial result: a failure anywhere returns a [`TransactionError`] and
//! the half-finished value is dropped.
//!
//! ## Design Decisions
//!
//! - Amounts are `u64` sompi everywhere. The single float-to-integer
//!   conversion is [`kas_to_sompi`], applied at the boundary.
//! - Inputs carry their full UTXO so the signature hash can commit to the
//!   spent amount and locking script without a second lookup.

pub mod builder;
pub mod script;
pub mod selector;
pub mod sighash;
pub mod signing;
pub mod types;
pub mod wire;

use thiserror::Error;

pub use builder::{TransactionBuilder, TransactionInput, TransactionOutput, UnsignedTransaction};
pub use script::ScriptPublicKey;
pub use selector::{select_utxos, Selection};
pub use sighash::{calc_schnorr_signature_hash, transaction_id};
pub use signing::{sign_transaction, verify_input, SignedInput, SignedTransaction};
pub use types::{kas_to_sompi, Outpoint, TransactionId, Utxo};
pub use wire::{serialize, BroadcastPayload};

/// Errors raised while building, signing or checking a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// A decimal amount could not be converted to sompi, or is zero where a
    /// positive amount is required.
    #[error("invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// A transaction id is not 32 bytes of hex.
    #[error("invalid transaction id: {reason}")]
    InvalidTransactionId { reason: String },

    /// The candidate UTXOs cannot cover amount plus fee.
    #[error("insufficient funds: need {required} sompi, have {available} sompi")]
    InsufficientFunds { required: u64, available: u64 },

    /// A sum of amounts does not fit in `u64`.
    #[error("amount overflow")]
    AmountOverflow,

    /// A transaction needs at least one input.
    #[error("transaction has no inputs")]
    NoInputs,

    /// An input index past the end of the input list.
    #[error("input index {index} out of range ({count} inputs)")]
    InputIndexOutOfRange { index: usize, count: usize },

    /// Digest computation or signing failed.
    #[error("signing failed: {reason}")]
    SigningFailed { reason: String },

    /// A signature script that is not `41 <sig:64> 01`.
    #[error("malformed signature script on input {index}")]
    MalformedSignatureScript { index: usize },

    /// A signature that does not verify against the expected key.
    #[error("signature on input {index} does not verify")]
    InvalidSignature { index: usize },
}
