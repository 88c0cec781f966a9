//! Signature hash and transaction id.
//!
//! This is the most error-prone corner of the engine: one byte out of place
//! and every signature we produce is valid math over the wrong message,
//! which nodes reject with nothing more helpful than "signature invalid".
//!
//! ## Signature hash (sighash type ALL)
//!
//! ```text
//! blake2b_256(key = "TransactionSigningHash",
//!     u16   version
//!     [32]  previous_outputs_hash   H(for each input: txid || u32 index)
//!     [32]  sequences_hash          H(for each input: u64 sequence)
//!     [32]  sig_op_counts_hash      H(for each input: u8 sig_op_count)
//!     [32]  txid                    \
//!     u32   index                    | the input being signed
//!     u16   spk version              |
//!     var   spk script               |
//!     u64   utxo amount              |
//!     u64   sequence                 |
//!     u8    sig_op_count            /
//!     [32]  outputs_hash            H(for each output: u64 amount, u16 spk version, var script)
//!     u64   lock_time
//!     [20]  subnetwork_id
//!     u64   gas
//!     [32]  payload_hash            zero for native subnetwork + empty payload
//!     u8    sighash type)
//! ```
//!
//! `var` is a `u64` length followed by the bytes. Integers are little-endian.
//! Every inner `H` is keyed with the same domain key as the outer hash.

use super::builder::{TransactionOutput, UnsignedTransaction};
use super::types::{Outpoint, TransactionId};
use super::TransactionError;
use crate::config::{HASH_LENGTH, SIG_HASH_ALL, SUBNETWORK_ID_NATIVE};
use crate::crypto::hash::TxHasher;
use crate::transaction::script::ScriptPublicKey;

const ZERO_HASH: [u8; HASH_LENGTH] = [0u8; HASH_LENGTH];

// ---------------------------------------------------------------------------
// Field writers
// ---------------------------------------------------------------------------

fn write_outpoint(hasher: &mut TxHasher, outpoint: &Outpoint) {
    hasher
        .update(outpoint.transaction_id.as_bytes())
        .write_u32(outpoint.index);
}

fn write_script_public_key(hasher: &mut TxHasher, spk: &ScriptPublicKey) {
    hasher.write_u16(spk.version()).write_var_bytes(spk.script());
}

fn write_output(hasher: &mut TxHasher, output: &TransactionOutput) {
    hasher.write_u64(output.amount);
    write_script_public_key(hasher, &output.script_public_key);
}

// ---------------------------------------------------------------------------
// SighashContext
// ---------------------------------------------------------------------------

/// The per-transaction parts of the signature hash, computed once and reused
/// for every input.
pub struct SighashContext<'a> {
    tx: &'a UnsignedTransaction,
    previous_outputs_hash: [u8; HASH_LENGTH],
    sequences_hash: [u8; HASH_LENGTH],
    sig_op_counts_hash: [u8; HASH_LENGTH],
    outputs_hash: [u8; HASH_LENGTH],
    payload_hash: [u8; HASH_LENGTH],
}

impl<'a> SighashContext<'a> {
    pub fn new(tx: &'a UnsignedTransaction) -> Self {
        let mut previous_outputs = TxHasher::transaction_signing();
        let mut sequences = TxHasher::transaction_signing();
        let mut sig_op_counts = TxHasher::transaction_signing();
        for input in &tx.inputs {
            write_outpoint(&mut previous_outputs, input.previous_outpoint());
            sequences.write_u64(input.sequence);
            sig_op_counts.write_u8(input.sig_op_count);
        }

        let mut outputs = TxHasher::transaction_signing();
        for output in &tx.outputs {
            write_output(&mut outputs, output);
        }

        let payload_hash = if tx.subnetwork_id == SUBNETWORK_ID_NATIVE && tx.payload.is_empty() {
            ZERO_HASH
        } else {
            TxHasher::transaction_signing()
                .write_var_bytes(&tx.payload)
                .finalize()
        };

        Self {
            tx,
            previous_outputs_hash: previous_outputs.finalize(),
            sequences_hash: sequences.finalize(),
            sig_op_counts_hash: sig_op_counts.finalize(),
            outputs_hash: outputs.finalize(),
            payload_hash,
        }
    }

    /// Signature hash of input `index` under sighash type ALL.
    pub fn input_digest(&self, index: usize) -> Result<[u8; HASH_LENGTH], TransactionError> {
        let input = self
            .tx
            .inputs
            .get(index)
            .ok_or(TransactionError::InputIndexOutOfRange {
                index,
                count: self.tx.inputs.len(),
            })?;

        let mut hasher = TxHasher::transaction_signing();
        hasher
            .write_u16(self.tx.version)
            .update(&self.previous_outputs_hash)
            .update(&self.sequences_hash)
            .update(&self.sig_op_counts_hash);
        write_outpoint(&mut hasher, input.previous_outpoint());
        write_script_public_key(&mut hasher, &input.utxo.script_public_key);
        hasher
            .write_u64(input.utxo.amount)
            .write_u64(input.sequence)
            .write_u8(input.sig_op_count)
            .update(&self.outputs_hash)
            .write_u64(self.tx.lock_time)
            .update(&self.tx.subnetwork_id)
            .write_u64(self.tx.gas)
            .update(&self.payload_hash)
            .write_u8(SIG_HASH_ALL);

        Ok(hasher.finalize())
    }
}

/// One-shot signature hash for a single input.
///
/// Prefer [`SighashContext`] when signing several inputs of the same
/// transaction.
pub fn calc_schnorr_signature_hash(
    tx: &UnsignedTransaction,
    input_index: usize,
) -> Result<[u8; HASH_LENGTH], TransactionError> {
    SighashContext::new(tx).input_digest(input_index)
}

// ---------------------------------------------------------------------------
// Transaction id
// ---------------------------------------------------------------------------

/// The transaction id: keyed BLAKE2b (`TransactionID`) over the transaction
/// with every signature script replaced by an empty byte string.
pub fn transaction_id(tx: &UnsignedTransaction) -> TransactionId {
    let mut hasher = TxHasher::transaction_id();
    hasher.write_u16(tx.version).write_len(tx.inputs.len());
    for input in &tx.inputs {
        write_outpoint(&mut hasher, input.previous_outpoint());
        hasher.write_var_bytes(&[]).write_u64(input.sequence);
    }

    hasher.write_len(tx.outputs.len());
    for output in &tx.outputs {
        write_output(&mut hasher, output);
    }

    hasher
        .write_u64(tx.lock_time)
        .update(&tx.subnetwork_id)
        .write_u64(tx.gas)
        .write_var_bytes(&tx.payload);

    TransactionId::from_bytes(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
