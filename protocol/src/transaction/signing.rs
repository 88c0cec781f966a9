//! Transaction signing with secp256k1 Schnorr keys.
//!
//! Signing is a separate step from building so that construction can be
//! tested without key material, and so the key is held for exactly one pass
//! over the inputs.
//!
//! Each input is signed independently: its own signature hash (which commits
//! to its own index and the locking script of the UTXO it spends) is signed
//! with the key, and the result is wrapped as `41 <sig:64> 01`.

use tracing::debug;

use super::builder::{TransactionInput, TransactionOutput, UnsignedTransaction};
use super::script::{parse_signature_script, signature_script, ScriptPublicKey};
use super::sighash::SighashContext;
use super::types::TransactionId;
use super::TransactionError;
use crate::config::{OP_CHECKSIG, OP_DATA_32, SCRIPT_PUBLIC_KEY_VERSION, SIG_HASH_ALL};
use crate::crypto::keys::{PublicKey, SigningKey};

// ---------------------------------------------------------------------------
// SignedTransaction
// ---------------------------------------------------------------------------

/// An input together with the signature script that unlocks it.
#[derive(Debug, Clone, Copy)]
pub struct SignedInput<'a> {
    pub input: &'a TransactionInput,
    pub signature_script: &'a [u8],
}

/// An [`UnsignedTransaction`] with a signature script attached to every
/// input.
///
/// Only [`sign_transaction`] creates one, so the number of signature scripts
/// always equals the number of inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    tx: UnsignedTransaction,
    signature_scripts: Vec<Vec<u8>>,
}

impl SignedTransaction {
    /// The transaction as it was before signing.
    pub fn unsigned(&self) -> &UnsignedTransaction {
        &self.tx
    }

    /// Inputs paired with their signature scripts, in order.
    pub fn inputs(&self) -> impl ExactSizeIterator<Item = SignedInput<'_>> {
        self.tx
            .inputs
            .iter()
            .zip(&self.signature_scripts)
            .map(|(input, script)| SignedInput {
                input,
                signature_script: script,
            })
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.tx.outputs
    }

    /// Same as the unsigned transaction's id: signature scripts are not part
    /// of it.
    pub fn transaction_id(&self) -> TransactionId {
        self.tx.transaction_id()
    }
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

/// The pay-to-public-key locking script for `public_key`.
fn p2pk_script(public_key: &PublicKey) -> ScriptPublicKey {
    let mut script = Vec::with_capacity(34);
    script.push(OP_DATA_32);
    script.extend_from_slice(&public_key.to_bytes());
    script.push(OP_CHECKSIG);
    ScriptPublicKey::new(SCRIPT_PUBLIC_KEY_VERSION, script)
}

/// Signs every input of `tx` with `key`.
///
/// # Errors
///
/// [`TransactionError::SigningFailed`] if any input spends a UTXO whose
/// locking script is not the pay-to-public-key script of `key`, or if a
/// signature hash cannot be computed. Nothing is returned half-signed: the
/// first failure aborts the whole pass.
pub fn sign_transaction(
    tx: UnsignedTransaction,
    key: &SigningKey,
) -> Result<SignedTransaction, TransactionError> {
    let expected_script = p2pk_script(&key.public_key());
    let context = SighashContext::new(&tx);

    let mut signature_scripts = Vec::with_capacity(tx.inputs.len());
    for (index, input) in tx.inputs.iter().enumerate() {
        if input.utxo.script_public_key != expected_script {
            return Err(TransactionError::SigningFailed {
                reason: format!(
                    "input {index} ({}) is locked by a script this key cannot satisfy",
                    input.utxo.outpoint
                ),
            });
        }

        let digest = context
            .input_digest(index)
            .map_err(|e| TransactionError::SigningFailed {
                reason: e.to_string(),
            })?;
        let signature = key.sign(&digest);
        signature_scripts.push(signature_script(&signature));
    }

    debug!(inputs = signature_scripts.len(), "signed all inputs");
    Ok(SignedTransaction {
        tx,
        signature_scripts,
    })
}

/// Checks that input `index` of `tx` carries a valid signature by
/// `public_key` over its recomputed signature hash.
pub fn verify_input(
    tx: &SignedTransaction,
    index: usize,
    public_key: &PublicKey,
) -> Result<(), TransactionError> {
    let script = tx
        .signature_scripts
        .get(index)
        .ok_or(TransactionError::InputIndexOutOfRange {
            index,
            count: tx.signature_scripts.len(),
        })?;

    let (signature, hash_type) =
        parse_signature_script(script).ok_or(TransactionError::MalformedSignatureScript { index })?;
    if hash_type != SIG_HASH_ALL {
        return Err(TransactionError::MalformedSignatureScript { index });
    }

    let digest = SighashContext::new(&tx.tx).input_digest(index)?;
    if public_key.verify(&digest, &signature) {
        Ok(())
    } else {
        Err(TransactionError::InvalidSignature { index })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
