//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] takes a funded [`Selection`], the two parties,
//! the payment amount and the fee, and produces an [`UnsignedTransaction`]
//! with its outputs laid out:
//!
//! ```text
//! outputs[0]  recipient   amount
//! outputs[1]  sender      change      (only if change >= DUST_THRESHOLD_SOMPI)
//! ```
//!
//! Change below the dust threshold is not returned. It stays in the
//! transaction as extra fee. [`UnsignedTransaction::forfeited_change`]
//! reports how much was given up that way.
//!
//! The builder does not sign. That happens in [`super::signing`], so
//! construction stays testable without key material.

use tracing::debug;

use super::script::ScriptPublicKey;
use super::selector::Selection;
use super::sighash;
use super::types::{Outpoint, TransactionId, Utxo};
use super::TransactionError;
use crate::address::Address;
use crate::config::{
    DUST_THRESHOLD_SOMPI, SUBNETWORK_ID_NATIVE, TX_GAS, TX_INPUT_SEQUENCE, TX_INPUT_SIG_OP_COUNT,
    TX_LOCK_TIME, TX_VERSION,
};

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// A transaction input: the UTXO it spends plus its per-input fields.
///
/// The full UTXO (amount and locking script) rides along because the
/// signature hash commits to both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionInput {
    pub utxo: Utxo,
    pub sequence: u64,
    pub sig_op_count: u8,
}

impl TransactionInput {
    fn spending(utxo: Utxo) -> Self {
        Self {
            utxo,
            sequence: TX_INPUT_SEQUENCE,
            sig_op_count: TX_INPUT_SIG_OP_COUNT,
        }
    }

    pub fn previous_outpoint(&self) -> &Outpoint {
        &self.utxo.outpoint
    }
}

/// A transaction output: an amount paid to a locking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionOutput {
    /// Value in sompi.
    pub amount: u64,
    pub script_public_key: ScriptPublicKey,
}

// ---------------------------------------------------------------------------
// UnsignedTransaction
// ---------------------------------------------------------------------------

/// A fully laid out transaction awaiting signatures.
///
/// Normally obtained from [`TransactionBuilder::build`], which guarantees
/// the inputs cover the outputs plus the requested fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub version: u16,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u64,
    pub subnetwork_id: [u8; 20],
    pub gas: u64,
    pub payload: Vec<u8>,
    /// The fee the caller asked for, in sompi. The fee actually paid may be
    /// higher by the forfeited change.
    pub requested_fee: u64,
}

impl UnsignedTransaction {
    /// Sum of input amounts. Cannot overflow: the builder checked it.
    pub fn input_total(&self) -> u64 {
        self.inputs.iter().map(|i| i.utxo.amount).sum()
    }

    /// Sum of output amounts.
    pub fn output_total(&self) -> u64 {
        self.outputs.iter().map(|o| o.amount).sum()
    }

    /// What the miner actually receives: inputs minus outputs.
    pub fn effective_fee(&self) -> u64 {
        self.input_total().saturating_sub(self.output_total())
    }

    /// Change that was too small to return and went to the miner instead.
    pub fn forfeited_change(&self) -> u64 {
        self.effective_fee().saturating_sub(self.requested_fee)
    }

    /// The change output, if one was created.
    pub fn change_output(&self) -> Option<&TransactionOutput> {
        self.outputs.get(1)
    }

    /// The transaction id. Signature scripts are not part of it, so it is
    /// already final before signing.
    pub fn transaction_id(&self) -> TransactionId {
        sighash::transaction_id(self)
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Builder for [`UnsignedTransaction`].
///
/// # Usage
///
/// ```rust,no_run
/// use kasgate_protocol::address::Address;
/// use kasgate_protocol::transaction::{select_utxos, TransactionBuilder};
/// # fn demo(candidates: Vec<kasgate_protocol::transaction::Utxo>) {
/// let sender = Address::parse("kaspa:qp0l70zd5x85ttwd6jv7g3s3a8llzj96d8dncn4zmhv4tlzx5k2jyqh70xmfj").unwrap();
/// let recipient = Address::parse("kaspa:qpumuen7l8wthtz45p3ftn58pvrs9xlumvkuu2xet8egzkcklqtes4ypce9sf").unwrap();
///
/// let selection = select_utxos(&candidates, 100_010_000).unwrap();
/// let tx = TransactionBuilder::new(sender, recipient)
///     .amount(100_000_000)
///     .fee(10_000)
///     .build(selection)
///     .unwrap();
/// # }
/// ```
pub struct TransactionBuilder {
    sender: Address,
    recipient: Address,
    amount: u64,
    fee: u64,
}

impl TransactionBuilder {
    /// Creates a builder paying from `sender` to `recipient`. Amount and fee
    /// default to zero.
    pub fn new(sender: Address, recipient: Address) -> Self {
        Self {
            sender,
            recipient,
            amount: 0,
            fee: 0,
        }
    }

    /// Sets the payment amount in sompi.
    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the requested fee in sompi.
    pub fn fee(mut self, fee: u64) -> Self {
        self.fee = fee;
        self
    }

    /// Consumes the builder and the selection, producing the unsigned
    /// transaction.
    ///
    /// # Errors
    ///
    /// - [`TransactionError::InvalidAmount`] for a zero amount.
    /// - [`TransactionError::NoInputs`] for an empty selection.
    /// - [`TransactionError::InsufficientFunds`] if the selection does not
    ///   cover `amount + fee`.
    pub fn build(self, selection: Selection) -> Result<UnsignedTransaction, TransactionError> {
        if self.amount == 0 {
            return Err(TransactionError::InvalidAmount {
                reason: "amount must be greater than zero".to_string(),
            });
        }
        if selection.inputs.is_empty() {
            return Err(TransactionError::NoInputs);
        }

        let required = self
            .amount
            .checked_add(self.fee)
            .ok_or(TransactionError::AmountOverflow)?;
        // Funded from the inputs themselves; `selection.total` is not trusted.
        let available = selection
            .inputs
            .iter()
            .try_fold(0u64, |sum, utxo| sum.checked_add(utxo.amount))
            .ok_or(TransactionError::AmountOverflow)?;
        let change = available
            .checked_sub(required)
            .ok_or(TransactionError::InsufficientFunds {
                required,
                available,
            })?;

        let mut outputs = vec![TransactionOutput {
            amount: self.amount,
            script_public_key: self.recipient.to_locking_script(),
        }];
        if change >= DUST_THRESHOLD_SOMPI {
            outputs.push(TransactionOutput {
                amount: change,
                script_public_key: self.sender.to_locking_script(),
            });
        } else if change > 0 {
            debug!(change, "change below dust threshold, forfeiting as fee");
        }

        Ok(UnsignedTransaction {
            version: TX_VERSION,
            inputs: selection
                .inputs
                .into_iter()
                .map(TransactionInput::spending)
                .collect(),
            outputs,
            lock_time: TX_LOCK_TIME,
            subnetwork_id: SUBNETWORK_ID_NATIVE,
            gas: TX_GAS,
            payload: Vec::new(),
            requested_fee: self.fee,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
