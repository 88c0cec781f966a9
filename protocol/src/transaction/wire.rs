//! Wire serialization for the indexer's broadcast endpoint.
//!
//! The indexer accepts exactly this JSON shape and nothing else:
//!
//! ```json
//! {
//!   "transaction": {
//!     "version": 0,
//!     "inputs": [{ "previousOutpoint": {"transactionId": "<hex>", "index": 0},
//!                  "signatureScript": "41<sig>01", "sequence": 0, "sigOpCount": 1 }],
//!     "outputs": [{ "amount": 100000000,
//!                   "scriptPublicKey": {"version": 0, "scriptPublicKey": "<hex>"} }],
//!     "lockTime": 0,
//!     "subnetworkId": "0000000000000000000000000000000000000000"
//!   },
//!   "allowOrphan": true
//! }
//! ```
//!
//! These types are DTOs: strings where the endpoint wants strings, integers
//! where it wants integers, and field names fixed by `serde(rename_all)`.

use serde::{Deserialize, Serialize};

use super::signing::SignedTransaction;
use crate::config::BROADCAST_ALLOW_ORPHAN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastPayload {
    pub transaction: WireTransaction,
    pub allow_orphan: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTransaction {
    pub version: u16,
    pub inputs: Vec<WireInput>,
    pub outputs: Vec<WireOutput>,
    pub lock_time: u64,
    pub subnetwork_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireInput {
    pub previous_outpoint: WireOutpoint,
    pub signature_script: String,
    pub sequence: u64,
    pub sig_op_count: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOutpoint {
    pub transaction_id: String,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireOutput {
    pub amount: u64,
    pub script_public_key: WireScriptPublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireScriptPublicKey {
    pub version: u16,
    pub script_public_key: String,
}

impl BroadcastPayload {
    /// Maps a signed transaction onto the broadcast shape.
    pub fn from_signed(tx: &SignedTransaction) -> Self {
        let unsigned = tx.unsigned();
        let inputs = tx
            .inputs()
            .map(|signed| WireInput {
                previous_outpoint: WireOutpoint {
                    transaction_id: signed.input.previous_outpoint().transaction_id.to_hex(),
                    index: signed.input.previous_outpoint().index,
                },
                signature_script: hex::encode(signed.signature_script),
                sequence: signed.input.sequence,
                sig_op_count: signed.input.sig_op_count,
            })
            .collect();
        let outputs = tx
            .outputs()
            .iter()
            .map(|output| WireOutput {
                amount: output.amount,
                script_public_key: WireScriptPublicKey {
                    version: output.script_public_key.version(),
                    script_public_key: output.script_public_key.to_hex(),
                },
            })
            .collect();

        Self {
            transaction: WireTransaction {
                version: unsigned.version,
                inputs,
                outputs,
                lock_time: unsigned.lock_time,
                subnetwork_id: hex::encode(unsigned.subnetwork_id),
            },
            allow_orphan: BROADCAST_ALLOW_ORPHAN,
        }
    }

    /// Hex encoding of the serialized `transaction` object, as reported back
    /// to clients alongside the transaction id.
    pub fn raw_transaction_hex(&self) -> Result<String, serde_json::Error> {
        Ok(hex::encode(serde_json::to_vec(&self.transaction)?))
    }
}

/// Serializes a signed transaction into its broadcast payload.
pub fn serialize(tx: &SignedTransaction) -> BroadcastPayload {
    BroadcastPayload::from_signed(tx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Prefix;
    use crate::crypto::keys::SigningKey;
    use crate::transaction::builder::TransactionBuilder;
    use crate::transaction::selector::select_utxos;
    use crate::transaction::signing::sign_transaction;
    use crate::transaction::types::{Outpoint, TransactionId, Utxo};

    fn signed() -> SignedTransaction {
        let key = SigningKey::generate();
        let sender = key.address(Prefix::Mainnet);
        let recipient = SigningKey::generate().address(Prefix::Mainnet);
        let utxo = Utxo::new(
            Outpoint::new(TransactionId::from_bytes([0x11; 32]), 2),
            150_000_000,
            sender.to_locking_script(),
        );
        let selection = select_utxos(&[utxo], 100_010_000).unwrap();
        let tx = TransactionBuilder::new(sender, recipient)
            .amount(100_000_000)
            .fee(10_000)
            .build(selection)
            .unwrap();
        sign_transaction(tx, &key).unwrap()
    }

    #[test]
    fn payload_has_the_exact_external_shape() {
        let json = serde_json::to_value(serialize(&signed())).unwrap();

        assert_eq!(json["allowOrphan"], true);
        let tx = &json["transaction"];
        assert_eq!(tx["version"], 0);
        assert_eq!(tx["lockTime"], 0);
        assert_eq!(tx["subnetworkId"], "0".repeat(40));

        let input = &tx["inputs"][0];
        assert_eq!(input["previousOutpoint"]["transactionId"], "11".repeat(32));
        assert_eq!(input["previousOutpoint"]["index"], 2);
        assert_eq!(input["sequence"], 0);
        assert_eq!(input["sigOpCount"], 1);
        let sig = input["signatureScript"].as_str().unwrap();
        assert_eq!(sig.len(), 132);
        assert!(sig.starts_with("41") && sig.ends_with("01"));

        let outputs = tx["outputs"].as_array().unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0]["amount"], 100_000_000u64);
        assert_eq!(outputs[1]["amount"], 49_990_000u64);
        assert_eq!(outputs[0]["scriptPublicKey"]["version"], 0);
        let spk = outputs[0]["scriptPublicKey"]["scriptPublicKey"].as_str().unwrap();
        assert!(spk.starts_with("20") && spk.ends_with("ac"));
        assert_eq!(spk.len(), 68);
    }

    #[test]
    fn no_extra_fields_leak_onto_the_wire() {
        let json = serde_json::to_value(serialize(&signed())).unwrap();
        let tx = json["transaction"].as_object().unwrap();
        let mut keys: Vec<&str> = tx.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            ["inputs", "lockTime", "outputs", "subnetworkId", "version"]
        );
    }

    #[test]
    fn raw_hex_decodes_back_to_transaction_json() {
        let payload = serialize(&signed());
        let raw = hex::decode(payload.raw_transaction_hex().unwrap()).unwrap();
        let back: WireTransaction = serde_json::from_slice(&raw).unwrap();
        assert_eq!(back, payload.transaction);
    }
}
