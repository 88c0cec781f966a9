//! End-to-end tests for the KasGate transfer pipeline.
//!
//! These tests drive [`TransferEngine`] from a raw request to a broadcast
//! payload against an in-memory indexer that records every call. They prove
//! that validation happens before any network traffic, that value is
//! conserved through selection and building, and that every signature in the
//! payload verifies against the recomputed digest.
//!
//! Each test builds its own indexer. No shared state, no network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use zeroize::Zeroizing;

use kasgate_protocol::address::{Address, Prefix};
use kasgate_protocol::config::DUST_THRESHOLD_SOMPI;
use kasgate_protocol::crypto::SigningKey;
use kasgate_protocol::indexer::{
    BroadcastAck, HistoryEntry, IndexerError, IndexerHealth, LedgerIndexer,
};
use kasgate_protocol::transaction::script::parse_signature_script;
use kasgate_protocol::transaction::{
    calc_schnorr_signature_hash, BroadcastPayload, Outpoint, TransactionId, Utxo,
};
use kasgate_protocol::transfer::{
    assemble, ErrorKind, TransferEngine, TransferError, TransferRequest, ValidatedTransfer,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const KEY_ONE_ADDR: &str = "kaspa:qpumuen7l8wthtz45p3ftn58pvrs9xlumvkuu2xet8egzkcklqtes4ypce9sf";
const KEY_TWO_ADDR: &str = "kaspa:qrrqglu5g8kh6mfsg4qxa9wq0nv9cauwfwxw70984wkqnw2uwz0w23n3jj3wt";
const KEY_TWO_TESTNET: &str =
    "kaspatest:qrrqglu5g8kh6mfsg4qxa9wq0nv9cauwfwxw70984wkqnw2uwz0w2s4hfa0l0";

/// An indexer that serves a fixed UTXO set and records what it was asked.
#[derive(Default)]
struct RecordingIndexer {
    amounts: Vec<u64>,
    fail_fetch: bool,
    fail_broadcast: bool,
    fail_balance: bool,
    fetch_calls: AtomicUsize,
    balance_calls: AtomicUsize,
    broadcasts: Mutex<Vec<BroadcastPayload>>,
}

impl RecordingIndexer {
    fn with_amounts(amounts: &[u64]) -> Self {
        Self {
            amounts: amounts.to_vec(),
            ..Default::default()
        }
    }

    fn fetches(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn broadcast_count(&self) -> usize {
        self.broadcasts.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerIndexer for RecordingIndexer {
    async fn fetch_utxos(&self, address: &Address) -> Result<Vec<Utxo>, IndexerError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fetch {
            return Err(IndexerError::Transport("connection reset by peer".into()));
        }
        Ok(self
            .amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                Utxo::new(
                    Outpoint::new(TransactionId::from_bytes([0x10 + i as u8; 32]), i as u32),
                    *amount,
                    address.to_locking_script(),
                )
            })
            .collect())
    }

    async fn fetch_balance(&self, _address: &Address) -> Result<u64, IndexerError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_balance {
            return Err(IndexerError::Status {
                status: 503,
                body: "maintenance".into(),
            });
        }
        Ok(self.amounts.iter().sum())
    }

    async fn broadcast(&self, payload: &BroadcastPayload) -> Result<BroadcastAck, IndexerError> {
        if self.fail_broadcast {
            return Err(IndexerError::Rejected(
                "transaction already in mempool".into(),
            ));
        }
        self.broadcasts.lock().unwrap().push(payload.clone());
        Ok(BroadcastAck {
            transaction_id: "cd".repeat(32),
        })
    }

    async fn health(&self) -> Result<IndexerHealth, IndexerError> {
        Ok(IndexerHealth {
            synced: true,
            servers: 1,
        })
    }

    async fn history(
        &self,
        _address: &Address,
        _limit: u32,
        _offset: u32,
    ) -> Result<Vec<HistoryEntry>, IndexerError> {
        Ok(Vec::new())
    }
}

fn engine(indexer: &Arc<RecordingIndexer>) -> TransferEngine {
    TransferEngine::new(indexer.clone(), Prefix::Mainnet)
}

fn request(from: &str, to: &str, amount: f64, fee: f64) -> TransferRequest {
    TransferRequest {
        from: from.to_string(),
        to: to.to_string(),
        amount,
        fee,
        private_key: Some(Zeroizing::new(KEY_ONE.to_string())),
    }
}

fn payment(amount: f64, fee: f64) -> TransferRequest {
    request(KEY_ONE_ADDR, KEY_TWO_ADDR, amount, fee)
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn send_with_change_produces_two_outputs() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let receipt = engine(&indexer).send(payment(1.0, 0.0001)).await.unwrap();

    assert_eq!(receipt.amount, "1.00000000");
    assert_eq!(receipt.fee, "0.00010000");
    assert_eq!(receipt.charged, "1.00010000");
    assert_eq!(receipt.forfeited_change, "0.00000000");
    assert_eq!(receipt.transaction_id, "cd".repeat(32));
    assert_eq!(receipt.remaining_balance.as_deref(), Some("1.50000000"));

    let sent = indexer.broadcasts.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let tx = &sent[0].transaction;
    assert_eq!(tx.inputs.len(), 1);
    assert_eq!(tx.outputs.len(), 2);
    assert_eq!(tx.outputs[0].amount, 100_000_000);
    assert_eq!(tx.outputs[1].amount, 49_990_000);
    assert!(tx.outputs[1].amount >= DUST_THRESHOLD_SOMPI);
    assert_eq!(tx.subnetwork_id, "0".repeat(40));
    assert!(sent[0].allow_orphan);
}

#[tokio::test]
async fn sub_dust_change_is_forfeited() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let receipt = engine(&indexer)
        .send(payment(1.499_999, 0.0))
        .await
        .unwrap();

    assert_eq!(receipt.forfeited_change, "0.00000100");
    let sent = indexer.broadcasts.lock().unwrap();
    let outputs = &sent[0].transaction.outputs;
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].amount, 149_999_900);
}

#[tokio::test]
async fn selection_accumulates_in_ledger_order() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[
        40_000_000, 40_000_000, 40_000_000, 500_000_000,
    ]));
    let preview = engine(&indexer).build(payment(1.0, 0.0)).await.unwrap();

    assert_eq!(preview.inputs, 3);
    let tx = &preview.payload.transaction;
    assert_eq!(tx.outputs[1].amount, 20_000_000);
    let indices: Vec<u32> = tx
        .inputs
        .iter()
        .map(|i| i.previous_outpoint.index)
        .collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn dry_run_never_broadcasts() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let preview = engine(&indexer).build(payment(1.0, 0.0001)).await.unwrap();

    assert_eq!(indexer.fetches(), 1);
    assert_eq!(indexer.broadcast_count(), 0);
    assert_eq!(indexer.balance_calls.load(Ordering::SeqCst), 0);
    assert_eq!(preview.outputs, 2);
    assert_eq!(preview.transaction_id.len(), 64);
    assert_eq!(
        preview.raw_transaction_hex,
        hex::encode(serde_json::to_vec(&preview.payload.transaction).unwrap())
    );
}

#[tokio::test]
async fn balance_failure_after_send_degrades_to_none() {
    let indexer = Arc::new(RecordingIndexer {
        amounts: vec![150_000_000],
        fail_balance: true,
        ..Default::default()
    });
    let receipt = engine(&indexer).send(payment(1.0, 0.0)).await.unwrap();

    assert_eq!(receipt.remaining_balance, None);
    assert_eq!(indexer.broadcast_count(), 1);
}

// ---------------------------------------------------------------------------
// Signatures
// ---------------------------------------------------------------------------

#[test]
fn every_signature_script_verifies_against_its_digest() {
    let (transfer, key) =
        ValidatedTransfer::validate(payment(2.0, 0.001), Prefix::Mainnet).unwrap();
    let candidates: Vec<Utxo> = [90_000_000u64, 80_000_000, 70_000_000]
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            Utxo::new(
                Outpoint::new(TransactionId::from_bytes([i as u8 + 1; 32]), 0),
                *amount,
                transfer.from.to_locking_script(),
            )
        })
        .collect();

    let assembled = assemble(&transfer, &candidates, key).unwrap();
    let public_key = SigningKey::from_hex(KEY_ONE).unwrap().public_key();
    let unsigned = assembled.signed.unsigned();
    assert_eq!(unsigned.inputs.len(), 3);

    for (index, input) in assembled.payload.transaction.inputs.iter().enumerate() {
        assert_eq!(input.signature_script.len(), 132);
        assert!(input.signature_script.starts_with("41"));
        assert!(input.signature_script.ends_with("01"));

        let script = hex::decode(&input.signature_script).unwrap();
        let (signature, sighash_type) = parse_signature_script(&script).unwrap();
        assert_eq!(sighash_type, 0x01);

        let digest = calc_schnorr_signature_hash(unsigned, index).unwrap();
        assert!(public_key.verify(&digest, &signature));
    }
}

#[test]
fn value_is_conserved() {
    let (transfer, key) =
        ValidatedTransfer::validate(payment(0.7, 0.0003), Prefix::Mainnet).unwrap();
    let candidates: Vec<Utxo> = [30_000_000u64, 30_000_000, 30_000_000]
        .iter()
        .enumerate()
        .map(|(i, amount)| {
            Utxo::new(
                Outpoint::new(TransactionId::from_bytes([i as u8 + 7; 32]), 1),
                *amount,
                transfer.from.to_locking_script(),
            )
        })
        .collect();

    let assembled = assemble(&transfer, &candidates, key).unwrap();
    let tx = assembled.signed.unsigned();
    assert_eq!(
        tx.output_total() + transfer.fee + tx.forfeited_change(),
        tx.input_total()
    );
}

// ---------------------------------------------------------------------------
// Validation before network
// ---------------------------------------------------------------------------

#[tokio::test]
async fn malformed_addresses_never_reach_the_indexer() {
    let uppercase = KEY_TWO_ADDR.to_uppercase();
    let truncated = &KEY_TWO_ADDR[..KEY_TWO_ADDR.len() - 1];
    let bad_recipients = [
        uppercase.as_str(),
        truncated,
        KEY_TWO_TESTNET,
        "bitcoin:qrrqglu5g8kh6mfsg4qxa9wq0nv9cauwfwxw70984wkqnw2uwz0w23n3jj3wt",
        "",
    ];

    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let engine = engine(&indexer);
    for to in bad_recipients {
        let err = engine
            .send(request(KEY_ONE_ADDR, to, 1.0, 0.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "recipient {to:?}");

        let err = engine
            .build(request(to, KEY_ONE_ADDR, 1.0, 0.0))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "sender {to:?}");
    }
    assert_eq!(indexer.fetches(), 0);
}

#[tokio::test]
async fn self_payment_is_rejected_before_fetch() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let err = engine(&indexer)
        .send(request(KEY_ONE_ADDR, KEY_ONE_ADDR, 1.0, 0.0))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(indexer.fetches(), 0);
}

#[tokio::test]
async fn non_positive_amounts_and_negative_fees_are_rejected() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let engine = engine(&indexer);
    for (amount, fee) in [(0.0, 0.0), (-5.0, 0.0), (1.0, -0.0001)] {
        let err = engine.send(payment(amount, fee)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
    assert_eq!(indexer.fetches(), 0);
}

#[tokio::test]
async fn foreign_key_is_rejected_before_fetch() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let mut req = payment(1.0, 0.0);
    req.private_key = Some(Zeroizing::new(format!("{:0>64}", "2")));
    let err = engine(&indexer).send(req).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Key);
    assert_eq!(indexer.fetches(), 0);
}

#[tokio::test]
async fn keyless_request_is_rejected_before_fetch() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let mut req = payment(1.0, 0.0);
    req.private_key = None;
    let err = engine(&indexer).send(req).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Key);
    assert_eq!(indexer.fetches(), 0);
}

#[tokio::test]
async fn malformed_sender_without_key_is_a_validation_error() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[150_000_000]));
    let mut req = request("KASPA:NOTANADDRESS", KEY_TWO_ADDR, 1.0, 0.0);
    req.private_key = None;
    let err = engine(&indexer).send(req).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(indexer.fetches(), 0);
}

// ---------------------------------------------------------------------------
// Failures after validation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn insufficient_funds_reports_shortfall() {
    let indexer = Arc::new(RecordingIndexer::with_amounts(&[50_000_000]));
    let err = engine(&indexer).send(payment(1.0, 0.0)).await.unwrap_err();

    assert_eq!(
        err,
        TransferError::InsufficientFunds {
            required: 100_000_000,
            available: 50_000_000,
        }
    );
    assert_eq!(indexer.broadcast_count(), 0);
}

#[tokio::test]
async fn fetch_failure_is_upstream_unavailable() {
    let indexer = Arc::new(RecordingIndexer {
        amounts: vec![150_000_000],
        fail_fetch: true,
        ..Default::default()
    });
    let err = engine(&indexer).send(payment(1.0, 0.0)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    assert_eq!(indexer.broadcast_count(), 0);
}

#[tokio::test]
async fn broadcast_failure_carries_upstream_detail() {
    let indexer = Arc::new(RecordingIndexer {
        amounts: vec![150_000_000],
        fail_broadcast: true,
        ..Default::default()
    });
    let err = engine(&indexer).send(payment(1.0, 0.0)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BroadcastFailed);
    assert!(err.to_string().contains("already in mempool"));
    assert_eq!(indexer.balance_calls.load(Ordering::SeqCst), 0);
}
