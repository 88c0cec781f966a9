// Signing & verification benchmarks for the KasGate engine.
//
// Covers secp256k1 Schnorr key generation, digest signing and verification,
// the per-input signature hash, and the full select/build/sign/serialize
// pipeline at various input counts.

use criterion::{
    criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use zeroize::Zeroizing;

use kasgate_protocol::address::Prefix;
use kasgate_protocol::crypto::SigningKey;
use kasgate_protocol::transaction::{
    calc_schnorr_signature_hash, select_utxos, Outpoint, TransactionBuilder, TransactionId, Utxo,
};
use kasgate_protocol::transfer::{assemble, TransferRequest, ValidatedTransfer};

const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
const KEY_ONE_ADDR: &str = "kaspa:qpumuen7l8wthtz45p3ftn58pvrs9xlumvkuu2xet8egzkcklqtes4ypce9sf";
const KEY_TWO_ADDR: &str = "kaspa:qrrqglu5g8kh6mfsg4qxa9wq0nv9cauwfwxw70984wkqnw2uwz0w23n3jj3wt";

/// A validated 1 KAS payment and `count` candidate UTXOs that together
/// just cover it.
fn fixture(count: usize) -> (ValidatedTransfer, Vec<Utxo>) {
    let request = TransferRequest {
        from: KEY_ONE_ADDR.to_string(),
        to: KEY_TWO_ADDR.to_string(),
        amount: 1.0,
        fee: 0.0001,
        private_key: Some(Zeroizing::new(KEY_ONE.to_string())),
    };
    let (transfer, _) = ValidatedTransfer::validate(request, Prefix::Mainnet).unwrap();
    let per_utxo = 110_000_000 / count as u64 + 1;
    let utxos = (0..count)
        .map(|i| {
            let mut id = [0u8; 32];
            id[..8].copy_from_slice(&(i as u64).to_le_bytes());
            Utxo::new(
                Outpoint::new(TransactionId::from_bytes(id), 0),
                per_utxo,
                transfer.from.to_locking_script(),
            )
        })
        .collect();
    (transfer, utxos)
}

fn bench_keypair_generation(c: &mut Criterion) {
    c.bench_function("schnorr/keypair_generate", |b| {
        b.iter(SigningKey::generate);
    });
}

fn bench_sign_digest(c: &mut Criterion) {
    let key = SigningKey::generate();
    let digest = [0x5au8; 32];

    c.bench_function("schnorr/sign_digest", |b| {
        b.iter(|| key.sign(&digest));
    });
}

fn bench_verify_signature(c: &mut Criterion) {
    let key = SigningKey::generate();
    let digest = [0x5au8; 32];
    let signature = key.sign(&digest);
    let public_key = key.public_key();

    c.bench_function("schnorr/verify_signature", |b| {
        b.iter(|| public_key.verify(&digest, &signature));
    });
}

fn bench_sighash(c: &mut Criterion) {
    let mut group = c.benchmark_group("sighash/input_digest");

    for size in [1usize, 10, 50] {
        let (transfer, utxos) = fixture(size);
        let selection = select_utxos(&utxos, transfer.target().unwrap()).unwrap();
        let tx = TransactionBuilder::new(transfer.from.clone(), transfer.to.clone())
            .amount(transfer.amount)
            .fee(transfer.fee)
            .build(selection)
            .unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tx, |b, tx| {
            b.iter(|| calc_schnorr_signature_hash(tx, tx.inputs.len() - 1).unwrap());
        });
    }

    group.finish();
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/assemble");

    for size in [1usize, 10, 50] {
        let (transfer, utxos) = fixture(size);

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &utxos, |b, utxos| {
            b.iter_batched(
                || SigningKey::from_hex(KEY_ONE).unwrap(),
                |key| assemble(&transfer, utxos, key).unwrap(),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_keypair_generation,
    bench_sign_digest,
    bench_verify_signature,
    bench_sighash,
    bench_assemble,
);
criterion_main!(benches);
