// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # KasGate Protocol Core Library
//!
//! Builds and signs Kaspa payments against the UTXO model and produces the
//! exact JSON payload a Kaspa REST indexer accepts for broadcast.
//!
//! The hard part of a payment gateway is not the HTTP server. It is getting
//! value conservation, input selection, the signature hash and the wire shape
//! exactly right, every time, with no second chance once the transaction is
//! relayed. That is what this crate does.
//!
//! ## Architecture
//!
//! - **config**: Consensus constants, address format, dust policy, defaults.
//! - **address**: Address parsing, checksums, and address ↔ locking script.
//! - **crypto**: Schnorr keys and keyed BLAKE2b hashing. Don't roll your own.
//! - **transaction**: Selection, building, sighash, signing, wire format.
//! - **indexer**: The [`indexer::LedgerIndexer`] seam and its HTTP client.
//! - **transfer**: The end-to-end pipeline and its error taxonomy.
//!
//! ## Design Philosophy
//!
//! 1. Integers for money. One float-to-sompi conversion, at the boundary.
//! 2. Validate everything before the first network call.
//! 3. No global state. The indexer is injected, the engine is a value.
//! 4. If it touches money, it has tests. Plural.

pub mod address;
pub mod config;
pub mod crypto;
pub mod indexer;
pub mod transaction;
pub mod transfer;
