//! # Cryptographic Primitives
//!
//! Everything that touches key material or consensus hashing lives here.
//!
//! - **secp256k1 Schnorr** (BIP-340) for input signatures, via the audited
//!   `secp256k1` bindings to libsecp256k1.
//! - **Keyed BLAKE2b-256** for signature digests and transaction ids, via
//!   `blake2b_simd`.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. The curve math is libsecp256k1's and the hash is BLAKE2b's.
//! What this module adds is types: a [`SigningKey`] that cannot be cloned,
//! printed or serialized, and a [`TxHasher`] that cannot be fed the wrong
//! domain key by accident.

pub mod hash;
pub mod keys;

pub use hash::TxHasher;
pub use keys::{KeyError, PublicKey, Signature, SigningKey};
