//! # Hashing Utilities
//!
//! Kaspa hashes transactions with BLAKE2b-256 keyed by a domain string.
//! The key acts as a domain separator: a signature digest can never collide
//! with a transaction id even over identical bytes, because the two hashers
//! are keyed differently.
//!
//! [`TxHasher`] is a small streaming writer with the integer encodings the
//! consensus serialization uses (little-endian fixed width, `u64` length
//! prefixes for variable-length byte strings).

use blake2b_simd::{Params, State};

use crate::config::HASH_LENGTH;

/// Domain key for signature hashes.
const TRANSACTION_SIGNING_HASH_KEY: &[u8] = b"TransactionSigningHash";

/// Domain key for transaction ids.
const TRANSACTION_ID_KEY: &[u8] = b"TransactionID";

/// Streaming keyed BLAKE2b-256 hasher.
///
/// # Example
///
/// ```
/// use kasgate_protocol::crypto::hash::TxHasher;
///
/// let mut h = TxHasher::transaction_signing();
/// h.write_u16(0).write_var_bytes(&[0xac]);
/// assert_eq!(h.finalize().len(), 32);
/// ```
#[derive(Clone)]
pub struct TxHasher {
    state: State,
}

impl TxHasher {
    /// Hasher for signature digests.
    pub fn transaction_signing() -> Self {
        Self::keyed(TRANSACTION_SIGNING_HASH_KEY)
    }

    /// Hasher for transaction ids.
    pub fn transaction_id() -> Self {
        Self::keyed(TRANSACTION_ID_KEY)
    }

    fn keyed(key: &[u8]) -> Self {
        let state = Params::new().hash_length(HASH_LENGTH).key(key).to_state();
        Self { state }
    }

    /// Feeds raw bytes.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.state.update(data);
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.update(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.update(&value.to_le_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.update(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.update(&value.to_le_bytes())
    }

    /// Writes a collection length. Lengths are always 8 bytes on the wire.
    pub fn write_len(&mut self, len: usize) -> &mut Self {
        self.write_u64(len as u64)
    }

    /// Writes `len(bytes)` as `u64` followed by the bytes themselves.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.write_len(bytes.len()).update(bytes)
    }

    /// Produces the 32-byte digest. The hasher may keep being used.
    pub fn finalize(&self) -> [u8; HASH_LENGTH] {
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(self.state.finalize().as_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domains_are_separated() {
        let mut a = TxHasher::transaction_signing();
        let mut b = TxHasher::transaction_id();
        a.update(b"same bytes");
        b.update(b"same bytes");
        assert_ne!(a.finalize(), b.finalize());
    }

    #[test]
    fn integers_are_little_endian() {
        let mut a = TxHasher::transaction_signing();
        a.write_u32(1);
        let mut b = TxHasher::transaction_signing();
        b.update(&[1, 0, 0, 0]);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn var_bytes_are_length_prefixed() {
        let mut a = TxHasher::transaction_signing();
        a.write_var_bytes(&[0xab, 0xcd]);
        let mut b = TxHasher::transaction_signing();
        b.update(&[2, 0, 0, 0, 0, 0, 0, 0, 0xab, 0xcd]);
        assert_eq!(a.finalize(), b.finalize());
    }

    #[test]
    fn matches_plain_keyed_blake2b() {
        let mut h = TxHasher::transaction_id();
        h.update(b"abc");
        let expected = Params::new()
            .hash_length(32)
            .key(b"TransactionID")
            .hash(b"abc");
        assert_eq!(&h.finalize()[..], expected.as_bytes());
    }
}
