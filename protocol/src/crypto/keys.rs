//! # Key Management
//!
//! secp256k1 Schnorr key material for signing Kaspa inputs.
//!
//! A [`SigningKey`] is parsed from hex, used for one signing pass, and
//! dropped. It is never serialized, never logged, and its secret scalar is
//! erased when the value goes out of scope. The hex string it came from is
//! decoded into a zeroizing buffer so the raw bytes do not linger either.
//!
//! ## Determinism
//!
//! Signing uses BIP-340 with fresh auxiliary randomness, so two signatures
//! over the same digest differ. Both verify. Tests assert on verification,
//! never on signature bytes.

use secp256k1::{schnorr, Keypair, Message, XOnlyPublicKey, SECP256K1};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::address::{Address, Prefix};
use crate::config::SCHNORR_SIGNATURE_LENGTH;

/// Errors that can occur during key operations.
///
/// Deliberately vague: the message never echoes the offending input, since
/// the offending input may be a private key with a typo in it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("invalid private key: malformed hex or scalar out of range")]
    InvalidPrivateKey,

    #[error("invalid public key: not a valid x-only secp256k1 point")]
    InvalidPublicKey,
}

// ---------------------------------------------------------------------------
// SigningKey
// ---------------------------------------------------------------------------

/// A Schnorr signing key.
///
/// Deliberately not `Clone`, `Serialize` or `Deserialize`.
pub struct SigningKey {
    keypair: Keypair,
}

impl SigningKey {
    /// Generates a fresh key from the OS RNG.
    pub fn generate() -> Self {
        let keypair = Keypair::new(SECP256K1, &mut secp256k1::rand::thread_rng());
        Self { keypair }
    }

    /// Parses a 32-byte secret scalar from 64 hex characters.
    ///
    /// Fails with [`KeyError::InvalidPrivateKey`] for malformed hex, a wrong
    /// length, zero, or a value at or above the curve order.
    pub fn from_hex(private_key_hex: &str) -> Result<Self, KeyError> {
        let bytes = Zeroizing::new(
            hex::decode(private_key_hex.trim()).map_err(|_| KeyError::InvalidPrivateKey)?,
        );
        Self::from_slice(&bytes)
    }

    /// Parses a raw 32-byte secret scalar.
    pub fn from_slice(secret: &[u8]) -> Result<Self, KeyError> {
        if secret.len() != 32 {
            return Err(KeyError::InvalidPrivateKey);
        }
        let keypair =
            Keypair::from_seckey_slice(SECP256K1, secret).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self { keypair })
    }

    /// The secret scalar as hex, for handing a generated key to an operator.
    pub fn secret_hex(&self) -> Zeroizing<String> {
        let secret = Zeroizing::new(self.keypair.secret_bytes());
        Zeroizing::new(hex::encode(&*secret))
    }

    /// The x-only public key.
    pub fn public_key(&self) -> PublicKey {
        let (inner, _parity) = self.keypair.x_only_public_key();
        PublicKey { inner }
    }

    /// The pay-to-public-key address this key spends from.
    pub fn address(&self, prefix: Prefix) -> Address {
        self.public_key().address(prefix)
    }

    /// Signs a 32-byte digest.
    pub fn sign(&self, digest: &[u8; 32]) -> Signature {
        let message = Message::from_digest(*digest);
        let sig = self.keypair.sign_schnorr(message);
        let mut bytes = [0u8; SCHNORR_SIGNATURE_LENGTH];
        bytes.copy_from_slice(&sig[..]);
        Signature { bytes }
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        self.keypair.non_secure_erase();
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(pub={})", self.public_key().to_hex())
    }
}

// ---------------------------------------------------------------------------
// PublicKey
// ---------------------------------------------------------------------------

/// An x-only secp256k1 public key, the payload of a Schnorr address.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    inner: XOnlyPublicKey,
}

impl PublicKey {
    /// Parses 32 bytes of x coordinate.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let inner = XOnlyPublicKey::from_slice(bytes).map_err(|_| KeyError::InvalidPublicKey)?;
        Ok(Self { inner })
    }

    /// Recovers the key committed to by a Schnorr pay-to-public-key address.
    pub fn from_address(address: &Address) -> Result<Self, KeyError> {
        if address.version() != crate::address::Version::PubKey {
            return Err(KeyError::InvalidPublicKey);
        }
        Self::from_slice(address.payload())
    }

    /// Raw 32 bytes.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.serialize()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn address(&self, prefix: Prefix) -> Address {
        Address::from_public_key(prefix, &self.to_bytes())
    }

    /// Verifies a Schnorr signature over a 32-byte digest.
    pub fn verify(&self, digest: &[u8; 32], signature: &Signature) -> bool {
        let Ok(sig) = schnorr::Signature::from_slice(signature.as_bytes()) else {
            return false;
        };
        let message = Message::from_digest(*digest);
        SECP256K1.verify_schnorr(&sig, &message, &self.inner).is_ok()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Signature
// ---------------------------------------------------------------------------

/// A 64-byte BIP-340 Schnorr signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    bytes: [u8; SCHNORR_SIGNATURE_LENGTH],
}

impl Signature {
    pub fn from_bytes(bytes: [u8; SCHNORR_SIGNATURE_LENGTH]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; SCHNORR_SIGNATURE_LENGTH] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
