//! Locking scripts and signature scripts.
//!
//! We never interpret scripts. We build the handful of fixed templates the
//! engine needs and pull the signature back out of a signature script for
//! verification.

use std::fmt;

use crate::config::{OP_DATA_65, SCHNORR_SIGNATURE_LENGTH, SIGNATURE_SCRIPT_LENGTH, SIG_HASH_ALL};
use crate::crypto::keys::Signature;

/// A locking script together with its script version.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ScriptPublicKey {
    version: u16,
    script: Vec<u8>,
}

impl ScriptPublicKey {
    /// Wraps raw script bytes.
    pub fn new(version: u16, script: Vec<u8>) -> Self {
        Self { version, script }
    }

    /// Decodes a hex-encoded script.
    pub fn from_hex(version: u16, script_hex: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self::new(version, hex::decode(script_hex)?))
    }

    /// Script version.
    pub fn version(&self) -> u16 {
        self.version
    }

    /// Raw script bytes.
    pub fn script(&self) -> &[u8] {
        &self.script
    }

    /// Hex encoding of the script bytes (version not included).
    pub fn to_hex(&self) -> String {
        hex::encode(&self.script)
    }
}

impl fmt::Debug for ScriptPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptPublicKey(v{}, {})", self.version, self.to_hex())
    }
}

/// Builds the signature script for a Schnorr signature with sighash ALL:
/// `OP_DATA_65 || sig(64) || 0x01`.
pub fn signature_script(signature: &Signature) -> Vec<u8> {
    let mut script = Vec::with_capacity(SIGNATURE_SCRIPT_LENGTH);
    script.push(OP_DATA_65);
    script.extend_from_slice(signature.as_bytes());
    script.push(SIG_HASH_ALL);
    script
}

/// Extracts the signature and sighash type from a signature script built by
/// [`signature_script`]. Returns `None` for anything of a different shape.
pub fn parse_signature_script(script: &[u8]) -> Option<(Signature, u8)> {
    if script.len() != SIGNATURE_SCRIPT_LENGTH || script[0] != OP_DATA_65 {
        return None;
    }
    let mut sig = [0u8; SCHNORR_SIGNATURE_LENGTH];
    sig.copy_from_slice(&script[1..=SCHNORR_SIGNATURE_LENGTH]);
    Some((Signature::from_bytes(sig), script[SIGNATURE_SCRIPT_LENGTH - 1]))
}
