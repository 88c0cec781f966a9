//! # Address Codec
//!
//! A Kaspa address is the human-facing name of a locking script:
//!
//! ```text
//! kaspa:qp0l70zd5x85ttwd6jv7g3s3a8llzj96d8dncn4zmhv4tlzx5k2jyqh70xmfj
//! ^^^^^ ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! prefix  base-32( version || key-or-hash ) || 40-bit checksum
//! ```
//!
//! Parsing is strict: a known network prefix, 61-63 lowercase characters
//! from the address alphabet, a valid checksum, a known version byte and a
//! payload of exactly the length that version demands. Anything else is
//! rejected before a single byte of network or signing work is done.
//!
//! An address maps deterministically to the script bytes paid to it via
//! [`Address::to_locking_script`], and back via [`Address::from_locking_script`].

mod encoding;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{
    ADDRESS_SEPARATOR, DEVNET_PREFIX, MAINNET_PREFIX, MAX_ADDRESS_PAYLOAD_CHARS,
    MIN_ADDRESS_PAYLOAD_CHARS, OP_BLAKE2B, OP_CHECKSIG, OP_CHECKSIG_ECDSA, OP_DATA_32, OP_DATA_33,
    OP_EQUAL, SCRIPT_PUBLIC_KEY_VERSION, SIMNET_PREFIX, TESTNET_PREFIX,
};
use crate::transaction::script::ScriptPublicKey;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while parsing or deriving addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The string does not match the textual address pattern: wrong or
    /// missing prefix, wrong length, or characters outside the alphabet.
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    /// The string is well-formed but its checksum does not verify.
    #[error("address checksum mismatch")]
    ChecksumMismatch,

    /// The version byte does not name a known script class.
    #[error("unsupported address version: {0:#04x}")]
    UnsupportedVersion(u8),

    /// The decoded payload has the wrong length for its version.
    #[error("invalid address payload length: expected {expected} bytes, got {got}")]
    InvalidPayloadLength {
        /// Length mandated by the version byte.
        expected: usize,
        /// Length actually decoded.
        got: usize,
    },

    /// A locking script that is not one of the three standard templates.
    #[error("script does not correspond to a standard address")]
    NonStandardScript,

    /// An address of a different network than the one expected.
    #[error("address belongs to {got}, expected {expected}")]
    WrongNetwork {
        /// Network the caller is bound to.
        expected: Prefix,
        /// Network the address encodes.
        got: Prefix,
    },
}

// ---------------------------------------------------------------------------
// Prefix
// ---------------------------------------------------------------------------

/// Network an address belongs to, rendered as its textual prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// `kaspa:`
    Mainnet,
    /// `kaspatest:`
    Testnet,
    /// `kaspasim:`
    Simnet,
    /// `kaspadev:`
    Devnet,
}

impl Prefix {
    /// The literal prefix string, without the separator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => MAINNET_PREFIX,
            Self::Testnet => TESTNET_PREFIX,
            Self::Simnet => SIMNET_PREFIX,
            Self::Devnet => DEVNET_PREFIX,
        }
    }

    fn from_prefix_str(s: &str) -> Option<Self> {
        match s {
            MAINNET_PREFIX => Some(Self::Mainnet),
            TESTNET_PREFIX => Some(Self::Testnet),
            SIMNET_PREFIX => Some(Self::Simnet),
            DEVNET_PREFIX => Some(Self::Devnet),
            _ => None,
        }
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts either the network name (`mainnet`, `testnet`, ...) or the
/// address prefix itself (`kaspa`, `kaspatest`, ...). Used by the CLI.
impl FromStr for Prefix {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "simnet" => Ok(Self::Simnet),
            "devnet" => Ok(Self::Devnet),
            other => Self::from_prefix_str(other).ok_or_else(|| {
                AddressError::InvalidAddressFormat(format!("unknown network '{other}'"))
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// The script class an address commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// 32-byte x-only Schnorr public key.
    PubKey,
    /// 33-byte compressed ECDSA public key.
    PubKeyEcdsa,
    /// 32-byte BLAKE2b hash of a redeem script.
    ScriptHash,
}

impl Version {
    /// The version byte as encoded in the address payload.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::PubKey => 0x00,
            Self::PubKeyEcdsa => 0x01,
            Self::ScriptHash => 0x08,
        }
    }

    /// Number of payload bytes following the version byte.
    pub fn payload_len(self) -> usize {
        match self {
            Self::PubKey | Self::ScriptHash => 32,
            Self::PubKeyEcdsa => 33,
        }
    }

    fn from_u8(byte: u8) -> Result<Self, AddressError> {
        match byte {
            0x00 => Ok(Self::PubKey),
            0x01 => Ok(Self::PubKeyEcdsa),
            0x08 => Ok(Self::ScriptHash),
            other => Err(AddressError::UnsupportedVersion(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A validated address. Construction goes through [`Address::parse`] or one
/// of the typed constructors, so holding an `Address` means it is well-formed.
///
/// # Examples
///
/// ```
/// use kasgate_protocol::address::{Address, Prefix};
///
/// let addr = Address::parse(
///     "kaspa:qp0l70zd5x85ttwd6jv7g3s3a8llzj96d8dncn4zmhv4tlzx5k2jyqh70xmfj",
/// ).unwrap();
/// assert_eq!(addr.prefix(), Prefix::Mainnet);
/// assert_eq!(addr.to_locking_script().script().len(), 34);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    prefix: Prefix,
    version: Version,
    payload: Vec<u8>,
}

impl Address {
    /// Builds an address from its parts, checking the payload length.
    pub fn new(prefix: Prefix, version: Version, payload: &[u8]) -> Result<Self, AddressError> {
        if payload.len() != version.payload_len() {
            return Err(AddressError::InvalidPayloadLength {
                expected: version.payload_len(),
                got: payload.len(),
            });
        }
        Ok(Self {
            prefix,
            version,
            payload: payload.to_vec(),
        })
    }

    /// The pay-to-public-key address of an x-only Schnorr key.
    pub fn from_public_key(prefix: Prefix, x_only_key: &[u8; 32]) -> Self {
        Self {
            prefix,
            version: Version::PubKey,
            payload: x_only_key.to_vec(),
        }
    }

    /// Parses and fully validates an address string.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let (prefix_str, encoded) = address.split_once(ADDRESS_SEPARATOR).ok_or_else(|| {
            AddressError::InvalidAddressFormat("missing network prefix".to_string())
        })?;

        let prefix = Prefix::from_prefix_str(prefix_str).ok_or_else(|| {
            AddressError::InvalidAddressFormat(format!("unknown prefix '{prefix_str}'"))
        })?;

        // Character count, not byte count: a multi-byte character would
        // otherwise slip a short string past the length gate.
        let len = encoded.chars().count();
        if !(MIN_ADDRESS_PAYLOAD_CHARS..=MAX_ADDRESS_PAYLOAD_CHARS).contains(&len) {
            return Err(AddressError::InvalidAddressFormat(format!(
                "payload must be {MIN_ADDRESS_PAYLOAD_CHARS}-{MAX_ADDRESS_PAYLOAD_CHARS} characters, got {len}"
            )));
        }

        let data = encoding::decode_payload(prefix.as_str(), encoded)?;
        let (&version_byte, payload) = data.split_first().ok_or_else(|| {
            AddressError::InvalidAddressFormat("empty payload".to_string())
        })?;
        let version = Version::from_u8(version_byte)?;

        Self::new(prefix, version, payload)
    }

    /// Parses an address and additionally requires it to belong to `network`.
    pub fn parse_for_network(address: &str, network: Prefix) -> Result<Self, AddressError> {
        let parsed = Self::parse(address)?;
        if parsed.prefix != network {
            return Err(AddressError::WrongNetwork {
                expected: network,
                got: parsed.prefix,
            });
        }
        Ok(parsed)
    }

    /// The network this address belongs to.
    pub fn prefix(&self) -> Prefix {
        self.prefix
    }

    /// The script class this address commits to.
    pub fn version(&self) -> Version {
        self.version
    }

    /// The raw key or hash bytes, without the version byte.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Derives the locking script paid to this address.
    ///
    /// Used for the recipient output and, with the sender's own address,
    /// for the change output.
    pub fn to_locking_script(&self) -> ScriptPublicKey {
        let mut script = Vec::with_capacity(self.payload.len() + 3);
        match self.version {
            Version::PubKey => {
                script.push(OP_DATA_32);
                script.extend_from_slice(&self.payload);
                script.push(OP_CHECKSIG);
            }
            Version::PubKeyEcdsa => {
                script.push(OP_DATA_33);
                script.extend_from_slice(&self.payload);
                script.push(OP_CHECKSIG_ECDSA);
            }
            Version::ScriptHash => {
                script.push(OP_BLAKE2B);
                script.push(OP_DATA_32);
                script.extend_from_slice(&self.payload);
                script.push(OP_EQUAL);
            }
        }
        ScriptPublicKey::new(SCRIPT_PUBLIC_KEY_VERSION, script)
    }

    /// Recovers the address a standard locking script pays to.
    pub fn from_locking_script(
        prefix: Prefix,
        script_public_key: &ScriptPublicKey,
    ) -> Result<Self, AddressError> {
        let script = script_public_key.script();
        match script {
            [OP_DATA_32, key @ .., OP_CHECKSIG] if key.len() == 32 => {
                Self::new(prefix, Version::PubKey, key)
            }
            [OP_DATA_33, key @ .., OP_CHECKSIG_ECDSA] if key.len() == 33 => {
                Self::new(prefix, Version::PubKeyEcdsa, key)
            }
            [OP_BLAKE2B, OP_DATA_32, hash @ .., OP_EQUAL] if hash.len() == 32 => {
                Self::new(prefix, Version::ScriptHash, hash)
            }
            _ => Err(AddressError::NonStandardScript),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut data = Vec::with_capacity(self.payload.len() + 1);
        data.push(self.version.to_u8());
        data.extend_from_slice(&self.payload);
        write!(
            f,
            "{}{}{}",
            self.prefix,
            ADDRESS_SEPARATOR,
            encoding::encode_payload(self.prefix.as_str(), &data)
        )
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
