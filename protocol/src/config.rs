//! # Protocol Configuration & Constants
//!
//! Every magic number the engine depends on lives here. If you're hardcoding
//! a constant somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! Most of these values are not ours to choose: they are dictated by the
//! Kaspa consensus rules and by the shape of the indexer's broadcast
//! endpoint. Changing them does not make the engine "more flexible", it
//! makes it produce transactions that nodes reject.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Number of sompi (the smallest indivisible unit) in one KAS.
///
/// This is the fixed scale factor applied exactly once, at the boundary,
/// when a user-supplied decimal amount becomes an integer amount.
pub const SOMPI_PER_KAS: u64 = 100_000_000;

/// Number of decimal places shown when formatting sompi as KAS.
pub const KAS_DECIMALS: usize = 8;

/// Change outputs below this many sompi are not created. The change is
/// forfeited to the miner as extra fee instead. 0.02 KAS.
pub const DUST_THRESHOLD_SOMPI: u64 = 2_000_000;

// ---------------------------------------------------------------------------
// Address Format
// ---------------------------------------------------------------------------

/// Address prefix for mainnet.
pub const MAINNET_PREFIX: &str = "kaspa";

/// Address prefix for testnet.
pub const TESTNET_PREFIX: &str = "kaspatest";

/// Address prefix for simnet.
pub const SIMNET_PREFIX: &str = "kaspasim";

/// Address prefix for devnet.
pub const DEVNET_PREFIX: &str = "kaspadev";

/// Separator between the prefix and the encoded payload.
pub const ADDRESS_SEPARATOR: char = ':';

/// The 32-character base-32 alphabet used for the encoded payload.
pub const ADDRESS_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Number of 5-bit characters taken by the checksum (40 bits).
pub const ADDRESS_CHECKSUM_CHARS: usize = 8;

/// Shortest accepted payload (version byte + 32-byte key/hash + checksum).
pub const MIN_ADDRESS_PAYLOAD_CHARS: usize = 61;

/// Longest accepted payload (version byte + 33-byte ECDSA key + checksum).
pub const MAX_ADDRESS_PAYLOAD_CHARS: usize = 63;

// ---------------------------------------------------------------------------
// Script Opcodes
// ---------------------------------------------------------------------------

/// Push the next 32 bytes.
pub const OP_DATA_32: u8 = 0x20;

/// Push the next 33 bytes.
pub const OP_DATA_33: u8 = 0x21;

/// Push the next 65 bytes. Prefixes every Schnorr signature script.
pub const OP_DATA_65: u8 = 0x41;

/// Equality check, closes a pay-to-script-hash script.
pub const OP_EQUAL: u8 = 0x87;

/// BLAKE2b hash of the top stack item, opens a pay-to-script-hash script.
pub const OP_BLAKE2B: u8 = 0xaa;

/// ECDSA signature check.
pub const OP_CHECKSIG_ECDSA: u8 = 0xab;

/// Schnorr signature check.
pub const OP_CHECKSIG: u8 = 0xac;

/// Script version carried by every locking script we produce.
pub const SCRIPT_PUBLIC_KEY_VERSION: u16 = 0;

// ---------------------------------------------------------------------------
// Transaction Fields
// ---------------------------------------------------------------------------

/// Transaction version. Kaspa only knows version 0.
pub const TX_VERSION: u16 = 0;

/// Lock time. We never build time-locked payments.
pub const TX_LOCK_TIME: u64 = 0;

/// Gas. Only meaningful on non-native subnetworks.
pub const TX_GAS: u64 = 0;

/// Sequence number carried by every input.
pub const TX_INPUT_SEQUENCE: u64 = 0;

/// Signature operations per input. A single Schnorr check.
pub const TX_INPUT_SIG_OP_COUNT: u8 = 1;

/// The native (default) subnetwork id: twenty zero bytes.
pub const SUBNETWORK_ID_NATIVE: [u8; 20] = [0u8; 20];

/// Sighash type ALL: commit to every input and every output.
pub const SIG_HASH_ALL: u8 = 0x01;

/// Length of a Schnorr signature in bytes.
pub const SCHNORR_SIGNATURE_LENGTH: usize = 64;

/// Length of a signature script: push opcode + signature + sighash byte.
pub const SIGNATURE_SCRIPT_LENGTH: usize = SCHNORR_SIGNATURE_LENGTH + 2;

/// Length of a transaction id / hash in bytes.
pub const HASH_LENGTH: usize = 32;

/// Ask the receiving node to accept the transaction even if a parent is
/// still missing from its view.
pub const BROADCAST_ALLOW_ORPHAN: bool = true;

// ---------------------------------------------------------------------------
// Indexer Defaults
// ---------------------------------------------------------------------------

/// Default base URL of the public REST indexer.
pub const DEFAULT_INDEXER_URL: &str = "https://api.kaspa.org";

/// Default per-request timeout towards the indexer. The core never retries,
/// so this is the whole budget for one upstream call.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Default page size for transaction history.
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

/// Largest history page we are willing to request in one go.
pub const MAX_HISTORY_LIMIT: u32 = 500;

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Formats an integer sompi amount as a fixed 8-decimal KAS string.
///
/// Strings, not floats, cross the API boundary so that no client ever sees
/// `0.30000000000000004` KAS.
pub fn format_sompi(sompi: u64) -> String {
    let whole = sompi / SOMPI_PER_KAS;
    let frac = sompi % SOMPI_PER_KAS;
    format!("{}.{:0>width$}", whole, frac, width = KAS_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_are_distinct() {
        let all = [MAINNET_PREFIX, TESTNET_PREFIX, SIMNET_PREFIX, DEVNET_PREFIX];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_charset_has_no_duplicates() {
        let mut seen = [false; 256];
        for &c in ADDRESS_CHARSET {
            assert!(!seen[c as usize], "duplicate charset symbol {}", c as char);
            seen[c as usize] = true;
        }
    }

    #[test]
    fn test_dust_threshold_is_two_hundredths_of_a_kas() {
        assert_eq!(DUST_THRESHOLD_SOMPI * 50, SOMPI_PER_KAS);
    }

    #[test]
    fn test_signature_script_length() {
        assert_eq!(SIGNATURE_SCRIPT_LENGTH, 66);
    }

    #[test]
    fn test_format_sompi() {
        assert_eq!(format_sompi(0), "0.00000000");
        assert_eq!(format_sompi(1), "0.00000001");
        assert_eq!(format_sompi(150_000_000), "1.50000000");
        assert_eq!(format_sompi(49_990_000), "0.49990000");
        assert_eq!(format_sompi(u64::MAX), "184467440737.09551615");
    }
}
