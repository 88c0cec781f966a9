//! Base-32 payload codec and the 40-bit polymod checksum.
//!
//! The payload alphabet is the familiar bech32 one, but the checksum is the
//! CashAddr-style BCH code over GF(2^40) and the separator is `:`, so the
//! `bech32` crate cannot decode these strings. Everything here operates on
//! 5-bit groups ("u5"), one per output character.

use super::AddressError;
use crate::config::{ADDRESS_CHARSET, ADDRESS_CHECKSUM_CHARS};

/// Generator constants of the BCH code, one per bit of the top 5-bit group.
const GENERATORS: [u64; 5] = [
    0x98f2bc8e61,
    0x79b76d99e2,
    0xf33e5fb3c4,
    0xae2eabe2a8,
    0x1e4f43e470,
];

/// Reverse lookup from ASCII to 5-bit value. `0xff` marks characters that
/// are not in the alphabet, which includes every uppercase letter.
const CHARSET_REV: [u8; 128] = {
    let mut table = [0xffu8; 128];
    let mut i = 0;
    while i < 32 {
        table[ADDRESS_CHARSET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

fn polymod(values: impl IntoIterator<Item = u8>) -> u64 {
    let mut c = 1u64;
    for d in values {
        let c0 = c >> 35;
        c = ((c & 0x07_ffff_ffff) << 5) ^ u64::from(d);
        for (bit, generator) in GENERATORS.iter().enumerate() {
            if c0 & (1 << bit) != 0 {
                c ^= generator;
            }
        }
    }
    c ^ 1
}

/// Computes the checksum of a 5-bit payload under the given prefix.
///
/// The prefix contributes the low five bits of each of its characters,
/// followed by a zero separator, then the payload, then eight zero
/// placeholders for the checksum itself.
pub(crate) fn checksum(payload: &[u8], prefix: &str) -> u64 {
    polymod(
        prefix
            .bytes()
            .map(|c| c & 0x1f)
            .chain(std::iter::once(0))
            .chain(payload.iter().copied())
            .chain([0u8; ADDRESS_CHECKSUM_CHARS]),
    )
}

/// Regroups 8-bit bytes into 5-bit values, zero-padding the tail.
pub(crate) fn conv8to5(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity((data.len() * 8).div_ceil(5));
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &byte in data {
        acc = (acc << 8) | u32::from(byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 0x1f) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 0x1f) as u8);
    }
    out
}

/// Regroups 5-bit values into bytes, dropping the trailing padding bits.
pub(crate) fn conv5to8(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 5 / 8);
    let mut acc: u32 = 0;
    let mut bits = 0u32;
    for &value in data {
        acc = (acc << 5) | u32::from(value);
        bits += 5;
        while bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
        acc &= (1 << bits) - 1;
    }
    out
}

/// Encodes `data` (version byte followed by key or hash) into the textual
/// payload that follows `prefix:`.
pub(crate) fn encode_payload(prefix: &str, data: &[u8]) -> String {
    let payload = conv8to5(data);
    let checksum = checksum(&payload, prefix);
    // 40-bit checksum lives in the low five bytes of the u64.
    let checksum_u5 = conv8to5(&checksum.to_be_bytes()[3..]);

    payload
        .iter()
        .chain(checksum_u5.iter())
        .map(|&v| ADDRESS_CHARSET[v as usize] as char)
        .collect()
}

/// Decodes the textual payload back into bytes, verifying the checksum.
pub(crate) fn decode_payload(prefix: &str, encoded: &str) -> Result<Vec<u8>, AddressError> {
    let mut values = Vec::with_capacity(encoded.len());
    for c in encoded.chars() {
        let value = if c.is_ascii() {
            CHARSET_REV[c as usize]
        } else {
            0xff
        };
        if value == 0xff {
            return Err(AddressError::InvalidAddressFormat(format!(
                "character '{c}' is not in the address alphabet"
            )));
        }
        values.push(value);
    }

    if values.len() <= ADDRESS_CHECKSUM_CHARS {
        return Err(AddressError::InvalidAddressFormat(
            "payload shorter than its checksum".to_string(),
        ));
    }

    let (payload, checksum_u5) = values.split_at(values.len() - ADDRESS_CHECKSUM_CHARS);
    let actual = checksum_u5
        .iter()
        .fold(0u64, |acc, &v| (acc << 5) | u64::from(v));
    if checksum(payload, prefix) != actual {
        return Err(AddressError::ChecksumMismatch);
    }

    Ok(conv5to8(payload))
}
