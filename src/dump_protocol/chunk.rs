//! Decoding of `CHUNK:` payloads.
//!
//! A payload is a run of hex digit pairs with no separators. Every complete
//! pair produces one byte; a trailing unpaired digit is dropped.

use log::warn;

/// Decode every complete pair of hex digits in `payload` into a new buffer.
///
/// Decoding is case-insensitive. A trailing odd digit is silently dropped and
/// a pair containing a non-hex character is skipped.
///
/// ```
/// assert_eq!(macdump::decode_pairs("0a1B"), vec![0x0a, 0x1b]);
/// assert_eq!(macdump::decode_pairs("0a1"), vec![0x0a]);
/// ```
pub fn decode_pairs(payload: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(payload.len() / 2);
    decode_pairs_into(payload, &mut bytes);
    bytes
}

/// Same as [`decode_pairs`] but appends to an existing buffer. Returns the
/// number of bytes appended.
pub fn decode_pairs_into(payload: &str, out: &mut Vec<u8>) -> usize {
    let before = out.len();
    let mut byte = [0_u8; 1];
    for (index, pair) in payload.as_bytes().chunks_exact(2).enumerate() {
        match hex::decode_to_slice(pair, &mut byte) {
            Ok(()) => out.push(byte[0]),
            Err(e) => warn!(
                "skipping malformed hex pair `{}` at offset {}: {}",
                String::from_utf8_lossy(pair),
                index * 2,
                e
            ),
        }
    }
    out.len() - before
}

// =============================================================================
// Unit Tests
// =============================================================================
