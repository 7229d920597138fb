//! # Hashing Utilities
//!
//! Every hash in the client is BLAKE3: unsigned digests, transaction IDs,
//! identity checksums and sub-seed derivation. Keeping a single function
//! family means the canonical encodings only have one thing to agree on.

use crate::config::{KEY_LENGTH, SUBSEED_DERIVATION_CONTEXT};

/// Compute the 32-byte BLAKE3 hash of the input data.
///
/// # Example
///
/// ```
/// use tickcast_client::crypto::hash::digest32;
///
/// let hash = digest32(b"tick 1010");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn digest32(data: &[u8]) -> [u8; KEY_LENGTH] {
    *blake3::hash(data).as_bytes()
}

/// Derive key material from seed digits with BLAKE3's key-derivation mode.
///
/// The context string is fixed and global, so the derivation is fully
/// determined by `material`.
pub fn derive_key(material: &[u8]) -> [u8; KEY_LENGTH] {
    blake3::derive_key(SUBSEED_DERIVATION_CONTEXT, material)
}

/// The 18-bit checksum embedded in identity strings: the first three bytes
/// of the hash of the key, little-endian, masked to 18 bits.
pub fn checksum18(key: &[u8; KEY_LENGTH]) -> u32 {
    let hash = digest32(key);
    (u32::from(hash[0]) | u32::from(hash[1]) << 8 | u32::from(hash[2]) << 16) & 0x3FFFF
}
