//! Base-26 key encoding shared by identities (uppercase) and transaction IDs
//! (lowercase).
//!
//! ```text
//! key (32 bytes) = 4 × u64 little-endian limbs
//! each limb      -> 14 base-26 digits, least significant first   (56 chars)
//! checksum18(key) -> 4 base-26 digits, least significant first   ( 4 chars)
//! ```

use thiserror::Error;

use crate::config::{IDENTITY_BODY_LENGTH, IDENTITY_LENGTH, IDENTITY_LIMB_DIGITS, KEY_LENGTH};
use crate::crypto::hash::checksum18;

/// Letter case of the encoded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alphabet {
    /// `A..=Z`, used for identities.
    Upper,
    /// `a..=z`, used for transaction IDs.
    Lower,
}

impl Alphabet {
    fn base(self) -> u8 {
        match self {
            Self::Upper => b'A',
            Self::Lower => b'a',
        }
    }

    fn digit(self, c: u8) -> Option<u64> {
        let base = self.base();
        (base..base + 26)
            .contains(&c)
            .then(|| u64::from(c - base))
    }
}

/// Why an encoded key failed to parse.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// Not exactly 60 characters.
    #[error("expected {expected} characters, got {got}")]
    Length {
        /// Required length.
        expected: usize,
        /// Observed length.
        got: usize,
    },

    /// A character outside the alphabet.
    #[error("invalid character {character:?} at position {position}")]
    Character {
        /// Offending character.
        character: char,
        /// Zero-based index.
        position: usize,
    },

    /// A limb does not fit in 64 bits.
    #[error("limb {limb} overflows 64 bits")]
    Overflow {
        /// Zero-based limb index.
        limb: usize,
    },

    /// The trailing four characters do not match the key's checksum.
    #[error("checksum mismatch")]
    Checksum,
}

/// Encode a 32-byte key into its 60-character form.
pub fn encode(key: &[u8; KEY_LENGTH], alphabet: Alphabet) -> String {
    let base = alphabet.base();
    let mut out = Vec::with_capacity(IDENTITY_LENGTH);

    for chunk in key.chunks_exact(8) {
        let mut limb = u64::from_le_bytes(chunk.try_into().unwrap_or([0u8; 8]));
        for _ in 0..IDENTITY_LIMB_DIGITS {
            out.push(base + (limb % 26) as u8);
            limb /= 26;
        }
    }

    let mut checksum = checksum18(key);
    for _ in 0..4 {
        out.push(base + (checksum % 26) as u8);
        checksum /= 26;
    }

    out.into_iter().map(char::from).collect()
}

/// Decode a 60-character form back into its key, verifying the checksum.
pub fn decode(text: &str, alphabet: Alphabet) -> Result<[u8; KEY_LENGTH], EncodingError> {
    let bytes = text.as_bytes();
    if bytes.len() != IDENTITY_LENGTH {
        return Err(EncodingError::Length {
            expected: IDENTITY_LENGTH,
            got: text.chars().count(),
        });
    }

    let mut digits = [0u64; IDENTITY_LENGTH];
    for (position, &c) in bytes.iter().enumerate() {
        digits[position] = alphabet.digit(c).ok_or(EncodingError::Character {
            character: char::from(c),
            position,
        })?;
    }

    let mut key = [0u8; KEY_LENGTH];
    for limb in 0..4 {
        let start = limb * IDENTITY_LIMB_DIGITS;
        let mut value: u64 = 0;
        for &d in digits[start..start + IDENTITY_LIMB_DIGITS].iter().rev() {
            value = value
                .checked_mul(26)
                .and_then(|v| v.checked_add(d))
                .ok_or(EncodingError::Overflow { limb })?;
        }
        key[limb * 8..limb * 8 + 8].copy_from_slice(&value.to_le_bytes());
    }

    let checksum = digits[IDENTITY_BODY_LENGTH..]
        .iter()
        .rev()
        .fold(0u64, |acc, d| acc * 26 + d);
    if checksum != u64::from(checksum18(&key)) {
        return Err(EncodingError::Checksum);
    }

    Ok(key)
}
