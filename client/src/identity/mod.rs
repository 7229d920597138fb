//! # Identity Module
//!
//! An [`Identity`] is the human-facing address of a participant: 60
//! uppercase letters that encode a 32-byte public key plus a checksum.
//!
//! ```text
//! public_key (32 bytes)
//!     -> 4 × u64 limbs -> 56 base-26 letters
//!     -> checksum18(BLAKE3(public_key)) -> 4 letters
//!     -> "BZBQFLLBNCXEMGLO..." (60 chars)
//! ```
//!
//! Parsing verifies the alphabet, the length and the checksum, so a
//! mistyped letter is caught before anything gets signed.

pub mod encoding;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::keys::PublicKey;
use encoding::{Alphabet, EncodingError};

/// An identity string failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid identity {identity:?}: {reason}")]
pub struct IdentityError {
    /// The rejected input (identities are public, so echoing is fine).
    pub identity: String,
    /// What was wrong with it.
    pub reason: EncodingError,
}

/// A validated 60-character identity together with its public key.
///
/// # Examples
///
/// ```
/// use tickcast_client::crypto::PublicKey;
/// use tickcast_client::identity::Identity;
///
/// let id = Identity::from_public_key(&PublicKey::from_bytes([7u8; 32]));
/// let parsed: Identity = id.as_str().parse().unwrap();
/// assert_eq!(parsed, id);
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    text: String,
    public_key: PublicKey,
}

impl Identity {
    /// Encode a public key as an identity.
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self {
            text: encoding::encode(public_key.as_bytes(), Alphabet::Upper),
            public_key: *public_key,
        }
    }

    /// Parse and validate an identity string.
    pub fn parse(text: &str) -> Result<Self, IdentityError> {
        let key = encoding::decode(text, Alphabet::Upper).map_err(|reason| IdentityError {
            identity: text.to_string(),
            reason,
        })?;
        Ok(Self {
            text: text.to_string(),
            public_key: PublicKey::from_bytes(key),
        })
    }

    /// The 60-character form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The public key behind this identity.
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.text)
    }
}

impl Serialize for Identity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Identity {
        Identity::from_public_key(&PublicKey::from_bytes([42u8; 32]))
    }

    #[test]
    fn parse_roundtrips_public_key() {
        let id = sample();
        let parsed = Identity::parse(id.as_str()).unwrap();
        assert_eq!(parsed.public_key(), id.public_key());
    }

    #[test]
    fn lowercase_is_not_an_identity() {
        let lower = sample().as_str().to_lowercase();
        assert!(Identity::parse(&lower).is_err());
    }

    #[test]
    fn error_names_the_input() {
        let err = Identity::parse("NOPE").unwrap_err();
        assert_eq!(err.identity, "NOPE");
        assert!(err.to_string().contains("NOPE"));
    }

    #[test]
    fn serde_uses_the_string_form() {
        let id = sample();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn serde_rejects_bad_checksum() {
        let mut text = sample().as_str().to_string();
        let last = text.pop().unwrap();
        text.push(if last == 'A' { 'B' } else { 'A' });
        let json = format!("\"{}\"", text);
        assert!(serde_json::from_str::<Identity>(&json).is_err());
    }
}
