//! # Key Material
//!
//! Fixed-size wrappers for the three byte strings the signer deals in:
//! the secret [`SubSeed`], the public [`PublicKey`] and the 64-byte
//! [`Signature`].
//!
//! `SubSeed` is zeroized on drop and never prints its bytes. It does not
//! implement `Serialize`, `Clone` or `Display`: the only way to get one is
//! [`super::signer::derive_subseed`], and the only thing to do with it is sign.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::{KEY_LENGTH, SIGNATURE_LENGTH};

/// The 32-byte secret derived from a seed. Used as the signing key.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SubSeed {
    bytes: [u8; KEY_LENGTH],
}

impl SubSeed {
    pub(crate) fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self { bytes }
    }

    pub(crate) fn expose(&self) -> &[u8; KEY_LENGTH] {
        &self.bytes
    }
}

impl fmt::Debug for SubSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubSeed(<redacted>)")
    }
}

/// A 32-byte public key, the raw form behind an identity string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey([u8; KEY_LENGTH]);

impl PublicKey {
    /// Wrap raw key bytes. No curve-point validation happens here; that is
    /// deferred to signature verification.
    pub const fn from_bytes(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Lowercase hex, for logs.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

/// A 64-byte signature over an unsigned transaction digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// Wrap raw signature bytes.
    pub const fn from_bytes(bytes: [u8; SIGNATURE_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse a signature from a byte slice of exactly 64 bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let array: [u8; SIGNATURE_LENGTH] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    /// Raw signature bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Lowercase hex, the form archive listings use.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", self.to_hex())
    }
}
