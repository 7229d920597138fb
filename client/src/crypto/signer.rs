//! # Signer
//!
//! Seed → sub-seed → key pair → signature.
//!
//! ```text
//! seed (55 × 'a'..='z')
//!     -> digit values 0..25
//!     -> BLAKE3 derive_key -> SubSeed (32 bytes)
//!     -> Ed25519 signing key -> PublicKey
//! ```
//!
//! Ed25519 signatures are deterministic (RFC 8032): signing the same digest
//! with the same sub-seed always yields the same 64 bytes. Nothing in this
//! module logs, and seed material is wiped as soon as it goes out of scope.

use ed25519_dalek::{Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;
use zeroize::Zeroizing;

use super::hash::derive_key;
use super::keys::{PublicKey, Signature, SubSeed};
use crate::config::SEED_LENGTH;
use crate::identity::Identity;

/// Errors raised by seed parsing and signing.
///
/// Messages never include seed characters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignerError {
    /// The seed is not exactly 55 lowercase ASCII letters.
    #[error("invalid seed format: expected {expected} lowercase letters, got {got} characters")]
    InvalidSeedFormat {
        /// Required length.
        expected: usize,
        /// Observed length in characters.
        got: usize,
    },

    /// The public key handed to `sign` does not belong to the sub-seed.
    #[error("signing failed: public key does not match the sub-seed")]
    KeyMismatch,

    /// The underlying signature primitive failed.
    #[error("signing failed: {0}")]
    Primitive(String),
}

/// Derive the 32-byte sub-seed from a textual seed.
///
/// Rejects anything that is not exactly [`SEED_LENGTH`] characters in
/// `a..=z`. The intermediate digit buffer is zeroized before returning.
pub fn derive_subseed(seed: &str) -> Result<SubSeed, SignerError> {
    let bytes = seed.as_bytes();
    if bytes.len() != SEED_LENGTH || !bytes.iter().all(u8::is_ascii_lowercase) {
        return Err(SignerError::InvalidSeedFormat {
            expected: SEED_LENGTH,
            got: seed.chars().count(),
        });
    }

    let digits: Zeroizing<Vec<u8>> = Zeroizing::new(bytes.iter().map(|c| c - b'a').collect());
    Ok(SubSeed::from_bytes(derive_key(&digits)))
}

fn signing_key(subseed: &SubSeed) -> SigningKey {
    SigningKey::from_bytes(subseed.expose())
}

/// The public key that belongs to a sub-seed.
pub fn public_key(subseed: &SubSeed) -> PublicKey {
    PublicKey::from_bytes(signing_key(subseed).verifying_key().to_bytes())
}

/// The identity string that belongs to a sub-seed.
pub fn identity(subseed: &SubSeed) -> Identity {
    Identity::from_public_key(&public_key(subseed))
}

/// Sign a 32-byte digest.
///
/// `public_key` must be the key derived from `subseed`; a mismatch is a
/// [`SignerError::KeyMismatch`] rather than a silently unverifiable
/// signature.
pub fn sign(
    subseed: &SubSeed,
    public_key: &PublicKey,
    digest: &[u8; 32],
) -> Result<Signature, SignerError> {
    let key = signing_key(subseed);
    if key.verifying_key().as_bytes() != public_key.as_bytes() {
        return Err(SignerError::KeyMismatch);
    }
    let signature = key
        .try_sign(digest)
        .map_err(|e| SignerError::Primitive(e.to_string()))?;
    Ok(Signature::from_bytes(signature.to_bytes()))
}

/// Verify a signature over a digest. Invalid keys simply fail verification.
pub fn verify(public_key: &PublicKey, digest: &[u8; 32], signature: &Signature) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let signature = DalekSignature::from_bytes(signature.as_bytes());
    verifying_key.verify(digest, &signature).is_ok()
}
