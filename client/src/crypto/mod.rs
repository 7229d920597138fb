//! # Cryptographic Primitives
//!
//! - **hash**: BLAKE3 digests, key derivation and identity checksums.
//! - **keys**: `SubSeed`, `PublicKey` and `Signature` wrappers.
//! - **signer**: sub-seed derivation, Ed25519 signing and verification.
//!
//! Everything here is a thin, type-safe layer over audited crates
//! (`blake3`, `ed25519-dalek`). Key bytes are never logged.

pub mod hash;
pub mod keys;
pub mod signer;

pub use keys::{PublicKey, Signature, SubSeed};
pub use signer::{derive_subseed, sign, verify, SignerError};
