//! Transaction signing.
//!
//! Signing is a separate step from building so the unsigned digest can be
//! produced without key material in scope. The sub-seed is borrowed, never
//! stored on the transaction.

use super::builder::UnsignedTransaction;
use super::Transaction;
use crate::crypto::keys::SubSeed;
use crate::crypto::signer::{self, SignerError};

/// Sign an unsigned transaction with the sub-seed behind its source identity.
///
/// The procedure:
/// 1. Compute the unsigned digest.
/// 2. Produce an Ed25519 signature over it, checking that the sub-seed owns
///    the source public key.
/// 3. Finalize, which fixes the transaction ID.
///
/// Fails with [`SignerError::KeyMismatch`] when `subseed` does not belong to
/// the source identity.
pub fn sign_transaction(
    unsigned: UnsignedTransaction,
    subseed: &SubSeed,
) -> Result<Transaction, SignerError> {
    let digest = unsigned.digest();
    let signature = signer::sign(subseed, unsigned.source.public_key(), &digest)?;
    Ok(unsigned.finalize(signature))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
