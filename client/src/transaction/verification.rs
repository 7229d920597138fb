//! Transaction validation errors and signature re-verification.
//!
//! Builder checks run cheapest first (integer comparisons before identity
//! parsing), and the signature check is the only one that touches the curve.

use thiserror::Error;

use super::Transaction;
use crate::crypto::signer;
use crate::identity::IdentityError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A transfer could not be built.
///
/// All variants are validation failures and therefore fatal to a submission.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// Amounts must be strictly positive.
    #[error("invalid amount {amount}: must be > 0")]
    InvalidAmount {
        /// The rejected amount.
        amount: i64,
    },

    /// The source or destination is not a well-formed identity.
    #[error("invalid {role} identity")]
    InvalidIdentity {
        /// `"source"` or `"destination"`.
        role: &'static str,
        /// The parse failure.
        #[source]
        source: IdentityError,
    },

    /// The input payload exceeds the protocol limit.
    #[error("input payload is {size} bytes (max {max})")]
    InputTooLarge {
        /// Observed payload size.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },
}

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

impl Transaction {
    /// Re-check the signature against the source identity's public key.
    pub fn verify_signature(&self) -> bool {
        signer::verify(
            self.unsigned.source.public_key(),
            &self.unsigned.digest(),
            &self.signature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::Signature;
    use crate::crypto::signer::{derive_subseed, identity};
    use crate::transaction::{sign_transaction, UnsignedTransaction};

    const SEED: &str = "abcdefghijklmnopqrstuvwxyzabcdefghijklmnopqrstuvwxyzabc";

    fn unsigned() -> UnsignedTransaction {
        let subseed = derive_subseed(SEED).unwrap();
        let source = identity(&subseed);
        let dest = identity(&derive_subseed(&"z".repeat(55)).unwrap());
        UnsignedTransaction::transfer(source.as_str(), dest.as_str(), 1_000, 42).unwrap()
    }

    #[test]
    fn signed_transaction_verifies() {
        let subseed = derive_subseed(SEED).unwrap();
        let tx = sign_transaction(unsigned(), &subseed).unwrap();
        assert!(tx.verify_signature());
    }

    #[test]
    fn forged_signature_does_not_verify() {
        let tx = unsigned().finalize(Signature::from_bytes([7u8; 64]));
        assert!(!tx.verify_signature());
    }

    #[test]
    fn error_messages_name_the_problem() {
        let err = TransactionError::InvalidAmount { amount: -3 };
        assert_eq!(err.to_string(), "invalid amount -3: must be > 0");

        let err = TransactionError::InputTooLarge { size: 2000, max: 1024 };
        assert!(err.to_string().contains("2000"));
    }

    #[test]
    fn identity_error_is_reachable_as_source() {
        use std::error::Error as _;
        let err = UnsignedTransaction::transfer("BAD", "BAD", 1, 1).unwrap_err();
        assert!(err.source().is_some());
    }
}
