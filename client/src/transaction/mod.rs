//! # Transaction Module
//!
//! Construction, signing, encoding and verification of value transfers.
//!
//! ## Architecture
//!
//! ```text
//! types.rs       : TickNumber, Digest and the TxId value type
//! builder.rs     : TransactionBuilder and UnsignedTransaction (canonical bytes, digest)
//! signing.rs     : sign_transaction: digest -> Ed25519 -> finalize
//! codec.rs       : signed wire encoding, base64 form, strict decoding
//! verification.rs: TransactionError and signature re-verification
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build**: [`TransactionBuilder`] validates amount, identities and input.
//! 2. **Sign**: [`sign_transaction`] signs the unsigned digest.
//! 3. **Finalize**: the signature is attached and the [`TxId`] fixed.
//! 4. **Encode**: [`codec::encode_base64`] produces the broadcast payload.
//!
//! A [`Transaction`] is immutable once signed. Amounts are `i64` in the
//! smallest unit.

pub mod builder;
pub mod codec;
pub mod signing;
pub mod types;
pub mod verification;

pub use builder::{TransactionBuilder, UnsignedTransaction};
pub use codec::CodecError;
pub use signing::sign_transaction;
pub use types::{Digest, TickNumber, TxId};
pub use verification::TransactionError;

use crate::crypto::keys::Signature;
use crate::identity::Identity;

/// A signed, finalized transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub(crate) unsigned: UnsignedTransaction,
    pub(crate) signature: Signature,
    pub(crate) id: TxId,
}

impl Transaction {
    /// Transaction ID: hash of the signed encoding.
    pub fn id(&self) -> TxId {
        self.id
    }

    /// The signature over [`Self::digest`].
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The unsigned digest that was signed.
    pub fn digest(&self) -> Digest {
        self.unsigned.digest()
    }

    /// Sending identity.
    pub fn source(&self) -> &Identity {
        self.unsigned.source()
    }

    /// Receiving identity.
    pub fn destination(&self) -> &Identity {
        self.unsigned.destination()
    }

    /// Transferred amount.
    pub fn amount(&self) -> i64 {
        self.unsigned.amount()
    }

    /// Target tick.
    pub fn tick(&self) -> TickNumber {
        self.unsigned.tick()
    }

    /// Input type discriminant.
    pub fn input_type(&self) -> u16 {
        self.unsigned.input_type()
    }

    /// Input payload.
    pub fn input(&self) -> &[u8] {
        self.unsigned.input()
    }

    /// Signed wire bytes.
    pub fn encode(&self) -> Vec<u8> {
        codec::encode(self)
    }

    /// Signed wire bytes as standard base64.
    pub fn to_base64(&self) -> String {
        codec::encode_base64(self)
    }
}
