//! Transaction construction via the builder pattern.
//!
//! The [`TransactionBuilder`] collects the fields, validates them in
//! `build()`, and returns an [`UnsignedTransaction`] whose digest is ready
//! to sign. The builder never touches key material; signing happens in
//! [`super::signing`].

use crate::config::{INPUT_TYPE_TRANSFER, MAX_INPUT_SIZE, TRANSACTION_HEADER_SIZE};
use crate::crypto::hash::digest32;
use crate::crypto::keys::Signature;
use crate::identity::Identity;

use super::types::{Digest, TickNumber, TxId};
use super::{Transaction, TransactionError};

// ---------------------------------------------------------------------------
// UnsignedTransaction
// ---------------------------------------------------------------------------

/// A validated transfer that has not been signed yet.
///
/// # Canonical Byte Format
///
/// ```text
/// source public key   32 bytes
/// dest public key     32 bytes
/// amount              i64 LE
/// tick                u32 LE
/// input type          u16 LE
/// input size          u16 LE
/// input               input size bytes
/// ```
///
/// The digest is BLAKE3 over exactly these bytes. Field order and widths are
/// part of the wire contract with the remote verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedTransaction {
    pub(crate) source: Identity,
    pub(crate) destination: Identity,
    pub(crate) amount: i64,
    pub(crate) tick: TickNumber,
    pub(crate) input_type: u16,
    pub(crate) input: Vec<u8>,
}

impl UnsignedTransaction {
    /// Build a plain transfer. Shorthand for the builder with no input.
    pub fn transfer(
        source: &str,
        destination: &str,
        amount: i64,
        tick: TickNumber,
    ) -> Result<Self, TransactionError> {
        TransactionBuilder::new(source, destination)
            .amount(amount)
            .tick(tick)
            .build()
    }

    /// Sending identity.
    pub fn source(&self) -> &Identity {
        &self.source
    }

    /// Receiving identity.
    pub fn destination(&self) -> &Identity {
        &self.destination
    }

    /// Amount in the ledger's smallest unit.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Tick the transaction targets.
    pub fn tick(&self) -> TickNumber {
        self.tick
    }

    /// Input type discriminant.
    pub fn input_type(&self) -> u16 {
        self.input_type
    }

    /// Input payload.
    pub fn input(&self) -> &[u8] {
        &self.input
    }

    /// The same transfer aimed at another tick. Used when the target is only
    /// known after validation.
    pub(crate) fn with_tick(mut self, tick: TickNumber) -> Self {
        self.tick = tick;
        self
    }

    /// Canonical bytes of every field except the signature.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(TRANSACTION_HEADER_SIZE + self.input.len());
        buf.extend_from_slice(self.source.public_key().as_bytes());
        buf.extend_from_slice(self.destination.public_key().as_bytes());
        buf.extend_from_slice(&self.amount.to_le_bytes());
        buf.extend_from_slice(&self.tick.to_le_bytes());
        buf.extend_from_slice(&self.input_type.to_le_bytes());
        // Bounded by MAX_INPUT_SIZE at construction.
        buf.extend_from_slice(&(self.input.len() as u16).to_le_bytes());
        buf.extend_from_slice(&self.input);
        buf
    }

    /// The unsigned digest: the message a signer signs.
    pub fn digest(&self) -> Digest {
        digest32(&self.canonical_bytes())
    }

    /// Attach a signature and compute the transaction ID.
    ///
    /// The signature is not checked here; [`Transaction::verify_signature`]
    /// does that.
    pub fn finalize(self, signature: Signature) -> Transaction {
        let mut signed = self.canonical_bytes();
        signed.extend_from_slice(signature.as_bytes());
        let id = TxId::from_hash(digest32(&signed));
        Transaction {
            unsigned: self,
            signature,
            id,
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`UnsignedTransaction`].
///
/// ```rust
/// use tickcast_client::crypto::PublicKey;
/// use tickcast_client::identity::Identity;
/// use tickcast_client::transaction::TransactionBuilder;
///
/// let source = Identity::from_public_key(&PublicKey::from_bytes([1u8; 32]));
/// let dest = Identity::from_public_key(&PublicKey::from_bytes([2u8; 32]));
///
/// let unsigned = TransactionBuilder::new(source.as_str(), dest.as_str())
///     .amount(5)
///     .tick(1010)
///     .build()
///     .unwrap();
/// assert_eq!(unsigned.tick(), 1010);
/// ```
pub struct TransactionBuilder {
    source: String,
    destination: String,
    amount: i64,
    tick: TickNumber,
    input_type: u16,
    input: Vec<u8>,
}

impl TransactionBuilder {
    /// Start a transfer from `source` to `destination`.
    ///
    /// Defaults: amount 0 (rejected by `build`), tick 0, transfer input type,
    /// empty input.
    pub fn new(source: &str, destination: &str) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            amount: 0,
            tick: 0,
            input_type: INPUT_TYPE_TRANSFER,
            input: Vec::new(),
        }
    }

    /// Sets the amount.
    pub fn amount(mut self, amount: i64) -> Self {
        self.amount = amount;
        self
    }

    /// Sets the target tick.
    pub fn tick(mut self, tick: TickNumber) -> Self {
        self.tick = tick;
        self
    }

    /// Attaches a typed input payload (contract call arguments and the like).
    pub fn input(mut self, input_type: u16, payload: Vec<u8>) -> Self {
        self.input_type = input_type;
        self.input = payload;
        self
    }

    /// Validate and produce the unsigned transaction.
    ///
    /// Checks, cheapest first: amount > 0, input size, source identity,
    /// destination identity.
    pub fn build(self) -> Result<UnsignedTransaction, TransactionError> {
        if self.amount <= 0 {
            return Err(TransactionError::InvalidAmount {
                amount: self.amount,
            });
        }
        if self.input.len() > MAX_INPUT_SIZE {
            return Err(TransactionError::InputTooLarge {
                size: self.input.len(),
                max: MAX_INPUT_SIZE,
            });
        }
        let source = Identity::parse(&self.source)
            .map_err(|e| TransactionError::InvalidIdentity { role: "source", source: e })?;
        let destination = Identity::parse(&self.destination).map_err(|e| {
            TransactionError::InvalidIdentity {
                role: "destination",
                source: e,
            }
        })?;

        Ok(UnsignedTransaction {
            source,
            destination,
            amount: self.amount,
            tick: self.tick,
            input_type: self.input_type,
            input: self.input,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
