//! Wire encoding of signed transactions.
//!
//! The encoding is the canonical unsigned layout followed by the 64-byte
//! signature. Transports carry it as standard base64.
//!
//! `decode` is the exact inverse of `encode`: it rejects truncated frames,
//! trailing bytes, and input sizes above the protocol limit, and recomputes
//! the transaction ID from the bytes it was given.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use super::builder::UnsignedTransaction;
use super::Transaction;
use crate::config::{KEY_LENGTH, MAX_INPUT_SIZE, SIGNATURE_LENGTH, TRANSACTION_HEADER_SIZE};
use crate::crypto::keys::{PublicKey, Signature};
use crate::identity::Identity;

/// A byte string is not a valid encoded transaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes than the layout requires.
    #[error("truncated transaction: need {needed} bytes, got {got}")]
    Truncated {
        /// Bytes required up to the failing field.
        needed: usize,
        /// Bytes available.
        got: usize,
    },

    /// Bytes left over after the signature.
    #[error("{extra} trailing bytes after signature")]
    TrailingBytes {
        /// Number of unexpected bytes.
        extra: usize,
    },

    /// The declared input size exceeds the protocol limit.
    #[error("declared input size {size} exceeds {max}")]
    InputTooLarge {
        /// Declared size.
        size: usize,
        /// Allowed maximum.
        max: usize,
    },

    /// The text is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(String),
}

/// Encode a signed transaction to bytes.
pub fn encode(tx: &Transaction) -> Vec<u8> {
    let mut bytes = tx.unsigned.canonical_bytes();
    bytes.extend_from_slice(tx.signature.as_bytes());
    bytes
}

/// Encode a signed transaction as standard base64, the form both transports
/// submit.
pub fn encode_base64(tx: &Transaction) -> String {
    STANDARD.encode(encode(tx))
}

/// Decode bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<Transaction, CodecError> {
    if bytes.len() < TRANSACTION_HEADER_SIZE {
        return Err(CodecError::Truncated {
            needed: TRANSACTION_HEADER_SIZE,
            got: bytes.len(),
        });
    }

    let mut reader = Reader { bytes, offset: 0 };
    let source = reader.key();
    let destination = reader.key();
    let amount = i64::from_le_bytes(reader.array());
    let tick = u32::from_le_bytes(reader.array());
    let input_type = u16::from_le_bytes(reader.array());
    let input_size = usize::from(u16::from_le_bytes(reader.array()));

    if input_size > MAX_INPUT_SIZE {
        return Err(CodecError::InputTooLarge {
            size: input_size,
            max: MAX_INPUT_SIZE,
        });
    }

    let expected = TRANSACTION_HEADER_SIZE + input_size + SIGNATURE_LENGTH;
    if bytes.len() < expected {
        return Err(CodecError::Truncated {
            needed: expected,
            got: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(CodecError::TrailingBytes {
            extra: bytes.len() - expected,
        });
    }

    let input = reader.take(input_size).to_vec();
    let signature = Signature::from_bytes(reader.array());

    let unsigned = UnsignedTransaction {
        source: Identity::from_public_key(&source),
        destination: Identity::from_public_key(&destination),
        amount,
        tick,
        input_type,
        input,
    };
    Ok(unsigned.finalize(signature))
}

/// Decode the base64 form produced by [`encode_base64`].
pub fn decode_base64(text: &str) -> Result<Transaction, CodecError> {
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|e| CodecError::Base64(e.to_string()))?;
    decode(&bytes)
}

/// Cursor over a buffer whose length has already been checked.
struct Reader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> &'a [u8] {
        let slice = &self.bytes[self.offset..self.offset + len];
        self.offset += len;
        slice
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N));
        out
    }

    fn key(&mut self) -> PublicKey {
        PublicKey::from_bytes(self.array::<KEY_LENGTH>())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
