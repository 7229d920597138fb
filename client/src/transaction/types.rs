//! Value types shared by the builder, the codec and the orchestrator.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::config::KEY_LENGTH;
use crate::identity::encoding::{self, Alphabet, EncodingError};

/// The ledger's confirmation counter.
pub type TickNumber = u32;

/// A 32-byte unsigned-transaction digest: the message that gets signed.
pub type Digest = [u8; KEY_LENGTH];

/// A transaction identifier: the hash of the signed encoding, rendered as
/// 60 lowercase letters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxId([u8; KEY_LENGTH]);

impl TxId {
    /// Wrap a raw 32-byte hash.
    pub const fn from_hash(hash: [u8; KEY_LENGTH]) -> Self {
        Self(hash)
    }

    /// Raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    /// Parse the 60-character lowercase form.
    pub fn parse(text: &str) -> Result<Self, EncodingError> {
        encoding::decode(text, Alphabet::Lower).map(Self)
    }

    /// Returns `true` when `text` is this ID's string form.
    pub fn matches(&self, text: &str) -> bool {
        Self::parse(text).map(|other| other == *self).unwrap_or(false)
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&encoding::encode(&self.0, Alphabet::Lower))
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self)
    }
}

impl FromStr for TxId {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TxId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TxId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
