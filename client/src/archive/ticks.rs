//! Transactions confirmed within one tick.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::transaction::{TickNumber, Transaction, TxId};

/// A transaction as the archive stores it.
///
/// Identities and the transaction ID are kept as the strings the archive
/// reported; matching against a local [`TxId`] goes through
/// [`TxId::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub source_id: String,
    pub dest_id: String,
    pub amount: i64,
    pub tick_number: TickNumber,
    pub input_type: u16,
    pub input_size: u16,
    pub input: Vec<u8>,
    pub signature: Vec<u8>,
    pub tx_id: String,
}

impl From<&Transaction> for TransactionRecord {
    /// The record an archive would hold for a locally signed transaction.
    fn from(tx: &Transaction) -> Self {
        Self {
            source_id: tx.source().to_string(),
            dest_id: tx.destination().to_string(),
            amount: tx.amount(),
            tick_number: tx.tick(),
            input_type: tx.input_type(),
            // Bounded by MAX_INPUT_SIZE.
            input_size: tx.input().len() as u16,
            input: tx.input().to_vec(),
            signature: tx.signature().as_bytes().to_vec(),
            tx_id: tx.id().to_string(),
        }
    }
}

/// One confirmed transaction plus its inclusion metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTransaction {
    pub transaction: TransactionRecord,
    /// When the archive saw the tick. Millisecond precision.
    pub timestamp: DateTime<Utc>,
    /// Whether value actually moved.
    pub money_flew: bool,
}

/// The ordered transactions of a single tick. Empty is a valid result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTransactionSet {
    pub tick: TickNumber,
    pub transactions: Vec<TickTransaction>,
}

impl TickTransactionSet {
    /// An empty set for `tick`.
    pub fn empty(tick: TickNumber) -> Self {
        Self {
            tick,
            transactions: Vec::new(),
        }
    }

    /// Number of transactions in the tick.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the tick holds no (matching) transactions.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// The entry for `id`, if the tick contains it.
    pub fn find(&self, id: &TxId) -> Option<&TickTransaction> {
        self.transactions
            .iter()
            .find(|entry| id.matches(&entry.transaction.tx_id))
    }

    /// Whether the tick contains `id`.
    pub fn contains(&self, id: &TxId) -> bool {
        self.find(id).is_some()
    }

    /// All transaction IDs, order-independent.
    pub fn tx_ids(&self) -> BTreeSet<&str> {
        self.transactions
            .iter()
            .map(|entry| entry.transaction.tx_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(tx_id: &str) -> TickTransaction {
        TickTransaction {
            transaction: TransactionRecord {
                source_id: "A".repeat(60),
                dest_id: "B".repeat(60),
                amount: 5,
                tick_number: 1010,
                input_type: 0,
                input_size: 0,
                input: Vec::new(),
                signature: vec![0; 64],
                tx_id: tx_id.to_string(),
            },
            timestamp: Utc.timestamp_millis_opt(1_718_461_680_000).unwrap(),
            money_flew: true,
        }
    }

    #[test]
    fn find_matches_by_tx_id() {
        let id = TxId::from_hash([9; 32]);
        let other = TxId::from_hash([8; 32]);
        let set = TickTransactionSet {
            tick: 1010,
            transactions: vec![entry(&other.to_string()), entry(&id.to_string())],
        };
        assert!(set.contains(&id));
        assert_eq!(set.find(&id).map(|e| e.transaction.tx_id.clone()), Some(id.to_string()));
        assert!(!set.contains(&TxId::from_hash([7; 32])));
    }

    #[test]
    fn empty_set_contains_nothing() {
        let set = TickTransactionSet::empty(42);
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
        assert!(!set.contains(&TxId::from_hash([1; 32])));
    }

    #[test]
    fn malformed_archive_ids_never_match() {
        let set = TickTransactionSet {
            tick: 1,
            transactions: vec![entry("garbage")],
        };
        assert!(!set.contains(&TxId::from_hash([0; 32])));
        assert_eq!(set.tx_ids().len(), 1);
    }
}
