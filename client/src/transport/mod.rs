//! # Transport Adapters
//!
//! Two interchangeable clients for the archive service:
//!
//! ```text
//! rest.rs : JSON over HTTP (reqwest)
//! rpc/    : length-prefixed bincode frames over TCP
//! error.rs: TransportError: Unreachable | TimedOut | Protocol | Remote
//! ```
//!
//! Both implement [`Transport`] and normalize replies into the
//! [`crate::archive`] types, so callers never see wire representations.
//! Adapters hold no per-call state and are safe to share behind an `Arc`.

mod convert;
pub mod error;
pub mod rest;
pub mod rpc;

pub use error::TransportError;
pub use rest::RestTransport;
pub use rpc::RpcTransport;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::archive::{Status, TickTransactionSet};
use crate::transaction::{TickNumber, Transaction};

/// Acknowledgement of a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReceipt {
    /// Number of peers the service relayed the transaction to.
    pub peers_broadcasted: u32,
}

/// The archive operations a submission needs.
///
/// Reads are idempotent and safe to retry. `broadcast` is not idempotent at
/// the remote; deduplication is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Short adapter name for logs (`"rest"`, `"rpc"`).
    fn name(&self) -> &'static str;

    /// The endpoint this adapter talks to.
    fn endpoint(&self) -> &str;

    /// Current archive status.
    async fn fetch_status(&self) -> Result<Status, TransportError>;

    /// The network's latest tick.
    async fn fetch_latest_tick(&self) -> Result<TickNumber, TransportError>;

    /// Transactions confirmed in `tick`. An empty set is a valid result.
    async fn fetch_tick_transactions(
        &self,
        tick: TickNumber,
        transfers_only: bool,
    ) -> Result<TickTransactionSet, TransportError>;

    /// Submit a signed transaction.
    async fn broadcast(&self, tx: &Transaction) -> Result<BroadcastReceipt, TransportError>;
}
