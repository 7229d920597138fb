//! # Archive Data Model
//!
//! Read-only snapshots produced by the remote archive service and normalized
//! by the transport adapters. Nothing here is computed locally: the client
//! only interprets what the service reports.
//!
//! - [`Status`]: last processed tick, per-epoch counters, skipped ranges and
//!   processed intervals.
//! - [`TickTransactionSet`]: the transactions confirmed in one tick, with
//!   inclusion metadata.

pub mod status;
pub mod ticks;

pub use status::{EpochIntervals, ProcessedTickInterval, SkippedTickRange, Status, TickInfo};
pub use ticks::{TickTransaction, TickTransactionSet, TransactionRecord};
