// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Tickcast Client Library
//!
//! Builds, signs and broadcasts value transfers on a tick-based ledger, then
//! watches the archive until the transfer is included in its target tick or
//! the tick passes without it.
//!
//! ## Architecture
//!
//! ```text
//!                    +--------------------+
//!   seed, dest, amt  |   submission       |  Outcome
//!  ----------------> |   Orchestrator     | --------->
//!                    +---------+----------+
//!                              |
//!        tick  +---------------+---------------+  transaction
//!              |                               |
//!       +------v------+                 +------v------+
//!       |    tick     |                 | transaction |
//!       +------+------+                 +------+------+
//!              |                               |
//!       +------v------+                 +------v------+
//!       |  transport  |                 |   crypto    |
//!       | rest | rpc  |                 |  identity   |
//!       +------+------+                 +-------------+
//!              |
//!       +------v------+
//!       |   archive   |  (normalized status and tick data)
//!       +-------------+
//! ```
//!
//! - **config**: wire constants and tunable defaults.
//! - **crypto**: sub-seed derivation, Ed25519 signing, BLAKE3 digests.
//! - **identity**: 60-letter identities and lowercase transaction IDs.
//! - **transaction**: builder, canonical encoding, signing, verification.
//! - **archive**: transport-neutral archive status and tick contents.
//! - **tick**: target tick choice and inclusion assessment.
//! - **transport**: REST and binary RPC adapters behind one trait.
//! - **submission**: the state machine, dedup registry and cancellation.
//! - **metrics**: Prometheus counters for the submission pipeline.

pub mod archive;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod metrics;
pub mod submission;
pub mod tick;
pub mod transaction;
pub mod transport;

pub use archive::{Status, TickTransactionSet};
pub use identity::Identity;
pub use submission::{
    cancel_pair, BroadcastRegistry, CancelHandle, CancelSignal, Orchestrator, Outcome,
    SourceAccount, SubmissionError, SubmissionReport, SubmissionState,
};
pub use transaction::{Transaction, TransactionBuilder, TxId};
pub use transport::{RestTransport, RpcTransport, Transport, TransportError};
