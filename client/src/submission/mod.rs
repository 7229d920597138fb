//! # Submission
//!
//! Drives one transfer from build to a terminal outcome:
//!
//! ```text
//! Building -> Signing -> Broadcasting -> AwaitingInclusion -+-> Included
//!     |          |            |                 |           +-> Abandoned
//!     +----------+------------+-----------------+-------------> Failed
//!                    (any state, on cancel) ------------------> Cancelled
//! ```
//!
//! - **cancel.rs**: watch-backed cancel handle/signal pair.
//! - **registry.rs**: shared TxId dedup and (source, tick) slot map.
//! - **orchestrator.rs**: the state machine, retry and polling policy.

pub mod cancel;
pub mod orchestrator;
pub mod registry;

pub use cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use orchestrator::{Orchestrator, SourceAccount};
pub use registry::{BroadcastRegistry, BroadcastState, BroadcastWaiter, Claim};

use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::crypto::SignerError;
use crate::tick::TickError;
use crate::transaction::{TickNumber, TransactionError, TxId};
use crate::transport::{BroadcastReceipt, TransportError};

/// Phases of a submission, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Building,
    Signing,
    Broadcasting,
    AwaitingInclusion,
    Included,
    Abandoned,
    Failed,
    Cancelled,
}

impl SubmissionState {
    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Included | Self::Abandoned | Self::Failed | Self::Cancelled
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Building => "building",
            Self::Signing => "signing",
            Self::Broadcasting => "broadcasting",
            Self::AwaitingInclusion => "awaiting_inclusion",
            Self::Included => "included",
            Self::Abandoned => "abandoned",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Why a submission failed.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// Amount, identity or input rejected by the builder.
    #[error("invalid transfer")]
    Validation(#[from] TransactionError),

    /// The sub-seed could not sign for the source identity.
    #[error("signing failed")]
    Signing(#[from] SignerError),

    /// No valid target tick could be derived from the current tick.
    #[error("cannot choose target tick")]
    Tick(#[from] TickError),

    /// Every probed (source, tick) slot is taken by another submission.
    #[error("no free tick slot for {identity} in {first}..={last}")]
    NoFreeSlot {
        identity: String,
        first: TickNumber,
        last: TickNumber,
    },

    /// A remote call kept failing, or failed in a non-retryable way.
    #[error("{operation} failed after {attempts} attempt(s)")]
    Transport {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// The archive never reached a verdict within the poll bounds.
    #[error("no inclusion verdict for tick {target_tick} after {attempts} poll(s) in {elapsed:?}")]
    PollExhausted {
        target_tick: TickNumber,
        attempts: u32,
        elapsed: Duration,
    },
}

/// Terminal result of a submission.
#[derive(Debug)]
pub enum Outcome {
    /// The transaction appears in its target tick.
    Included { tx_id: TxId, tick: TickNumber },
    /// The target tick was skipped or passed without the transaction.
    Abandoned { tx_id: TxId, target_tick: TickNumber },
    /// Unrecoverable error; the cause chain is preserved.
    Failed(SubmissionError),
    /// The caller cancelled.
    Cancelled,
}

impl Outcome {
    /// Metric and log label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Included { .. } => "included",
            Self::Abandoned { .. } => "abandoned",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// The terminal state matching this outcome.
    pub fn state(&self) -> SubmissionState {
        match self {
            Self::Included { .. } => SubmissionState::Included,
            Self::Abandoned { .. } => SubmissionState::Abandoned,
            Self::Failed(_) => SubmissionState::Failed,
            Self::Cancelled => SubmissionState::Cancelled,
        }
    }
}

/// Everything a caller may want to know after a submission ends.
#[derive(Debug)]
pub struct SubmissionReport {
    /// Correlates this submission's log lines.
    pub id: Uuid,
    pub outcome: Outcome,
    /// States entered, in order, ending with the terminal one.
    pub states: Vec<SubmissionState>,
    /// Set once the transaction is signed.
    pub tx_id: Option<TxId>,
    /// Set once a target tick is chosen.
    pub target_tick: Option<TickNumber>,
    /// Set when the broadcast was accepted (here or by an earlier attempt).
    pub receipt: Option<BroadcastReceipt>,
}
