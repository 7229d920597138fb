//! # Tick Synchronizer
//!
//! Picks a target tick ahead of the network and decides, from an archive
//! [`Status`], whether a target can still be included.
//!
//! ```text
//!         current            target = current + lead
//!  ---------|--------------------|------------------>  ticks
//!           |<---- lead_ticks --->|
//!  Pending : last_processed <  target
//!  Due     : last_processed == target (inclusion can be checked)
//!  Superseded: last_processed > target
//!  Skipped : target inside a reported skipped range
//! ```
//!
//! A lead that is too small loses transactions silently: the broadcast
//! arrives after the target tick has closed and nothing ever reports it.

use thiserror::Error;

use crate::archive::Status;
use crate::transaction::TickNumber;

/// A target tick could not be chosen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TickError {
    /// A zero lead would target a tick that is already being processed.
    #[error("lead_ticks must be at least 1")]
    ZeroLead,

    /// `current + lead` does not fit in a tick number.
    #[error("target tick overflows: current {current} + lead {lead}")]
    Overflow { current: TickNumber, lead: u32 },
}

/// Where a target tick stands relative to the archive's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAssessment {
    /// The archive has not reached the target yet.
    Pending,
    /// The archive has processed the target; its transactions are final.
    Due,
    /// The target lies in a skipped range and will never be included.
    Skipped,
    /// The archive has moved past the target.
    Superseded,
}

/// `current_tick + lead_ticks`, rejecting a zero lead and overflow.
pub fn choose_target_tick(current_tick: TickNumber, lead_ticks: u32) -> Result<TickNumber, TickError> {
    if lead_ticks == 0 {
        return Err(TickError::ZeroLead);
    }
    current_tick
        .checked_add(lead_ticks)
        .ok_or(TickError::Overflow {
            current: current_tick,
            lead: lead_ticks,
        })
}

/// True once the archive has processed a tick beyond `target_tick`.
pub fn is_superseded(target_tick: TickNumber, last_processed_tick: TickNumber) -> bool {
    last_processed_tick > target_tick
}

/// Classify `target_tick` against a status snapshot.
///
/// A skipped range wins over everything else: a skipped target is abandoned
/// even before the archive reaches it.
pub fn assess(target_tick: TickNumber, status: &Status) -> TickAssessment {
    let last = status.last_processed();
    if status.is_skipped(target_tick) {
        TickAssessment::Skipped
    } else if is_superseded(target_tick, last) {
        TickAssessment::Superseded
    } else if last == target_tick {
        TickAssessment::Due
    } else {
        TickAssessment::Pending
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
