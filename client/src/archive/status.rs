//! Archive status snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::transaction::TickNumber;

/// A tick together with the epoch it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInfo {
    pub tick_number: TickNumber,
    pub epoch: u32,
}

/// An inclusive range of ticks the network skipped. Nothing targeting these
/// ticks is ever included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTickRange {
    pub start_tick: TickNumber,
    pub end_tick: TickNumber,
}

impl SkippedTickRange {
    /// Whether `tick` falls inside this range.
    pub fn contains(&self, tick: TickNumber) -> bool {
        (self.start_tick..=self.end_tick).contains(&tick)
    }
}

/// An inclusive range of ticks the archive has processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedTickInterval {
    pub initial_processed_tick: TickNumber,
    pub last_processed_tick: TickNumber,
}

impl ProcessedTickInterval {
    /// Whether `tick` falls inside this interval.
    pub fn contains(&self, tick: TickNumber) -> bool {
        (self.initial_processed_tick..=self.last_processed_tick).contains(&tick)
    }
}

/// Processed intervals for one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochIntervals {
    pub epoch: u32,
    pub intervals: Vec<ProcessedTickInterval>,
}

/// Snapshot of the archive's progress. Polled, never pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub last_processed_tick: TickInfo,
    /// epoch -> last processed tick in that epoch.
    pub last_processed_ticks_per_epoch: BTreeMap<u32, TickNumber>,
    pub skipped_ticks: Vec<SkippedTickRange>,
    pub processed_tick_intervals_per_epoch: Vec<EpochIntervals>,
    /// epoch -> number of empty ticks.
    pub empty_ticks_per_epoch: BTreeMap<u32, u32>,
}

impl Status {
    /// The newest tick the archive has processed.
    pub fn last_processed(&self) -> TickNumber {
        self.last_processed_tick.tick_number
    }

    /// The epoch of the newest processed tick.
    pub fn current_epoch(&self) -> u32 {
        self.last_processed_tick.epoch
    }

    /// Whether `tick` lies in a reported skipped range.
    pub fn is_skipped(&self, tick: TickNumber) -> bool {
        self.skipped_ticks.iter().any(|range| range.contains(tick))
    }

    /// Whether `tick` lies in any processed interval of any epoch.
    pub fn is_processed(&self, tick: TickNumber) -> bool {
        self.processed_tick_intervals_per_epoch
            .iter()
            .flat_map(|epoch| epoch.intervals.iter())
            .any(|interval| interval.contains(tick))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A status whose archive has processed 900..=1020 in epoch 120 and
    /// skipped 1005..=1007.
    pub(crate) fn sample_status(last: TickNumber) -> Status {
        Status {
            last_processed_tick: TickInfo {
                tick_number: last,
                epoch: 120,
            },
            last_processed_ticks_per_epoch: BTreeMap::from([(119, 899), (120, last)]),
            skipped_ticks: vec![SkippedTickRange {
                start_tick: 1005,
                end_tick: 1007,
            }],
            processed_tick_intervals_per_epoch: vec![EpochIntervals {
                epoch: 120,
                intervals: vec![ProcessedTickInterval {
                    initial_processed_tick: 900,
                    last_processed_tick: last,
                }],
            }],
            empty_ticks_per_epoch: BTreeMap::from([(120, 3)]),
        }
    }

    #[test]
    fn skipped_ranges_are_inclusive() {
        let status = sample_status(1020);
        assert!(!status.is_skipped(1004));
        assert!(status.is_skipped(1005));
        assert!(status.is_skipped(1007));
        assert!(!status.is_skipped(1008));
    }

    #[test]
    fn processed_intervals_cover_bounds() {
        let status = sample_status(1020);
        assert!(status.is_processed(900));
        assert!(status.is_processed(1020));
        assert!(!status.is_processed(1021));
        assert!(!status.is_processed(899));
    }

    #[test]
    fn accessors_read_last_processed_tick() {
        let status = sample_status(1_234);
        assert_eq!(status.last_processed(), 1_234);
        assert_eq!(status.current_epoch(), 120);
    }
}
