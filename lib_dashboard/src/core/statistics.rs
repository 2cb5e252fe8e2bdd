//! Holder of the pipeline's aggregate snapshot. The client never derives or
//! merges fields; it only swaps whole snapshots.

use crate::core::model::StatisticsSnapshot;

/// The single authoritative statistics value held by the client.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatisticsStore {
    current: StatisticsSnapshot,
}

impl StatisticsStore {
    /// Starts at the all-zero snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrites the held snapshot.
    pub fn replace(&mut self, snapshot: StatisticsSnapshot) {
        self.current = snapshot;
    }

    /// Zeroes every counter and amount. Local only.
    pub fn reset(&mut self) {
        self.current = StatisticsSnapshot::ZERO;
    }

    /// The held snapshot.
    pub fn current(&self) -> StatisticsSnapshot {
        self.current
    }
}
