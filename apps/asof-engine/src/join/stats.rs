//! Summary of one join run.

use serde::{Deserialize, Serialize};

/// Counters describing a finished join.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinStats {
    /// Groups present in the primary stream.
    pub groups: u64,
    /// Groups present only in the reference stream (never visited).
    pub reference_only_groups: u64,
    /// Primary events ingested.
    pub primary_events: u64,
    /// Reference events ingested.
    pub reference_events: u64,
    /// Primary events that found a match.
    pub matched: u64,
    /// Primary events without a match.
    pub unmatched: u64,
    /// Records emitted after applying the join mode.
    pub emitted: u64,
    /// Total merge steps over all groups.
    pub merge_steps: u64,
    /// Group sequences that claimed sortedness but had to be re-sorted.
    pub resorted_sequences: u64,
    /// Worker threads available to the run (1 when run sequentially).
    pub threads: usize,
    /// Wall-clock time in milliseconds.
    pub elapsed_ms: u64,
}

impl JoinStats {
    /// Fraction of primary events that matched.
    #[must_use]
    pub fn match_rate(&self) -> f64 {
        if self.primary_events == 0 {
            0.0
        } else {
            self.matched as f64 / self.primary_events as f64
        }
    }

    /// Whether the merge stayed within its linear bound.
    #[must_use]
    pub const fn within_linear_bound(&self) -> bool {
        self.merge_steps <= self.primary_events + self.reference_events
    }
}
