//! Progress tracking across group tasks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Counts completed groups and merged events from any worker thread.
#[derive(Debug)]
pub struct ProgressTracker {
    total_groups: u64,
    completed_groups: AtomicU64,
    merged_events: AtomicU64,
    start_time: Instant,
}

impl ProgressTracker {
    /// Create a tracker for `total_groups` groups.
    #[must_use]
    pub fn new(total_groups: u64) -> Self {
        Self {
            total_groups,
            completed_groups: AtomicU64::new(0),
            merged_events: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a merged group of `events` primary plus reference events.
    pub fn group_completed(&self, events: u64) {
        self.completed_groups.fetch_add(1, Ordering::Relaxed);
        self.merged_events.fetch_add(events, Ordering::Relaxed);
    }

    /// Snapshot of current progress.
    #[must_use]
    pub fn progress(&self) -> Progress {
        let completed = self.completed_groups.load(Ordering::Relaxed);
        let events = self.merged_events.load(Ordering::Relaxed);
        let elapsed = self.start_time.elapsed().as_secs_f64();

        let events_per_sec = if elapsed > 0.0 {
            events as f64 / elapsed
        } else {
            0.0
        };

        Progress {
            total: self.total_groups,
            completed,
            events_merged: events,
            elapsed_secs: elapsed,
            events_per_sec,
        }
    }
}

/// Progress snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    /// Total number of groups.
    pub total: u64,
    /// Groups merged so far.
    pub completed: u64,
    /// Primary plus reference events merged so far.
    pub events_merged: u64,
    /// Elapsed time in seconds.
    pub elapsed_secs: f64,
    /// Merge throughput.
    pub events_per_sec: f64,
}

impl Progress {
    /// Completion percentage.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.completed as f64 / self.total as f64) * 100.0
        }
    }
}
