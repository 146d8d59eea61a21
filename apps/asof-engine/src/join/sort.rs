//! Per-group timestamp ordering.
//!
//! [`SortedEvents`] can only be built through a path that guarantees
//! ascending timestamps, so the merge never has to trust a caller's claim.

use tracing::warn;

use crate::domain::{Event, StreamKind};
use crate::error::ErrorCode;

/// How a sequence reached sorted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOutcome {
    /// Stable-sorted by the sorter.
    Sorted,
    /// Claimed sorted and verified to be.
    Verified,
    /// Claimed sorted, found out of order, and re-sorted.
    Resorted,
}

/// Events in ascending timestamp order; ties keep insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortedEvents<P> {
    events: Vec<Event<P>>,
}

impl<P> SortedEvents<P> {
    /// Stable sort by timestamp.
    #[must_use]
    pub fn sort(mut events: Vec<Event<P>>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        Self { events }
    }

    /// Accept `events` as-is if already in timestamp order, otherwise sort.
    #[must_use]
    pub fn verify_or_sort(events: Vec<Event<P>>) -> (Self, SortOutcome) {
        if is_sorted_by_timestamp(&events) {
            (Self { events }, SortOutcome::Verified)
        } else {
            (Self::sort(events), SortOutcome::Resorted)
        }
    }

    /// Borrow the ordered events.
    #[must_use]
    pub fn as_slice(&self) -> &[Event<P>] {
        &self.events
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Consume into the ordered vector.
    #[must_use]
    pub fn into_vec(self) -> Vec<Event<P>> {
        self.events
    }
}

/// Whether timestamps are non-decreasing.
pub fn is_sorted_by_timestamp<P>(events: &[Event<P>]) -> bool {
    events.is_sorted_by_key(|e| e.timestamp)
}

/// Orders one group of one stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sorter {
    assume_sorted: bool,
}

impl Sorter {
    /// Create a sorter. With `assume_sorted`, input is verified in O(n)
    /// and only sorted when the check fails.
    #[must_use]
    pub const fn new(assume_sorted: bool) -> Self {
        Self { assume_sorted }
    }

    /// Whether input is expected to arrive sorted.
    #[must_use]
    pub const fn assumes_sorted(&self) -> bool {
        self.assume_sorted
    }

    /// Order `events` of `group_key`.
    pub fn order<P>(
        &self,
        stream: StreamKind,
        group_key: &str,
        events: Vec<Event<P>>,
    ) -> (SortedEvents<P>, SortOutcome) {
        if !self.assume_sorted {
            return (SortedEvents::sort(events), SortOutcome::Sorted);
        }

        let (sorted, outcome) = SortedEvents::verify_or_sort(events);
        if outcome == SortOutcome::Resorted {
            warn!(
                code = %ErrorCode::UnsortedInput,
                stream = %stream,
                group_key,
                events = sorted.len(),
                "Input claimed sorted was out of order; re-sorted"
            );
        }
        (sorted, outcome)
    }
}
