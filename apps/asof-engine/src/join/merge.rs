//! Two-pointer merge of one group.
//!
//! Primary events are visited in ascending timestamp order. A single
//! reference cursor moves forward over every reference event whose timestamp
//! is `<=` the current primary's, remembering the latest one seen; that
//! event is the primary's match. The cursor never rewinds, so a group costs
//! O(|P| + |R|) steps and matches are non-decreasing in time.
//!
//! ```text
//! R:  08:59:59.999   09:00:30   09:01:30   09:02:00
//!          │             │          │
//! P:       │          09:00:30   09:01:00   09:01:30
//!          └─────────────┴──────────┘
//!   09:00:30 → 09:00:30, 09:01:00 → 09:00:30, 09:01:30 → 09:01:30
//! ```

use serde::{Deserialize, Serialize};

use super::sort::SortedEvents;
use crate::domain::{Event, JoinedRecord};

/// Which reference event wins among several sharing the best timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceTieBreak {
    /// The last in stable (insertion) order.
    #[default]
    LastInserted,
    /// The first in stable (insertion) order.
    FirstInserted,
}

impl ReferenceTieBreak {
    /// Config/CLI spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LastInserted => "last_inserted",
            Self::FirstInserted => "first_inserted",
        }
    }

    fn replaces<R>(self, best: Option<&Event<R>>, candidate: &Event<R>) -> bool {
        match self {
            Self::LastInserted => true,
            Self::FirstInserted => best.is_none_or(|b| b.timestamp < candidate.timestamp),
        }
    }
}

/// Output of merging one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMerge<P, R> {
    /// One record per primary event, primary timestamp ascending.
    pub records: Vec<JoinedRecord<P, R>>,
    /// Cursor advances plus primary assignments; at most `|P| + |R|`.
    pub steps: u64,
}

impl<P, R> GroupMerge<P, R> {
    /// Records that found a match.
    #[must_use]
    pub fn matched(&self) -> usize {
        self.records.iter().filter(|r| r.is_matched()).count()
    }
}

/// Merge a group's sorted primary events against its sorted reference
/// events. `reference` is `None` when the group has no reference events,
/// in which case every record is unmatched.
pub fn merge_group<P, R: Clone>(
    primary: SortedEvents<P>,
    reference: Option<&SortedEvents<R>>,
    tie_break: ReferenceTieBreak,
) -> GroupMerge<P, R> {
    let refs: &[Event<R>] = match reference {
        Some(sorted) => sorted.as_slice(),
        None => &[],
    };

    let mut records = Vec::with_capacity(primary.len());
    let mut cursor = 0_usize;
    let mut best: Option<&Event<R>> = None;
    let mut steps = 0_u64;

    for event in primary.into_vec() {
        while let Some(candidate) = refs.get(cursor) {
            if candidate.timestamp > event.timestamp {
                break;
            }
            if tie_break.replaces(best, candidate) {
                best = Some(candidate);
            }
            cursor += 1;
            steps += 1;
        }

        steps += 1;
        records.push(JoinedRecord {
            primary: event,
            matched_reference: best.cloned(),
        });
    }

    GroupMerge { records, steps }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};

    use super::*;

    fn at(h: u32, m: u32, s: u32, ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, h, m, s).unwrap() + TimeDelta::milliseconds(ms)
    }

    fn sorted<T>(events: Vec<Event<T>>) -> SortedEvents<T> {
        SortedEvents::sort(
            events
                .into_iter()
                .enumerate()
                .map(|(i, e)| e.with_sequence(i as u64))
                .collect(),
        )
    }

    fn matched_times(merge: &GroupMerge<(), &'static str>) -> Vec<Option<DateTime<Utc>>> {
        merge.records.iter().map(JoinedRecord::reference_timestamp).collect()
    }

    #[test]
    fn test_merge_aapl_sample() {
        let trades = sorted(vec![
            Event::new("AAPL", at(9, 0, 30, 0), ()),
            Event::new("AAPL", at(9, 1, 0, 0), ()),
            Event::new("AAPL", at(9, 1, 30, 0), ()),
        ]);
        let quotes = sorted(vec![
            Event::new("AAPL", at(8, 59, 59, 999), "q0"),
            Event::new("AAPL", at(9, 0, 30, 0), "q1"),
            Event::new("AAPL", at(9, 1, 30, 0), "q2"),
            Event::new("AAPL", at(9, 2, 0, 0), "q3"),
        ]);

        let merge = merge_group(trades, Some(&quotes), ReferenceTieBreak::default());

        assert_eq!(
            matched_times(&merge),
            vec![
                Some(at(9, 0, 30, 0)),
                Some(at(9, 0, 30, 0)),
                Some(at(9, 1, 30, 0))
            ]
        );
        assert_eq!(merge.matched(), 3);
        // q3 is never reached: 3 cursor advances + 3 assignments
        assert_eq!(merge.steps, 6);
    }

    #[test]
    fn test_merge_equal_timestamp_matches() {
        let trades = sorted(vec![Event::new("X", at(9, 0, 0, 0), ())]);
        let quotes = sorted(vec![Event::new("X", at(9, 0, 0, 0), "same")]);

        let merge = merge_group(trades, Some(&quotes), ReferenceTieBreak::default());

        assert_eq!(
            merge.records[0].matched_reference.as_ref().map(|r| r.payload),
            Some("same")
        );
    }

    #[test]
    fn test_merge_primary_before_all_references_is_unmatched() {
        let trades = sorted(vec![
            Event::new("X", at(8, 0, 0, 0), ()),
            Event::new("X", at(10, 0, 0, 0), ()),
        ]);
        let quotes = sorted(vec![Event::new("X", at(9, 0, 0, 0), "q")]);

        let merge = merge_group(trades, Some(&quotes), ReferenceTieBreak::default());

        assert_eq!(matched_times(&merge), vec![None, Some(at(9, 0, 0, 0))]);
        assert_eq!(merge.matched(), 1);
    }

    #[test]
    fn test_merge_without_reference_group() {
        let trades = sorted(vec![
            Event::new("X", at(9, 0, 0, 0), ()),
            Event::new("X", at(9, 0, 1, 0), ()),
        ]);

        let merge: GroupMerge<(), &str> = merge_group(trades, None, ReferenceTieBreak::default());

        assert_eq!(merge.records.len(), 2);
        assert_eq!(merge.matched(), 0);
        assert_eq!(merge.steps, 2);
    }

    #[test]
    fn test_tie_break_last_vs_first_inserted() {
        let quotes = sorted(vec![
            Event::new("X", at(9, 0, 0, 0), "first"),
            Event::new("X", at(9, 0, 0, 0), "second"),
            Event::new("X", at(9, 0, 0, 0), "third"),
        ]);
        let trade = || sorted(vec![Event::new("X", at(9, 0, 5, 0), ())]);

        let last = merge_group(trade(), Some(&quotes), ReferenceTieBreak::LastInserted);
        let first = merge_group(trade(), Some(&quotes), ReferenceTieBreak::FirstInserted);

        let payload = |m: &GroupMerge<(), &'static str>| {
            m.records[0].matched_reference.as_ref().map(|r| r.payload)
        };
        assert_eq!(payload(&last), Some("third"));
        assert_eq!(payload(&first), Some("first"));
    }

    #[test]
    fn test_first_inserted_still_advances_to_later_timestamps() {
        let quotes = sorted(vec![
            Event::new("X", at(9, 0, 0, 0), "a"),
            Event::new("X", at(9, 0, 0, 0), "b"),
            Event::new("X", at(9, 0, 2, 0), "c"),
        ]);
        let trades = sorted(vec![Event::new("X", at(9, 0, 3, 0), ())]);

        let merge = merge_group(trades, Some(&quotes), ReferenceTieBreak::FirstInserted);

        assert_eq!(
            merge.records[0].matched_reference.as_ref().map(|r| r.payload),
            Some("c")
        );
    }

    #[test]
    fn test_steps_bounded_by_input_sizes() {
        let trades = sorted((0..50).map(|i| Event::new("X", at(9, 0, 0, i * 7), ())).collect());
        let quotes = sorted((0..80).map(|i| Event::new("X", at(9, 0, 0, i * 3), "q")).collect());

        let merge = merge_group(trades, Some(&quotes), ReferenceTieBreak::default());

        assert!(merge.steps <= 50 + 80);
    }

    #[test]
    fn test_tie_break_serde_spelling() {
        let parsed: ReferenceTieBreak = serde_json::from_str("\"first_inserted\"").unwrap();

        assert_eq!(parsed, ReferenceTieBreak::FirstInserted);
        assert_eq!(ReferenceTieBreak::LastInserted.as_str(), "last_inserted");
    }
}
