//! Candidate-then-rank AS-OF join.
//!
//! Pairs every primary event with every reference event, keeps the pairs
//! that share a group key and are not in the future, then ranks the
//! candidates of each primary. Quadratic in the stream sizes. Used as the
//! correctness oracle for the merge and as the comparison point for its
//! scaling benchmarks; never as a production path.

use super::emit::JoinMode;
use super::merge::ReferenceTieBreak;
use crate::domain::{Event, JoinedRecord};

/// Records and work counter of a baseline run.
#[derive(Debug, Clone)]
pub struct BaselineOutput<P, R> {
    /// Records ordered by group key, primary timestamp, primary position.
    pub records: Vec<JoinedRecord<P, R>>,
    /// Primary/reference pairs examined.
    pub candidate_pairs: u64,
}

/// Join by enumerating every primary/reference pair.
///
/// Sequences are stamped from slice positions, as the partitioner does.
#[must_use]
pub fn baseline_join<P: Clone, R: Clone>(
    primary: &[Event<P>],
    reference: &[Event<R>],
    mode: JoinMode,
    tie_break: ReferenceTieBreak,
) -> BaselineOutput<P, R> {
    let mut candidate_pairs = 0_u64;
    let mut records = Vec::new();

    for (p_pos, p) in primary.iter().enumerate() {
        let mut best: Option<(usize, &Event<R>)> = None;

        for (r_pos, r) in reference.iter().enumerate() {
            candidate_pairs += 1;
            if r.group_key != p.group_key || r.timestamp > p.timestamp {
                continue;
            }
            let wins = best.is_none_or(|(b_pos, b)| {
                r.timestamp > b.timestamp
                    || (r.timestamp == b.timestamp && prefers(tie_break, r_pos, b_pos))
            });
            if wins {
                best = Some((r_pos, r));
            }
        }

        let record = JoinedRecord {
            primary: p.clone().with_sequence(p_pos as u64),
            matched_reference: best.map(|(r_pos, r)| r.clone().with_sequence(r_pos as u64)),
        };
        if mode.retains(&record) {
            records.push(record);
        }
    }

    records.sort_by(|a, b| {
        a.group_key()
            .cmp(b.group_key())
            .then(a.primary.timestamp.cmp(&b.primary.timestamp))
            .then(a.primary.sequence.cmp(&b.primary.sequence))
    });

    BaselineOutput {
        records,
        candidate_pairs,
    }
}

const fn prefers(tie_break: ReferenceTieBreak, candidate: usize, current: usize) -> bool {
    match tie_break {
        ReferenceTieBreak::LastInserted => candidate > current,
        ReferenceTieBreak::FirstInserted => candidate < current,
    }
}
