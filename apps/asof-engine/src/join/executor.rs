//! Join executor: partitions both streams and merges each group as an
//! independent rayon task.

use std::time::Instant;

use rayon::prelude::*;
use tracing::{Level, debug, info, span};

use super::emit::ResultEmitter;
use super::merge::merge_group;
use super::partition::partition;
use super::progress::ProgressTracker;
use super::sort::{SortOutcome, Sorter};
use super::stats::JoinStats;
use crate::config::JoinConfig;
use crate::domain::{Event, JoinedRecord, RawEvent, StreamKind};
use crate::error::JoinError;
use crate::ingest::ingest_rows;
use crate::observability::record_join_metrics;

/// Records and statistics of one join run.
#[derive(Debug, Clone)]
pub struct JoinOutput<P, R> {
    /// Emitted records, in the configured order.
    pub records: Vec<JoinedRecord<P, R>>,
    /// Run statistics.
    pub stats: JoinStats,
}

/// All events of one group key, owned by exactly one task.
struct GroupTask<P, R> {
    group_key: String,
    primary: Vec<Event<P>>,
    reference: Option<Vec<Event<R>>>,
}

struct GroupResult<P, R> {
    records: Vec<JoinedRecord<P, R>>,
    matched: u64,
    steps: u64,
    resorted: u64,
}

/// Point-in-time join executor.
#[derive(Debug, Clone, Default)]
pub struct AsofJoiner {
    config: JoinConfig,
}

impl AsofJoiner {
    /// Create a joiner.
    #[must_use]
    pub const fn new(config: JoinConfig) -> Self {
        Self { config }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Validate raw rows of both streams, then join them.
    ///
    /// # Errors
    ///
    /// Returns `MalformedEvent` for the first invalid row of either stream.
    pub fn join_rows<P, R>(
        &self,
        primary: Vec<RawEvent<P>>,
        reference: Vec<RawEvent<R>>,
    ) -> Result<JoinOutput<P, R>, JoinError>
    where
        P: Send,
        R: Clone + Send,
    {
        let primary = ingest_rows(StreamKind::Primary, primary)?;
        let reference = ingest_rows(StreamKind::Reference, reference)?;
        self.join(primary, reference)
    }

    /// Join `primary` against `reference`.
    ///
    /// Sequences are reassigned from each vector's order, so `stream_order`
    /// output follows the order of `primary` as passed here.
    ///
    /// # Errors
    ///
    /// Returns `MalformedEvent` for a blank group key, or `ThreadPool` if a
    /// dedicated pool was requested and could not be built.
    pub fn join<P, R>(
        &self,
        primary: Vec<Event<P>>,
        reference: Vec<Event<R>>,
    ) -> Result<JoinOutput<P, R>, JoinError>
    where
        P: Send,
        R: Clone + Send,
    {
        let start_time = Instant::now();

        let primary_parts = partition(StreamKind::Primary, primary)?;
        let mut reference_parts = partition(StreamKind::Reference, reference)?;

        let primary_events = primary_parts.total_events() as u64;
        let reference_events = reference_parts.total_events() as u64;

        let tasks: Vec<GroupTask<P, R>> = primary_parts
            .into_groups()
            .into_iter()
            .map(|(group_key, primary)| {
                let reference = reference_parts.remove(&group_key);
                GroupTask {
                    group_key,
                    primary,
                    reference,
                }
            })
            .collect();
        let reference_only_groups = reference_parts.group_count() as u64;

        info!(
            groups = tasks.len(),
            primary_events,
            reference_events,
            mode = self.config.join_mode.as_str(),
            order = self.config.order.as_str(),
            "Starting as-of join"
        );

        let tracker = ProgressTracker::new(tasks.len() as u64);
        let groups = tasks.len() as u64;
        let (results, threads) = self.dispatch(tasks, &tracker)?;

        let mut stats = JoinStats {
            groups,
            reference_only_groups,
            primary_events,
            reference_events,
            threads,
            ..JoinStats::default()
        };
        let mut merged = Vec::with_capacity(results.len());
        for result in results {
            stats.matched += result.matched;
            stats.merge_steps += result.steps;
            stats.resorted_sequences += result.resorted;
            merged.push(result.records);
        }
        stats.unmatched = primary_events - stats.matched;

        let emitter = ResultEmitter::new(self.config.join_mode, self.config.order);
        let records = emitter.emit(merged);

        stats.emitted = records.len() as u64;
        stats.elapsed_ms = start_time.elapsed().as_millis() as u64;

        info!(
            emitted = stats.emitted,
            matched = stats.matched,
            unmatched = stats.unmatched,
            merge_steps = stats.merge_steps,
            elapsed_ms = stats.elapsed_ms,
            "As-of join complete"
        );
        record_join_metrics(&stats, self.config.join_mode);

        Ok(JoinOutput { records, stats })
    }

    /// Worker threads a parallel run would use.
    #[must_use]
    pub fn effective_thread_count(&self) -> usize {
        if self.config.parallel.max_threads > 0 {
            self.config.parallel.max_threads
        } else {
            rayon::current_num_threads()
        }
    }

    fn dispatch<P, R>(
        &self,
        tasks: Vec<GroupTask<P, R>>,
        tracker: &ProgressTracker,
    ) -> Result<(Vec<GroupResult<P, R>>, usize), JoinError>
    where
        P: Send,
        R: Clone + Send,
    {
        if tasks.len() < self.config.parallel.min_parallel_groups {
            let results = tasks
                .into_iter()
                .map(|task| self.run_group(task, tracker))
                .collect();
            return Ok((results, 1));
        }

        let max_threads = self.config.parallel.max_threads;
        if max_threads == 0 {
            return Ok((self.run_parallel(tasks, tracker), rayon::current_num_threads()));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .thread_name(|i| format!("asof-merge-{i}"))
            .build()
            .map_err(|e| JoinError::ThreadPool {
                message: e.to_string(),
            })?;

        Ok((pool.install(|| self.run_parallel(tasks, tracker)), max_threads))
    }

    fn run_parallel<P, R>(
        &self,
        tasks: Vec<GroupTask<P, R>>,
        tracker: &ProgressTracker,
    ) -> Vec<GroupResult<P, R>>
    where
        P: Send,
        R: Clone + Send,
    {
        tasks
            .into_par_iter()
            .map(|task| self.run_group(task, tracker))
            .collect()
    }

    fn run_group<P, R: Clone>(
        &self,
        task: GroupTask<P, R>,
        tracker: &ProgressTracker,
    ) -> GroupResult<P, R> {
        let GroupTask {
            group_key,
            primary,
            reference,
        } = task;
        let _span = span!(Level::DEBUG, "merge_group", group_key = %group_key).entered();

        let sorter = Sorter::new(self.config.assume_sorted);
        let (primary, primary_outcome) = sorter.order(StreamKind::Primary, &group_key, primary);
        let reference =
            reference.map(|events| sorter.order(StreamKind::Reference, &group_key, events));

        let mut resorted = u64::from(primary_outcome == SortOutcome::Resorted);
        if matches!(reference, Some((_, SortOutcome::Resorted))) {
            resorted += 1;
        }
        let events = (primary.len() + reference.as_ref().map_or(0, |(r, _)| r.len())) as u64;

        let merge = merge_group(
            primary,
            reference.as_ref().map(|(sorted, _)| sorted),
            self.config.reference_tie_break,
        );
        let matched = merge.matched() as u64;

        tracker.group_completed(events);
        if self.config.parallel.track_progress {
            let progress = tracker.progress();
            debug!(
                matched,
                steps = merge.steps,
                "Progress: {:.1}% ({}/{} groups, {:.0} events/s)",
                progress.percentage(),
                progress.completed,
                progress.total,
                progress.events_per_sec
            );
        }

        GroupResult {
            records: merge.records,
            matched,
            steps: merge.steps,
            resorted,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::config::ParallelConfig;
    use crate::error::MalformedReason;
    use crate::join::{JoinMode, OutputOrder};

    fn at(minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 9, minute, second).unwrap()
    }

    fn trades() -> Vec<Event<u32>> {
        vec![
            Event::new("GOOGL", at(2, 0), 10),
            Event::new("AAPL", at(1, 0), 11),
            Event::new("AAPL", at(0, 10), 12),
            Event::new("MSFT", at(5, 0), 13),
        ]
    }

    fn quotes() -> Vec<Event<&'static str>> {
        vec![
            Event::new("AAPL", at(0, 30), "aapl-0030"),
            Event::new("GOOGL", at(1, 0), "googl-0100"),
            Event::new("AAPL", at(0, 0), "aapl-0000"),
            Event::new("TSLA", at(0, 0), "tsla"),
        ]
    }

    fn joiner(mode: JoinMode, order: OutputOrder) -> AsofJoiner {
        AsofJoiner::new(JoinConfig {
            join_mode: mode,
            order,
            ..JoinConfig::default()
        })
    }

    #[test]
    fn test_inner_join_drops_unmatched() {
        let output = joiner(JoinMode::Inner, OutputOrder::ByGroupThenTime)
            .join(trades(), quotes())
            .unwrap();

        let pairs: Vec<(u32, &str)> = output
            .records
            .iter()
            .map(|r| (r.primary.payload, r.matched_reference.as_ref().unwrap().payload))
            .collect();
        assert_eq!(
            pairs,
            vec![(12, "aapl-0000"), (11, "aapl-0030"), (10, "googl-0100")]
        );
        assert_eq!(output.stats.matched, 3);
        assert_eq!(output.stats.unmatched, 1);
        assert_eq!(output.stats.emitted, 3);
        assert_eq!(output.stats.reference_only_groups, 1);
    }

    #[test]
    fn test_outer_join_stream_order() {
        let output = joiner(JoinMode::Outer, OutputOrder::StreamOrder)
            .join(trades(), quotes())
            .unwrap();

        let payloads: Vec<u32> = output.records.iter().map(|r| r.primary.payload).collect();
        assert_eq!(payloads, vec![10, 11, 12, 13]);
        assert!(output.records[3].matched_reference.is_none());
        assert_eq!(output.stats.groups, 3);
    }

    #[test]
    fn test_assume_sorted_counts_resorted_sequences() {
        let output = AsofJoiner::new(JoinConfig {
            assume_sorted: true,
            ..JoinConfig::default()
        })
        .join(trades(), quotes())
        .unwrap();

        // AAPL trades and AAPL quotes both arrive out of order
        assert_eq!(output.stats.resorted_sequences, 2);
        assert_eq!(output.stats.matched, 3);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = AsofJoiner::new(JoinConfig {
            join_mode: JoinMode::Outer,
            parallel: ParallelConfig {
                min_parallel_groups: usize::MAX,
                ..ParallelConfig::default()
            },
            ..JoinConfig::default()
        });
        let parallel = AsofJoiner::new(JoinConfig {
            join_mode: JoinMode::Outer,
            parallel: ParallelConfig {
                max_threads: 3,
                min_parallel_groups: 1,
                ..ParallelConfig::default()
            },
            ..JoinConfig::default()
        });

        let a = sequential.join(trades(), quotes()).unwrap();
        let b = parallel.join(trades(), quotes()).unwrap();

        assert_eq!(a.records, b.records);
        assert_eq!(a.stats.threads, 1);
        assert_eq!(b.stats.threads, 3);
    }

    #[test]
    fn test_blank_reference_key_fails_whole_join() {
        let mut bad_quotes = quotes();
        bad_quotes.push(Event::new(" ", at(0, 0), "blank"));

        let err = AsofJoiner::default().join(trades(), bad_quotes).unwrap_err();

        assert!(matches!(
            err,
            JoinError::MalformedEvent {
                stream: StreamKind::Reference,
                position: 4,
                reason: MalformedReason::EmptyGroupKey,
            }
        ));
    }

    #[test]
    fn test_join_rows_rejects_missing_timestamp() {
        let primary = vec![RawEvent {
            group_key: Some("AAPL".to_string()),
            timestamp: None,
            payload: 1_u32,
        }];

        let err = AsofJoiner::default()
            .join_rows::<u32, u32>(primary, Vec::new())
            .unwrap_err();

        assert!(matches!(
            err,
            JoinError::MalformedEvent {
                stream: StreamKind::Primary,
                position: 0,
                reason: MalformedReason::MissingTimestamp,
            }
        ));
    }

    #[test]
    fn test_empty_inputs() {
        let output = AsofJoiner::default()
            .join::<u32, u32>(Vec::new(), Vec::new())
            .unwrap();

        assert!(output.records.is_empty());
        assert_eq!(output.stats.groups, 0);
        assert_eq!(output.stats.emitted, 0);
        assert_eq!(output.stats.threads, 1);
    }
}
