// Allow unwrap/expect in tests - tests should panic on unexpected errors
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect
    )
)]

//! Asof Engine - Point-in-time Join Core
//!
//! Attaches to every event of a primary stream (trades) the single most
//! recent event of a reference stream (quotes) whose timestamp is at or
//! before it, within the same group key (ticker).
//!
//! # Pipeline
//!
//! ```text
//! raw rows ──ingest──▶ Event<P> ──partition──▶ group → events
//!                                                   │
//!                                    stable sort ◀──┘
//!                                         │
//!                           two-pointer merge (one rayon task per group)
//!                                         │
//!                 emit (inner/outer, by group+time or stream order)
//! ```
//!
//! The merge is O(|P| + |R|) per group after sorting. The quadratic
//! candidate-then-rank join lives in [`join::baseline`] and is compiled only
//! for tests and the `baseline` feature.
//!
//! # Example
//!
//! ```ignore
//! use asof_engine::{AsofJoiner, JoinConfig, JoinMode};
//!
//! let joiner = AsofJoiner::new(JoinConfig {
//!     join_mode: JoinMode::Outer,
//!     ..JoinConfig::default()
//! });
//! let output = joiner.join(trades, quotes)?;
//! for record in &output.records {
//!     println!("{} -> {:?}", record.primary.timestamp, record.reference_timestamp());
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

/// Join and configuration errors.
pub mod error;

/// YAML/env configuration for the join and its ambient concerns.
pub mod config;

/// Events, payloads and joined records.
pub mod domain;

/// Raw row validation and timestamp parsing.
pub mod ingest;

/// JSON Lines file reading and writing.
pub mod jsonl;

/// Partition, sort, merge and emit.
pub mod join;

/// Logging subscriber setup and join metrics.
pub mod observability;

/// Flattening joined records into output rows.
pub mod output;

/// Seeded trade/quote stream generation.
pub mod synthetic;

pub use config::{ConfigError, JoinConfig, LoggingConfig, ParallelConfig, load_config};
pub use domain::{
    Event, JoinedRecord, PrimaryEvent, Quote, RawEvent, RawTimestamp, ReferenceEvent, StreamKind,
    Trade,
};
pub use error::{ErrorCode, JoinError, MalformedReason};
pub use join::{
    AsofJoiner, JoinMode, JoinOutput, JoinStats, OutputOrder, ReferenceTieBreak, ResultEmitter,
    SortedEvents, Sorter, merge_group, partition,
};
