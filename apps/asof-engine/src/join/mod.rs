//! The AS-OF join pipeline.
//!
//! - [`partition`]: hash-partition a stream by group key, preserving order
//! - [`Sorter`] / [`SortedEvents`]: stable timestamp sort, or verify-then-sort
//!   for input that claims to be sorted already
//! - [`merge_group`]: single forward two-pointer pass per group
//! - [`ResultEmitter`]: inner/outer filtering and deterministic ordering
//! - [`AsofJoiner`]: runs the above with one rayon task per group
//!
//! # Thread Pool Configuration
//!
//! Groups share no state, so they are dispatched with `into_par_iter` on
//! rayon's global pool. Setting `parallel.max_threads` builds a dedicated
//! pool of that size for the call instead:
//!
//! ```ignore
//! let joiner = AsofJoiner::new(JoinConfig {
//!     parallel: ParallelConfig { max_threads: 4, ..Default::default() },
//!     ..Default::default()
//! });
//! ```

#[cfg(any(test, feature = "baseline"))]
pub mod baseline;
mod emit;
mod executor;
mod merge;
mod partition;
mod progress;
mod sort;
mod stats;

pub use emit::{JoinMode, OutputOrder, ResultEmitter};
pub use executor::{AsofJoiner, JoinOutput};
pub use merge::{GroupMerge, ReferenceTieBreak, merge_group};
pub use partition::{Partitions, partition};
pub use progress::{Progress, ProgressTracker};
pub use sort::{SortOutcome, SortedEvents, Sorter};
pub use stats::JoinStats;
