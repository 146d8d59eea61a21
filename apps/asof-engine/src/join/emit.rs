//! Flattening per-group results into the final record sequence.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::domain::JoinedRecord;

/// Whether unmatched primary events are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinMode {
    /// Drop primary events without a qualifying reference event.
    #[default]
    Inner,
    /// Keep every primary event, with an empty match when none qualifies.
    Outer,
}

impl JoinMode {
    /// Config/CLI spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Outer => "outer",
        }
    }

    /// Whether `record` survives this mode.
    #[must_use]
    pub const fn retains<P, R>(&self, record: &JoinedRecord<P, R>) -> bool {
        match self {
            Self::Inner => record.is_matched(),
            Self::Outer => true,
        }
    }
}

impl FromStr for JoinMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(Self::Inner),
            "outer" | "left" => Ok(Self::Outer),
            other => Err(ConfigError::ValidationError(format!(
                "join_mode must be 'inner' or 'outer', got '{other}'"
            ))),
        }
    }
}

/// Final ordering of emitted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputOrder {
    /// Group key, then primary timestamp, then primary stream position.
    #[default]
    ByGroupThenTime,
    /// Primary stream position.
    StreamOrder,
}

impl OutputOrder {
    /// Config/CLI spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ByGroupThenTime => "by_group_then_time",
            Self::StreamOrder => "stream_order",
        }
    }
}

impl FromStr for OutputOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "by_group_then_time" => Ok(Self::ByGroupThenTime),
            "stream_order" => Ok(Self::StreamOrder),
            other => Err(ConfigError::ValidationError(format!(
                "order must be 'by_group_then_time' or 'stream_order', got '{other}'"
            ))),
        }
    }
}

/// Applies the join mode and output order to merged groups.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultEmitter {
    mode: JoinMode,
    order: OutputOrder,
}

impl ResultEmitter {
    /// Create an emitter.
    #[must_use]
    pub const fn new(mode: JoinMode, order: OutputOrder) -> Self {
        Self { mode, order }
    }

    /// Configured join mode.
    #[must_use]
    pub const fn mode(&self) -> JoinMode {
        self.mode
    }

    /// Configured output order.
    #[must_use]
    pub const fn order(&self) -> OutputOrder {
        self.order
    }

    /// Flatten `groups` into one sequence.
    ///
    /// Groups may arrive in any order (they come back from worker threads);
    /// the result depends only on the records, never on arrival order,
    /// because primary sequences are unique within a join.
    pub fn emit<P, R>(&self, groups: Vec<Vec<JoinedRecord<P, R>>>) -> Vec<JoinedRecord<P, R>> {
        let mut records: Vec<JoinedRecord<P, R>> = groups
            .into_iter()
            .flatten()
            .filter(|record| self.mode.retains(record))
            .collect();

        match self.order {
            OutputOrder::ByGroupThenTime => records.sort_unstable_by(|a, b| {
                a.primary
                    .group_key
                    .cmp(&b.primary.group_key)
                    .then(a.primary.timestamp.cmp(&b.primary.timestamp))
                    .then(a.primary.sequence.cmp(&b.primary.sequence))
            }),
            OutputOrder::StreamOrder => records.sort_unstable_by_key(|r| r.primary.sequence),
        }

        records
    }
}
