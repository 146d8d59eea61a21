//! Error types for the join pipeline.
//!
//! Every failure carries a stable [`ErrorCode`] so callers (and log
//! pipelines) can branch on a machine-readable reason.
//!
//! | Code | Raised when |
//! |------|-------------|
//! | `MALFORMED_EVENT` | A row lacks a group key or timestamp, or the timestamp does not parse |
//! | `UNSORTED_INPUT` | Input claimed sorted is not; logged, then re-sorted (never returned) |
//! | `INVALID_CONFIG` | Configuration failed to parse or validate |
//! | `THREAD_POOL` | A dedicated worker pool could not be built |
//! | `SERIALIZATION` | An output row could not be produced |
//! | `IO` | Reading configuration failed |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::StreamKind;

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Row rejected at ingestion.
    MalformedEvent,
    /// Sortedness assumption violated (diagnostic only).
    UnsortedInput,
    /// Configuration parse or validation failure.
    InvalidConfig,
    /// Worker pool construction failure.
    ThreadPool,
    /// Output serialization failure.
    Serialization,
    /// Filesystem failure.
    Io,
}

impl ErrorCode {
    /// Reason string used in logs and error reports.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::MalformedEvent => "MALFORMED_EVENT",
            Self::UnsortedInput => "UNSORTED_INPUT",
            Self::InvalidConfig => "INVALID_CONFIG",
            Self::ThreadPool => "THREAD_POOL",
            Self::Serialization => "SERIALIZATION",
            Self::Io => "IO",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// Why a row was rejected at ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    /// The group key column is absent.
    #[error("missing group key")]
    MissingGroupKey,
    /// The group key is present but blank.
    #[error("empty group key")]
    EmptyGroupKey,
    /// The timestamp column is absent.
    #[error("missing timestamp")]
    MissingTimestamp,
    /// The timestamp does not parse as RFC 3339 or `YYYY-MM-DD HH:MM:SS[.fff]`.
    #[error("invalid timestamp '{value}'")]
    InvalidTimestamp {
        /// The offending raw value.
        value: String,
    },
}

/// Errors from a join invocation. A join either fully succeeds or fails
/// as a whole; there is no partial output.
#[derive(Debug, Error)]
pub enum JoinError {
    /// A row in one of the input streams is malformed.
    #[error("Malformed {stream} event at position {position}: {reason}")]
    MalformedEvent {
        /// Stream the row came from.
        stream: StreamKind,
        /// Zero-based position of the row in its stream.
        position: usize,
        /// What is wrong with it.
        reason: MalformedReason,
    },

    /// A dedicated worker pool could not be built.
    #[error("Failed to build worker pool: {message}")]
    ThreadPool {
        /// Error message.
        message: String,
    },

    /// An output row could not be serialized.
    #[error("Failed to serialize output row: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl JoinError {
    /// Create a malformed-event error.
    #[must_use]
    pub const fn malformed(stream: StreamKind, position: usize, reason: MalformedReason) -> Self {
        Self::MalformedEvent {
            stream,
            position,
            reason,
        }
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedEvent { .. } => ErrorCode::MalformedEvent,
            Self::ThreadPool { .. } => ErrorCode::ThreadPool,
            Self::Serialization(_) => ErrorCode::Serialization,
        }
    }
}
