//! Time-stamped events and their pre-ingestion raw form.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Which input stream an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// The stream every output row is anchored on (e.g. trades).
    Primary,
    /// The stream matched as-of each primary event (e.g. quotes).
    Reference,
}

impl StreamKind {
    /// Lowercase stream name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Reference => "reference",
        }
    }
}

impl std::fmt::Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ingested, immutable event.
///
/// `sequence` is the event's zero-based position in its input stream. It is
/// stamped by the partitioner and drives both the stable tie-break and the
/// `stream_order` output ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event<P> {
    /// Grouping key (e.g. ticker symbol).
    pub group_key: String,
    /// Event time.
    pub timestamp: DateTime<Utc>,
    /// Position in the original input stream.
    pub sequence: u64,
    /// Stream-specific fields.
    pub payload: P,
}

/// An event of the primary stream.
pub type PrimaryEvent<P> = Event<P>;

/// An event of the reference stream.
pub type ReferenceEvent<R> = Event<R>;

impl<P> Event<P> {
    /// Create an event. The sequence is assigned when the event enters a join.
    pub fn new(group_key: impl Into<String>, timestamp: DateTime<Utc>, payload: P) -> Self {
        Self {
            group_key: group_key.into(),
            timestamp,
            sequence: 0,
            payload,
        }
    }

    /// Same event with an explicit stream position.
    #[must_use]
    pub fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// A timestamp cell as it appears in a raw row.
///
/// Text is parsed at ingestion; an integer is an instant in Unix epoch
/// milliseconds. Any other JSON value is kept so ingestion can reject it
/// with the row's position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    /// RFC 3339 or naive UTC text.
    Text(String),
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// Anything else (floats, booleans, objects).
    Other(serde_json::Value),
}

impl RawTimestamp {
    /// The text form, if this cell is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for RawTimestamp {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl std::fmt::Display for RawTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::EpochMillis(ms) => write!(f, "{ms}"),
            Self::Other(value) => write!(f, "{value}"),
        }
    }
}

/// A row as read from an external source, before validation.
///
/// Payload fields are flattened next to `group_key` and `timestamp`, so a
/// JSON line like `{"group_key":"AAPL","timestamp":"...","bid":"1.0"}`
/// deserializes into `RawEvent<Quote>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent<P> {
    /// Grouping key, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_key: Option<String>,
    /// Timestamp cell, if present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<RawTimestamp>,
    /// Remaining fields.
    #[serde(flatten)]
    pub payload: P,
}

impl<P: Clone> RawEvent<P> {
    /// Render an ingested event back into its raw row form.
    #[must_use]
    pub fn from_event(event: &Event<P>) -> Self {
        Self {
            group_key: Some(event.group_key.clone()),
            timestamp: Some(RawTimestamp::Text(
                event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            )),
            payload: event.payload.clone(),
        }
    }
}
