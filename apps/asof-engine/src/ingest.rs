//! Validation of raw rows into typed events.
//!
//! A row must carry a non-blank group key and a timestamp that is either
//! text parsing as RFC 3339 (`2024-01-02T09:00:30.500Z`) or a naive UTC
//! datetime (`2024-01-02 09:00:30.500`), or an integer count of Unix epoch
//! milliseconds. The first bad row fails the whole stream; nothing is
//! coerced or skipped.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::debug;

use crate::domain::{Event, RawEvent, RawTimestamp, StreamKind};
use crate::error::{JoinError, MalformedReason};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a timestamp in any accepted format.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, MalformedReason> {
    let trimmed = value.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| MalformedReason::InvalidTimestamp {
            value: value.to_string(),
        })
}

/// Resolve a raw timestamp cell to an instant.
pub fn resolve_timestamp(raw: &RawTimestamp) -> Result<DateTime<Utc>, MalformedReason> {
    match raw {
        RawTimestamp::Text(text) => parse_timestamp(text),
        RawTimestamp::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms).ok_or_else(|| {
            MalformedReason::InvalidTimestamp {
                value: ms.to_string(),
            }
        }),
        RawTimestamp::Other(_) => Err(MalformedReason::InvalidTimestamp {
            value: raw.to_string(),
        }),
    }
}

/// Check a group key: present and not blank.
pub(crate) fn check_group_key(key: Option<&str>) -> Result<(), MalformedReason> {
    match key {
        None => Err(MalformedReason::MissingGroupKey),
        Some(k) if k.trim().is_empty() => Err(MalformedReason::EmptyGroupKey),
        Some(_) => Ok(()),
    }
}

/// Validate one raw row at `position` of `stream`.
pub fn ingest_row<P>(
    stream: StreamKind,
    position: usize,
    row: RawEvent<P>,
) -> Result<Event<P>, JoinError> {
    let malformed = |reason| JoinError::malformed(stream, position, reason);

    check_group_key(row.group_key.as_deref()).map_err(malformed)?;
    let group_key = row.group_key.unwrap_or_default();

    let Some(raw_ts) = row.timestamp else {
        return Err(malformed(MalformedReason::MissingTimestamp));
    };
    let timestamp = resolve_timestamp(&raw_ts).map_err(malformed)?;

    Ok(Event::new(group_key, timestamp, row.payload).with_sequence(position as u64))
}

/// Validate a whole stream, stamping each event with its position.
pub fn ingest_rows<P>(
    stream: StreamKind,
    rows: impl IntoIterator<Item = RawEvent<P>>,
) -> Result<Vec<Event<P>>, JoinError> {
    let events = rows
        .into_iter()
        .enumerate()
        .map(|(position, row)| ingest_row(stream, position, row))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(stream = %stream, events = events.len(), "Ingested stream");
    Ok(events)
}
