//! The output of the merge: a primary event and its as-of match.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::event::Event;

/// A primary event paired with the latest reference event at or before it.
///
/// When `matched_reference` is present its timestamp is `<=` the primary
/// timestamp and is the maximum such timestamp in the primary's group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedRecord<P, R> {
    /// The primary event.
    pub primary: Event<P>,
    /// Its as-of match, if any reference event qualifies.
    pub matched_reference: Option<Event<R>>,
}

impl<P, R> JoinedRecord<P, R> {
    /// Whether a reference event was matched.
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        self.matched_reference.is_some()
    }

    /// Group key of the primary event.
    #[must_use]
    pub fn group_key(&self) -> &str {
        &self.primary.group_key
    }

    /// Timestamp of the matched reference event.
    #[must_use]
    pub fn reference_timestamp(&self) -> Option<DateTime<Utc>> {
        self.matched_reference.as_ref().map(|r| r.timestamp)
    }

    /// How old the matched reference was at the primary's time.
    #[must_use]
    pub fn staleness(&self) -> Option<TimeDelta> {
        self.reference_timestamp().map(|ts| self.primary.timestamp - ts)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_staleness_is_primary_minus_reference() {
        let trade_ts = Utc.with_ymd_and_hms(2024, 1, 2, 9, 1, 0).unwrap();
        let quote_ts = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 30).unwrap();
        let record = JoinedRecord {
            primary: Event::new("AAPL", trade_ts, ()),
            matched_reference: Some(Event::new("AAPL", quote_ts, ())),
        };

        assert!(record.is_matched());
        assert_eq!(record.group_key(), "AAPL");
        assert_eq!(record.staleness(), Some(TimeDelta::seconds(30)));
    }

    #[test]
    fn test_unmatched_record_has_no_reference_timestamp() {
        let record: JoinedRecord<(), ()> = JoinedRecord {
            primary: Event::new("GOOGL", Utc::now(), ()),
            matched_reference: None,
        };

        assert!(!record.is_matched());
        assert!(record.reference_timestamp().is_none());
        assert!(record.staleness().is_none());
    }
}
