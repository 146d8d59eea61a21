//! Hash partitioning by group key.

use std::collections::HashMap;

use crate::domain::{Event, StreamKind};
use crate::error::JoinError;
use crate::ingest::check_group_key;

/// Events of one stream split by group key, each group in input order.
#[derive(Debug, Clone)]
pub struct Partitions<P> {
    stream: StreamKind,
    groups: HashMap<String, Vec<Event<P>>>,
    total_events: usize,
}

impl<P> Partitions<P> {
    /// Stream these partitions were built from.
    #[must_use]
    pub const fn stream(&self) -> StreamKind {
        self.stream
    }

    /// Number of distinct group keys.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of events across all groups.
    #[must_use]
    pub const fn total_events(&self) -> usize {
        self.total_events
    }

    /// Events of one group.
    #[must_use]
    pub fn get(&self, group_key: &str) -> Option<&[Event<P>]> {
        self.groups.get(group_key).map(Vec::as_slice)
    }

    /// Take ownership of one group's events.
    pub fn remove(&mut self, group_key: &str) -> Option<Vec<Event<P>>> {
        self.groups.remove(group_key)
    }

    /// Group keys in ascending order.
    #[must_use]
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Consume into the underlying map.
    #[must_use]
    pub fn into_groups(self) -> HashMap<String, Vec<Event<P>>> {
        self.groups
    }
}

/// Split `events` by group key.
///
/// Each event is stamped with its position in `events` as its sequence.
/// Relative order inside a group is the input order; nothing is dropped or
/// duplicated. A blank group key rejects the whole stream.
pub fn partition<P>(stream: StreamKind, events: Vec<Event<P>>) -> Result<Partitions<P>, JoinError> {
    let total_events = events.len();
    let mut groups: HashMap<String, Vec<Event<P>>> = HashMap::new();

    for (position, mut event) in events.into_iter().enumerate() {
        check_group_key(Some(&event.group_key))
            .map_err(|reason| JoinError::malformed(stream, position, reason))?;

        event.sequence = position as u64;
        match groups.get_mut(event.group_key.as_str()) {
            Some(group) => group.push(event),
            None => {
                groups.insert(event.group_key.clone(), vec![event]);
            }
        }
    }

    Ok(Partitions {
        stream,
        groups,
        total_events,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::error::MalformedReason;

    fn event(key: &str, minute: u32, tag: u32) -> Event<u32> {
        Event::new(key, Utc.with_ymd_and_hms(2024, 1, 2, 9, minute, 0).unwrap(), tag)
    }

    #[test]
    fn test_partition_preserves_relative_order() {
        let events = vec![
            event("AAPL", 3, 0),
            event("GOOGL", 1, 1),
            event("AAPL", 1, 2),
            event("AAPL", 2, 3),
        ];

        let partitions = partition(StreamKind::Primary, events).unwrap();

        let aapl: Vec<u32> = partitions.get("AAPL").unwrap().iter().map(|e| e.payload).collect();
        assert_eq!(aapl, vec![0, 2, 3]);
        assert_eq!(partitions.group_count(), 2);
        assert_eq!(partitions.total_events(), 4);
        assert_eq!(partitions.sorted_keys(), vec!["AAPL", "GOOGL"]);
    }

    #[test]
    fn test_partition_stamps_stream_positions() {
        let events = vec![event("AAPL", 0, 0), event("GOOGL", 0, 1), event("AAPL", 0, 2)];

        let partitions = partition(StreamKind::Reference, events).unwrap();

        let sequences: Vec<u64> =
            partitions.get("AAPL").unwrap().iter().map(|e| e.sequence).collect();
        assert_eq!(sequences, vec![0, 2]);
        assert_eq!(partitions.get("GOOGL").unwrap()[0].sequence, 1);
        assert_eq!(partitions.stream(), StreamKind::Reference);
    }

    #[test]
    fn test_partition_rejects_blank_group_key() {
        let events = vec![event("AAPL", 0, 0), event("", 0, 1)];

        let err = partition(StreamKind::Primary, events).unwrap_err();

        assert!(matches!(
            err,
            JoinError::MalformedEvent {
                stream: StreamKind::Primary,
                position: 1,
                reason: MalformedReason::EmptyGroupKey,
            }
        ));
    }

    #[test]
    fn test_partition_empty_stream() {
        let partitions = partition::<u32>(StreamKind::Reference, Vec::new()).unwrap();

        assert_eq!(partitions.group_count(), 0);
        assert!(partitions.get("AAPL").is_none());
    }
}
