//! Flattening joined records into tabular rows.
//!
//! A row is `group_key`, `timestamp`, the primary payload fields, then
//! `reference_timestamp` and the reference payload fields, in that column
//! order. Reference fields are always present: unmatched records carry
//! `null` in each of them, so every row of an outer join has the same
//! columns.
//!
//! No field is ever overwritten. A primary field named like a key column is
//! renamed `primary_<name>`; a reference field whose name is taken is
//! renamed `reference_<name>`. The prefix repeats until the name is free.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::JoinedRecord;
use crate::error::JoinError;

/// Key columns every row starts with.
const KEY_COLUMNS: [&str; 3] = ["group_key", "timestamp", "reference_timestamp"];

/// One output row.
pub type Row = Map<String, Value>;

/// Builds rows with a fixed set of reference columns.
#[derive(Debug, Clone, Default)]
pub struct RowWriter {
    reference_fields: Vec<String>,
}

impl RowWriter {
    /// Writer that null-fills the given reference payload fields.
    #[must_use]
    pub fn new(reference_fields: impl IntoIterator<Item = String>) -> Self {
        let unique: BTreeSet<String> = reference_fields.into_iter().collect();
        Self {
            reference_fields: unique.into_iter().collect(),
        }
    }

    /// Writer whose reference columns are the union of the fields of `payloads`.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if a payload cannot be serialized.
    pub fn for_payloads<'a, R: Serialize + 'a>(
        payloads: impl IntoIterator<Item = &'a R>,
    ) -> Result<Self, JoinError> {
        let mut fields = BTreeSet::new();
        for payload in payloads {
            fields.extend(payload_fields(payload)?.into_iter().map(|(k, _)| k));
        }
        Ok(Self {
            reference_fields: fields.into_iter().collect(),
        })
    }

    /// Reference columns this writer emits, sorted.
    #[must_use]
    pub fn reference_fields(&self) -> &[String] {
        &self.reference_fields
    }

    /// Flatten one record.
    ///
    /// # Errors
    ///
    /// Returns `Serialization` if a payload cannot be serialized.
    pub fn row<P: Serialize, R: Serialize>(
        &self,
        record: &JoinedRecord<P, R>,
    ) -> Result<Row, JoinError> {
        let mut row = Row::new();
        row.insert("group_key".to_string(), Value::from(record.group_key()));
        row.insert("timestamp".to_string(), timestamp_value(record.primary.timestamp));

        for (name, value) in payload_fields(&record.primary.payload)? {
            row.insert(free_column(&row, "primary", &name), value);
        }

        row.insert(
            "reference_timestamp".to_string(),
            record.reference_timestamp().map_or(Value::Null, timestamp_value),
        );

        let mut reference = match &record.matched_reference {
            Some(event) => payload_fields(&event.payload)?,
            None => Row::new(),
        };
        for name in &self.reference_fields {
            let value = reference.remove(name).unwrap_or(Value::Null);
            row.insert(free_column(&row, "reference", name), value);
        }
        // Fields absent from the declared set still belong in the row
        for (name, value) in reference {
            row.insert(free_column(&row, "reference", &name), value);
        }

        Ok(row)
    }
}

/// `field`, or `field` behind as many `prefix_` as it takes to be unused.
/// Key columns count as used even before they are written.
fn free_column(row: &Row, prefix: &str, field: &str) -> String {
    let mut name = field.to_string();
    while row.contains_key(&name) || KEY_COLUMNS.contains(&name.as_str()) {
        name = format!("{prefix}_{name}");
    }
    name
}

/// Serialize a payload into named fields. Non-object payloads become a
/// single `payload` field; unit payloads have no fields.
fn payload_fields<T: Serialize>(payload: &T) -> Result<Row, JoinError> {
    Ok(match serde_json::to_value(payload)? {
        Value::Object(map) => map,
        Value::Null => Row::new(),
        other => {
            let mut map = Row::new();
            map.insert("payload".to_string(), other);
            map
        }
    })
}

fn timestamp_value(ts: DateTime<Utc>) -> Value {
    Value::from(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
