//! Domain types: events of either stream, demonstration payloads and the
//! joined record produced by the merge.

mod event;
mod payload;
mod record;

pub use event::{Event, PrimaryEvent, RawEvent, RawTimestamp, ReferenceEvent, StreamKind};
pub use payload::{Quote, Trade};
pub use record::JoinedRecord;
