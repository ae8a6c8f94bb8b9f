//! Ingest stage: reading raw records and normalizing their timestamps.

pub mod normalize;
pub mod reader;
pub mod types;

pub use normalize::{normalize, normalize_record, parse_instant, NormalizedBatch};
pub use reader::{read_records, read_records_from_path, ReadError, RecordSource};
pub use types::{RawRecord, RecordError, SensorEvent, SensorValue};
