//! Timestamp normalization.
//!
//! Merges the separate date and time fields of each record into one
//! chronological key and re-establishes global time order.

use crate::ingest::types::{RawRecord, RecordError, SensorEvent, SensorValue};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// `%.f` makes the fractional part optional when parsing.
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Output of the normalizer.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// Events in stable chronological order
    pub events: Vec<SensorEvent>,
    pub rejected: Vec<RecordError>,
}

/// Parse separate date and time strings into one instant.
pub fn parse_instant(line: usize, date: &str, time: &str) -> Result<NaiveDateTime, RecordError> {
    let invalid = || RecordError::InvalidTimestamp {
        line,
        date: date.to_string(),
        time: time.to_string(),
    };

    let day = NaiveDate::parse_from_str(date.trim(), DATE_FORMAT).map_err(|_| invalid())?;
    let clock = NaiveTime::parse_from_str(time.trim(), TIME_FORMAT).map_err(|_| invalid())?;
    Ok(day.and_time(clock))
}

/// Normalize a single record.
pub fn normalize_record(record: &RawRecord) -> Result<SensorEvent, RecordError> {
    if record.sensor_id.trim().is_empty() {
        return Err(RecordError::MissingField {
            line: record.line,
            field: "sensor_id",
        });
    }
    if record.value.trim().is_empty() {
        return Err(RecordError::MissingField {
            line: record.line,
            field: "value",
        });
    }

    let timestamp = parse_instant(record.line, &record.date, &record.time)?;
    Ok(SensorEvent::new(
        record.sensor_id.trim(),
        SensorValue::parse(&record.value),
        timestamp,
    ))
}

/// Normalize all records and sort them by instant.
///
/// The sort is stable, so records sharing an instant keep their input order.
pub fn normalize(records: &[RawRecord]) -> NormalizedBatch {
    let mut batch = NormalizedBatch::default();

    for record in records {
        match normalize_record(record) {
            Ok(event) => batch.events.push(event),
            Err(e) => {
                tracing::debug!("dropping malformed record: {e}");
                batch.rejected.push(e);
            }
        }
    }

    batch.events.sort_by_key(|e| e.timestamp);

    tracing::info!(
        events = batch.events.len(),
        malformed = batch.rejected.len(),
        "normalized timestamps"
    );

    batch
}
