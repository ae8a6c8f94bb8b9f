//! Record and event types produced by the ingest stage.
//!
//! A [`RawRecord`] is one line of the source file split into its four textual
//! fields. A [`SensorEvent`] is the normalized form with a single parsed instant.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One unparsed input record: date, time, sensor identifier and value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    /// 1-based line number in the source
    pub line: usize,
    pub date: String,
    pub time: String,
    pub sensor_id: String,
    pub value: String,
}

impl RawRecord {
    pub fn new(
        line: usize,
        date: impl Into<String>,
        time: impl Into<String>,
        sensor_id: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            line,
            date: date.into(),
            time: time.into(),
            sensor_id: sensor_id.into(),
            value: value.into(),
        }
    }

    /// Split a source line into a record.
    ///
    /// Comma-separated lines are split on commas. Lines without a comma are
    /// split on whitespace, which is how the raw CASAS dumps are laid out.
    pub fn parse_line(line: usize, text: &str) -> Result<Self, RecordError> {
        let fields: Vec<&str> = if text.contains(',') {
            text.split(',').map(str::trim).collect()
        } else {
            text.split_whitespace().collect()
        };

        if fields.len() != 4 {
            return Err(RecordError::FieldCount {
                line,
                found: fields.len(),
            });
        }

        Ok(Self::new(line, fields[0], fields[1], fields[2], fields[3]))
    }
}

/// Reading reported by a binary sensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorValue {
    On,
    Off,
    /// Any other token, kept verbatim
    Other(String),
}

impl SensorValue {
    pub fn parse(token: &str) -> Self {
        let token = token.trim();
        if token.eq_ignore_ascii_case("ON") {
            SensorValue::On
        } else if token.eq_ignore_ascii_case("OFF") {
            SensorValue::Off
        } else {
            SensorValue::Other(token.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SensorValue::On => "ON",
            SensorValue::Off => "OFF",
            SensorValue::Other(s) => s,
        }
    }
}

impl fmt::Display for SensorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sensor firing with a normalized timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorEvent {
    pub sensor_id: String,
    pub value: SensorValue,
    /// Local wall-clock time of the firing
    pub timestamp: NaiveDateTime,
}

impl SensorEvent {
    pub fn new(sensor_id: impl Into<String>, value: SensorValue, timestamp: NaiveDateTime) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            value,
            timestamp,
        }
    }
}

/// Per-record ingest failures. These are counted as malformed records and
/// never abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("line {line}: not valid UTF-8")]
    InvalidEncoding { line: usize },

    #[error("line {line}: expected 4 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: missing {field}")]
    MissingField { line: usize, field: &'static str },

    #[error("line {line}: invalid timestamp '{date} {time}'")]
    InvalidTimestamp {
        line: usize,
        date: String,
        time: String,
    },
}

impl RecordError {
    pub fn line(&self) -> usize {
        match self {
            RecordError::InvalidEncoding { line }
            | RecordError::FieldCount { line, .. }
            | RecordError::MissingField { line, .. }
            | RecordError::InvalidTimestamp { line, .. } => *line,
        }
    }
}
