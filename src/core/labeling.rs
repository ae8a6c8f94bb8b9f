//! Activity labeling.

use crate::config::ConfigError;
use crate::ingest::{SensorEvent, SensorValue};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Separator between sensor id and value in activity labels.
pub const LABEL_SEPARATOR: &str = "_";

/// How an activity name is derived from a sensor firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityPolicy {
    /// `<sensor>_<value>`, never fails
    #[default]
    Default,
    /// `<sensor>_Activate` / `<sensor>_Deactivate`, only for ON/OFF
    Binary,
}

impl ActivityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityPolicy::Default => "default",
            ActivityPolicy::Binary => "binary",
        }
    }

    /// Derive the activity label for one firing.
    pub fn label(&self, sensor_id: &str, value: &SensorValue) -> Result<String, LabelingError> {
        let suffix = match (self, value) {
            (ActivityPolicy::Default, v) => v.as_str(),
            (ActivityPolicy::Binary, SensorValue::On) => "Activate",
            (ActivityPolicy::Binary, SensorValue::Off) => "Deactivate",
            (ActivityPolicy::Binary, SensorValue::Other(v)) => {
                return Err(LabelingError::UnrecognizedValue {
                    sensor_id: sensor_id.to_string(),
                    value: v.clone(),
                })
            }
        };
        Ok(format!("{sensor_id}{LABEL_SEPARATOR}{suffix}"))
    }
}

impl fmt::Display for ActivityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" => Ok(ActivityPolicy::Default),
            "binary" => Ok(ActivityPolicy::Binary),
            other => Err(ConfigError::UnknownActivityPolicy(other.to_string())),
        }
    }
}

/// Value token not accepted by a strict labeling policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelingError {
    #[error("sensor {sensor_id}: value '{value}' is not ON/OFF")]
    UnrecognizedValue { sensor_id: String, value: String },
}

/// A firing with its derived activity name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledEvent {
    pub sensor_id: String,
    pub activity: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct LabeledBatch {
    pub events: Vec<LabeledEvent>,
    pub rejected: Vec<LabelingError>,
}

/// Label every event, dropping the ones the policy rejects.
pub fn label_events(events: &[SensorEvent], policy: ActivityPolicy) -> LabeledBatch {
    let mut batch = LabeledBatch::default();

    for event in events {
        match policy.label(&event.sensor_id, &event.value) {
            Ok(activity) => batch.events.push(LabeledEvent {
                sensor_id: event.sensor_id.clone(),
                activity,
                timestamp: event.timestamp,
            }),
            Err(e) => batch.rejected.push(e),
        }
    }

    if !batch.rejected.is_empty() {
        tracing::warn!(
            policy = %policy,
            rejected = batch.rejected.len(),
            "some events could not be labeled"
        );
    }

    batch
}
