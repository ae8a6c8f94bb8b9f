//! Optional event selection: restrict a run to some sensors or hours.

use crate::ingest::SensorEvent;
use chrono::Timelike;
use serde::{Deserialize, Serialize};

/// Inclusive hour-of-day window. `start > end` wraps past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourRange {
    pub start: u32,
    pub end: u32,
}

impl HourRange {
    pub fn contains(&self, hour: u32) -> bool {
        if self.start <= self.end {
            (self.start..=self.end).contains(&hour)
        } else {
            hour >= self.start || hour <= self.end
        }
    }

    /// Parse `"8-20"`.
    pub fn parse(text: &str) -> Option<Self> {
        let (start, end) = text.split_once('-')?;
        let range = Self {
            start: start.trim().parse().ok()?,
            end: end.trim().parse().ok()?,
        };
        (range.start < 24 && range.end < 24).then_some(range)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Case-insensitive substring the sensor id must contain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensor_contains: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_range: Option<HourRange>,
}

impl EventFilter {
    pub fn is_empty(&self) -> bool {
        self.sensor_contains.is_none() && self.hour_range.is_none()
    }

    /// Keep only events from matching sensors. Returns survivors and the drop count.
    pub fn select_sensors(&self, events: Vec<SensorEvent>) -> (Vec<SensorEvent>, usize) {
        let Some(needle) = self.sensor_contains.as_deref().map(str::to_lowercase) else {
            return (events, 0);
        };
        retain_counting(events, |e| e.sensor_id.to_lowercase().contains(&needle))
    }

    /// Keep only events inside the hour window.
    pub fn select_hours(&self, events: Vec<SensorEvent>) -> (Vec<SensorEvent>, usize) {
        let Some(range) = self.hour_range else {
            return (events, 0);
        };
        retain_counting(events, |e| range.contains(e.timestamp.hour()))
    }
}

fn retain_counting<F>(mut events: Vec<SensorEvent>, keep: F) -> (Vec<SensorEvent>, usize)
where
    F: Fn(&SensorEvent) -> bool,
{
    let before = events.len();
    events.retain(|e| keep(e));
    let dropped = before - events.len();
    (events, dropped)
}
