//! Run summary: what went in, what came out, and what was dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Keep at most this many example messages per run.
const MAX_DROP_SAMPLES: usize = 20;

/// Why a record or event was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MalformedRecord,
    LabelingError,
    IncompleteEvent,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DropReason::MalformedRecord => "MalformedRecord",
            DropReason::LabelingError => "LabelingError",
            DropReason::IncompleteEvent => "IncompleteEvent",
        };
        f.write_str(name)
    }
}

/// Per-reason drop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub malformed_record: u64,
    pub labeling_error: u64,
    pub incomplete_event: u64,
}

impl DropCounts {
    pub fn get(&self, reason: DropReason) -> u64 {
        match reason {
            DropReason::MalformedRecord => self.malformed_record,
            DropReason::LabelingError => self.labeling_error,
            DropReason::IncompleteEvent => self.incomplete_event,
        }
    }

    pub fn total(&self) -> u64 {
        self.malformed_record + self.labeling_error + self.incomplete_event
    }
}

/// An example of a dropped record, kept for diagnosis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropSample {
    pub reason: DropReason,
    pub message: String,
}

/// Summary of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Data lines read from the source
    pub input_records: u64,
    /// Events left after timestamp normalization
    pub normalized_events: u64,
    /// Events removed by the sensor / hour filters
    pub filtered_out: u64,
    pub noise_removed: u64,
    pub noise_removed_pct: f64,
    pub log_events: u64,
    pub cases: u64,
    pub drops: DropCounts,
    pub drop_samples: Vec<DropSample>,
}

impl RunSummary {
    /// Start a new summary.
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            input_records: 0,
            normalized_events: 0,
            filtered_out: 0,
            noise_removed: 0,
            noise_removed_pct: 0.0,
            log_events: 0,
            cases: 0,
            drops: DropCounts::default(),
            drop_samples: Vec::new(),
        }
    }

    /// Record one dropped record or event.
    pub fn record_drop(&mut self, reason: DropReason, message: impl fmt::Display) {
        match reason {
            DropReason::MalformedRecord => self.drops.malformed_record += 1,
            DropReason::LabelingError => self.drops.labeling_error += 1,
            DropReason::IncompleteEvent => self.drops.incomplete_event += 1,
        }
        if self.drop_samples.len() < MAX_DROP_SAMPLES {
            self.drop_samples.push(DropSample {
                reason,
                message: message.to_string(),
            });
        }
    }

    /// Record every error of one kind.
    pub fn record_drops<E: fmt::Display>(&mut self, reason: DropReason, errors: &[E]) {
        for e in errors {
            self.record_drop(reason, e);
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let duration = match self.duration_ms() {
            Some(ms) => format!("{ms} ms"),
            None => "running".to_string(),
        };
        format!(
            "Run Summary ({}):\n\
             - Duration: {}\n\
             - Input records: {}\n\
             - Malformed records dropped: {}\n\
             - Labeling errors dropped: {}\n\
             - Incomplete events dropped: {}\n\
             - Filtered out by selection: {}\n\
             - Rapid-fire events removed: {} ({:.2}%)\n\
             - Event log: {} events in {} cases",
            self.run_id,
            duration,
            self.input_records,
            self.drops.malformed_record,
            self.drops.labeling_error,
            self.drops.incomplete_event,
            self.filtered_out,
            self.noise_removed,
            self.noise_removed_pct,
            self.log_events,
            self.cases
        )
    }

    /// Save the summary as JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, json)
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::new()
    }
}
