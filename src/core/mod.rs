//! Core event log construction.
//!
//! This module contains:
//! - Noise filtering of bouncing sensors
//! - Activity labeling
//! - Case segmentation (daily or session)
//! - Event log assembly and export
//! - Statistics over the assembled log

pub mod assembly;
pub mod filters;
pub mod labeling;
pub mod noise;
pub mod segmentation;
pub mod stats;

use chrono::NaiveDateTime;

// Re-export commonly used types
pub use assembly::{
    assemble, AssembledLog, AssemblyError, Case, CaseEvent, EventLog, EventLogEntry, ExportError,
    RoutedEvent,
};
pub use filters::{EventFilter, HourRange};
pub use labeling::{label_events, ActivityPolicy, LabeledBatch, LabeledEvent, LabelingError};
pub use noise::{filter_noise, FilteredEvents, NoiseFilterConfig};
pub use segmentation::{CaseId, CaseStrategy, Segmenter, SessionTracker};
pub use stats::{compute_statistics, preprocess_profile, LogStatistics, PreprocessProfile};

/// Elapsed seconds from `earlier` to `later` with microsecond precision.
pub(crate) fn seconds_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
    let delta = later - earlier;
    match delta.num_microseconds() {
        Some(us) => us as f64 / 1_000_000.0,
        None => delta.num_seconds() as f64,
    }
}
