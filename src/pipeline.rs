//! End-to-end event log construction.
//!
//! ```text
//! records ─▶ normalize ─▶ select sensors ─▶ noise filter ─▶ select hours
//!         ─▶ label ─▶ segment ─▶ assemble ─▶ statistics
//! ```
//!
//! Each stage fully consumes its input before the next one runs. Data-quality
//! problems drop single records and are counted in the [`RunSummary`];
//! configuration problems fail before any record is touched.

use crate::config::{Config, ConfigError};
use crate::core::{
    assemble, compute_statistics, filter_noise, label_events, preprocess_profile, EventLog,
    LogStatistics, PreprocessProfile, RoutedEvent, Segmenter,
};
use crate::ingest::{normalize, read_records_from_path, ReadError, RecordSource};
use crate::report::{DropReason, RunSummary};
use chrono::NaiveDateTime;
use std::path::Path;
use thiserror::Error;

/// Sensors listed in the preprocessing profile.
const PROFILE_TOP_SENSORS: usize = 10;

/// Fatal pipeline errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Read(#[from] ReadError),
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub log: EventLog,
    pub statistics: LogStatistics,
    pub profile: PreprocessProfile,
    pub summary: RunSummary,
}

/// A validated pipeline, ready to run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Config,
    segmenter: Segmenter,
}

impl Pipeline {
    /// Validate the configuration and build the pipeline.
    pub fn new(config: Config) -> Result<Self, PipelineError> {
        config.validate()?;
        let segmenter = Segmenter::new(config.case_strategy, config.session_gap_seconds)?;
        Ok(Self { config, segmenter })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read a record file (honoring `sample_size`) and run the pipeline.
    pub fn run_path(&self, path: &Path) -> Result<PipelineOutput, PipelineError> {
        let source = read_records_from_path(path, self.config.sample_size)?;
        Ok(self.run(source))
    }

    /// Run every stage over records already in memory.
    pub fn run(&self, source: RecordSource) -> PipelineOutput {
        let mut summary = RunSummary::new();
        summary.input_records = source.line_count() as u64;
        summary.record_drops(DropReason::MalformedRecord, &source.rejected);

        let normalized = normalize(&source.records);
        summary.record_drops(DropReason::MalformedRecord, &normalized.rejected);
        summary.normalized_events = normalized.events.len() as u64;

        let filters = &self.config.filters;
        let (events, by_sensor) = filters.select_sensors(normalized.events);

        let filtered = filter_noise(&events, &self.config.noise_filter());
        summary.noise_removed = filtered.removed as u64;
        summary.noise_removed_pct = filtered.removed_pct();

        let (events, by_hour) = filters.select_hours(filtered.events);
        summary.filtered_out = (by_sensor + by_hour) as u64;
        if !filters.is_empty() {
            tracing::info!(by_sensor, by_hour, "applied event selection");
        }

        let labeled = label_events(&events, self.config.activity_policy);
        summary.record_drops(DropReason::LabelingError, &labeled.rejected);
        let profile = preprocess_profile(&labeled.events, PROFILE_TOP_SENSORS);

        let timestamps: Vec<NaiveDateTime> = labeled.events.iter().map(|e| e.timestamp).collect();
        let cases = self.segmenter.assign(&timestamps);
        tracing::info!(
            strategy = %self.segmenter.strategy(),
            events = timestamps.len(),
            "assigned case ids"
        );

        let routed: Vec<RoutedEvent> = labeled
            .events
            .into_iter()
            .zip(cases)
            .map(|(event, case)| RoutedEvent {
                case: Some(case),
                activity: event.activity,
                timestamp: event.timestamp,
            })
            .collect();

        let assembled = assemble(routed);
        summary.record_drops(DropReason::IncompleteEvent, &assembled.rejected);

        let statistics = compute_statistics(&assembled.log);
        summary.log_events = statistics.total_events as u64;
        summary.cases = statistics.case_count as u64;
        summary.finish();

        tracing::info!(
            events = summary.log_events,
            cases = summary.cases,
            dropped = summary.drops.total(),
            "event log created"
        );

        PipelineOutput {
            log: assembled.log,
            statistics,
            profile,
            summary,
        }
    }
}
