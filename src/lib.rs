//! CASAS Event Log - process mining preprocessing for smart-home sensor data.
//!
//! This library turns a flat stream of timestamped sensor firings into an
//! event log of cases: ordered activity sequences ready for process
//! discovery, along with summary statistics describing the log.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       CASAS Event Log                        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │ Normalizer │──▶│   Noise    │──▶│  Labeler   │            │
//! │  │ (date+time)│   │  Filter    │   │ (activity) │            │
//! │  └────────────┘   └────────────┘   └────────────┘            │
//! │                                          │                   │
//! │                                          ▼                   │
//! │  ┌────────────┐   ┌────────────┐   ┌────────────┐            │
//! │  │ Statistics │◀──│ Assembler  │◀──│ Segmenter  │            │
//! │  │            │   │ (case,time)│   │ day/session│            │
//! │  └────────────┘   └────────────┘   └────────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use casas_eventlog::{Config, Pipeline};
//! use std::path::Path;
//!
//! let pipeline = Pipeline::new(Config::default()).expect("valid configuration");
//! let output = pipeline.run_path(Path::new("aruba.csv")).expect("readable input");
//!
//! println!("{} cases", output.statistics.case_count);
//! output.log.export_csv(Path::new("aruba_event_log.csv")).expect("export");
//! ```

pub mod config;
pub mod core;
pub mod discovery;
pub mod ingest;
pub mod pipeline;
pub mod report;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use crate::core::{
    ActivityPolicy, Case, CaseId, CaseStrategy, EventLog, EventLogEntry, LogStatistics, Segmenter,
};
pub use discovery::{DiscoveredModel, ModelKind, ModelSummary, ProcessDiscovery};
pub use ingest::{RawRecord, SensorEvent, SensorValue};
pub use pipeline::{Pipeline, PipelineError, PipelineOutput};
pub use report::{DropCounts, DropReason, RunSummary};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
