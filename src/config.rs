//! Configuration for event log construction.

use crate::core::filters::EventFilter;
use crate::core::labeling::ActivityPolicy;
use crate::core::noise::NoiseFilterConfig;
use crate::core::segmentation::{CaseStrategy, DEFAULT_SESSION_GAP_SECS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read at most this many data lines
    pub sample_size: Option<usize>,

    /// How events are grouped into cases
    pub case_strategy: CaseStrategy,

    /// How activity names are derived
    pub activity_policy: ActivityPolicy,

    /// Whether rapid-fire repeats of a sensor are removed
    pub remove_duplicates: bool,

    /// Minimum gap between kept firings of one sensor (in seconds)
    pub time_threshold_seconds: f64,

    /// Idle gap that starts a new session (in seconds)
    pub session_gap_seconds: f64,

    /// Optional sensor / hour selection
    pub filters: EventFilter,

    /// How many entries the text report lists
    pub top_n: usize,

    /// Directory for exported logs and reports
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("casas-eventlog");

        Self {
            sample_size: None,
            case_strategy: CaseStrategy::Daily,
            activity_policy: ActivityPolicy::Default,
            remove_duplicates: true,
            time_threshold_seconds: 1.0,
            session_gap_seconds: DEFAULT_SESSION_GAP_SECS,
            filters: EventFilter::default(),
            top_n: 20,
            output_dir: data_dir.join("exports"),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("casas-eventlog")
            .join("config.json")
    }

    /// Ensure the output directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Noise filter settings derived from this configuration.
    pub fn noise_filter(&self) -> NoiseFilterConfig {
        NoiseFilterConfig {
            enabled: self.remove_duplicates,
            threshold_secs: self.time_threshold_seconds,
        }
    }

    /// Reject settings that would make a run meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_size == Some(0) {
            return Err(ConfigError::InvalidParameter {
                name: "sample_size",
                value: "0".to_string(),
            });
        }
        if !self.time_threshold_seconds.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "time_threshold_seconds",
                value: self.time_threshold_seconds.to_string(),
            });
        }
        if !self.session_gap_seconds.is_finite() || self.session_gap_seconds <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "session_gap_seconds",
                value: self.session_gap_seconds.to_string(),
            });
        }
        if let Some(range) = self.filters.hour_range {
            if range.start > 23 || range.end > 23 {
                return Err(ConfigError::InvalidParameter {
                    name: "hour_range",
                    value: format!("{}-{}", range.start, range.end),
                });
            }
        }
        Ok(())
    }
}

/// Configuration errors. All of these are fatal to a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown segmentation policy '{0}' (expected 'daily' or 'session')")]
    UnknownSegmentationPolicy(String),

    #[error("unknown activity policy '{0}' (expected 'default' or 'binary')")]
    UnknownActivityPolicy(String),

    #[error("invalid value for {name}: {value}")]
    InvalidParameter { name: &'static str, value: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
