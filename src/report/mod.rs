//! Reporting for pipeline runs.
//!
//! Every run surfaces its drop counts and reasons through a [`RunSummary`];
//! nothing is dropped silently.

pub mod render;
pub mod summary;

// Re-export commonly used types
pub use render::{render_profile, render_statistics, ProfileReport, StatisticsReport};
pub use summary::{DropCounts, DropReason, DropSample, RunSummary};
