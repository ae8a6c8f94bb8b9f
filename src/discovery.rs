//! Seam for process discovery libraries.
//!
//! Discovery algorithms are external collaborators. They take the grouped
//! cases of an [`EventLog`] and return a model this crate treats as opaque,
//! apart from the summary counts exposed through [`DiscoveredModel`].

use crate::core::assembly::{Case, EventLog};
use serde::{Deserialize, Serialize};

/// Family of a discovered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Places, transitions, arcs and markings
    PetriNet,
    /// Activities with weighted directly-follows edges
    FrequencyGraph,
    /// Hierarchical operator tree
    ProcessTree,
}

/// Counts a discovered model can report without exposing its structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub algorithm: String,
    pub kind: ModelKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub places: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitions: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arcs: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
}

pub trait DiscoveredModel {
    fn summary(&self) -> ModelSummary;
}

/// A process discovery algorithm.
pub trait ProcessDiscovery {
    type Model: DiscoveredModel;
    type Error: std::error::Error;

    fn name(&self) -> &str;

    fn discover(&self, cases: &[Case]) -> Result<Self::Model, Self::Error>;
}

/// Run a discovery algorithm over an assembled log.
pub fn discover<D: ProcessDiscovery>(algorithm: &D, log: &EventLog) -> Result<D::Model, D::Error> {
    let cases = log.cases();
    tracing::info!(
        algorithm = algorithm.name(),
        cases = cases.len(),
        "running process discovery"
    );

    match algorithm.discover(&cases) {
        Ok(model) => {
            tracing::info!(summary = ?model.summary(), "discovery completed");
            Ok(model)
        }
        Err(e) => {
            tracing::warn!(algorithm = algorithm.name(), "discovery failed: {e}");
            Err(e)
        }
    }
}
