//! Stages of the cleaning pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of the cleaning pipeline, in execution order.
///
/// The order is fixed: only whether a stage runs is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Removing duplicate rows
    Deduplication,
    /// Dropping requested columns
    ColumnPruning,
    /// Dropping or filling missing values
    MissingValues,
    /// Flagging anomalous rows
    AnomalyDetection,
}

impl PipelineStage {
    /// All stages in execution order.
    pub const ORDER: [PipelineStage; 4] = [
        Self::Deduplication,
        Self::ColumnPruning,
        Self::MissingValues,
        Self::AnomalyDetection,
    ];

    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Deduplication => "deduplication",
            Self::ColumnPruning => "column pruning",
            Self::MissingValues => "missing value resolution",
            Self::AnomalyDetection => "anomaly detection",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
