//! Pipeline module.
//!
//! This module provides the cleaning pipeline and its stages.

mod anomaly;
mod builder;
mod dedup;
mod missing;
mod pruner;
mod stage;

pub use anomaly::{ANOMALY_COLUMN, AnomalyDetector};
pub use builder::{Pipeline, PipelineBuilder, run};
pub use dedup::Deduplicator;
pub use missing::MissingValueResolver;
pub use pruner::ColumnPruner;
pub use stage::PipelineStage;
