//! Main cleaning pipeline module.
//!
//! This module provides the core `Pipeline` struct and builder for
//! orchestrating the cleaning stages.

use crate::config::{AnomalyParams, CleaningOptions, CleaningPlan};
use crate::error::{PreprocessingError, Result, ResultExt, StageError};
use crate::pipeline::{
    AnomalyDetector, ColumnPruner, Deduplicator, MissingValueResolver, PipelineStage,
};
use crate::reporting::RunAccumulator;
use crate::types::{ColumnKinds, PipelineOutput};
use crate::utils::count_complete_rows;
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, error, info};

/// The cleaning pipeline.
///
/// Stages run in a fixed order, each only when the options enable it:
/// deduplication, column pruning, missing value resolution, anomaly detection.
/// Use [`Pipeline::builder()`] to create a pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use scrubber_processing::{CleaningOptions, Pipeline};
///
/// let options = CleaningOptions::builder()
///     .drop_duplicates(true)
///     .fill_na("fill")
///     .fill_na_value("median")
///     .build()?;
///
/// let output = Pipeline::builder()
///     .options(options)
///     .build()?
///     .process(dataframe)?;
///
/// println!("{}", output.report);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    plan: CleaningPlan,
    anomaly_detector: Option<AnomalyDetector>,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// The validated plan this pipeline executes.
    pub fn plan(&self) -> &CleaningPlan {
        &self.plan
    }

    /// Run the enabled stages over a DataFrame.
    ///
    /// # Errors
    ///
    /// The first failing stage aborts the run; no partial table is returned.
    pub fn process(&self, df: DataFrame) -> Result<PipelineOutput> {
        match self.process_internal(df) {
            Ok(output) => Ok(output),
            Err(e) => {
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    fn process_internal(&self, df: DataFrame) -> Result<PipelineOutput> {
        let start_time = Instant::now();
        info!(
            "Starting cleaning pipeline on {} rows x {} columns",
            df.height(),
            df.width()
        );

        let mut kinds = ColumnKinds::classify(&df);
        let mut acc = RunAccumulator::start(df.height());
        let mut df = df;

        // Step 1: Deduplication
        if self.plan.drop_duplicates {
            info!("Step 1: Removing duplicate rows...");
            let (deduped, removed) =
                Deduplicator::run(df).in_stage(PipelineStage::Deduplication)?;
            acc.record_duplicates(removed);
            df = deduped;
        }

        // Step 2: Column pruning
        if !self.plan.drop_columns.is_empty() {
            info!("Step 2: Dropping columns...");
            df = ColumnPruner::run(df, &self.plan.drop_columns);
            acc.record_dropped_columns(&self.plan.drop_columns);
        }

        // Step 3: Missing values
        if let Some(policy) = &self.plan.missing_values {
            info!("Step 3: Resolving missing values ({})...", policy.name());
            let rows_before = df.height();
            df = MissingValueResolver::resolve(df, policy, &mut kinds)
                .in_stage(PipelineStage::MissingValues)?;
            acc.record_missing_values(policy.name(), rows_before, count_complete_rows(&df));
        }

        // Step 4: Anomaly detection
        if let Some(detector) = &self.anomaly_detector {
            info!("Step 4: Detecting anomalies...");
            let (flagged_df, flagged) = detector
                .detect(df, &kinds)
                .in_stage(PipelineStage::AnomalyDetection)?;
            acc.record_anomalies(flagged);
            df = flagged_df;
        }

        let (report, stats) = acc.finish(df.height());
        debug!("Final shape: {:?}", (df.height(), df.width()));
        info!(
            "Pipeline finished in {}ms: {} of {} rows kept",
            start_time.elapsed().as_millis(),
            df.height(),
            stats.total_rows
        );

        Ok(PipelineOutput {
            table: df,
            report,
            stats,
        })
    }
}

/// Run the pipeline once with the given options.
pub fn run(df: DataFrame, options: &CleaningOptions) -> Result<PipelineOutput> {
    Pipeline::builder()
        .options(options.clone())
        .build()?
        .process(df)
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
///
/// # Example
///
/// ```rust,ignore
/// use scrubber_processing::{AnomalyParams, CleaningOptions, Pipeline};
///
/// let pipeline = Pipeline::builder()
///     .options(CleaningOptions::builder().enable_anomaly_detection(true).build()?)
///     .anomaly_params(AnomalyParams { epsilon: 1.5, min_samples: 3 })
///     .build()?;
/// ```
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    options: Option<CleaningOptions>,
    anomaly_params: Option<AnomalyParams>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the cleaning options.
    pub fn options(mut self, options: CleaningOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Override the anomaly clustering parameters.
    ///
    /// Only used when anomaly detection is enabled.
    pub fn anomaly_params(mut self, params: AnomalyParams) -> Self {
        self.anomaly_params = Some(params);
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error, tagged with the offending stage, if the options are
    /// invalid.
    pub fn build(self) -> Result<Pipeline> {
        let options = self.options.unwrap_or_default();
        let plan = options
            .validate()
            .map_err(|e| PreprocessingError::new(e.stage(), StageError::from(e)))?;

        let anomaly_detector = if plan.detect_anomalies {
            let params = self.anomaly_params.unwrap_or_default();
            Some(AnomalyDetector::new(params).in_stage(PipelineStage::AnomalyDetection)?)
        } else {
            None
        };

        debug!("Validated cleaning plan: {:?}", plan);
        Ok(Pipeline {
            plan,
            anomaly_detector,
        })
    }
}
