//! Tabular Dataset Cleaning Library
//!
//! A configurable cleaning pipeline for tabular data built with Rust and Polars.
//!
//! # Overview
//!
//! A run applies up to four stages, always in this order:
//!
//! - **Deduplication**: removes rows repeating an earlier row
//! - **Column Pruning**: drops caller-named columns
//! - **Missing Values**: drops incomplete rows or fills missing values
//!   (mean, median, mode, backward fill or a constant)
//! - **Anomaly Detection**: flags rows that DBSCAN leaves as noise
//!
//! Each run returns the cleaned table, an ordered report of what ran and a
//! set of row counters.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use scrubber_processing::{CleaningOptions, Pipeline};
//! use scrubber_processing::codec::decode_table;
//!
//! let df = decode_table(&std::fs::read("data.csv")?)?;
//!
//! let options = CleaningOptions::builder()
//!     .drop_duplicates(true)
//!     .drop_columns(["internal_id"])
//!     .fill_na("fill")
//!     .fill_na_value("median")
//!     .enable_anomaly_detection(true)
//!     .build()?;
//!
//! let output = Pipeline::builder()
//!     .options(options)
//!     .build()?
//!     .process(df)?;
//!
//! println!("{}", output.report);
//! println!("Rows lost: {}", output.stats.corrupted_rows);
//! ```
//!
//! # Options
//!
//! [`CleaningOptions`] deserializes from the camelCase JSON used by callers:
//!
//! ```rust,ignore
//! let options = CleaningOptions::from_json(r#"{
//!     "dropDuplicates": true,
//!     "dropColumns": ["notes"],
//!     "fillNa": "fill",
//!     "fillNaValue": "custom",
//!     "fillCustomNaValue": 0
//! }"#)?;
//! ```
//!
//! Options are validated once when the pipeline is built; an invalid
//! combination fails with a [`PreprocessingError`] naming the stage.
//!
//! # Jobs
//!
//! The [`job`] module wraps the pipeline for batch use: it fetches a CSV from
//! a [`storage::TableStore`], cleans it and stores the result with the report
//! and counters attached.

pub mod clustering;
pub mod codec;
pub mod config;
pub mod error;
pub mod imputers;
pub mod job;
pub mod pipeline;
pub mod reporting;
pub mod storage;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use clustering::{ClusterLabel, ClusteringError, Dbscan};
pub use config::{
    AnomalyParams, CleaningOptions, CleaningOptionsBuilder, CleaningPlan, ConfigValidationError,
    FillStrategy, FillValue, MissingValuePolicy,
};
pub use error::{
    JobError, PreprocessingError, Result as PreprocessingResult, ResultExt, StageError,
    StorageError,
};
pub use imputers::StatisticalImputer;
pub use job::{JobResponse, JobRunner, ProcessingJob};
pub use pipeline::{
    ANOMALY_COLUMN, AnomalyDetector, ColumnPruner, Deduplicator, MissingValueResolver, Pipeline,
    PipelineBuilder, PipelineStage, run,
};
pub use reporting::{PipelineStats, ProcessingReport};
pub use storage::{LocalStore, MemoryStore, TableLocation, TableStore};
pub use types::{ColumnKind, ColumnKinds, PipelineOutput};
