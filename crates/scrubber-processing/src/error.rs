//! Error types for the cleaning pipeline and its storage boundary.
//!
//! The hierarchy mirrors how a run fails:
//!
//! - [`StageError`] is what a single stage returns.
//! - [`PreprocessingError`] is the orchestrator's wrapper around a
//!   [`StageError`], carrying the name of the stage that failed.
//! - [`StorageError`] and [`JobError`] belong to the job boundary
//!   (fetching, decoding, encoding and storing tables).
//!
//! Errors are serializable as `{code, message}` so job responses can hand
//! them to a caller unchanged.

use crate::clustering::ClusteringError;
use crate::config::ConfigValidationError;
use crate::pipeline::PipelineStage;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Failure raised by a single pipeline stage.
#[derive(Error, Debug)]
pub enum StageError {
    /// A recognized but unsupported combination of option values.
    #[error("Invalid option: {0}")]
    InvalidOption(String),

    /// The stage's transform failed for structural reasons (polars errors
    /// included).
    #[error("Stage execution failed: {0}")]
    Execution(String),

    /// The clustering step could not run.
    #[error("Anomaly detection failed: {0}")]
    AnomalyDetection(String),
}

impl StageError {
    /// Get error code for callers that branch on the failure kind.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidOption(_) => "INVALID_OPTION",
            Self::Execution(_) => "STAGE_EXECUTION_ERROR",
            Self::AnomalyDetection(_) => "ANOMALY_DETECTION_ERROR",
        }
    }
}

// polars failures are structural failures of the table
impl From<polars::error::PolarsError> for StageError {
    fn from(err: polars::error::PolarsError) -> Self {
        StageError::Execution(err.to_string())
    }
}

impl From<ConfigValidationError> for StageError {
    fn from(err: ConfigValidationError) -> Self {
        StageError::InvalidOption(err.to_string())
    }
}

impl From<ClusteringError> for StageError {
    fn from(err: ClusteringError) -> Self {
        StageError::AnomalyDetection(err.to_string())
    }
}

/// The pipeline's single point of failure.
///
/// Every stage error is wrapped here together with the stage it came from.
/// The original cause stays reachable through [`std::error::Error::source`]
/// and [`PreprocessingError::cause`].
#[derive(Error, Debug)]
#[error("Error in preprocessing data during {stage}: {source}")]
pub struct PreprocessingError {
    stage: PipelineStage,
    #[source]
    source: StageError,
}

impl PreprocessingError {
    /// Wrap a stage error with the stage it originated from.
    pub fn new(stage: PipelineStage, source: StageError) -> Self {
        Self { stage, source }
    }

    /// The stage that failed.
    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    /// The originating stage error.
    pub fn cause(&self) -> &StageError {
        &self.source
    }

    /// Error code of the originating stage error.
    pub fn error_code(&self) -> &'static str {
        self.source.error_code()
    }

    /// Check if the run was rejected because of its options.
    pub fn is_invalid_option(&self) -> bool {
        matches!(self.source, StageError::InvalidOption(_))
    }
}

impl Serialize for PreprocessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PreprocessingError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("stage", &self.stage)?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PreprocessingError>;

/// Extension trait for attaching the failing stage to a stage result.
pub trait ResultExt<T> {
    /// Wrap the error, if any, into a [`PreprocessingError`] for `stage`.
    fn in_stage(self, stage: PipelineStage) -> Result<T>;
}

impl<T> ResultExt<T> for std::result::Result<T, StageError> {
    fn in_stage(self, stage: PipelineStage) -> Result<T> {
        self.map_err(|e| PreprocessingError::new(stage, e))
    }
}

/// Failure of a [`TableStore`](crate::storage::TableStore) operation.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Nothing is stored at the location.
    #[error("Object '{0}' not found")]
    NotFound(String),

    /// The key cannot be mapped onto the store (e.g. path traversal).
    #[error("Invalid key '{0}'")]
    InvalidKey(String),

    /// IO error while reading or writing the location.
    #[error("IO error for '{location}': {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    /// Attribute sidecar could not be read or written.
    #[error("Attribute error for '{location}': {source}")]
    Attributes {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of a whole processing job (fetch, decode, clean, encode, store).
#[derive(Error, Debug)]
pub enum JobError {
    /// The job event could not be parsed.
    #[error("Invalid job event: {0}")]
    Event(#[from] serde_json::Error),

    /// Fetching or storing the table failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The fetched bytes are not a readable table.
    #[error("Failed to decode table: {0}")]
    Decode(#[source] polars::error::PolarsError),

    /// The cleaned table could not be written out.
    #[error("Failed to encode table: {0}")]
    Encode(#[source] polars::error::PolarsError),

    /// The pipeline itself failed.
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
}

impl JobError {
    /// Get error code for job responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Event(_) => "INVALID_EVENT",
            Self::Storage(StorageError::NotFound(_)) => "NOT_FOUND",
            Self::Storage(StorageError::InvalidKey(_)) => "INVALID_KEY",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Decode(_) => "DECODE_ERROR",
            Self::Encode(_) => "ENCODE_ERROR",
            Self::Preprocessing(e) => e.error_code(),
        }
    }
}

impl Serialize for JobError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("JobError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::df;

    #[test]
    fn test_stage_error_codes() {
        assert_eq!(
            StageError::InvalidOption("x".to_string()).error_code(),
            "INVALID_OPTION"
        );
        assert_eq!(
            StageError::Execution("x".to_string()).error_code(),
            "STAGE_EXECUTION_ERROR"
        );
        assert_eq!(
            StageError::AnomalyDetection("x".to_string()).error_code(),
            "ANOMALY_DETECTION_ERROR"
        );
    }

    #[test]
    fn test_in_stage_preserves_cause() {
        let result: std::result::Result<(), StageError> =
            Err(StageError::AnomalyDetection("no numeric columns".to_string()));
        let error = result.in_stage(PipelineStage::AnomalyDetection).unwrap_err();

        assert_eq!(error.stage(), PipelineStage::AnomalyDetection);
        assert_eq!(error.error_code(), "ANOMALY_DETECTION_ERROR");
        assert!(matches!(error.cause(), StageError::AnomalyDetection(_)));
        assert!(error.to_string().contains("anomaly detection"));
        assert!(error.to_string().contains("no numeric columns"));
    }

    #[test]
    fn test_polars_error_becomes_execution() {
        let df = df!["a" => [1i64]].unwrap();
        let polars_error = df.column("missing").unwrap_err();

        let stage_error: StageError = polars_error.into();
        assert!(matches!(stage_error, StageError::Execution(ref msg) if msg.contains("missing")));
        assert_eq!(stage_error.error_code(), "STAGE_EXECUTION_ERROR");
    }

    #[test]
    fn test_config_error_becomes_invalid_option() {
        let stage_error: StageError = ConfigValidationError::MissingCustomValue.into();
        assert!(matches!(stage_error, StageError::InvalidOption(_)));
    }

    #[test]
    fn test_preprocessing_error_serialization() {
        let error = PreprocessingError::new(
            PipelineStage::MissingValues,
            StageError::InvalidOption("unknown fill value 'avg'".to_string()),
        );
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("INVALID_OPTION"));
        assert!(json.contains("missing_values"));
        assert!(json.contains("avg"));
    }

    #[test]
    fn test_job_error_code_passes_through() {
        let error: JobError = PreprocessingError::new(
            PipelineStage::Deduplication,
            StageError::Execution("bad table".to_string()),
        )
        .into();
        assert_eq!(error.error_code(), "STAGE_EXECUTION_ERROR");

        let missing: JobError = StorageError::NotFound("bucket/key.csv".to_string()).into();
        assert_eq!(missing.error_code(), "NOT_FOUND");
    }
}
