//! Processing jobs: fetch a table, clean it, store the result.
//!
//! A job names a file in the source bucket and the cleaning options to apply.
//! The cleaned table is stored in the destination bucket as
//! `processed_<file_key>`, with the run's report and counters attached as
//! single-line string attributes.
//!
//! # Example
//!
//! ```rust,ignore
//! use scrubber_processing::job::JobRunner;
//! use scrubber_processing::storage::LocalStore;
//!
//! let runner = JobRunner::new(LocalStore::new("./data"));
//! let response = runner.handle_event(r#"{
//!     "file_key": "sales.csv",
//!     "cleaning_options": {"dropDuplicates": true}
//! }"#);
//! println!("{}", serde_json::to_string(&response)?);
//! ```

use crate::codec::{decode_table, encode_table};
use crate::config::{AnomalyParams, CleaningOptions};
use crate::error::JobError;
use crate::pipeline::Pipeline;
use crate::reporting::{PipelineStats, ProcessingReport};
use crate::storage::{Attributes, TableLocation, TableStore};
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Bucket jobs read from unless configured otherwise.
pub const DEFAULT_SOURCE_BUCKET: &str = "scrubber-user-uploads";

/// Bucket jobs write to unless configured otherwise.
pub const DEFAULT_DESTINATION_BUCKET: &str = "scrubber-processed-files";

/// Prefix added to the key of a processed table.
pub const PROCESSED_PREFIX: &str = "processed_";

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]+").expect("Invalid regex: control characters"));

/// A single cleaning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingJob {
    /// Key of the table in the source bucket.
    pub file_key: String,
    /// Options for the run; absent means no stage runs.
    #[serde(default)]
    pub cleaning_options: CleaningOptions,
}

impl ProcessingJob {
    pub fn from_json(json: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of a successful job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    /// Where the cleaned table was stored.
    pub processed: TableLocation,
    pub report: ProcessingReport,
    pub stats: PipelineStats,
}

/// Body of a [`JobResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobBody {
    Success { processed_file_key: String },
    Failure { error: String, code: String },
}

/// Status-coded answer to a job, in the shape invocation handlers return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: JobBody,
}

impl JobResponse {
    pub fn success(processed_file_key: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: JobBody::Success {
                processed_file_key: processed_file_key.into(),
            },
        }
    }

    pub fn failure(err: &JobError) -> Self {
        Self {
            status_code: 500,
            body: JobBody::Failure {
                error: err.to_string(),
                code: err.error_code().to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Runs processing jobs against a [`TableStore`].
#[derive(Debug, Clone)]
pub struct JobRunner<S> {
    store: S,
    source_bucket: String,
    destination_bucket: String,
    anomaly_params: Option<AnomalyParams>,
}

impl<S: TableStore> JobRunner<S> {
    /// Create a runner using the default buckets.
    pub fn new(store: S) -> Self {
        Self {
            store,
            source_bucket: DEFAULT_SOURCE_BUCKET.to_string(),
            destination_bucket: DEFAULT_DESTINATION_BUCKET.to_string(),
            anomaly_params: None,
        }
    }

    pub fn with_source_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.source_bucket = bucket.into();
        self
    }

    pub fn with_destination_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.destination_bucket = bucket.into();
        self
    }

    /// Override the anomaly clustering parameters for every job.
    pub fn with_anomaly_params(mut self, params: AnomalyParams) -> Self {
        self.anomaly_params = Some(params);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a job end to end.
    pub fn run(&self, job: &ProcessingJob) -> Result<JobOutcome, JobError> {
        let source = TableLocation::new(&self.source_bucket, &job.file_key);
        info!("Processing {}", source);

        let mut builder = Pipeline::builder().options(job.cleaning_options.clone());
        if let Some(params) = self.anomaly_params {
            builder = builder.anomaly_params(params);
        }
        let pipeline = builder.build()?;

        let bytes = self.store.fetch_table(&source)?;
        let df = decode_table(&bytes).map_err(JobError::Decode)?;
        let mut output = pipeline.process(df)?;
        let encoded = encode_table(&mut output.table).map_err(JobError::Encode)?;

        let processed = TableLocation::new(
            &self.destination_bucket,
            format!("{}{}", PROCESSED_PREFIX, job.file_key),
        );
        let attributes = build_attributes(&output.report, &output.stats, Utc::now());
        self.store.store_table(&processed, encoded, &attributes)?;

        info!("Stored cleaned table at {}", processed);
        Ok(JobOutcome {
            processed,
            report: output.report,
            stats: output.stats,
        })
    }

    /// Run a job and translate the result into a response.
    pub fn handle(&self, job: &ProcessingJob) -> JobResponse {
        match self.run(job) {
            Ok(outcome) => JobResponse::success(outcome.processed.key),
            Err(e) => {
                error!("Job for '{}' failed: {}", job.file_key, e);
                JobResponse::failure(&e)
            }
        }
    }

    /// Parse a JSON job event and handle it.
    pub fn handle_event(&self, event: &str) -> JobResponse {
        match ProcessingJob::from_json(event) {
            Ok(job) => self.handle(&job),
            Err(e) => {
                error!("Rejected job event: {}", e);
                JobResponse::failure(&e)
            }
        }
    }
}

/// Attributes stored with a processed table.
pub fn build_attributes(
    report: &ProcessingReport,
    stats: &PipelineStats,
    processed_at: DateTime<Utc>,
) -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert(
        "processing_report".to_string(),
        sanitize_attribute_value(&report.joined()),
    );
    attributes.insert("totalRows".to_string(), stats.total_rows.to_string());
    attributes.insert("duplicateRows".to_string(), stats.duplicate_rows.to_string());
    attributes.insert("modifiedRows".to_string(), stats.modified_rows.to_string());
    attributes.insert("corruptedRows".to_string(), stats.corrupted_rows.to_string());
    attributes.insert("anomalousRows".to_string(), stats.anomalous_rows.to_string());
    attributes.insert(
        "processedAt".to_string(),
        processed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    attributes
}

/// Collapse each run of control characters (newlines included) into a space.
pub fn sanitize_attribute_value(value: &str) -> String {
    CONTROL_CHARS.replace_all(value, " ").into_owned()
}
