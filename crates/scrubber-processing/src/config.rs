//! Cleaning options for the pipeline.
//!
//! [`CleaningOptions`] is the wire form: a flat, all-optional mapping that
//! deserializes from the camelCase JSON callers send (`dropDuplicates`,
//! `fillNa`, ...). It is validated exactly once, at pipeline entry, into a
//! typed [`CleaningPlan`] that the stages consume.
//!
//! # Example
//!
//! ```rust,ignore
//! use scrubber_processing::config::{CleaningOptions, FillValue};
//!
//! let options = CleaningOptions::builder()
//!     .drop_duplicates(true)
//!     .drop_columns(["internal_id"])
//!     .fill_na("fill")
//!     .fill_na_value("custom")
//!     .fill_custom_na_value(0)
//!     .build()?;
//!
//! let plan = options.validate()?;
//! ```

use crate::pipeline::PipelineStage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default neighborhood radius for anomaly clustering.
pub const DEFAULT_EPSILON: f64 = 0.5;

/// Default minimum neighborhood size (the point itself included).
pub const DEFAULT_MIN_SAMPLES: usize = 5;

/// A caller-supplied scalar used by the `custom` fill strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FillValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FillValue {
    /// Numeric interpretation of the value, if it has one.
    ///
    /// Text that parses as a number counts as numeric so that a value typed
    /// into a form field still fills numeric columns numerically.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for FillValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                write!(f, "{}", *n as i64)
            }
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FillValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FillValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for FillValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for FillValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for FillValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FillValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// How the missing value stage fills a column.
#[derive(Debug, Clone, PartialEq)]
pub enum FillStrategy {
    /// Arithmetic mean of the numeric column
    Mean,
    /// Median of the numeric column
    Median,
    /// Most frequent value of the column (smallest value on ties)
    Mode,
    /// Next non-missing value further down the column
    Backwards,
    /// A caller-supplied constant
    Custom(FillValue),
}

impl FillStrategy {
    /// Short name used in reports and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Backwards => "backwards",
            Self::Custom(_) => "custom",
        }
    }
}

/// Validated missing value policy.
#[derive(Debug, Clone, PartialEq)]
pub enum MissingValuePolicy {
    /// Remove every row holding at least one missing field.
    Drop,
    /// Replace missing fields according to the strategy.
    Fill(FillStrategy),
    /// A policy name the stage does not know; the stage runs as a no-op.
    Unrecognized(String),
}

impl MissingValuePolicy {
    /// Policy name as it appears in the options (`drop`, `fill`, ...).
    pub fn name(&self) -> &str {
        match self {
            Self::Drop => "drop",
            Self::Fill(_) => "fill",
            Self::Unrecognized(name) => name,
        }
    }
}

/// Parameters of the density-based anomaly clustering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnomalyParams {
    /// Neighborhood radius (Euclidean, unscaled).
    pub epsilon: f64,
    /// Minimum neighborhood size for a core point, the point itself included.
    pub min_samples: usize,
}

impl Default for AnomalyParams {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

impl AnomalyParams {
    /// Validate the parameters.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(ConfigValidationError::InvalidEpsilon(self.epsilon));
        }
        if self.min_samples == 0 {
            return Err(ConfigValidationError::InvalidMinSamples(self.min_samples));
        }
        Ok(())
    }
}

/// Cleaning options as supplied by the caller.
///
/// All keys are optional; an empty object disables every stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleaningOptions {
    /// Enable duplicate row removal.
    pub drop_duplicates: bool,

    /// Columns to remove; names not present in the table are ignored.
    pub drop_columns: Vec<String>,

    /// Missing value policy: `none`, `drop` or `fill`.
    /// Absent or `none` disables the stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_na: Option<String>,

    /// Fill sub-policy when `fill_na` is `fill`:
    /// `mean`, `median`, `mode`, `backwards` or `custom`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_na_value: Option<String>,

    /// Value used by the `custom` fill sub-policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_custom_na_value: Option<FillValue>,

    /// Enable density-based anomaly flagging.
    pub enable_anomaly_detection: bool,
}

impl CleaningOptions {
    /// Create a new options builder.
    pub fn builder() -> CleaningOptionsBuilder {
        CleaningOptionsBuilder::default()
    }

    /// Parse options from their JSON form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the options into the plan the pipeline executes.
    pub fn validate(&self) -> Result<CleaningPlan, ConfigValidationError> {
        let missing_values = match self.fill_na.as_deref() {
            None | Some("none") => None,
            Some("drop") => Some(MissingValuePolicy::Drop),
            Some("fill") => Some(MissingValuePolicy::Fill(self.fill_strategy()?)),
            Some(other) => Some(MissingValuePolicy::Unrecognized(other.to_string())),
        };

        Ok(CleaningPlan {
            drop_duplicates: self.drop_duplicates,
            drop_columns: self.drop_columns.clone(),
            missing_values,
            detect_anomalies: self.enable_anomaly_detection,
        })
    }

    fn fill_strategy(&self) -> Result<FillStrategy, ConfigValidationError> {
        match self.fill_na_value.as_deref() {
            Some("mean") => Ok(FillStrategy::Mean),
            Some("median") => Ok(FillStrategy::Median),
            Some("mode") => Ok(FillStrategy::Mode),
            Some("backwards") => Ok(FillStrategy::Backwards),
            Some("custom") => self
                .fill_custom_na_value
                .clone()
                .map(FillStrategy::Custom)
                .ok_or(ConfigValidationError::MissingCustomValue),
            Some(other) => Err(ConfigValidationError::UnknownFillValue(other.to_string())),
            None => Err(ConfigValidationError::MissingFillValue),
        }
    }
}

/// The validated, typed form of [`CleaningOptions`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CleaningPlan {
    pub drop_duplicates: bool,
    pub drop_columns: Vec<String>,
    pub missing_values: Option<MissingValuePolicy>,
    pub detect_anomalies: bool,
}

/// Errors that can occur during option validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fillNaValue provided: '{0}'")]
    UnknownFillValue(String),

    #[error("fillNa is 'fill' but no fillNaValue was provided")]
    MissingFillValue,

    #[error("fillNaValue is 'custom' but no fillCustomNaValue was provided")]
    MissingCustomValue,

    #[error("Invalid anomaly epsilon: {0} (must be finite and greater than 0)")]
    InvalidEpsilon(f64),

    #[error("Invalid anomaly min_samples: {0} (must be at least 1)")]
    InvalidMinSamples(usize),
}

impl ConfigValidationError {
    /// The stage whose options were rejected.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::UnknownFillValue(_) | Self::MissingFillValue | Self::MissingCustomValue => {
                PipelineStage::MissingValues
            }
            Self::InvalidEpsilon(_) | Self::InvalidMinSamples(_) => {
                PipelineStage::AnomalyDetection
            }
        }
    }
}

/// Builder for [`CleaningOptions`] with fluent API.
#[derive(Debug, Default)]
pub struct CleaningOptionsBuilder {
    options: CleaningOptions,
}

impl CleaningOptionsBuilder {
    /// Enable or disable duplicate row removal.
    pub fn drop_duplicates(mut self, enable: bool) -> Self {
        self.options.drop_duplicates = enable;
        self
    }

    /// Set the columns to drop.
    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the missing value policy (`none`, `drop`, `fill`).
    pub fn fill_na(mut self, policy: impl Into<String>) -> Self {
        self.options.fill_na = Some(policy.into());
        self
    }

    /// Set the fill sub-policy (`mean`, `median`, `mode`, `backwards`, `custom`).
    pub fn fill_na_value(mut self, strategy: impl Into<String>) -> Self {
        self.options.fill_na_value = Some(strategy.into());
        self
    }

    /// Set the value used by the `custom` fill sub-policy.
    pub fn fill_custom_na_value(mut self, value: impl Into<FillValue>) -> Self {
        self.options.fill_custom_na_value = Some(value.into());
        self
    }

    /// Enable or disable anomaly detection.
    pub fn enable_anomaly_detection(mut self, enable: bool) -> Self {
        self.options.enable_anomaly_detection = enable;
        self
    }

    /// Build the options.
    ///
    /// Returns the options once they pass validation.
    pub fn build(self) -> Result<CleaningOptions, ConfigValidationError> {
        self.options.validate()?;
        Ok(self.options)
    }
}
