//! Statistical imputation methods.
//!
//! Provides per-column mean, median, mode, backward and constant fills.
//! Every method leaves columns without missing values untouched.

use crate::config::FillValue;
use crate::utils::{
    fill_nulls_from_index, fill_numeric_nulls, fill_string_nulls, numeric_mode_index,
    string_mode_index,
};
use polars::prelude::*;
use tracing::debug;

/// Outcome of filling one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFill {
    /// Missing values were replaced.
    Filled,
    /// Missing values were replaced and the column now holds text.
    FilledAsText,
    /// Nothing to do, or no value to fill with.
    Unchanged,
}

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill a numeric column with its arithmetic mean.
    pub fn fill_mean(df: &mut DataFrame, col_name: &str) -> PolarsResult<ColumnFill> {
        let Some(series) = Self::series_with_nulls(df, col_name)? else {
            return Ok(ColumnFill::Unchanged);
        };
        match series.mean() {
            Some(mean_val) => Self::fill_with_value(df, col_name, mean_val, &series, "mean"),
            None => Ok(ColumnFill::Unchanged),
        }
    }

    /// Fill a numeric column with its median.
    pub fn fill_median(df: &mut DataFrame, col_name: &str) -> PolarsResult<ColumnFill> {
        let Some(series) = Self::series_with_nulls(df, col_name)? else {
            return Ok(ColumnFill::Unchanged);
        };
        match series.median() {
            Some(median_val) => {
                Self::fill_with_value(df, col_name, median_val, &series, "median")
            }
            None => Ok(ColumnFill::Unchanged),
        }
    }

    /// Fill a column with its most frequent value.
    ///
    /// Numeric columns break ties by numeric order, all others by text order.
    pub fn fill_mode(df: &mut DataFrame, col_name: &str, numeric: bool) -> PolarsResult<ColumnFill> {
        let Some(series) = Self::series_with_nulls(df, col_name)? else {
            return Ok(ColumnFill::Unchanged);
        };

        let mode_idx = if numeric {
            numeric_mode_index(&series)?
        } else {
            string_mode_index(&series)?
        };
        let Some(idx) = mode_idx else {
            return Ok(ColumnFill::Unchanged);
        };

        let filled = fill_nulls_from_index(&series, idx)?;
        debug!("Filled '{}' with mode: {}", col_name, series.get(idx)?);
        df.replace(col_name, filled)?;
        Ok(ColumnFill::Filled)
    }

    /// Fill each missing value with the next non-missing value below it.
    ///
    /// Trailing missing values stay missing.
    pub fn fill_backwards(df: &mut DataFrame, col_name: &str) -> PolarsResult<ColumnFill> {
        let Some(series) = Self::series_with_nulls(df, col_name)? else {
            return Ok(ColumnFill::Unchanged);
        };
        let filled = series.fill_null(FillNullStrategy::Backward(None))?;
        debug!(
            "Backward filled '{}' ({} values still missing)",
            col_name,
            filled.null_count()
        );
        df.replace(col_name, filled)?;
        Ok(ColumnFill::Filled)
    }

    /// Fill a column with a caller-supplied constant.
    ///
    /// Numeric columns stay numeric when the value has a numeric reading;
    /// otherwise the column is converted to text.
    pub fn fill_custom(
        df: &mut DataFrame,
        col_name: &str,
        value: &FillValue,
        numeric: bool,
    ) -> PolarsResult<ColumnFill> {
        let Some(series) = Self::series_with_nulls(df, col_name)? else {
            return Ok(ColumnFill::Unchanged);
        };

        if numeric && let Some(number) = value.as_number() {
            return Self::fill_with_value(df, col_name, number, &series, "custom value");
        }

        let filled = fill_string_nulls(&series, &value.to_string())?;
        debug!("Filled '{}' with constant value: '{}'", col_name, value);
        df.replace(col_name, filled)?;
        Ok(ColumnFill::FilledAsText)
    }

    /// Clone of the column if it exists and has missing values.
    fn series_with_nulls(df: &DataFrame, col_name: &str) -> PolarsResult<Option<Series>> {
        let Ok(col) = df.column(col_name) else {
            return Ok(None);
        };
        if col.null_count() == 0 {
            return Ok(None);
        }
        Ok(Some(col.as_materialized_series().clone()))
    }

    /// Fill numeric column with a specific value.
    fn fill_with_value(
        df: &mut DataFrame,
        col_name: &str,
        fill_value: f64,
        series: &Series,
        method: &str,
    ) -> PolarsResult<ColumnFill> {
        let result = fill_numeric_nulls(series, fill_value)?;
        df.replace(col_name, result)?;

        debug!("Filled '{}' with {}: {:.2}", col_name, method, fill_value);
        Ok(ColumnFill::Filled)
    }
}
