//! Shared utilities for the cleaning pipeline.
//!
//! This module contains the column and row helpers used by more than one
//! stage, so that null handling and dtype checks stay consistent.

use polars::prelude::*;
use std::cmp::Ordering;
use std::collections::BTreeMap;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType is an integer type.
#[inline]
pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Index of the first occurrence of the most frequent value in a numeric Series.
///
/// Integer columns are grouped on their exact values, floats on their f64
/// value. Ties go to the smallest value.
pub fn numeric_mode_index(series: &Series) -> PolarsResult<Option<usize>> {
    let dtype = series.dtype();
    if matches!(dtype, DataType::UInt64) {
        let values = indexed_values(series.u64()?.into_iter());
        return Ok(mode_of_sorted(values, |a, b| a.cmp(b)));
    }
    if is_integer_dtype(dtype) {
        let ints = series.cast(&DataType::Int64)?;
        let values = indexed_values(ints.i64()?.into_iter());
        return Ok(mode_of_sorted(values, |a, b| a.cmp(b)));
    }

    let floats = series.cast(&DataType::Float64)?;
    let values = indexed_values(floats.f64()?.into_iter());
    Ok(mode_of_sorted(values, |a, b| a.total_cmp(b)))
}

fn indexed_values<T>(values: impl Iterator<Item = Option<T>>) -> Vec<(T, usize)> {
    values
        .enumerate()
        .filter_map(|(idx, val)| val.map(|v| (v, idx)))
        .collect()
}

/// Index of the first occurrence of the longest run of equal values once
/// sorted; the smallest value wins ties.
fn mode_of_sorted<T, F>(mut values: Vec<(T, usize)>, cmp: F) -> Option<usize>
where
    F: Fn(&T, &T) -> Ordering,
{
    values.sort_by(|a, b| cmp(&a.0, &b.0).then(a.1.cmp(&b.1)));

    let mut best: Option<(usize, usize)> = None; // (count, index)
    let mut start = 0;
    while start < values.len() {
        let mut end = start + 1;
        while end < values.len() && cmp(&values[end].0, &values[start].0) == Ordering::Equal {
            end += 1;
        }
        let count = end - start;
        if best.is_none_or(|(best_count, _)| count > best_count) {
            best = Some((count, values[start].1));
        }
        start = end;
    }

    best.map(|(_, idx)| idx)
}

/// Index of the first occurrence of the most frequent value of any Series,
/// compared by its text form.
///
/// Ties go to the lexically smallest value.
pub fn string_mode_index(series: &Series) -> PolarsResult<Option<usize>> {
    let text = series.cast(&DataType::String)?;
    let mut value_counts: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (idx, val) in text.str()?.into_iter().enumerate() {
        if let Some(val) = val {
            value_counts.entry(val).or_insert((0, idx)).0 += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (count, idx) in value_counts.into_values() {
        if best.is_none_or(|(best_count, _)| count > best_count) {
            best = Some((count, idx));
        }
    }

    Ok(best.map(|(_, idx)| idx))
}

// =============================================================================
// Series Transformation Utilities
// =============================================================================

/// Fill null values in a numeric Series with a specific value.
///
/// Integer columns stay integer when the value is integral and fits the
/// column's integer range; otherwise the result is Float64.
pub fn fill_numeric_nulls(series: &Series, fill_value: f64) -> PolarsResult<Series> {
    let dtype = series.dtype();
    if is_integer_dtype(dtype) && fill_value.fract() == 0.0 {
        if matches!(dtype, DataType::UInt64) {
            if fill_value >= 0.0 && fill_value < u64::MAX as f64 {
                let result_vec: Vec<Option<u64>> = series
                    .u64()?
                    .into_iter()
                    .map(|val| Some(val.unwrap_or(fill_value as u64)))
                    .collect();
                return Ok(Series::new(series.name().clone(), result_vec));
            }
        } else if fill_value >= i64::MIN as f64 && fill_value < i64::MAX as f64 {
            let ints = series.cast(&DataType::Int64)?;
            let result_vec: Vec<Option<i64>> = ints
                .i64()?
                .into_iter()
                .map(|val| Some(val.unwrap_or(fill_value as i64)))
                .collect();
            return Ok(Series::new(series.name().clone(), result_vec));
        }
    }

    let floats = series.cast(&DataType::Float64)?;
    let result_vec: Vec<Option<f64>> = floats
        .f64()?
        .into_iter()
        .map(|val| Some(val.unwrap_or(fill_value)))
        .collect();
    Ok(Series::new(series.name().clone(), result_vec))
}

/// Fill null values with a string, converting the Series to text.
pub fn fill_string_nulls(series: &Series, fill_value: &str) -> PolarsResult<Series> {
    let text = series.cast(&DataType::String)?;
    let result_vec: Vec<Option<String>> = text
        .str()?
        .into_iter()
        .map(|val| Some(val.unwrap_or(fill_value).to_string()))
        .collect();
    Ok(Series::new(series.name().clone(), result_vec))
}

/// Fill null values with the value found at `idx`, keeping the dtype.
pub fn fill_nulls_from_index(series: &Series, idx: usize) -> PolarsResult<Series> {
    let fill = series.new_from_index(idx, series.len());
    series.zip_with(&series.is_not_null(), &fill)
}

// =============================================================================
// Row Utilities
// =============================================================================

/// Mask of rows holding no missing value in any column.
pub fn complete_row_mask(df: &DataFrame) -> BooleanChunked {
    let mut mask = BooleanChunked::full("complete".into(), true, df.height());
    for col in df.get_columns() {
        mask = &mask & &col.is_not_null();
    }
    mask
}

/// Number of rows holding no missing value in any column.
pub fn count_complete_rows(df: &DataFrame) -> usize {
    complete_row_mask(df)
        .into_iter()
        .filter(|complete| *complete == Some(true))
        .count()
}

/// Row-major f64 values of the given columns.
///
/// Missing values come out as NaN.
pub fn numeric_rows(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<Vec<f64>>> {
    let mut rows = vec![Vec::with_capacity(columns.len()); df.height()];
    for name in columns {
        let floats = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?;
        for (row, val) in rows.iter_mut().zip(floats.f64()?.into_iter()) {
            row.push(val.unwrap_or(f64::NAN));
        }
    }
    Ok(rows)
}

// =============================================================================
// Tests
// =============================================================================
