//! Missing value resolution.

use crate::config::{FillStrategy, MissingValuePolicy};
use crate::error::StageError;
use crate::imputers::{ColumnFill, StatisticalImputer};
use crate::types::ColumnKinds;
use crate::utils::complete_row_mask;
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Drops or fills missing values according to a [`MissingValuePolicy`].
pub struct MissingValueResolver;

impl MissingValueResolver {
    /// Apply `policy` to every column of `df`.
    ///
    /// Columns converted to text by a constant fill are recorded in `kinds`.
    pub fn resolve(
        df: DataFrame,
        policy: &MissingValuePolicy,
        kinds: &mut ColumnKinds,
    ) -> Result<DataFrame, StageError> {
        match policy {
            MissingValuePolicy::Drop => Self::drop_incomplete_rows(df),
            MissingValuePolicy::Fill(strategy) => Self::fill(df, strategy, kinds),
            MissingValuePolicy::Unrecognized(name) => {
                warn!("Unrecognized missing value policy '{}', leaving table unchanged", name);
                Ok(df)
            }
        }
    }

    /// Remove every row holding at least one missing value.
    fn drop_incomplete_rows(df: DataFrame) -> Result<DataFrame, StageError> {
        let before = df.height();
        let mask = complete_row_mask(&df);
        let df = df.filter(&mask)?;
        debug!("Dropped {} rows with missing values", before - df.height());
        Ok(df)
    }

    fn fill(
        mut df: DataFrame,
        strategy: &FillStrategy,
        kinds: &mut ColumnKinds,
    ) -> Result<DataFrame, StageError> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        let mut filled = 0;
        for name in &columns {
            let numeric = kinds.is_numeric(name);
            let outcome = match strategy {
                FillStrategy::Mean if numeric => StatisticalImputer::fill_mean(&mut df, name)?,
                FillStrategy::Median if numeric => {
                    StatisticalImputer::fill_median(&mut df, name)?
                }
                // statistic fills leave non-numeric columns alone
                FillStrategy::Mean | FillStrategy::Median => ColumnFill::Unchanged,
                FillStrategy::Mode => StatisticalImputer::fill_mode(&mut df, name, numeric)?,
                FillStrategy::Backwards => StatisticalImputer::fill_backwards(&mut df, name)?,
                FillStrategy::Custom(value) => {
                    StatisticalImputer::fill_custom(&mut df, name, value, numeric)?
                }
            };

            match outcome {
                ColumnFill::Filled => filled += 1,
                ColumnFill::FilledAsText => {
                    filled += 1;
                    if numeric {
                        debug!("Column '{}' converted to text by constant fill", name);
                        kinds.mark_non_numeric(name);
                    }
                }
                ColumnFill::Unchanged => {}
            }
        }

        info!(
            "Filled missing values in {} of {} columns using {}",
            filled,
            columns.len(),
            strategy.name()
        );
        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FillValue;

    fn resolve(df: DataFrame, policy: MissingValuePolicy) -> (DataFrame, ColumnKinds) {
        let mut kinds = ColumnKinds::classify(&df);
        let df = MissingValueResolver::resolve(df, &policy, &mut kinds).unwrap();
        (df, kinds)
    }

    fn null_total(df: &DataFrame) -> usize {
        df.get_columns().iter().map(|col| col.null_count()).sum()
    }

    #[test]
    fn test_drop_keeps_complete_rows() {
        let df = df![
            "a" => [Some(1i64), Some(4), Some(7)],
            "b" => [None, Some(5i64), Some(8)],
            "c" => [Some(3i64), Some(6), None],
        ]
        .unwrap();

        let (df, _) = resolve(df, MissingValuePolicy::Drop);
        assert_eq!(df.height(), 1);
        assert_eq!(
            df.column("a").unwrap().get(0).unwrap().try_extract::<i64>().unwrap(),
            4
        );
    }

    #[test]
    fn test_mean_skips_text_columns() {
        let df = df![
            "score" => [Some(2.0), None, Some(4.0)],
            "name" => [Some("a"), Some("b"), None],
        ]
        .unwrap();

        let (df, _) = resolve(df, MissingValuePolicy::Fill(FillStrategy::Mean));
        let score = df.column("score").unwrap();
        assert_eq!(score.null_count(), 0);
        assert_eq!(score.get(1).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert_eq!(df.column("name").unwrap().null_count(), 1);
    }

    #[test]
    fn test_median_fill() {
        let df = df![
            "v" => [Some(1.0), Some(10.0), Some(2.0), None],
        ]
        .unwrap();

        let (df, _) = resolve(df, MissingValuePolicy::Fill(FillStrategy::Median));
        let v = df.column("v").unwrap();
        assert_eq!(v.get(3).unwrap().try_extract::<f64>().unwrap(), 2.0);
    }

    #[test]
    fn test_mode_fills_every_column() {
        let df = df![
            "n" => [Some(1i64), Some(2), Some(2), None],
            "s" => [Some("x"), None, Some("y"), Some("y")],
        ]
        .unwrap();

        let (df, _) = resolve(df, MissingValuePolicy::Fill(FillStrategy::Mode));
        assert_eq!(null_total(&df), 0);
        assert_eq!(
            df.column("n").unwrap().get(3).unwrap().try_extract::<i64>().unwrap(),
            2
        );
        assert_eq!(df.column("s").unwrap().str().unwrap().get(1), Some("y"));
    }

    #[test]
    fn test_backwards_fill() {
        let df = df![
            "v" => [None, Some(1.0), None, Some(3.0)],
            "s" => [Some("a"), None, Some("c"), None],
        ]
        .unwrap();

        let (df, _) = resolve(df, MissingValuePolicy::Fill(FillStrategy::Backwards));
        let v = df.column("v").unwrap();
        assert_eq!(v.get(0).unwrap().try_extract::<f64>().unwrap(), 1.0);
        assert_eq!(v.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
        let s = df.column("s").unwrap().str().unwrap().clone();
        assert_eq!(s.get(1), Some("c"));
        // trailing gap has nothing below it
        assert_eq!(s.get(3), None);
    }

    #[test]
    fn test_custom_fill_reclassifies_text_columns() {
        let df = df![
            "v" => [Some(1.0), None],
            "w" => [Some(2i64), Some(3)],
        ]
        .unwrap();

        let (df, kinds) = resolve(
            df,
            MissingValuePolicy::Fill(FillStrategy::Custom(FillValue::from("missing"))),
        );
        assert_eq!(df.column("v").unwrap().dtype(), &DataType::String);
        assert!(!kinds.is_numeric("v"));
        // no missing values, so the column stays numeric
        assert!(kinds.is_numeric("w"));
    }

    #[test]
    fn test_custom_zero_fill() {
        let df = df![
            "v" => [Some(5i64), None, Some(7)],
            "s" => [None, Some("b"), Some("c")],
        ]
        .unwrap();

        let (df, kinds) = resolve(
            df,
            MissingValuePolicy::Fill(FillStrategy::Custom(FillValue::from(0))),
        );
        assert_eq!(null_total(&df), 0);
        assert_eq!(
            df.column("v").unwrap().get(1).unwrap().try_extract::<i64>().unwrap(),
            0
        );
        assert_eq!(df.column("s").unwrap().str().unwrap().get(0), Some("0"));
        assert!(kinds.is_numeric("v"));
    }

    #[test]
    fn test_unrecognized_policy_is_noop() {
        let df = df!["v" => [Some(1.0), None]].unwrap();
        let (out, _) = resolve(
            df.clone(),
            MissingValuePolicy::Unrecognized("interpolate".to_string()),
        );
        assert_eq!(out.height(), 2);
        assert_eq!(null_total(&out), 1);
    }
}
