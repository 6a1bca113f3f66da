//! Density-based anomaly flagging.
//!
//! Rows are clustered on their numeric fields with DBSCAN; rows that end up
//! as noise are anomalous. The result is a boolean [`ANOMALY_COLUMN`] added to
//! the table: `true` for noise, `false` for clustered rows and missing for
//! rows that could not be clustered because a numeric field was missing.

use crate::clustering::Dbscan;
use crate::config::AnomalyParams;
use crate::error::StageError;
use crate::types::ColumnKinds;
use crate::utils::{complete_row_mask, numeric_rows};
use polars::prelude::*;
use tracing::debug;

/// Name of the column holding anomaly flags.
pub const ANOMALY_COLUMN: &str = "anomaly";

/// Flags anomalous rows.
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    dbscan: Dbscan,
}

impl AnomalyDetector {
    /// Create a detector with validated parameters.
    pub fn new(params: AnomalyParams) -> Result<Self, StageError> {
        params.validate()?;
        let dbscan = Dbscan::new(params.epsilon, params.min_samples)?;
        Ok(Self { dbscan })
    }

    /// Add the anomaly column to `df`.
    ///
    /// Returns the augmented table and the number of rows flagged. An existing
    /// column named [`ANOMALY_COLUMN`] is replaced and never clustered on.
    pub fn detect(
        &self,
        mut df: DataFrame,
        kinds: &ColumnKinds,
    ) -> Result<(DataFrame, usize), StageError> {
        let columns: Vec<String> = kinds
            .numeric_columns(&df)
            .into_iter()
            .filter(|name| name != ANOMALY_COLUMN)
            .collect();
        if columns.is_empty() {
            return Err(StageError::AnomalyDetection(
                "no numeric columns to cluster on".to_string(),
            ));
        }

        let numeric = df.select(columns.iter().map(String::as_str))?;
        let mask = complete_row_mask(&numeric);
        let complete = numeric.filter(&mask)?;
        if complete.height() == 0 {
            return Err(StageError::AnomalyDetection(
                "no rows without missing numeric values".to_string(),
            ));
        }

        debug!(
            "Clustering {} of {} rows on {} numeric columns (eps={}, min_samples={})",
            complete.height(),
            df.height(),
            columns.len(),
            self.dbscan.epsilon(),
            self.dbscan.min_samples()
        );

        let points = numeric_rows(&complete, &columns)?;
        let labels = self.dbscan.fit(&points)?;

        let mut labels_iter = labels.iter();
        let flags: Vec<Option<bool>> = mask
            .into_iter()
            .map(|row_complete| match row_complete {
                Some(true) => labels_iter.next().map(|label| label.is_noise()),
                _ => None,
            })
            .collect();
        let flagged = labels.iter().filter(|label| label.is_noise()).count();

        df.with_column(Series::new(ANOMALY_COLUMN.into(), flags))?;
        Ok((df, flagged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> AnomalyDetector {
        AnomalyDetector::new(AnomalyParams::default()).unwrap()
    }

    #[test]
    fn test_far_apart_rows_are_all_anomalous() {
        let df = df![
            "x" => [0.0, 100.0, 200.0],
            "y" => [0.0, 100.0, 200.0],
        ]
        .unwrap();
        let kinds = ColumnKinds::classify(&df);

        let (df, flagged) = detector().detect(df, &kinds).unwrap();
        assert_eq!(flagged, 3);
        let anomaly = df.column(ANOMALY_COLUMN).unwrap().bool().unwrap().clone();
        assert!(anomaly.into_iter().all(|flag| flag == Some(true)));
    }

    #[test]
    fn test_dense_rows_are_not_anomalous() {
        let df = df![
            "x" => [1.0, 1.1, 1.0, 0.9, 1.0, 50.0],
            "label" => ["a", "b", "c", "d", "e", "f"],
        ]
        .unwrap();
        let kinds = ColumnKinds::classify(&df);

        let (df, flagged) = detector().detect(df, &kinds).unwrap();
        assert_eq!(flagged, 1);
        let anomaly = df.column(ANOMALY_COLUMN).unwrap().bool().unwrap().clone();
        assert_eq!(anomaly.get(0), Some(false));
        assert_eq!(anomaly.get(5), Some(true));
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_rows_with_missing_numbers_are_left_unflagged() {
        let df = df![
            "x" => [Some(0.0), None, Some(10.0)],
        ]
        .unwrap();
        let kinds = ColumnKinds::classify(&df);

        let (df, flagged) = detector().detect(df, &kinds).unwrap();
        assert_eq!(flagged, 2);
        assert_eq!(df.height(), 3);
        let anomaly = df.column(ANOMALY_COLUMN).unwrap().bool().unwrap().clone();
        assert_eq!(anomaly.get(1), None);
        assert_eq!(anomaly.null_count(), 1);
    }

    #[test]
    fn test_existing_anomaly_column_is_replaced() {
        let df = df![
            "x" => [0.0, 100.0],
            "anomaly" => [0i64, 0],
        ]
        .unwrap();
        let kinds = ColumnKinds::classify(&df);

        let (df, _) = detector().detect(df, &kinds).unwrap();
        assert_eq!(df.width(), 2);
        assert_eq!(df.column(ANOMALY_COLUMN).unwrap().dtype(), &DataType::Boolean);
    }

    #[test]
    fn test_no_numeric_columns_fails() {
        let df = df!["name" => ["a", "b"]].unwrap();
        let kinds = ColumnKinds::classify(&df);

        let err = detector().detect(df, &kinds).unwrap_err();
        assert!(matches!(err, StageError::AnomalyDetection(_)));
    }

    #[test]
    fn test_no_complete_rows_fails() {
        let df = df![
            "x" => [Some(1.0), None],
            "y" => [None, Some(2.0)],
        ]
        .unwrap();
        let kinds = ColumnKinds::classify(&df);

        let err = detector().detect(df, &kinds).unwrap_err();
        assert_eq!(err.error_code(), "ANOMALY_DETECTION_ERROR");
    }

    #[test]
    fn test_non_finite_value_fails() {
        let df = df!["x" => [1.0, f64::INFINITY]].unwrap();
        let kinds = ColumnKinds::classify(&df);

        let err = detector().detect(df, &kinds).unwrap_err();
        assert!(matches!(err, StageError::AnomalyDetection(_)));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let params = AnomalyParams {
            epsilon: -1.0,
            min_samples: 5,
        };
        assert!(matches!(
            AnomalyDetector::new(params),
            Err(StageError::InvalidOption(_))
        ));
    }
}
