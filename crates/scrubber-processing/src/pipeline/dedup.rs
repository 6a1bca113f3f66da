//! Duplicate row removal.

use crate::error::StageError;
use polars::prelude::*;
use tracing::debug;

/// Removes rows that repeat an earlier row across all columns.
pub struct Deduplicator;

impl Deduplicator {
    /// Remove duplicate rows, keeping the first occurrence of each.
    ///
    /// Missing values compare equal to each other and the order of the kept
    /// rows is preserved. Returns the table and the number of rows removed.
    pub fn run(df: DataFrame) -> Result<(DataFrame, usize), StageError> {
        if df.width() == 0 || df.height() < 2 {
            return Ok((df, 0));
        }

        let before = df.height();
        let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let removed = before - df.height();

        debug!("Removed {} duplicate rows", removed);
        Ok((df, removed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_removes_later_duplicates() {
        let df = df![
            "a" => [1i64, 1, 7, 1],
            "b" => ["x", "x", "y", "x"],
        ]
        .unwrap();

        let (df, removed) = Deduplicator::run(df).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(df.height(), 2);
        let a = df.column("a").unwrap();
        assert_eq!(a.get(0).unwrap().try_extract::<i64>().unwrap(), 1);
        assert_eq!(a.get(1).unwrap().try_extract::<i64>().unwrap(), 7);
    }

    #[test]
    fn test_missing_equals_missing() {
        let df = df![
            "a" => [Some(1.0), Some(1.0), Some(2.0)],
            "b" => [None::<&str>, None, Some("z")],
        ]
        .unwrap();

        let (df, removed) = Deduplicator::run(df).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(df.height(), 2);
    }

    #[test]
    fn test_idempotent() {
        let df = df![
            "a" => [3i64, 3, 2, 2, 1],
        ]
        .unwrap();

        let (once, _) = Deduplicator::run(df).unwrap();
        let (twice, removed_again) = Deduplicator::run(once.clone()).unwrap();
        assert_eq!(once.height(), twice.height());
        assert_eq!(removed_again, 0);
        assert!(once.equals(&twice));
    }

    #[test]
    fn test_no_duplicates() {
        let df = df!["a" => [1i64, 2, 3]].unwrap();
        let (df, removed) = Deduplicator::run(df).unwrap();
        assert_eq!(removed, 0);
        assert_eq!(df.height(), 3);
    }
}
