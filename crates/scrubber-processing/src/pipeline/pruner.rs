//! Column removal.

use polars::prelude::*;
use tracing::debug;

/// Drops caller-named columns.
pub struct ColumnPruner;

impl ColumnPruner {
    /// Drop the named columns that exist; unknown names are skipped.
    pub fn run(df: DataFrame, columns: &[String]) -> DataFrame {
        let present: Vec<PlSmallStr> = columns
            .iter()
            .filter(|name| df.column(name).is_ok())
            .map(|name| name.as_str().into())
            .collect();

        if present.len() < columns.len() {
            debug!(
                "Skipping {} requested columns not present in the table",
                columns.len() - present.len()
            );
        }
        if present.is_empty() {
            return df;
        }

        debug!("Dropping columns: {:?}", present);
        df.drop_many(present)
    }
}
