use crate::reporting::{PipelineStats, ProcessingReport};
use crate::utils::is_numeric_dtype;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of a column as seen by the stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Integer or floating point values
    Numeric,
    /// Anything else (text, booleans, dates)
    NonNumeric,
}

/// Numeric/non-numeric classification of a table's columns.
///
/// Produced once per run, before any stage executes, and consulted by the
/// missing value and anomaly stages. Columns removed by a later stage keep
/// their entry; lookups go through the current table so they are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnKinds {
    kinds: Vec<(String, ColumnKind)>,
}

impl ColumnKinds {
    /// Classify every column of `df` by dtype.
    pub fn classify(df: &DataFrame) -> Self {
        let kinds = df
            .get_columns()
            .iter()
            .map(|col| {
                let kind = if is_numeric_dtype(col.dtype()) {
                    ColumnKind::Numeric
                } else {
                    ColumnKind::NonNumeric
                };
                (col.name().to_string(), kind)
            })
            .collect();
        Self { kinds }
    }

    /// Kind of a column, if it was present when the run started.
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.kinds
            .iter()
            .find(|(col, _)| col == name)
            .map(|(_, kind)| *kind)
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.kind(name) == Some(ColumnKind::Numeric)
    }

    /// Numeric columns still present in `df`, in table order.
    pub fn numeric_columns(&self, df: &DataFrame) -> Vec<String> {
        df.get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| self.is_numeric(name))
            .collect()
    }

    /// Record that a column no longer holds numbers (e.g. after a text fill).
    pub fn mark_non_numeric(&mut self, name: &str) {
        if let Some(entry) = self.kinds.iter_mut().find(|(col, _)| col == name) {
            entry.1 = ColumnKind::NonNumeric;
        }
    }
}

/// Result of a pipeline run: the cleaned table, the report and the counters.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: DataFrame,
    pub report: ProcessingReport,
    pub stats: PipelineStats,
}
