//! Per-run statistics and report accumulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Row counters describing what a run changed.
///
/// Serialized with the camelCase keys external consumers read
/// (`totalRows`, `duplicateRows`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    /// Row count before any stage ran.
    pub total_rows: usize,
    /// Rows removed by deduplication.
    pub duplicate_rows: usize,
    /// Rows before missing value resolution minus the complete rows after it.
    pub modified_rows: usize,
    /// Rows lost over the whole run.
    pub corrupted_rows: usize,
    /// Rows flagged by anomaly detection.
    pub anomalous_rows: usize,
}

/// Ordered, human-readable notes on the transformations that ran.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessingReport {
    entries: Vec<String>,
}

impl ProcessingReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|entry| entry.contains(needle))
    }

    /// Entries joined with newlines, the form handed to external consumers.
    pub fn joined(&self) -> String {
        self.entries.join("\n")
    }
}

impl fmt::Display for ProcessingReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

/// Collects stats and report entries while the stages run.
///
/// Each `record_*` call appends exactly one report entry, so the report
/// follows the order in which stages were recorded.
#[derive(Debug, Clone)]
pub struct RunAccumulator {
    stats: PipelineStats,
    report: ProcessingReport,
}

impl RunAccumulator {
    /// Start a run over a table of `total_rows` rows.
    pub fn start(total_rows: usize) -> Self {
        Self {
            stats: PipelineStats {
                total_rows,
                ..Default::default()
            },
            report: ProcessingReport::new(),
        }
    }

    pub fn record_duplicates(&mut self, removed: usize) {
        self.stats.duplicate_rows = removed;
        self.report.push(format!("Removed {} duplicate rows", removed));
    }

    /// Record a column pruning pass; the note names the requested columns.
    pub fn record_dropped_columns(&mut self, requested: &[String]) {
        self.report.push(format!("Dropped columns: {}", requested.join(", ")));
    }

    /// Record a missing value pass.
    ///
    /// `complete_rows_after` is the number of rows of the result that hold no
    /// missing value.
    pub fn record_missing_values(
        &mut self,
        policy: &str,
        rows_before: usize,
        complete_rows_after: usize,
    ) {
        self.stats.modified_rows = rows_before.saturating_sub(complete_rows_after);
        self.report.push(format!("Filled missing values using {} method", policy));
    }

    pub fn record_anomalies(&mut self, flagged: usize) {
        self.stats.anomalous_rows = flagged;
        self.report.push(format!("Flagged {} anomalous rows", flagged));
    }

    /// Close the run with the final row count.
    pub fn finish(mut self, final_rows: usize) -> (ProcessingReport, PipelineStats) {
        self.stats.corrupted_rows = self.stats.total_rows.saturating_sub(final_rows);
        (self.report, self.stats)
    }
}
