//! Run reporting module.
//!
//! This module collects the statistics and human-readable notes a pipeline
//! run produces.
//!
//! # Example
//!
//! ```rust,ignore
//! use scrubber_processing::reporting::RunAccumulator;
//!
//! let mut acc = RunAccumulator::start(df.height());
//! acc.record_duplicates(removed);
//! let (report, stats) = acc.finish(df.height());
//!
//! println!("{}", report);
//! println!("{}", serde_json::to_string_pretty(&stats)?);
//! ```

mod accumulator;

pub use accumulator::{PipelineStats, ProcessingReport, RunAccumulator};
