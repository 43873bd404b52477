//! Pipeline module.
//!
//! This module provides the analysis pipeline, its outcome types and
//! progress/cancellation support.

mod builder;
mod outcome;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder};
pub use outcome::{PipelineOutcome, RunDetails};
pub use progress::{
    AnalysisStage, CancellationToken, ClosureProgressReporter, ProgressReporter, ProgressUpdate,
};
