//! Recompute and verify workflows over the external I/O layer.

pub mod pipeline;

pub use pipeline::{Pipeline, PipelineError, RecomputeSummary};
