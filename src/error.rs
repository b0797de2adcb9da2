use crate::compile::CompileError;
use crate::config::ConfigError;
use crate::orchestration::PipelineError;
use crate::source::SourceError;
use thiserror::Error;

/// Crate-level error for callers that drive the whole workflow.
#[derive(Debug, Error)]
pub enum EconError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("I/O layer error: {0}")]
    Source(#[from] SourceError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Verification failed: {0} snapshot(s) did not match")]
    VerificationFailed(usize),
}
