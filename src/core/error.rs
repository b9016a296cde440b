//! Error types for pipeline construction and configuration.

use thiserror::Error;

/// Errors produced when building stages and pipelines.
///
/// Runtime execution has no error channel of its own: transform failures are
/// captured, counted, and logged (see the crate-level docs), and contract
/// violations such as waiting before the task count is set are documented
/// preconditions rather than recoverable errors.
#[derive(Debug, Error)]
pub enum StageError {
    /// A stage or pipeline configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A pipeline was built with no stages.
    #[error("pipeline has no stages")]
    EmptyPipeline,
    /// Two stages in one pipeline share a name.
    #[error("duplicate stage name: {0}")]
    DuplicateStage(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
