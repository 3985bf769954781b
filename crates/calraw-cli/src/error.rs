//! Error types for the CLI.

use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    /// Pipeline operation failed
    #[error(transparent)]
    Pipeline(#[from] calraw_pipeline::PipelineError),

    /// Anything else
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Whether this error is an operator cancellation rather than a fault.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            CliError::Pipeline(calraw_pipeline::PipelineError::Cancelled)
        )
    }
}
