//! Error types for the pipeline.
//!
//! The variants mirror the failure taxonomy of the pipeline: configuration
//! problems abort before any state is written, a declined confirmation
//! aborts with nothing persisted, and per-item data errors are fatal to the
//! containing stage while leaving completed child run records valid for a
//! later resume.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Required directory or setting is missing or invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operator declined the confirmation prompt
    #[error("Update cancelled")]
    Cancelled,

    /// A source file the stage depends on does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Data file exists but has no header row to drive the field mapping
    #[error("File has no header row: {}", .0.display())]
    MissingHeader(PathBuf),

    /// Destination table is absent (schema/model mismatch)
    #[error("Destination table '{0}' does not exist")]
    TableNotFound(String),

    /// Schema registry has no entry for the requested model
    #[error("Unknown model '{model}' in app '{app}'")]
    UnknownModel { app: String, model: String },

    /// SQL query or connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration failure
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Remote archive metadata is missing or unparsable
    #[error("Archive metadata error: {0}")]
    ArchiveMetadata(String),

    /// HTTP request failed
    #[error("Network request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Archive extraction failed
    #[error("Archive extraction failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// CSV reading or writing failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// File system operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Operator prompt could not be rendered or read
    #[error("Prompt error: {0}")]
    Prompt(String),
}

impl PipelineError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an archive metadata error
    pub fn archive_metadata(msg: impl Into<String>) -> Self {
        Self::ArchiveMetadata(msg.into())
    }

    /// Create a prompt error
    pub fn prompt(msg: impl Into<String>) -> Self {
        Self::Prompt(msg.into())
    }
}
