//! Error types for the tabkit library.

use thiserror::Error;

/// Main error type for tabkit operations.
#[derive(Debug, Error)]
pub enum TabkitError {
    /// A pipeline referenced a step name with no registered function.
    #[error("Step function not found: {0}")]
    StepNotFound(String),

    /// A pipeline step reported a failure.
    #[error("{0}")]
    StepFailed(String),

    /// A cell executor reported a failure.
    #[error("{0}")]
    Executor(String),

    /// A declarative operation referenced a column the dataset does not have.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TabkitError {
    /// Shorthand for a step failure with the given message.
    pub fn step(message: impl Into<String>) -> Self {
        TabkitError::StepFailed(message.into())
    }

    /// Shorthand for an executor failure with the given message.
    pub fn executor(message: impl Into<String>) -> Self {
        TabkitError::Executor(message.into())
    }
}

/// Result type alias for tabkit operations.
pub type Result<T> = std::result::Result<T, TabkitError>;
