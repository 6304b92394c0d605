//! Error types for model loading, querying and export.

use std::fmt;

use thiserror::Error;

/// Coarse error category surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File unreadable, wrong low-level format, or an export could not be written.
    Io,
    /// Valid container with missing or malformed required sections.
    Schema,
    /// Requested view/factor/group does not exist in the loaded model.
    NotFound,
    /// Caller-supplied parameter out of range.
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Io => "I/O error",
            ErrorKind::Schema => "schema error",
            ErrorKind::NotFound => "not found",
            ErrorKind::Validation => "invalid parameter",
        };
        f.write_str(s)
    }
}

/// Main error type for the model reader and exporters.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Not a valid {format} container: {reason}")]
    Format { format: &'static str, reason: String },

    #[error("Schema error at '{path}': {reason}")]
    Schema { path: String, reason: String },

    #[error("{kind} '{name}' not found in model")]
    NotFound { kind: &'static str, name: String },

    #[error("Invalid parameter: {reason}")]
    Validation { reason: String },

    #[error("Invalid schema configuration: {reason}")]
    Config { reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl ModelError {
    pub(crate) fn schema(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ModelError::Schema {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        ModelError::Validation {
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        ModelError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Map the error onto the four user-facing categories.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelError::Io(_)
            | ModelError::Format { .. }
            | ModelError::Csv(_)
            | ModelError::Arrow(_)
            | ModelError::Parquet(_) => ErrorKind::Io,
            ModelError::Schema { .. } => ErrorKind::Schema,
            ModelError::NotFound { .. } => ErrorKind::NotFound,
            ModelError::Validation { .. } | ModelError::Config { .. } => ErrorKind::Validation,
        }
    }
}

/// Result type alias for model operations
pub type Result<T> = std::result::Result<T, ModelError>;
