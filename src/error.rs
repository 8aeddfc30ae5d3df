//! Error types for Kettle operations.
//!
//! This module defines [`KettleError`], the primary error type used throughout
//! the application, a [`Result`] type alias, and [`Failure`], the structured
//! `kind`/`code`/`message` form that the CLI and the sync server report.
//!
//! # Error Handling Strategy
//!
//! - Use `KettleError` for domain-specific errors that need distinct handling
//! - Use `anyhow::Error` (via `KettleError::Other`) for unexpected errors
//! - Aborted runs carry enough data to be reported without side effects

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Core error type for Kettle operations.
#[derive(Debug, Error)]
pub enum KettleError {
    /// No project definition at or above the given directory.
    #[error("No kettle project found at {path}")]
    ProjectNotFound { path: PathBuf },

    /// Failed to parse a project definition or override file.
    #[error("Failed to parse definition at {path}: {message}")]
    DefinitionParseError { path: PathBuf, message: String },

    /// Invalid project definition structure or values.
    #[error("Invalid project definition: {message}")]
    ValidationError { message: String },

    /// A single step lookup failed.
    #[error("Unknown step: {name}")]
    StepNotFound { name: String },

    /// One or more requested steps do not exist in the project.
    #[error("Unable to locate steps: {}", steps.join(", "))]
    MissingSteps { steps: Vec<String> },

    /// The dependency sourcing pass reported failure.
    #[error("Dependency sourcing failed")]
    SourcingFailed,

    /// Shell command could not be spawned.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// Reading or writing persisted state failed.
    #[error("State error at {path}: {message}")]
    StateError { path: PathBuf, message: String },

    /// Remote synchronisation failed.
    #[error("Sync error: {message}")]
    Sync { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Kettle operations.
pub type Result<T> = std::result::Result<T, KettleError>;

impl KettleError {
    /// Short failure category.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingSteps { .. } | Self::SourcingFailed => "ABORTED",
            _ => "ERROR",
        }
    }

    /// Machine-readable failure code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ProjectNotFound { .. } => "NO_PROJECT",
            Self::DefinitionParseError { .. } => "INVALID_DEFINITION",
            Self::ValidationError { .. } => "INVALID_DEFINITION",
            Self::StepNotFound { .. } => "UNKNOWN_STEP",
            Self::MissingSteps { .. } => "MISSING_STEP",
            Self::SourcingFailed => "SOURCING_FAILED",
            Self::CommandFailed { .. } => "COMMAND_FAILED",
            Self::StateError { .. } => "STATE_ERROR",
            Self::Sync { .. } => "SYNC_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Machine-readable payload accompanying the failure.
    pub fn payload(&self) -> Value {
        match self {
            Self::MissingSteps { steps } => json!({ "steps": steps }),
            Self::StepNotFound { name } => json!({ "step": name }),
            Self::ProjectNotFound { path } => json!({ "path": path }),
            _ => Value::Null,
        }
    }

    /// Convert into the structured form reported to callers.
    pub fn to_failure(&self) -> Failure {
        let message = match self {
            Self::MissingSteps { .. } => "Unable to locate steps".to_string(),
            other => other.to_string(),
        };
        Failure {
            kind: self.kind().to_string(),
            code: self.code().to_string(),
            message,
            data: self.payload(),
        }
    }
}

/// Structured failure report: a `kind`/`code` pair, a readable message and
/// a machine-readable payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

impl Failure {
    /// Create a failure without a payload.
    pub fn new(kind: &str, code: &str, message: &str) -> Self {
        Self {
            kind: kind.to_string(),
            code: code.to_string(),
            message: message.to_string(),
            data: Value::Null,
        }
    }
}

impl From<&KettleError> for Failure {
    fn from(err: &KettleError) -> Self {
        err.to_failure()
    }
}
