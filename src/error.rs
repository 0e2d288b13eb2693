use std::path::PathBuf;

use thiserror::Error;

use crate::sync::Step;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Error during file I/O operations
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization
    #[error("json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// Registry file exists but is not a valid registry document
    #[error("corrupt config at {path}: {reason}")]
    CorruptConfig { path: PathBuf, reason: String },
    /// Error when user input fails.
    #[error("inquire error: {0}")]
    Inquire(#[from] inquire::InquireError),
    /// External binary could not be spawned
    #[error("'{0}' not found on PATH")]
    ExternalToolMissing(String),
    /// External binary ran but exited unsuccessfully
    #[error("{tool} failed: {stderr}")]
    ExternalToolFailed { tool: String, stderr: String },
    /// Error during input validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// Error when a user id is not in the registry.
    #[error("no user found with id {0}")]
    NotFound(u32),
    /// Home directory could not be determined
    #[error("failed to find the home directory")]
    HomeDirMissing,
    /// A step of a multi-store operation failed after `completed` had already landed
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: Step,
        completed: Vec<Step>,
        #[source]
        source: Box<AppError>,
    },
}

impl AppError {
    /// Whether the error is a user-facing message rather than a failure.
    ///
    /// Informational errors are printed and the process still exits with 0.
    pub fn is_informational(&self) -> bool {
        match self {
            AppError::NotFound(_) | AppError::Validation(_) => true,
            AppError::Inquire(inquire::InquireError::OperationCanceled)
            | AppError::Inquire(inquire::InquireError::OperationInterrupted) => true,
            _ => false,
        }
    }

    /// The step that failed, if this error came out of the sync engine.
    pub fn failed_step(&self) -> Option<Step> {
        match self {
            AppError::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}
