//! Error types for orchestration operations

use thiserror::Error;

use crate::platform::PlatformError;
use crate::spec::DocumentError;
use crate::state_machine::TransitionError;

/// Errors that can occur while orchestrating an environment
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Specification or side-file could not be read or parsed
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Specification failed syntax validation
    #[error("Specification rejected: {errors} errors, {warnings} warnings")]
    SpecRejected { errors: usize, warnings: usize },

    /// Connection or platform configuration is unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Platform operation failed
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// Provisioning phase requested out of order
    #[error(transparent)]
    Lifecycle(#[from] TransitionError),
}

/// Result type for orchestration operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

impl From<serde_json::Error> for OrchestratorError {
    fn from(err: serde_json::Error) -> Self {
        OrchestratorError::Configuration(err.to_string())
    }
}
