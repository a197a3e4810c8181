//! Runtime error types.

use conduit_core::ValidationError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur while assembling a runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A bus or queue rejected its configured name.
    #[error("Invalid bus setup: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
