//! Unified error types for the Conduit core.
//!
//! Pipeline-level errors (routing failures, dispatch failures) are defined in
//! `conduit-bus`; this module only carries what the foundation needs.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// Error type returned by listeners, handlers and transport collaborators.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Clonable error handle, used where one failure must be observed many times
/// (e.g. by every observer of a promise).
pub type SharedError = Arc<dyn StdError + Send + Sync>;

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors raised while constructing messages, queues or buses.
///
/// These fail fast at construction time and never travel through a dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required name was empty (or whitespace only).
    #[error("{subject} name must not be empty")]
    EmptyName {
        /// What was being named (`"message"`, `"queue"`, `"bus"`, ...).
        subject: &'static str,
    },

    /// The same queue was configured twice on one bus.
    #[error("queue '{name}' is configured more than once")]
    DuplicateQueue {
        /// The duplicated queue name.
        name: String,
    },
}

impl ValidationError {
    /// Checks that `value` is a usable name for `subject`.
    pub fn check_name(subject: &'static str, value: &str) -> Result<(), Self> {
        if value.trim().is_empty() {
            Err(Self::EmptyName { subject })
        } else {
            Ok(())
        }
    }
}

/// Result type for construction-time validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert!(ValidationError::check_name("bus", "command-bus").is_ok());
        assert_eq!(
            ValidationError::check_name("bus", "  "),
            Err(ValidationError::EmptyName { subject: "bus" })
        );
    }

    #[test]
    fn test_display() {
        let err = ValidationError::EmptyName { subject: "message" };
        assert_eq!(err.to_string(), "message name must not be empty");
    }
}
