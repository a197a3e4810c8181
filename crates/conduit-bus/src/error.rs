//! Error types for the Conduit buses.
//!
//! Errors flow through a dispatch in three stages:
//!
//! 1. A listener or handler returns any [`BoxError`]
//! 2. The pipeline classifies it as a [`PipelineError`] and stores it in the
//!    `exception` parameter, where finalize listeners may clear it
//! 3. Whatever is left after finalize is surfaced as a [`DispatchFailure`]

use std::error::Error as StdError;

use conduit_core::{BoxError, SharedError};
use thiserror::Error;

/// The message name or its handler could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No listener produced a message name.
    #[error("message name could not be detected")]
    MissingMessageName,

    /// No listener routed the message to a handler, or no handler took it.
    #[error("no handler could process message '{message_name}'")]
    NoHandler {
        /// The detected message name.
        message_name: String,
    },

    /// The handler was routed as a locator token nobody resolved.
    #[error("handler '{locator}' for message '{message_name}' could not be located")]
    HandlerNotLocated {
        /// The detected message name.
        message_name: String,
        /// The unresolved locator token.
        locator: String,
    },
}

/// A listener or handler failed while the message was being dispatched.
///
/// Displays as the original error, which stays reachable through
/// [`source`](StdError::source) and [`downcast_ref`](Self::downcast_ref).
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct HandlerInvocationError {
    #[source]
    error: SharedError,
}

impl HandlerInvocationError {
    /// Wraps a listener or handler error.
    pub fn new(error: BoxError) -> Self {
        Self {
            error: SharedError::from(error),
        }
    }

    /// The original error.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        &*self.error
    }

    /// Attempts to downcast the original error.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.error.downcast_ref()
    }
}

/// An error captured in the `exception` parameter of a dispatch.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// Name or handler resolution failed.
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// A listener or handler failed.
    #[error(transparent)]
    Invocation(#[from] HandlerInvocationError),
}

impl PipelineError {
    /// Returns the routing error, if this is one.
    pub fn as_routing(&self) -> Option<&RoutingError> {
        match self {
            Self::Routing(error) => Some(error),
            Self::Invocation(_) => None,
        }
    }

    /// Returns `true` if the error is a routing failure.
    pub fn is_routing(&self) -> bool {
        matches!(self, Self::Routing(_))
    }
}

impl From<BoxError> for PipelineError {
    fn from(error: BoxError) -> Self {
        let error = match error.downcast::<PipelineError>() {
            Ok(pipeline) => return *pipeline,
            Err(other) => other,
        };

        match error.downcast::<RoutingError>() {
            Ok(routing) => Self::Routing(*routing),
            Err(other) => Self::Invocation(HandlerInvocationError::new(other)),
        }
    }
}

/// The single error a caller observes when a dispatch fails.
///
/// The classified [`PipelineError`] is available through [`cause`](Self::cause)
/// and as the [`source`](StdError::source) of this error.
#[derive(Debug, Clone, Error)]
#[error("Message dispatch failed. See previous error for details.")]
pub struct DispatchFailure {
    message_name: Option<String>,
    #[source]
    cause: PipelineError,
}

impl DispatchFailure {
    /// Wraps the error left over after finalize.
    pub fn new(message_name: Option<String>, cause: PipelineError) -> Self {
        Self {
            message_name,
            cause,
        }
    }

    /// Name of the message whose dispatch failed, if it was detected.
    pub fn message_name(&self) -> Option<&str> {
        self.message_name.as_deref()
    }

    /// The error that caused the failure.
    pub fn cause(&self) -> &PipelineError {
        &self.cause
    }

    /// Consumes the failure, returning its cause.
    pub fn into_cause(self) -> PipelineError {
        self.cause
    }
}

/// Result of a command dispatch.
pub type DispatchResult = Result<(), DispatchFailure>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_routing_error_is_classified() {
        let boxed: BoxError = Box::new(RoutingError::MissingMessageName);
        let error = PipelineError::from(boxed);

        assert_eq!(error.as_routing(), Some(&RoutingError::MissingMessageName));
    }

    #[test]
    fn test_other_errors_are_invocation_errors() {
        let boxed: BoxError = Box::new(io::Error::other("boom"));
        let error = PipelineError::from(boxed);

        assert!(!error.is_routing());
        assert_eq!(error.to_string(), "boom");
        let PipelineError::Invocation(invocation) = &error else {
            panic!("expected an invocation error");
        };
        assert_eq!(
            invocation.downcast_ref::<io::Error>().map(io::Error::kind),
            Some(io::ErrorKind::Other)
        );
    }

    #[test]
    fn test_pipeline_error_passes_through() {
        let original = PipelineError::from(RoutingError::NoHandler {
            message_name: "ping".into(),
        });
        let boxed: BoxError = Box::new(original);

        assert!(PipelineError::from(boxed).is_routing());
    }

    #[test]
    fn test_dispatch_failure_exposes_cause() {
        let cause = PipelineError::from(RoutingError::NoHandler {
            message_name: "ping".into(),
        });
        let failure = DispatchFailure::new(Some("ping".into()), cause);

        assert_eq!(
            failure.to_string(),
            "Message dispatch failed. See previous error for details."
        );
        assert_eq!(failure.message_name(), Some("ping"));
        assert_eq!(
            failure.source().map(ToString::to_string).as_deref(),
            Some("no handler could process message 'ping'")
        );
    }
}
