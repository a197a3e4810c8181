//! The parameter record shared by all listeners of one dispatch.
//!
//! The same [`DispatchParams`] value is handed to the `dispatch` trigger and
//! then to the `finalize` trigger, so state written early (the handled flag,
//! a captured exception) stays visible until the dispatch completes.

use std::fmt;

use conduit_core::Envelope;
use serde_json::{Map, Value};

use crate::error::PipelineError;
use crate::handler::{CommandCallable, HandlerCall, MessageHandler, QueryCallable, QueryDeferred};

/// Typed dispatch parameters.
///
/// `C` is the callable type of the bus's handlers; `X` carries bus-specific
/// state (the query deferred for the query bus).
pub struct DispatchParams<C: ?Sized, X = ()> {
    message: Envelope,
    message_name: Option<String>,
    handler: Option<MessageHandler<C>>,
    handled: bool,
    exception: Option<PipelineError>,
    annotations: Map<String, Value>,
    extension: X,
}

/// Parameters of a command dispatch.
pub type CommandParams = DispatchParams<CommandCallable>;

/// Parameters of a query dispatch.
pub type QueryParams = DispatchParams<QueryCallable, QueryDeferred>;

impl<C: ?Sized, X> DispatchParams<C, X> {
    /// Creates the parameters for dispatching `message`.
    pub fn new(message: Envelope, extension: X) -> Self {
        Self {
            message,
            message_name: None,
            handler: None,
            handled: false,
            exception: None,
            annotations: Map::new(),
            extension,
        }
    }

    /// The message being dispatched.
    pub fn message(&self) -> &Envelope {
        &self.message
    }

    /// The detected message name.
    pub fn message_name(&self) -> Option<&str> {
        self.message_name.as_deref()
    }

    pub fn set_message_name(&mut self, name: impl Into<String>) {
        self.message_name = Some(name.into());
    }

    /// The routed handler.
    pub fn handler(&self) -> Option<&MessageHandler<C>> {
        self.handler.as_ref()
    }

    pub fn set_handler(&mut self, handler: MessageHandler<C>) {
        self.handler = Some(handler);
    }

    /// Removes the routed handler, returning it.
    pub fn clear_handler(&mut self) -> Option<MessageHandler<C>> {
        self.handler.take()
    }

    /// Whether a handler took the message.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn set_handled(&mut self, handled: bool) {
        self.handled = handled;
    }

    /// The error captured so far.
    pub fn exception(&self) -> Option<&PipelineError> {
        self.exception.as_ref()
    }

    pub fn set_exception(&mut self, exception: impl Into<PipelineError>) {
        self.exception = Some(exception.into());
    }

    /// Clears the captured error, returning it.
    ///
    /// Called from a finalize listener, this recovers the dispatch.
    pub fn clear_exception(&mut self) -> Option<PipelineError> {
        self.exception.take()
    }

    /// A free-form annotation set by another listener.
    pub fn param(&self, key: &str) -> Option<&Value> {
        self.annotations.get(key)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.annotations.insert(key.into(), value.into());
    }

    pub fn remove_param(&mut self, key: &str) -> Option<Value> {
        self.annotations.remove(key)
    }

    /// All free-form annotations.
    pub fn annotations(&self) -> &Map<String, Value> {
        &self.annotations
    }

    /// Bus-specific state.
    pub fn extension(&self) -> &X {
        &self.extension
    }
}

impl<C: ?Sized> DispatchParams<C, QueryDeferred> {
    /// The deferred the query handler settles.
    pub fn deferred(&self) -> &QueryDeferred {
        &self.extension
    }
}

impl<C: ?Sized, X: fmt::Debug> fmt::Debug for DispatchParams<C, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchParams")
            .field("message", &self.message)
            .field("message_name", &self.message_name)
            .field("handler", &self.handler)
            .field("handled", &self.handled)
            .field("exception", &self.exception)
            .field("annotations", &self.annotations)
            .field("extension", &self.extension)
            .finish()
    }
}

// =============================================================================
// Handler Calls
// =============================================================================

/// Builds the arguments a handler object is invoked with.
pub trait AsHandlerCall {
    fn handler_call(&self) -> HandlerCall<'_>;
}

impl AsHandlerCall for CommandParams {
    fn handler_call(&self) -> HandlerCall<'_> {
        HandlerCall::Command(self.message())
    }
}

impl AsHandlerCall for QueryParams {
    fn handler_call(&self) -> HandlerCall<'_> {
        HandlerCall::Query(self.message(), self.deferred().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutingError;
    use serde_json::json;

    #[test]
    fn test_exception_can_be_cleared() {
        let mut params = CommandParams::new(Envelope::from("ping"), ());
        params.set_exception(RoutingError::MissingMessageName);

        assert!(params.exception().is_some_and(PipelineError::is_routing));
        assert!(params.clear_exception().is_some());
        assert!(params.exception().is_none());
    }

    #[test]
    fn test_annotations() {
        let mut params = CommandParams::new(Envelope::from("ping"), ());
        params.set_param("tenant", "acme");
        params.set_param("attempt", 2);

        assert_eq!(params.param("tenant"), Some(&json!("acme")));
        assert_eq!(params.remove_param("attempt"), Some(json!(2)));
        assert_eq!(params.annotations().len(), 1);
    }

    #[test]
    fn test_query_handler_call_shares_deferred() {
        let deferred = QueryDeferred::new();
        let params = QueryParams::new(Envelope::from("ping"), deferred.clone());

        let HandlerCall::Query(message, call_deferred) = params.handler_call() else {
            panic!("expected a query call");
        };
        call_deferred.resolve(json!("pong"));

        assert!(message.ptr_eq(params.message()));
        assert_eq!(deferred.promise().result().unwrap().unwrap(), json!("pong"));
    }
}
