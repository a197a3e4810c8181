//! Message handlers.
//!
//! Routing listeners store a [`MessageHandler`] in the dispatch parameters.
//! A handler is one of three shapes, checked by tag at the invoke tier:
//!
//! | Variant | Invoked by |
//! |---------|------------|
//! | [`Callable`](MessageHandler::Callable) | the bus's default invoke listener |
//! | [`Locator`](MessageHandler::Locator) | nobody; must be resolved at the locate-handler tier |
//! | [`Object`](MessageHandler::Object) | an invocation-strategy plugin |
//!
//! ```rust,ignore
//! // Direct callable
//! event.set_handler(MessageHandler::command(|message| {
//!     println!("registering {:?}", message.name());
//!     Ok(())
//! }));
//!
//! // Object with conventionally named methods, for a strategy plugin
//! event.set_handler(MessageHandler::object(
//!     HandlerMethods::new().method("handle_register_user", |call| Ok(())),
//! ));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use conduit_core::{BoxError, Deferred, Envelope, Promise, SharedError};
use serde_json::Value;

/// Result returned by handlers.
pub type HandlerResult = Result<(), BoxError>;

/// Settles the result of a query.
pub type QueryDeferred = Deferred<Value, SharedError>;

/// Observes the result of a query.
pub type QueryPromise = Promise<Value, SharedError>;

/// A command handler: receives the message.
pub type CommandCallable = dyn Fn(&Envelope) -> HandlerResult + Send + Sync;

/// A query handler: receives the message and the deferred it must settle.
pub type QueryCallable = dyn Fn(&Envelope, QueryDeferred) -> HandlerResult + Send + Sync;

// =============================================================================
// Handler Objects
// =============================================================================

/// The arguments a handler object method is called with.
#[derive(Debug)]
pub enum HandlerCall<'a> {
    /// A command: the message only.
    Command(&'a Envelope),
    /// A query: the message and the deferred to settle.
    Query(&'a Envelope, QueryDeferred),
}

impl HandlerCall<'_> {
    /// The message being handled.
    pub fn message(&self) -> &Envelope {
        match self {
            Self::Command(message) | Self::Query(message, _) => message,
        }
    }

    /// The deferred to settle, for queries.
    pub fn deferred(&self) -> Option<&QueryDeferred> {
        match self {
            Self::Command(_) => None,
            Self::Query(_, deferred) => Some(deferred),
        }
    }
}

/// A handler without a direct callable.
///
/// Invocation strategies look up a method by a naming convention and call
/// it through [`call_method`](Self::call_method).
pub trait HandlerObject: Send + Sync {
    /// Calls the method named `method`.
    ///
    /// Returns `None` if the object has no such method.
    fn call_method(&self, method: &str, call: HandlerCall<'_>) -> Option<HandlerResult>;
}

type Method = Arc<dyn Fn(HandlerCall<'_>) -> HandlerResult + Send + Sync>;

/// A [`HandlerObject`] assembled from named closures.
#[derive(Clone, Default)]
pub struct HandlerMethods {
    methods: HashMap<String, Method>,
}

impl HandlerMethods {
    /// Creates an object with no methods.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the method `name`.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(HandlerCall<'_>) -> HandlerResult + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Returns `true` if the object has a method called `name`.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }
}

impl HandlerObject for HandlerMethods {
    fn call_method(&self, method: &str, call: HandlerCall<'_>) -> Option<HandlerResult> {
        self.methods.get(method).map(|method| method(call))
    }
}

impl fmt::Debug for HandlerMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("HandlerMethods")
            .field("methods", &names)
            .finish()
    }
}

// =============================================================================
// Message Handler
// =============================================================================

/// The handler routed for a message.
pub enum MessageHandler<C: ?Sized> {
    /// Invoked directly by the bus.
    Callable(Arc<C>),
    /// A token to be resolved by a locator plugin.
    Locator(String),
    /// An object invoked by an invocation-strategy plugin.
    Object(Arc<dyn HandlerObject>),
}

impl<C: ?Sized> MessageHandler<C> {
    /// Creates a locator token.
    pub fn locator(token: impl Into<String>) -> Self {
        Self::Locator(token.into())
    }

    /// Wraps a handler object.
    pub fn object(object: impl HandlerObject + 'static) -> Self {
        Self::Object(Arc::new(object))
    }

    /// Short label of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Callable(_) => "callable",
            Self::Locator(_) => "locator",
            Self::Object(_) => "object",
        }
    }
}

impl MessageHandler<CommandCallable> {
    /// Wraps a command handler closure.
    pub fn command<F>(handler: F) -> Self
    where
        F: Fn(&Envelope) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(handler))
    }
}

impl MessageHandler<QueryCallable> {
    /// Wraps a query handler closure.
    pub fn query<F>(handler: F) -> Self
    where
        F: Fn(&Envelope, QueryDeferred) -> HandlerResult + Send + Sync + 'static,
    {
        Self::Callable(Arc::new(handler))
    }
}

impl<C: ?Sized> Clone for MessageHandler<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Callable(callable) => Self::Callable(Arc::clone(callable)),
            Self::Locator(token) => Self::Locator(token.clone()),
            Self::Object(object) => Self::Object(Arc::clone(object)),
        }
    }
}

impl<C: ?Sized> fmt::Debug for MessageHandler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(_) => f.write_str("Callable(..)"),
            Self::Locator(token) => f.debug_tuple("Locator").field(token).finish(),
            Self::Object(_) => f.write_str("Object(..)"),
        }
    }
}
