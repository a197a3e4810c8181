//! Request/response dispatch.
//!
//! A [`QueryBus`] runs the same pipeline as the command bus, but hands every
//! handler a [`QueryDeferred`] and returns the matching [`QueryPromise`].
//! The handler may settle the deferred inline or keep it and settle it
//! later from another thread.
//!
//! A pipeline failure rejects the promise with the [`DispatchFailure`],
//! unless the handler already settled it.
//!
//! ```rust,ignore
//! let bus = QueryBus::new();
//! bus.event_emitter().attach(EVENT_DISPATCH, |event| {
//!     event.set_handler(MessageHandler::query(|message, deferred| {
//!         deferred.resolve(json!(["todo"]));
//!         Ok(())
//!     }));
//!     Ok(())
//! }, PRIORITY_ROUTE);
//!
//! let todos = bus.dispatch(Envelope::named(FetchSomething::default())).await?;
//! ```
//!
//! [`DispatchFailure`]: crate::DispatchFailure

use std::fmt;
use std::sync::Arc;

use conduit_core::{
    ActionEvent, ActionEventEmitter, Envelope, ListenerResult, Plugin, ValidationError,
    ValidationResult,
};
use tracing::debug;

use crate::handler::{QueryDeferred, QueryPromise};
use crate::params::QueryParams;
use crate::pipeline::{
    self, EVENT_DISPATCH, PRIORITY_DETECT_MESSAGE_NAME, PRIORITY_INVOKE_HANDLER,
};

/// The emitter type of a [`QueryBus`].
pub type QueryEmitter = ActionEventEmitter<QueryBus, QueryParams>;

/// A bus answering each query through a promise.
pub struct QueryBus {
    name: String,
    emitter: Arc<QueryEmitter>,
}

impl QueryBus {
    /// Name used by [`QueryBus::new`].
    pub const DEFAULT_NAME: &'static str = "query-bus";

    /// Creates a bus owning a fresh emitter.
    pub fn new() -> Self {
        Self::build(Self::DEFAULT_NAME.to_owned(), Arc::new(QueryEmitter::new()))
    }

    /// Creates a named bus owning a fresh emitter.
    pub fn named(name: impl Into<String>) -> ValidationResult<Self> {
        Self::with_emitter(name, Arc::new(QueryEmitter::new()))
    }

    /// Creates a named bus on a supplied emitter.
    pub fn with_emitter(
        name: impl Into<String>,
        emitter: Arc<QueryEmitter>,
    ) -> ValidationResult<Self> {
        let name = name.into();
        ValidationError::check_name("bus", &name)?;
        Ok(Self::build(name, emitter))
    }

    fn build(name: String, emitter: Arc<QueryEmitter>) -> Self {
        emitter.attach(
            EVENT_DISPATCH,
            pipeline::detect_message_name,
            PRIORITY_DETECT_MESSAGE_NAME,
        );
        emitter.attach(EVENT_DISPATCH, invoke_handler, PRIORITY_INVOKE_HANDLER);
        Self { name, emitter }
    }

    /// The bus name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The emitter listeners are attached to.
    pub fn event_emitter(&self) -> &Arc<QueryEmitter> {
        &self.emitter
    }

    /// Attaches a plugin's listeners.
    pub fn utilize(&self, plugin: &dyn Plugin<QueryBus, QueryParams>) {
        pipeline::utilize(&self.name, &self.emitter, plugin);
    }

    /// Detaches a plugin's listeners.
    pub fn deactivate(&self, plugin: &dyn Plugin<QueryBus, QueryParams>) {
        pipeline::deactivate(&self.name, &self.emitter, plugin);
    }

    /// Dispatches a query and returns the promise of its result.
    pub fn dispatch(&self, message: impl Into<Envelope>) -> QueryPromise {
        let deferred = QueryDeferred::new();
        let promise = deferred.promise();
        let mut params = QueryParams::new(message.into(), deferred.clone());

        if let Err(failure) = pipeline::dispatch(&self.name, &self.emitter, self, &mut params) {
            if !deferred.reject(Arc::new(failure)) {
                debug!(bus = %self.name, "Query already settled, dispatch failure dropped");
            }
        }

        promise
    }
}

impl Default for QueryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for QueryBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBus")
            .field("name", &self.name)
            .field("emitter", &self.emitter)
            .finish()
    }
}

/// Invoke tier: calls a callable handler with the message and the deferred.
fn invoke_handler(event: &mut ActionEvent<'_, QueryBus, QueryParams>) -> ListenerResult {
    if event.is_handled() {
        return Ok(());
    }

    if let Some(handler) = pipeline::callable_handler(event.params()) {
        let deferred = event.deferred().clone();
        handler(event.message(), deferred)?;
        event.set_handled(true);
    }
    Ok(())
}
