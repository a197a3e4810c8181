//! # Conduit Bus
//!
//! Command, query and event buses built on the action-event pipeline of
//! `conduit-core`.
//!
//! This layer provides:
//! - [`CommandBus`]: fire-and-forget dispatch to exactly one handler
//! - [`QueryBus`]: request/response dispatch answered through a promise
//! - [`EventBus`]: fan-out publishing of domain events to delivery queues
//! - The shared dispatch pipeline, its tiers and its error model
//! - Built-in plugins: invocation strategies and handler location
//!
//! Every bus exposes its emitter, so behavior is extended by attaching
//! listeners at the pipeline's priority tiers or by utilizing plugins.

pub mod command_bus;
pub mod error;
pub mod event_bus;
pub mod handler;
pub mod params;
pub mod pipeline;
pub mod plugin;
pub mod query_bus;

pub use command_bus::{CommandBus, CommandEmitter};
pub use error::{
    DispatchFailure, DispatchResult, HandlerInvocationError, PipelineError, RoutingError,
};
pub use event_bus::{
    EVENT_DELIVER_POST, EVENT_DELIVER_PRE, EVENT_PUBLISH_POST, EVENT_PUBLISH_PRE, EventBus,
    EventEmitter, PublishParams,
};
pub use handler::{
    CommandCallable, HandlerCall, HandlerMethods, HandlerObject, HandlerResult, MessageHandler,
    QueryCallable, QueryDeferred, QueryPromise,
};
pub use params::{AsHandlerCall, CommandParams, DispatchParams, QueryParams};
pub use pipeline::{
    EVENT_DISPATCH, EVENT_FINALIZE, PRIORITY_DETECT_MESSAGE_NAME, PRIORITY_INITIALIZE,
    PRIORITY_INVOKE_HANDLER, PRIORITY_LOCATE_HANDLER, PRIORITY_ROUTE,
};
pub use plugin::{
    FinderInvokeStrategy, HandleCommandStrategy, HandlerLocator, HandlerLocatorPlugin,
    InMemoryLocator,
};
pub use query_bus::{QueryBus, QueryEmitter};

/// Prelude for common imports.
pub mod prelude {
    pub use super::command_bus::CommandBus;
    pub use super::error::{DispatchFailure, PipelineError, RoutingError};
    pub use super::event_bus::{EventBus, PublishParams};
    pub use super::handler::{HandlerCall, HandlerMethods, HandlerObject, MessageHandler};
    pub use super::params::{CommandParams, DispatchParams, QueryParams};
    pub use super::pipeline::*;
    pub use super::plugin::{FinderInvokeStrategy, HandleCommandStrategy, HandlerLocatorPlugin};
    pub use super::query_bus::QueryBus;
    pub use conduit_core::prelude::*;
}
