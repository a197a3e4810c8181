//! # Conduit Core
//!
//! The engine underneath the Conduit message buses.
//!
//! This crate provides the building blocks every bus is assembled from:
//! priority-ordered extension points, the execution context shared by their
//! listeners, reversible plugins, single-assignment results and the message
//! model.
//!
//! ## Layers
//!
//! ### Foundation Layer
//!
//! Value types and errors:
//! - **Messages**: the standard transport message ([`Message`]) and the
//!   type-erased [`Envelope`] every bus dispatches
//! - **Domain Events**: what the fan-out bus publishes ([`DomainEvent`])
//! - **Errors**: [`ValidationError`], [`BoxError`], [`SharedError`]
//!
//! ### Engine Layer
//!
//! - **Emitter**: named extension points with priority-ordered listeners
//!   ([`ActionEventEmitter`], [`ActionEvent`])
//! - **Plugins**: listener bundles attached and detached as a unit
//!   ([`Plugin`], [`ListenerHandles`])
//! - **Deferred Results**: [`Deferred`] / [`Promise`]
//!
//! ### Integration Layer
//!
//! External collaborators of the fan-out bus:
//! - **Message Factory**: [`MessageFactory`], [`StandardMessageFactory`]
//! - **Delivery**: [`Queue`], [`MessageDispatcher`]
//!
//! ## Trigger Flow
//!
//! ```text
//! trigger("dispatch") ──▶ snapshot ──▶ listener (400) ──▶ listener (0) ──▶ outcome
//!                                          │                  ▲
//!                                          └─ stop ───────────┘ (skips the rest)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use conduit_core::{ActionEventEmitter, Deferred};
//!
//! let emitter: ActionEventEmitter<str, Vec<String>> = ActionEventEmitter::new();
//! emitter.attach("dispatch", |event| {
//!     let target = event.target().to_owned();
//!     event.push(target);
//!     Ok(())
//! }, 0);
//!
//! let mut params = Vec::new();
//! emitter.trigger("dispatch", "command-bus", &mut params)?;
//! ```

pub mod deferred;
pub mod emitter;
pub mod foundation;
pub mod integration;
pub mod plugin;

// Re-export foundation types
pub use foundation::{
    BoxError, DomainEvent, Envelope, GenericEvent, HasMessageName, Message, MessageHeader,
    SharedError, ValidationError, ValidationResult,
};

// Re-export engine types
pub use deferred::{Deferred, Promise};
pub use emitter::{ActionEvent, ActionEventEmitter, ListenerHandle, ListenerResult, TriggerOutcome};
pub use plugin::{ListenerHandles, Plugin};

// Re-export integration types
pub use integration::{MessageDispatcher, MessageFactory, Queue, StandardMessageFactory};

/// Prelude for common imports.
pub mod prelude {
    pub use super::deferred::{Deferred, Promise};
    pub use super::emitter::{ActionEvent, ActionEventEmitter, ListenerHandle, ListenerResult};
    pub use super::foundation::*;
    pub use super::integration::{MessageDispatcher, MessageFactory, Queue};
    pub use super::plugin::{ListenerHandles, Plugin};
}
