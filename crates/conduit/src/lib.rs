//! # Conduit
//!
//! An in-process message bus for Rust: commands, queries and domain events,
//! each dispatched through an extensible, priority-ordered pipeline.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌──────────────────────── dispatch ────────────────────────┐
//! message ──────▶ │ initialize ▶ detect name ▶ route ▶ locate ▶ invoke       │ ──▶ finalize ──▶ Ok / DispatchFailure
//!                 └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - **Emitter**: named extension points with priority-ordered listeners
//! - **Buses**: `CommandBus` (one handler), `QueryBus` (promise of a result),
//!   `EventBus` (fan-out to delivery queues)
//! - **Plugins**: listener bundles attached with `utilize` and removed with
//!   `deactivate` (invocation strategies, handler locators, your own)
//! - **Runtime**: configuration, logging and config-driven bus assembly
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use conduit::prelude::*;
//!
//! #[derive(MessageName)]
//! #[message(name = "fetch-something")]
//! struct FetchSomething;
//!
//! let bus = QueryBus::new();
//! bus.event_emitter().attach(EVENT_DISPATCH, |event| {
//!     if event.message_name() == Some("fetch-something") {
//!         event.set_handler(MessageHandler::query(|_, deferred| {
//!             deferred.resolve(json!(["todo"]));
//!             Ok(())
//!         }));
//!     }
//!     Ok(())
//! }, PRIORITY_ROUTE);
//!
//! let todos = bus.dispatch(Envelope::named(FetchSomething)).await?;
//! ```
//!
//! ## Features
//!
//! - `macros`: Enable the `MessageName` derive macro (default)
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use conduit_bus as bus;
pub use conduit_core as core;
pub use conduit_runtime as runtime;

#[cfg(feature = "macros")]
pub use conduit_macros::MessageName;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use conduit::prelude::*;
/// ```
pub mod prelude {
    // Buses, pipeline constants, handlers and plugins
    pub use conduit_bus::prelude::*;

    // Runtime - config-driven assembly
    pub use conduit_runtime::{Buses, ConduitConfig, ConduitRuntime};

    #[cfg(feature = "macros")]
    pub use conduit_macros::MessageName;
}
