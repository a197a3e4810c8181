//! Conduit Runtime - Configuration and assembly layer for Conduit buses.
//!
//! This crate provides:
//! - Layered configuration loading (`ConfigLoader`, `ConduitConfig`)
//! - Logging configuration (`LoggingBuilder`, `init_from_config`)
//! - Config-driven bus construction (`Buses`)
//! - Application assembly (`ConduitRuntime`)
//!
//! # Example
//!
//! ```ignore
//! use conduit_runtime::ConduitRuntime;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = ConduitRuntime::builder()
//!         .profile("production")
//!         .build()?;
//!
//!     let buses = runtime.buses();
//!     buses.events().publish(GenericEvent::new("started", json!({}))?)?;
//!     Ok(())
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [command_bus]
//! name = "commands"
//!
//! [event_bus]
//! name = "domain-events"
//! queues = ["mail", "audit"]
//! ```

pub mod buses;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use buses::{Buses, LogDispatcher};
pub use config::{
    CommandBusConfig, ConduitConfig, ConfigError, ConfigLoader, ConfigResult, EventBusConfig,
    LoggingConfig, QueryBusConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, init_from_config};
pub use runtime::{ConduitRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `span`, `event`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, event, info, instrument, span, trace, warn};
}
