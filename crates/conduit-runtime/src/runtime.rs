//! Application assembly.
//!
//! A [`ConduitRuntime`] loads the configuration, installs logging and builds
//! the three buses.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use conduit_runtime::ConduitRuntime;
//!
//! // Config from ./conduit.toml and CONDUIT_* variables, deliveries logged
//! let runtime = ConduitRuntime::builder().build()?;
//!
//! // Custom configuration file and dispatcher
//! let runtime = ConduitRuntime::builder()
//!     .config_file("config/conduit.toml")
//!     .profile("production")
//!     .dispatcher(Arc::new(broker))
//!     .build()?;
//!
//! runtime.buses().commands().dispatch(command)?;
//! ```

use std::path::Path;
use std::sync::Arc;

use conduit_core::MessageDispatcher;
use tracing::info;

use crate::buses::{Buses, LogDispatcher};
use crate::config::{ConduitConfig, ConfigLoader};
use crate::error::RuntimeResult;
use crate::logging;

/// Configuration, logging and buses of one application.
#[derive(Debug)]
pub struct ConduitRuntime {
    config: ConduitConfig,
    buses: Buses,
}

impl ConduitRuntime {
    /// Creates a runtime builder.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a runtime from a loaded configuration.
    ///
    /// Initializes logging (unless a subscriber is already installed) and
    /// builds the buses.
    pub fn from_config(
        config: ConduitConfig,
        dispatcher: Arc<dyn MessageDispatcher>,
    ) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);

        let buses = Buses::from_config(&config, dispatcher)?;

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        Ok(Self { config, buses })
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &ConduitConfig {
        &self.config
    }

    /// Returns the buses.
    pub fn buses(&self) -> &Buses {
        &self.buses
    }

    /// Returns the buses mutably.
    pub fn buses_mut(&mut self) -> &mut Buses {
        &mut self.buses
    }

    /// Consumes the runtime, returning its buses.
    pub fn into_buses(self) -> Buses {
        self.buses
    }
}

// =============================================================================
// Runtime Builder
// =============================================================================

/// Builder for [`ConduitRuntime`].
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    dispatcher: Option<Arc<dyn MessageDispatcher>>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder searching the current directory.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            dispatcher: None,
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Enables loading environment variables (enabled by default).
    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: ConduitConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Overrides the event bus delivery queues.
    pub fn queues<I, S>(mut self, queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config_loader = self.config_loader.queues(queues);
        self
    }

    /// Sets the dispatcher the event bus delivers through.
    pub fn dispatcher(mut self, dispatcher: Arc<dyn MessageDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Loads the configuration and builds the runtime.
    pub fn build(self) -> RuntimeResult<ConduitRuntime> {
        let config = self.config_loader.load()?;
        let dispatcher = self
            .dispatcher
            .unwrap_or_else(|| Arc::new(LogDispatcher));
        ConduitRuntime::from_config(config, dispatcher)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
