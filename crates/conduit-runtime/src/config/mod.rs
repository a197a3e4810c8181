//! Configuration module for the Conduit runtime.
//!
//! This module provides layered configuration loading (defaults, TOML/YAML
//! files, `CONDUIT_*` environment variables) and validation for the logging
//! setup and the three buses.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    CommandBusConfig, ConduitConfig, EventBusConfig, LogFormat, LogLevel, LogOutput,
    LoggingConfig, QueryBusConfig, SpanEventConfig,
};
pub use validation::validate_config;
