//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use conduit_bus::{CommandBus, QueryBus};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConduitConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Command bus settings.
    #[serde(default)]
    pub command_bus: CommandBusConfig,

    /// Query bus settings.
    #[serde(default)]
    pub query_bus: QueryBusConfig,

    /// Event bus settings.
    #[serde(default)]
    pub event_bus: EventBusConfig,
}

// =============================================================================
// Buses
// =============================================================================

/// Command bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandBusConfig {
    /// Bus name, used in logs and as the bus identity.
    #[serde(default = "default_command_bus_name")]
    pub name: String,
}

impl Default for CommandBusConfig {
    fn default() -> Self {
        Self {
            name: default_command_bus_name(),
        }
    }
}

fn default_command_bus_name() -> String {
    CommandBus::DEFAULT_NAME.to_string()
}

/// Query bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryBusConfig {
    /// Bus name.
    #[serde(default = "default_query_bus_name")]
    pub name: String,
}

impl Default for QueryBusConfig {
    fn default() -> Self {
        Self {
            name: default_query_bus_name(),
        }
    }
}

fn default_query_bus_name() -> String {
    QueryBus::DEFAULT_NAME.to_string()
}

/// Event bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventBusConfig {
    /// Bus name; recorded as the sender of every published message.
    #[serde(default = "default_event_bus_name")]
    pub name: String,

    /// Delivery queues, in delivery order.
    #[serde(default)]
    pub queues: Vec<String>,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            name: default_event_bus_name(),
            queues: Vec::new(),
        }
    }
}

fn default_event_bus_name() -> String {
    "event-bus".to_string()
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level as a filter directive value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` otherwise.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Output destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Span lifecycle events.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Log file, for `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Number of daily log files kept.
    #[serde(default = "default_max_files")]
    pub max_files: u32,

    /// Per-module levels, e.g. `conduit_bus = "trace"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    /// Levels inside the dispatches of one bus, keyed by bus name, e.g.
    /// `orders = "trace"`.
    #[serde(default)]
    pub buses: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            output: LogOutput::default(),
            span_events: SpanEventConfig::default(),
            thread_ids: false,
            file_location: false,
            file_path: None,
            max_files: default_max_files(),
            filters: HashMap::new(),
            buses: HashMap::new(),
        }
    }
}

fn default_max_files() -> u32 {
    5
}
