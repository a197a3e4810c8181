//! Subscriber setup for the bus `tracing` output.
//!
//! The buses open one `dispatch` span (command and query buses) or `publish`
//! span (event bus) per message, each carrying a `bus` field with the bus
//! name. Besides the global level and per-module filters, a level can be set
//! for everything logged inside the dispatches of a single bus:
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [logging.buses]
//! orders = "trace"
//! ```
//!
//! ```rust,ignore
//! LoggingBuilder::new()
//!     .level(LogLevel::Warn)
//!     .bus_level("orders", LogLevel::Trace)
//!     .span_events(FmtSpan::NEW | FmtSpan::CLOSE)
//!     .init();
//! ```

use std::path::{Path, PathBuf};

use tracing::warn;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::config::{LogFormat, LogLevel, LogOutput, LoggingConfig, SpanEventConfig};

/// Names of the per-message spans opened by the buses.
const BUS_SPANS: [&str; 2] = ["dispatch", "publish"];

/// Installs the subscriber described by `config`.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_from_config(config: &LoggingConfig) {
    let _ = LoggingBuilder::from_config(config).try_init();
}

/// Converts the configured span lifecycle events.
pub fn fmt_span(config: &SpanEventConfig) -> FmtSpan {
    [
        (config.new, FmtSpan::NEW),
        (config.enter, FmtSpan::ENTER),
        (config.exit, FmtSpan::EXIT),
        (config.close, FmtSpan::CLOSE),
    ]
    .into_iter()
    .filter(|(enabled, _)| *enabled)
    .fold(FmtSpan::NONE, |span, (_, flag)| span | flag)
}

/// Builds and installs the global subscriber.
#[derive(Debug)]
pub struct LoggingBuilder {
    level: LogLevel,
    directives: Vec<String>,
    span_events: FmtSpan,
    format: LogFormat,
    output: LogOutput,
    thread_ids: bool,
    source_location: bool,
    file_path: Option<PathBuf>,
    max_files: usize,
}

impl Default for LoggingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingBuilder {
    pub fn new() -> Self {
        Self {
            level: LogLevel::default(),
            directives: Vec::new(),
            span_events: FmtSpan::NONE,
            format: LogFormat::default(),
            output: LogOutput::default(),
            thread_ids: false,
            source_location: false,
            file_path: None,
            max_files: 5,
        }
    }

    /// Mirrors a [`LoggingConfig`]. Module filters come before bus levels,
    /// each sorted by key.
    pub fn from_config(config: &LoggingConfig) -> Self {
        let mut builder = Self::new()
            .level(config.level)
            .format(config.format)
            .output(config.output)
            .span_events(fmt_span(&config.span_events))
            .thread_ids(config.thread_ids)
            .source_location(config.file_location);
        builder.file_path.clone_from(&config.file_path);
        builder.max_files = config.max_files as usize;

        let mut filters: Vec<_> = config.filters.iter().collect();
        filters.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (target, level) in filters {
            builder = builder.directive(format!("{target}={level}"));
        }

        let mut buses: Vec<_> = config.buses.iter().collect();
        buses.sort_unstable_by(|a, b| a.0.cmp(b.0));
        for (bus, level) in buses {
            builder = builder.bus_level(bus, *level);
        }

        builder
    }

    /// Global level, used unless `RUST_LOG` is set.
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Adds an `EnvFilter` directive such as `conduit_core::emitter=trace`.
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Sets the level of everything logged while `bus` dispatches or
    /// publishes a message.
    pub fn bus_level(mut self, bus: &str, level: LogLevel) -> Self {
        for span in BUS_SPANS {
            self.directives.push(format!("[{span}{{bus={bus}}}]={level}"));
        }
        self
    }

    pub fn span_events(mut self, span_events: FmtSpan) -> Self {
        self.span_events = span_events;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn output(mut self, output: LogOutput) -> Self {
        self.output = output;
        self
    }

    pub fn thread_ids(mut self, enabled: bool) -> Self {
        self.thread_ids = enabled;
        self
    }

    /// Includes source file and line number.
    pub fn source_location(mut self, enabled: bool) -> Self {
        self.source_location = enabled;
        self
    }

    /// Writes to a daily rolling file, keeping `max_files` files.
    pub fn file(mut self, path: impl Into<PathBuf>, max_files: usize) -> Self {
        self.output = LogOutput::File;
        self.file_path = Some(path.into());
        self.max_files = max_files;
        self
    }

    /// The filter directives, in order.
    pub fn directives(&self) -> &[String] {
        &self.directives
    }

    fn filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level.as_str()));

        for directive in &self.directives {
            match directive.parse() {
                Ok(parsed) => filter = filter.add_directive(parsed),
                Err(e) => warn!(directive = %directive, error = %e, "Ignoring invalid log directive"),
            }
        }
        filter
    }

    fn writer(&self) -> BoxMakeWriter {
        match self.output {
            LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
            LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
            LogOutput::File => match self.file_path.as_deref().and_then(|p| self.appender(p)) {
                Some(appender) => BoxMakeWriter::new(appender),
                None => {
                    warn!("File output unavailable, falling back to stdout");
                    BoxMakeWriter::new(std::io::stdout)
                }
            },
        }
    }

    fn appender(&self, path: &Path) -> Option<RollingFileAppender> {
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let prefix = path
            .file_name()
            .map_or_else(|| "conduit.log".into(), |name| name.to_string_lossy());

        RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(prefix.into_owned())
            .max_log_files(self.max_files.max(1))
            .build(directory)
            .map_err(|e| warn!(path = %path.display(), error = %e, "Failed to open log file"))
            .ok()
    }

    fn layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(self.writer())
            .with_span_events(self.span_events.clone())
            .with_thread_ids(self.thread_ids)
            .with_file(self.source_location)
            .with_line_number(self.source_location);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.boxed(),
            LogFormat::Pretty => layer.pretty().boxed(),
            #[cfg(feature = "json-log")]
            LogFormat::Json => layer.json().boxed(),
            #[cfg(not(feature = "json-log"))]
            LogFormat::Json => layer.boxed(),
        }
    }

    pub fn init(self) {
        let _ = self.try_init();
    }

    /// Installs the subscriber, failing if one is already installed.
    pub fn try_init(self) -> Result<(), TryInitError> {
        tracing_subscriber::registry()
            .with(self.layer())
            .with(self.filter())
            .try_init()?;

        if cfg!(not(feature = "json-log")) && self.format == LogFormat::Json {
            warn!("JSON logging requires the `json-log` feature, using the full format");
        }
        Ok(())
    }
}
