//! Configuration validation utilities.

use std::collections::HashSet;

use super::error::{ConfigError, ConfigResult};
use super::schema::{ConduitConfig, EventBusConfig, LogOutput, LoggingConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &ConduitConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    validate_name("command_bus.name", &config.command_bus.name)?;
    validate_name("query_bus.name", &config.query_bus.name)?;
    validate_event_bus_config(&config.event_bus)?;

    let buses = [
        config.command_bus.name.as_str(),
        config.query_bus.name.as_str(),
        config.event_bus.name.as_str(),
    ];
    if let Some(bus) = config
        .logging
        .buses
        .keys()
        .find(|bus| !buses.contains(&bus.as_str()))
    {
        return Err(ConfigError::validation(format!(
            "logging.buses names an unknown bus: {bus:?}"
        )));
    }

    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    if logging.max_files == 0 {
        return Err(ConfigError::validation(
            "logging.max_files must be greater than 0",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|module| module.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter target: {module:?}"
        )));
    }

    Ok(())
}

/// Validates the event bus name and its queues.
fn validate_event_bus_config(event_bus: &EventBusConfig) -> ConfigResult<()> {
    validate_name("event_bus.name", &event_bus.name)?;

    let mut seen = HashSet::new();
    for queue in &event_bus.queues {
        validate_name("event_bus.queues[]", queue)?;
        if !seen.insert(queue.as_str()) {
            return Err(ConfigError::DuplicateQueue(queue.clone()));
        }
    }

    Ok(())
}

/// Validates a bus or queue name.
fn validate_name(field: &str, name: &str) -> ConfigResult<()> {
    if name.trim().is_empty() {
        return Err(ConfigError::missing_field(field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&ConduitConfig::default()).is_ok());
    }

    #[test]
    fn test_validate_empty_bus_name() {
        let mut config = ConduitConfig::default();
        config.query_bus.name = "  ".to_string();

        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(ConfigError::MissingField { field }) if field == "query_bus.name"
        ));
    }

    #[test]
    fn test_validate_duplicate_queue() {
        let mut config = ConduitConfig::default();
        config.event_bus.queues = vec!["mail".into(), "audit".into(), "mail".into()];

        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::DuplicateQueue(name)) if name == "mail"));
    }

    #[test]
    fn test_validate_file_output_requires_path() {
        let mut config = ConduitConfig::default();
        config.logging.output = LogOutput::File;
        assert!(validate_config(&config).is_err());

        config.logging.file_path = Some("logs/conduit.log".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_bus_log_levels() {
        let mut config = ConduitConfig::default();
        config.command_bus.name = "orders".into();
        config.logging.buses.insert("orders".into(), LogLevel::Trace);
        assert!(validate_config(&config).is_ok());

        config.logging.buses.insert("command-bus".into(), LogLevel::Debug);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError { message }) if message.contains("command-bus")
        ));
    }
}
