//! Config-driven bus construction.
//!
//! Each bus is built from its section of [`ConduitConfig`]. The event bus
//! additionally needs a [`MessageDispatcher`]; without one, deliveries go to
//! [`LogDispatcher`].
//!
//! ```rust,ignore
//! let config = load_config()?;
//! let buses = Buses::from_config(&config, Arc::new(my_broker))?;
//!
//! buses.commands().dispatch(Message::with_payload("register-user", json!({}))?)?;
//! ```

use std::sync::Arc;

use conduit_bus::{CommandBus, EventBus, QueryBus};
use conduit_core::{BoxError, Message, MessageDispatcher, Queue};
use tracing::{debug, info};

use crate::config::{
    CommandBusConfig, ConduitConfig, EventBusConfig, QueryBusConfig, validate_config,
};
use crate::error::RuntimeResult;

/// Builds a command bus from its configuration.
pub fn command_bus(config: &CommandBusConfig) -> RuntimeResult<CommandBus> {
    Ok(CommandBus::named(config.name.as_str())?)
}

/// Builds a query bus from its configuration.
pub fn query_bus(config: &QueryBusConfig) -> RuntimeResult<QueryBus> {
    Ok(QueryBus::named(config.name.as_str())?)
}

/// Builds an event bus delivering to the configured queues.
pub fn event_bus(
    config: &EventBusConfig,
    dispatcher: Arc<dyn MessageDispatcher>,
) -> RuntimeResult<EventBus> {
    let queues = config
        .queues
        .iter()
        .map(|name| Queue::new(name.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventBus::new(config.name.as_str(), dispatcher, queues)?)
}

/// A [`MessageDispatcher`] that only logs deliveries.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

impl MessageDispatcher for LogDispatcher {
    fn dispatch(&self, queue: &Queue, message: &Message) -> Result<(), BoxError> {
        debug!(
            queue = %queue,
            message_name = message.name(),
            message_id = %message.header().id(),
            "Message delivered to log"
        );
        Ok(())
    }
}

// =============================================================================
// Bus Set
// =============================================================================

/// The three buses of one application.
#[derive(Debug)]
pub struct Buses {
    commands: CommandBus,
    queries: QueryBus,
    events: EventBus,
}

impl Buses {
    /// Validates `config` and builds every bus from it.
    pub fn from_config(
        config: &ConduitConfig,
        dispatcher: Arc<dyn MessageDispatcher>,
    ) -> RuntimeResult<Self> {
        validate_config(config)?;

        let buses = Self {
            commands: command_bus(&config.command_bus)?,
            queries: query_bus(&config.query_bus)?,
            events: event_bus(&config.event_bus, dispatcher)?,
        };

        info!(
            command_bus = buses.commands.name(),
            query_bus = buses.queries.name(),
            event_bus = buses.events.name(),
            queues = buses.events.queues().len(),
            "Buses assembled"
        );

        Ok(buses)
    }

    /// The command bus.
    pub fn commands(&self) -> &CommandBus {
        &self.commands
    }

    /// The query bus.
    pub fn queries(&self) -> &QueryBus {
        &self.queries
    }

    /// The event bus.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The event bus, for replacing its message factory.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::RuntimeError;

    #[test]
    fn test_buses_from_default_config() {
        let buses = Buses::from_config(&ConduitConfig::default(), Arc::new(LogDispatcher)).unwrap();

        assert_eq!(buses.commands().name(), "command-bus");
        assert_eq!(buses.queries().name(), "query-bus");
        assert_eq!(buses.events().name(), "event-bus");
        assert!(buses.events().queues().is_empty());
    }

    #[test]
    fn test_event_bus_queues_from_config() {
        let config = EventBusConfig {
            name: "domain-events".to_string(),
            queues: vec!["mail".to_string(), "audit".to_string()],
        };

        let bus = event_bus(&config, Arc::new(LogDispatcher)).unwrap();

        let names: Vec<&str> = bus.queues().iter().map(Queue::name).collect();
        assert_eq!(names, ["mail", "audit"]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ConduitConfig::default();
        config.event_bus.queues = vec!["mail".to_string(), "mail".to_string()];

        let result = Buses::from_config(&config, Arc::new(LogDispatcher));
        assert!(matches!(
            result,
            Err(RuntimeError::Config(ConfigError::DuplicateQueue(_)))
        ));
    }

    #[test]
    fn test_empty_bus_name_is_rejected_without_validation() {
        let config = CommandBusConfig {
            name: String::new(),
        };

        assert!(matches!(
            command_bus(&config),
            Err(RuntimeError::Validation(_))
        ));
    }
}
