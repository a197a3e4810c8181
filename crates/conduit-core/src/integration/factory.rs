//! Conversion of domain events into transport messages.

use crate::foundation::error::ValidationError;
use crate::foundation::event::DomainEvent;
use crate::foundation::message::{Message, MessageHeader};

/// Turns a published domain event into the message handed to each queue.
pub trait MessageFactory: Send + Sync {
    /// Builds the transport message for `event`, published on the bus named
    /// `bus_name`.
    fn from_event(&self, event: &dyn DomainEvent, bus_name: &str)
    -> Result<Message, ValidationError>;
}

/// The factory used by an event bus unless another one is configured.
///
/// The message name is the event name; the header copies the event id,
/// occurrence time and version and records the bus as sender.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardMessageFactory;

impl MessageFactory for StandardMessageFactory {
    fn from_event(
        &self,
        event: &dyn DomainEvent,
        bus_name: &str,
    ) -> Result<Message, ValidationError> {
        let header = MessageHeader::new(event.event_id(), event.occurred_at(), event.version())
            .with_sender(bus_name);
        Message::new(event.event_name(), header, event.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::event::GenericEvent;
    use serde_json::json;

    #[test]
    fn test_standard_factory_copies_event_identity() {
        let event = GenericEvent::new("user-registered", json!({"id": 9}))
            .unwrap()
            .with_version(2);

        let message = StandardMessageFactory
            .from_event(&event, "event-bus")
            .unwrap();

        assert_eq!(message.name(), "user-registered");
        assert_eq!(message.payload(), &json!({"id": 9}));
        assert_eq!(message.header().id(), event.event_id());
        assert_eq!(message.header().created_at(), event.occurred_at());
        assert_eq!(message.header().version(), 2);
        assert_eq!(message.header().sender(), Some("event-bus"));
    }
}
