//! Domain events published through the fan-out bus.
//!
//! A [`DomainEvent`] is what application code publishes; the bus turns it
//! into a transport [`Message`](super::message::Message) through a
//! [`MessageFactory`](crate::integration::MessageFactory) before handing it
//! to each delivery queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{ValidationError, ValidationResult};

/// The base trait for events published on an event bus.
pub trait DomainEvent: Send + Sync {
    /// Name of the event; becomes the transport message name.
    fn event_name(&self) -> &str;

    /// Unique identifier of this occurrence.
    fn event_id(&self) -> Uuid;

    /// When the event occurred.
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Event schema version.
    fn version(&self) -> u32 {
        1
    }

    /// Structured payload of the event.
    fn payload(&self) -> Value;
}

/// A ready-made [`DomainEvent`] carrying a JSON payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericEvent {
    name: String,
    id: Uuid,
    occurred_at: DateTime<Utc>,
    version: u32,
    payload: Value,
}

impl GenericEvent {
    /// Creates a new occurrence of the named event.
    pub fn new(name: impl Into<String>, payload: Value) -> ValidationResult<Self> {
        let name = name.into();
        ValidationError::check_name("event", &name)?;
        Ok(Self {
            name,
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            version: 1,
            payload,
        })
    }

    /// Overrides the schema version.
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }
}

impl DomainEvent for GenericEvent {
    fn event_name(&self) -> &str {
        &self.name
    }

    fn event_id(&self) -> Uuid {
        self.id
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    fn version(&self) -> u32 {
        self.version
    }

    fn payload(&self) -> Value {
        self.payload.clone()
    }
}
