//! Delivery targets for the fan-out bus.
//!
//! The bus never delivers anything itself. For every configured [`Queue`] it
//! hands the message to a [`MessageDispatcher`], the transport collaborator
//! that owns delivery guarantees, retries and backpressure.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{BoxError, ValidationError, ValidationResult};
use crate::foundation::message::Message;

/// A named delivery target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Queue {
    name: String,
}

impl Queue {
    /// Creates a queue, rejecting an empty name.
    pub fn new(name: impl Into<String>) -> ValidationResult<Self> {
        let name = name.into();
        ValidationError::check_name("queue", &name)?;
        Ok(Self { name })
    }

    /// The queue name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TryFrom<String> for Queue {
    type Error = ValidationError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Queue::new(name)
    }
}

impl From<Queue> for String {
    fn from(queue: Queue) -> Self {
        queue.name
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Hands a message to a queue.
///
/// Errors are returned to the publisher unchanged.
pub trait MessageDispatcher: Send + Sync {
    /// Delivers `message` to `queue`.
    fn dispatch(&self, queue: &Queue, message: &Message) -> Result<(), BoxError>;
}

impl<F> MessageDispatcher for F
where
    F: Fn(&Queue, &Message) -> Result<(), BoxError> + Send + Sync,
{
    fn dispatch(&self, queue: &Queue, message: &Message) -> Result<(), BoxError> {
        self(queue, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_queue_validation() {
        assert!(Queue::new("audit").is_ok());
        assert_eq!(
            Queue::new(""),
            Err(ValidationError::EmptyName { subject: "queue" })
        );
        assert!(serde_json::from_value::<Queue>(json!("")).is_err());
        assert_eq!(
            serde_json::from_value::<Queue>(json!("mail")).unwrap().name(),
            "mail"
        );
    }

    #[test]
    fn test_closure_dispatcher() {
        let delivered = Mutex::new(Vec::new());
        let dispatcher = |queue: &Queue, message: &Message| -> Result<(), BoxError> {
            delivered
                .lock()
                .push(format!("{queue}:{}", message.name()));
            Ok(())
        };

        let queue = Queue::new("mail").unwrap();
        let message = Message::with_payload("user-registered", json!(null)).unwrap();
        MessageDispatcher::dispatch(&dispatcher, &queue, &message).unwrap();

        assert_eq!(delivered.lock().as_slice(), ["mail:user-registered"]);
    }
}
