//! Message types for the Conduit bus.
//!
//! This module provides the two shapes a message can take on its way through
//! a bus:
//!
//! - [`Message`]: the standard, immutable transport message (name, header,
//!   JSON payload). Produced by callers or by a
//!   [`MessageFactory`](crate::integration::MessageFactory).
//! - [`Envelope`]: a type-erased container for *anything* that can be
//!   dispatched, named or not. Buses accept any `impl Into<Envelope>`.
//!
//! Types that carry their own routing name implement [`HasMessageName`]
//! (usually via `#[derive(MessageName)]`). Everything else is identified by
//! its Rust type name when the pipeline detects the message name.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{ValidationError, ValidationResult};

// ============================================================================
// HasMessageName
// ============================================================================

/// Implemented by message types that expose their own routing name.
///
/// # Derive Macro
///
/// ```rust,ignore
/// use conduit_macros::MessageName;
///
/// #[derive(MessageName)]
/// #[message(name = "fetch-something")]
/// struct FetchSomething { filter: String }
/// ```
pub trait HasMessageName {
    /// Returns the name used to route this message to its handler.
    fn message_name(&self) -> &str;
}

// ============================================================================
// Message Header
// ============================================================================

/// Opaque message metadata. The pipeline never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageHeader {
    id: Uuid,
    created_at: DateTime<Utc>,
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sender: Option<String>,
}

impl MessageHeader {
    /// Creates a header from explicit parts.
    pub fn new(id: Uuid, created_at: DateTime<Utc>, version: u32) -> Self {
        Self {
            id,
            created_at,
            version,
            sender: None,
        }
    }

    /// Creates a fresh header: random v4 id, current time, version 1.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4(), Utc::now(), 1)
    }

    /// Sets the name of the bus that produced the message.
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Unique identifier of the message.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Message version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Name of the bus that produced the message, if any.
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }
}

// ============================================================================
// Standard Message
// ============================================================================

/// The standard transport message: a validated name, an opaque header and a
/// JSON payload.
///
/// Messages are immutable once built; the bus only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    name: String,
    header: MessageHeader,
    payload: Value,
}

impl Message {
    /// Creates a message, rejecting an empty name.
    pub fn new(
        name: impl Into<String>,
        header: MessageHeader,
        payload: Value,
    ) -> ValidationResult<Self> {
        let name = name.into();
        ValidationError::check_name("message", &name)?;
        Ok(Self {
            name,
            header,
            payload,
        })
    }

    /// Creates a message with a freshly generated header.
    pub fn with_payload(name: impl Into<String>, payload: Value) -> ValidationResult<Self> {
        Self::new(name, MessageHeader::generate(), payload)
    }

    /// The message name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The message header.
    pub fn header(&self) -> &MessageHeader {
        &self.header
    }

    /// The message payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

impl HasMessageName for Message {
    fn message_name(&self) -> &str {
        &self.name
    }
}

/// Unvalidated wire form; deserialization goes through [`Message::new`].
#[derive(Deserialize)]
struct RawMessage {
    name: String,
    header: MessageHeader,
    #[serde(default)]
    payload: Value,
}

impl TryFrom<RawMessage> for Message {
    type Error = ValidationError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        Message::new(raw.name, raw.header, raw.payload)
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A type-erased container for anything dispatched through a bus.
///
/// `Envelope` wraps the value in an `Arc`, so cloning is cheap and every
/// listener of one dispatch sees the very same instance.
///
/// ```rust,ignore
/// // Named: the routing name comes from `HasMessageName`.
/// bus.dispatch(Message::with_payload("register-user", json!({}))?)?;
///
/// // Unnamed: the pipeline falls back to the Rust type name.
/// bus.dispatch(Envelope::new(RegisterUser { id: 7 }))?;
/// ```
#[derive(Clone)]
pub struct Envelope {
    inner: Arc<dyn Any + Send + Sync>,
    name: Option<String>,
    type_name: &'static str,
}

impl Envelope {
    /// Wraps a value that exposes no message name.
    pub fn new<M: Any + Send + Sync>(message: M) -> Self {
        Self {
            inner: Arc::new(message),
            name: None,
            type_name: type_name::<M>(),
        }
    }

    /// Wraps a value that carries its own message name.
    pub fn named<M: HasMessageName + Any + Send + Sync>(message: M) -> Self {
        let name = message.message_name().to_owned();
        Self {
            inner: Arc::new(message),
            name: Some(name),
            type_name: type_name::<M>(),
        }
    }

    /// The name exposed by the wrapped value, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The Rust type name of the wrapped value.
    ///
    /// This is the structural identifier used when the value has no name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is of type `M`.
    pub fn is<M: Any>(&self) -> bool {
        self.inner.is::<M>()
    }

    /// Attempts to downcast to the concrete message type.
    pub fn downcast_ref<M: Any>(&self) -> Option<&M> {
        self.inner.downcast_ref()
    }

    /// Shortcut for envelopes carrying a standard [`Message`].
    pub fn as_message(&self) -> Option<&Message> {
        self.downcast_ref()
    }

    /// Returns `true` if both envelopes share the same wrapped instance.
    pub fn ptr_eq(&self, other: &Envelope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl From<Message> for Envelope {
    fn from(message: Message) -> Self {
        Envelope::named(message)
    }
}

impl From<String> for Envelope {
    fn from(message: String) -> Self {
        Envelope::new(message)
    }
}

impl From<&str> for Envelope {
    fn from(message: &str) -> Self {
        Envelope::new(message.to_owned())
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish()
    }
}
