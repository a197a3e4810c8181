//! Foundation layer - Core value types.
//!
//! This module contains the building blocks every other layer relies on:
//! - Message model (standard messages and type-erased envelopes)
//! - Domain events for the fan-out bus
//! - Construction-time validation errors

pub mod error;
pub mod event;
pub mod message;

pub use error::{BoxError, SharedError, ValidationError, ValidationResult};
pub use event::{DomainEvent, GenericEvent};
pub use message::{Envelope, HasMessageName, Message, MessageHeader};
