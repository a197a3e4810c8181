//! Integration layer - External collaborators.
//!
//! This module contains the seams the fan-out bus talks through:
//! - Message factory converting domain events into transport messages
//! - Delivery targets (queues) and the dispatcher that delivers to them

pub mod dispatcher;
pub mod factory;

pub use dispatcher::{MessageDispatcher, Queue};
pub use factory::{MessageFactory, StandardMessageFactory};
