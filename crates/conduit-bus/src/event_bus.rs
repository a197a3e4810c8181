//! Fan-out publishing.
//!
//! An [`EventBus`] converts each published [`DomainEvent`] into a transport
//! [`Message`] and hands it to a [`MessageDispatcher`] once per configured
//! [`Queue`].
//!
//! # Lifecycle
//!
//! ```text
//! publish.pre ──▶ message factory ──┬─▶ deliver.pre ──▶ dispatcher ──▶ deliver.post ─┐
//!     │ stop                        │       │ stop                                  │
//!     ▼                             │       └──────── (next queue) ◀────────────────┘
//!   return                          └──────────────────────────────────────────────▶ publish.post
//! ```
//!
//! - stopping `publish.pre` skips the whole publish;
//! - stopping `deliver.pre` skips only the current queue.
//!
//! Dispatcher errors are **not** captured or wrapped: they abort the publish
//! and reach the caller unchanged.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use conduit_core::{
    ActionEventEmitter, BoxError, DomainEvent, Message, MessageDispatcher, MessageFactory,
    Plugin, Queue, StandardMessageFactory, ValidationError, ValidationResult,
};
use tracing::{Level, debug, span, trace};

use crate::pipeline;

/// Triggered before an event is converted and delivered.
pub const EVENT_PUBLISH_PRE: &str = "publish.pre";
/// Triggered before delivery to each queue.
pub const EVENT_DELIVER_PRE: &str = "deliver.pre";
/// Triggered after delivery to each queue.
pub const EVENT_DELIVER_POST: &str = "deliver.post";
/// Triggered after delivery to every queue.
pub const EVENT_PUBLISH_POST: &str = "publish.post";

/// The emitter type of an [`EventBus`].
pub type EventEmitter = ActionEventEmitter<EventBus, PublishParams>;

// =============================================================================
// Publish Parameters
// =============================================================================

/// Parameters shared by the listeners of one publish.
pub struct PublishParams {
    event: Arc<dyn DomainEvent>,
    message: Option<Message>,
    queue: Option<Queue>,
}

impl PublishParams {
    fn new(event: Arc<dyn DomainEvent>) -> Self {
        Self {
            event,
            message: None,
            queue: None,
        }
    }

    /// The published event.
    pub fn event(&self) -> &dyn DomainEvent {
        self.event.as_ref()
    }

    /// The transport message; `None` during `publish.pre`.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// The queue being delivered to; `None` outside the delivery hooks.
    pub fn queue(&self) -> Option<&Queue> {
        self.queue.as_ref()
    }
}

impl fmt::Debug for PublishParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishParams")
            .field("event", &self.event.event_name())
            .field("message", &self.message)
            .field("queue", &self.queue)
            .finish()
    }
}

// =============================================================================
// Event Bus
// =============================================================================

/// A bus delivering each event to every configured queue.
pub struct EventBus {
    name: String,
    emitter: Arc<EventEmitter>,
    dispatcher: Arc<dyn MessageDispatcher>,
    queues: Vec<Queue>,
    factory: Arc<dyn MessageFactory>,
}

impl EventBus {
    /// Creates a bus owning a fresh emitter.
    ///
    /// # Errors
    ///
    /// Fails if `name` is empty or a queue is listed twice.
    pub fn new(
        name: impl Into<String>,
        dispatcher: Arc<dyn MessageDispatcher>,
        queues: Vec<Queue>,
    ) -> ValidationResult<Self> {
        Self::with_emitter(name, dispatcher, queues, Arc::new(EventEmitter::new()))
    }

    /// Creates a bus on a supplied emitter.
    pub fn with_emitter(
        name: impl Into<String>,
        dispatcher: Arc<dyn MessageDispatcher>,
        queues: Vec<Queue>,
        emitter: Arc<EventEmitter>,
    ) -> ValidationResult<Self> {
        let name = name.into();
        ValidationError::check_name("bus", &name)?;

        let mut seen = HashSet::new();
        if let Some(duplicate) = queues.iter().find(|queue| !seen.insert(queue.name())) {
            return Err(ValidationError::DuplicateQueue {
                name: duplicate.name().to_owned(),
            });
        }

        Ok(Self {
            name,
            emitter,
            dispatcher,
            queues,
            factory: Arc::new(StandardMessageFactory),
        })
    }

    /// Replaces the factory converting events into messages.
    pub fn set_message_factory(&mut self, factory: Arc<dyn MessageFactory>) {
        self.factory = factory;
    }

    /// The bus name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The delivery targets, in delivery order.
    pub fn queues(&self) -> &[Queue] {
        &self.queues
    }

    /// The emitter listeners are attached to.
    pub fn event_emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// Attaches a plugin's listeners.
    pub fn utilize(&self, plugin: &dyn Plugin<EventBus, PublishParams>) {
        pipeline::utilize(&self.name, &self.emitter, plugin);
    }

    /// Detaches a plugin's listeners.
    pub fn deactivate(&self, plugin: &dyn Plugin<EventBus, PublishParams>) {
        pipeline::deactivate(&self.name, &self.emitter, plugin);
    }

    /// Publishes an event to every queue.
    ///
    /// # Errors
    ///
    /// Listener, factory and dispatcher errors are returned unchanged; queues
    /// after a failing one are not delivered to.
    pub fn publish(&self, event: impl DomainEvent + 'static) -> Result<(), BoxError> {
        self.publish_shared(Arc::new(event))
    }

    /// Same as [`publish`](Self::publish).
    pub fn dispatch(&self, event: impl DomainEvent + 'static) -> Result<(), BoxError> {
        self.publish(event)
    }

    /// Publishes an already shared event.
    pub fn publish_shared(&self, event: Arc<dyn DomainEvent>) -> Result<(), BoxError> {
        let span = span!(
            Level::DEBUG,
            "publish",
            bus = %self.name,
            message_name = %event.event_name()
        );
        let _enter = span.enter();

        let mut params = PublishParams::new(event);

        if self.emitter.trigger(EVENT_PUBLISH_PRE, self, &mut params)?.stopped {
            debug!("Publish stopped by a listener");
            return Ok(());
        }

        let message = self.factory.from_event(params.event(), &self.name)?;
        params.message = Some(message.clone());

        for queue in &self.queues {
            params.queue = Some(queue.clone());

            if self.emitter.trigger(EVENT_DELIVER_PRE, self, &mut params)?.stopped {
                debug!(queue = %queue, "Delivery skipped by a listener");
                continue;
            }

            self.dispatcher.dispatch(queue, &message)?;
            trace!(queue = %queue, "Message delivered");

            self.emitter.trigger(EVENT_DELIVER_POST, self, &mut params)?;
        }

        params.queue = None;
        self.emitter.trigger(EVENT_PUBLISH_POST, self, &mut params)?;
        Ok(())
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("name", &self.name)
            .field("queues", &self.queues)
            .field("emitter", &self.emitter)
            .finish_non_exhaustive()
    }
}
