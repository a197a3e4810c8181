//! Fire-and-forget dispatch.
//!
//! A [`CommandBus`] routes every message to exactly one handler and reports
//! failure synchronously.
//!
//! ```rust,ignore
//! use conduit_bus::prelude::*;
//!
//! let bus = CommandBus::new();
//! bus.event_emitter().attach(EVENT_DISPATCH, |event| {
//!     if event.message_name() == Some("register-user") {
//!         event.set_handler(MessageHandler::command(|message| {
//!             println!("registering {:?}", message.as_message());
//!             Ok(())
//!         }));
//!     }
//!     Ok(())
//! }, PRIORITY_ROUTE);
//!
//! bus.dispatch(Message::with_payload("register-user", json!({"id": 7}))?)?;
//! ```

use std::fmt;
use std::sync::Arc;

use conduit_core::{
    ActionEvent, ActionEventEmitter, Envelope, ListenerResult, Plugin, ValidationError,
    ValidationResult,
};

use crate::error::DispatchResult;
use crate::params::CommandParams;
use crate::pipeline::{
    self, EVENT_DISPATCH, PRIORITY_DETECT_MESSAGE_NAME, PRIORITY_INVOKE_HANDLER,
};

/// The emitter type of a [`CommandBus`].
pub type CommandEmitter = ActionEventEmitter<CommandBus, CommandParams>;

/// A bus delivering each command to exactly one handler.
pub struct CommandBus {
    name: String,
    emitter: Arc<CommandEmitter>,
}

impl CommandBus {
    /// Name used by [`CommandBus::new`].
    pub const DEFAULT_NAME: &'static str = "command-bus";

    /// Creates a bus owning a fresh emitter.
    pub fn new() -> Self {
        Self::build(Self::DEFAULT_NAME.to_owned(), Arc::new(CommandEmitter::new()))
    }

    /// Creates a named bus owning a fresh emitter.
    pub fn named(name: impl Into<String>) -> ValidationResult<Self> {
        Self::with_emitter(name, Arc::new(CommandEmitter::new()))
    }

    /// Creates a named bus on a supplied emitter.
    ///
    /// The default listeners are attached to `emitter`.
    pub fn with_emitter(
        name: impl Into<String>,
        emitter: Arc<CommandEmitter>,
    ) -> ValidationResult<Self> {
        let name = name.into();
        ValidationError::check_name("bus", &name)?;
        Ok(Self::build(name, emitter))
    }

    fn build(name: String, emitter: Arc<CommandEmitter>) -> Self {
        emitter.attach(
            EVENT_DISPATCH,
            pipeline::detect_message_name,
            PRIORITY_DETECT_MESSAGE_NAME,
        );
        emitter.attach(EVENT_DISPATCH, invoke_handler, PRIORITY_INVOKE_HANDLER);
        Self { name, emitter }
    }

    /// The bus name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The emitter listeners are attached to.
    pub fn event_emitter(&self) -> &Arc<CommandEmitter> {
        &self.emitter
    }

    /// Attaches a plugin's listeners.
    pub fn utilize(&self, plugin: &dyn Plugin<CommandBus, CommandParams>) {
        pipeline::utilize(&self.name, &self.emitter, plugin);
    }

    /// Detaches a plugin's listeners.
    pub fn deactivate(&self, plugin: &dyn Plugin<CommandBus, CommandParams>) {
        pipeline::deactivate(&self.name, &self.emitter, plugin);
    }

    /// Dispatches a command.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchFailure`](crate::DispatchFailure) if routing or the
    /// handler failed and no finalize listener recovered.
    pub fn dispatch(&self, message: impl Into<Envelope>) -> DispatchResult {
        let mut params = CommandParams::new(message.into(), ());
        pipeline::dispatch(&self.name, &self.emitter, self, &mut params)
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandBus")
            .field("name", &self.name)
            .field("emitter", &self.emitter)
            .finish()
    }
}

/// Invoke tier: calls a callable handler.
fn invoke_handler(event: &mut ActionEvent<'_, CommandBus, CommandParams>) -> ListenerResult {
    if event.is_handled() {
        return Ok(());
    }

    if let Some(handler) = pipeline::callable_handler(event.params()) {
        handler(event.message())?;
        event.set_handled(true);
    }
    Ok(())
}
