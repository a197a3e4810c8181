//! Invocation strategies for handler objects.
//!
//! A routing listener may store a [`MessageHandler::Object`] instead of a
//! callable. The default invoke listener leaves such handlers alone; an
//! invocation strategy attached at the invoke tier looks up a method by
//! convention and calls it:
//!
//! | Strategy | Bus | Methods tried, in order |
//! |----------|-----|-------------------------|
//! | [`HandleCommandStrategy`] | command | `handle_<short name>`, `handle` |
//! | [`FinderInvokeStrategy`] | query | `find_<short name>`, `find` |
//!
//! The short name is the last segment of the message name, in snake_case:
//! `app::commands::RegisterUser` becomes `register_user`, `custom-message`
//! becomes `custom_message`.

use conduit_core::{ActionEvent, ActionEventEmitter, ListenerHandles, ListenerResult, Plugin};
use tracing::trace;

use crate::command_bus::CommandBus;
use crate::handler::MessageHandler;
use crate::params::{AsHandlerCall, CommandParams, DispatchParams, QueryParams};
use crate::pipeline::{EVENT_DISPATCH, PRIORITY_INVOKE_HANDLER};
use crate::query_bus::QueryBus;

// ─── Naming convention ────────────────────────────────────────────────────────

/// Derives the method-name suffix for a message name.
pub fn short_name(message_name: &str) -> String {
    let last = message_name
        .rsplit(|c| matches!(c, ':' | '\\' | '/' | '.'))
        .find(|segment| !segment.is_empty())
        .unwrap_or(message_name);

    let mut snake = String::with_capacity(last.len() + 4);
    let mut previous: Option<char> = None;

    for c in last.chars() {
        if c == '-' || c == ' ' || c == '_' {
            if !snake.is_empty() && !snake.ends_with('_') {
                snake.push('_');
            }
        } else if c.is_uppercase() {
            if previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit())
                && !snake.ends_with('_')
            {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
        previous = Some(c);
    }

    snake.trim_end_matches('_').to_owned()
}

/// Calls the conventionally named method of a handler object.
fn invoke_by_convention<B: ?Sized, C: ?Sized, X>(
    event: &mut ActionEvent<'_, B, DispatchParams<C, X>>,
    prefix: &'static str,
) -> ListenerResult
where
    DispatchParams<C, X>: AsHandlerCall,
{
    if event.is_handled() {
        return Ok(());
    }

    let Some(MessageHandler::Object(object)) = event.handler() else {
        return Ok(());
    };
    let object = object.clone();

    let Some(message_name) = event.message_name() else {
        return Ok(());
    };
    let specific = format!("{prefix}_{}", short_name(message_name));

    for method in [specific.as_str(), prefix] {
        if let Some(result) = object.call_method(method, event.params().handler_call()) {
            result?;
            trace!(method, "Handler object invoked");
            event.set_handled(true);
            return Ok(());
        }
    }

    Ok(())
}

// ─── Command strategy ─────────────────────────────────────────────────────────

/// Calls `handle_<short name>` or `handle` on command handler objects.
#[derive(Debug, Default)]
pub struct HandleCommandStrategy {
    handles: ListenerHandles,
}

impl HandleCommandStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin<CommandBus, CommandParams> for HandleCommandStrategy {
    fn name(&self) -> &str {
        "handle-command-strategy"
    }

    fn attach_to(&self, emitter: &ActionEventEmitter<CommandBus, CommandParams>) {
        self.handles.track(emitter.attach(
            EVENT_DISPATCH,
            |event| invoke_by_convention(event, "handle"),
            PRIORITY_INVOKE_HANDLER,
        ));
    }

    fn detach_from(&self, emitter: &ActionEventEmitter<CommandBus, CommandParams>) {
        self.handles.detach_all(emitter);
    }
}

// ─── Query strategy ───────────────────────────────────────────────────────────

/// Calls `find_<short name>` or `find` on query handler objects, passing the
/// deferred along.
#[derive(Debug, Default)]
pub struct FinderInvokeStrategy {
    handles: ListenerHandles,
}

impl FinderInvokeStrategy {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Plugin<QueryBus, QueryParams> for FinderInvokeStrategy {
    fn name(&self) -> &str {
        "finder-invoke-strategy"
    }

    fn attach_to(&self, emitter: &ActionEventEmitter<QueryBus, QueryParams>) {
        self.handles.track(emitter.attach(
            EVENT_DISPATCH,
            |event| invoke_by_convention(event, "find"),
            PRIORITY_INVOKE_HANDLER,
        ));
    }

    fn detach_from(&self, emitter: &ActionEventEmitter<QueryBus, QueryParams>) {
        self.handles.detach_all(emitter);
    }
}
