//! The dispatch pipeline shared by the command and query buses.
//!
//! # Algorithm
//!
//! One dispatch runs through four steps:
//!
//! 1. **Dispatch**: trigger [`EVENT_DISPATCH`]. Listeners run in priority
//!    tiers:
//!
//!    | Tier | Priority | Default behavior |
//!    |------|----------|------------------|
//!    | initialize | [`PRIORITY_INITIALIZE`] | none |
//!    | detect message name | [`PRIORITY_DETECT_MESSAGE_NAME`] | name from [`HasMessageName`], else the Rust type name |
//!    | route | [`PRIORITY_ROUTE`] | none |
//!    | locate handler | [`PRIORITY_LOCATE_HANDLER`] | none |
//!    | invoke handler | [`PRIORITY_INVOKE_HANDLER`] | call a [`Callable`] handler |
//!
//!    A listener error stops the trigger and is stored as the exception.
//! 2. **Evaluate**: no exception and nothing handled yields a
//!    [`RoutingError`] describing what was left unresolved: no name, an
//!    unlocated token, or no handler at all.
//! 3. **Finalize**: trigger [`EVENT_FINALIZE`] with the same parameters.
//!    Listeners may inspect or clear the exception.
//! 4. **Resolve**: a remaining exception becomes a [`DispatchFailure`].
//!
//! [`HasMessageName`]: conduit_core::HasMessageName
//! [`Callable`]: MessageHandler::Callable

use std::sync::Arc;

use conduit_core::{ActionEvent, ActionEventEmitter, ListenerResult, Plugin};
use tracing::{Level, debug, field, info, span, trace, warn};

use crate::error::{DispatchFailure, PipelineError, RoutingError};
use crate::handler::MessageHandler;
use crate::params::DispatchParams;

/// Extension point triggered to route and handle a message.
pub const EVENT_DISPATCH: &str = "dispatch";

/// Extension point triggered once after every dispatch.
pub const EVENT_FINALIZE: &str = "finalize";

/// Initialize tier, the first to see a dispatch.
pub const PRIORITY_INITIALIZE: i32 = 400_000;
/// Detect-message-name tier.
pub const PRIORITY_DETECT_MESSAGE_NAME: i32 = 300_000;
/// Route tier: assigns the handler.
pub const PRIORITY_ROUTE: i32 = 200_000;
/// Locate-handler tier: resolves locator tokens.
pub const PRIORITY_LOCATE_HANDLER: i32 = 100_000;
/// Invoke tier: calls the handler and marks the message handled.
pub const PRIORITY_INVOKE_HANDLER: i32 = 0;

// =============================================================================
// Default Listeners
// =============================================================================

/// Detect-message-name tier: fills in the message name if no listener did.
pub fn detect_message_name<B: ?Sized, C: ?Sized, X>(
    event: &mut ActionEvent<'_, B, DispatchParams<C, X>>,
) -> ListenerResult {
    if event.message_name().is_none() {
        let message = event.message();
        let name = message.name().unwrap_or(message.type_name()).to_owned();
        trace!(message_name = %name, "Message name detected");
        event.set_message_name(name);
    }
    Ok(())
}

/// Returns the callable the default invoke listener should call.
///
/// Anything else (no name, no handler, a locator token, a handler object) is
/// left untouched for later invoke-tier listeners and classified by
/// [`unhandled_error`] once the trigger completes.
pub fn callable_handler<C: ?Sized, X>(params: &DispatchParams<C, X>) -> Option<Arc<C>> {
    if !has_message_name(params) {
        return None;
    }
    match params.handler() {
        Some(MessageHandler::Callable(callable)) => Some(Arc::clone(callable)),
        _ => None,
    }
}

/// The routing error for a dispatch no listener handled.
pub fn unhandled_error<C: ?Sized, X>(params: &DispatchParams<C, X>) -> RoutingError {
    let message_name = match params.message_name() {
        Some(name) if !name.trim().is_empty() => name.to_owned(),
        _ => return RoutingError::MissingMessageName,
    };

    match params.handler() {
        Some(MessageHandler::Locator(token)) => RoutingError::HandlerNotLocated {
            message_name,
            locator: token.clone(),
        },
        _ => RoutingError::NoHandler { message_name },
    }
}

fn has_message_name<C: ?Sized, X>(params: &DispatchParams<C, X>) -> bool {
    params
        .message_name()
        .is_some_and(|name| !name.trim().is_empty())
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs one dispatch through the emitter.
pub(crate) fn dispatch<B: ?Sized, C: ?Sized, X>(
    bus_name: &str,
    emitter: &ActionEventEmitter<B, DispatchParams<C, X>>,
    bus: &B,
    params: &mut DispatchParams<C, X>,
) -> Result<(), DispatchFailure> {
    let span = span!(
        Level::DEBUG,
        "dispatch",
        bus = %bus_name,
        message_type = params.message().type_name(),
        message_name = field::Empty
    );
    let _enter = span.enter();

    match emitter.trigger(EVENT_DISPATCH, bus, params) {
        Ok(outcome) if outcome.stopped => debug!("Dispatch stopped by a listener"),
        Ok(_) => {}
        Err(error) => {
            let error = PipelineError::from(error);
            debug!(error = %error, "Listener failed during dispatch");
            params.set_exception(error);
        }
    }

    if let Some(name) = params.message_name() {
        span.record("message_name", name);
    }

    if params.exception().is_none() && !params.is_handled() {
        let error = unhandled_error(params);
        trace!(error = %error, "No listener handled the message");
        params.set_exception(error);
    }

    if let Err(error) = emitter.trigger(EVENT_FINALIZE, bus, params) {
        let error = PipelineError::from(error);
        if params.exception().is_none() {
            params.set_exception(error);
        } else {
            warn!(error = %error, "Finalize listener failed, keeping the original exception");
        }
    }

    match params.clear_exception() {
        None => {
            trace!(message_name = ?params.message_name(), "Message dispatched");
            Ok(())
        }
        Some(cause) => {
            warn!(
                message_name = ?params.message_name(),
                error = %cause,
                "Message dispatch failed"
            );
            Err(DispatchFailure::new(
                params.message_name().map(str::to_owned),
                cause,
            ))
        }
    }
}

// =============================================================================
// Plugins
// =============================================================================

pub(crate) fn utilize<B: ?Sized, P>(
    bus_name: &str,
    emitter: &ActionEventEmitter<B, P>,
    plugin: &dyn Plugin<B, P>,
) {
    plugin.attach_to(emitter);
    info!(bus = %bus_name, plugin = plugin.name(), "Plugin attached");
}

pub(crate) fn deactivate<B: ?Sized, P>(
    bus_name: &str,
    emitter: &ActionEventEmitter<B, P>,
    plugin: &dyn Plugin<B, P>,
) {
    plugin.detach_from(emitter);
    info!(bus = %bus_name, plugin = plugin.name(), "Plugin detached");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerMethods;
    use crate::params::CommandParams;
    use conduit_core::Envelope;

    #[test]
    fn test_detect_falls_back_to_type_name() {
        let emitter: ActionEventEmitter<(), CommandParams> = ActionEventEmitter::new();
        emitter.attach(EVENT_DISPATCH, detect_message_name, PRIORITY_DETECT_MESSAGE_NAME);

        let mut params = CommandParams::new(Envelope::new(7u32), ());
        emitter.trigger(EVENT_DISPATCH, &(), &mut params).unwrap();

        assert_eq!(params.message_name(), Some("u32"));
    }

    #[test]
    fn test_detect_keeps_existing_name() {
        let emitter: ActionEventEmitter<(), CommandParams> = ActionEventEmitter::new();
        emitter.attach(
            EVENT_DISPATCH,
            |event| {
                event.set_message_name("custom-message");
                Ok(())
            },
            PRIORITY_INITIALIZE,
        );
        emitter.attach(EVENT_DISPATCH, detect_message_name, PRIORITY_DETECT_MESSAGE_NAME);

        let mut params = CommandParams::new(Envelope::from("payload"), ());
        emitter.trigger(EVENT_DISPATCH, &(), &mut params).unwrap();

        assert_eq!(params.message_name(), Some("custom-message"));
    }

    #[test]
    fn test_only_callables_are_invoked_by_default() {
        let mut params = CommandParams::new(Envelope::from("ping"), ());
        params.set_handler(MessageHandler::command(|_| Ok(())));
        assert!(callable_handler(&params).is_none());

        params.set_message_name("ping");
        assert!(callable_handler(&params).is_some());

        params.set_handler(MessageHandler::locator("ping-service"));
        assert!(callable_handler(&params).is_none());

        params.set_handler(MessageHandler::object(HandlerMethods::new()));
        assert!(callable_handler(&params).is_none());
    }

    #[test]
    fn test_unhandled_error_classification() {
        let mut params = CommandParams::new(Envelope::from("ping"), ());
        assert_eq!(unhandled_error(&params), RoutingError::MissingMessageName);

        params.set_message_name("  ");
        assert_eq!(unhandled_error(&params), RoutingError::MissingMessageName);

        params.set_message_name("ping");
        assert_eq!(
            unhandled_error(&params),
            RoutingError::NoHandler {
                message_name: "ping".into()
            }
        );

        params.set_handler(MessageHandler::locator("ping-service"));
        assert_eq!(
            unhandled_error(&params),
            RoutingError::HandlerNotLocated {
                message_name: "ping".into(),
                locator: "ping-service".into()
            }
        );

        params.set_handler(MessageHandler::object(HandlerMethods::new()));
        assert_eq!(
            unhandled_error(&params),
            RoutingError::NoHandler {
                message_name: "ping".into()
            }
        );
    }

    #[test]
    fn test_unhandled_message_without_listeners() {
        let emitter: ActionEventEmitter<(), CommandParams> = ActionEventEmitter::new();
        let mut params = CommandParams::new(Envelope::from("ping"), ());

        let failure = dispatch("test-bus", &emitter, &(), &mut params).unwrap_err();

        assert_eq!(
            failure.cause().as_routing(),
            Some(&RoutingError::MissingMessageName)
        );
    }

    #[test]
    fn test_later_invoke_listener_handles_locator_token() {
        let emitter: ActionEventEmitter<(), CommandParams> = ActionEventEmitter::new();
        emitter.attach(EVENT_DISPATCH, detect_message_name, PRIORITY_DETECT_MESSAGE_NAME);
        emitter.attach(
            EVENT_DISPATCH,
            |event| {
                event.set_handler(MessageHandler::locator("svc"));
                Ok(())
            },
            PRIORITY_ROUTE,
        );
        emitter.attach(
            EVENT_DISPATCH,
            |event| {
                if let Some(handler) = callable_handler(event.params()) {
                    handler(event.message())?;
                    event.set_handled(true);
                }
                Ok(())
            },
            PRIORITY_INVOKE_HANDLER,
        );
        emitter.attach(
            EVENT_DISPATCH,
            |event| {
                if matches!(event.handler(), Some(MessageHandler::Locator(token)) if token == "svc") {
                    event.set_handled(true);
                }
                Ok(())
            },
            PRIORITY_INVOKE_HANDLER,
        );

        let mut params = CommandParams::new(Envelope::from("ping"), ());
        assert!(dispatch("test-bus", &emitter, &(), &mut params).is_ok());
        assert!(params.is_handled());
    }
}
