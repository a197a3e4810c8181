//! Handler location.
//!
//! A routing listener may name a handler by token
//! ([`MessageHandler::Locator`]) instead of providing it. The
//! [`HandlerLocatorPlugin`] resolves such tokens at the locate-handler tier
//! through a [`HandlerLocator`]; unresolved tokens fail the dispatch with
//! [`RoutingError::HandlerNotLocated`](crate::RoutingError::HandlerNotLocated).
//!
//! ```rust,ignore
//! let locator = Arc::new(InMemoryLocator::new());
//! locator.register("user-service", MessageHandler::command(register_user));
//!
//! let bus = CommandBus::new();
//! bus.utilize(&HandlerLocatorPlugin::new(locator));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use conduit_core::{ActionEventEmitter, ListenerHandles, Plugin};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::handler::MessageHandler;
use crate::params::DispatchParams;
use crate::pipeline::{EVENT_DISPATCH, PRIORITY_LOCATE_HANDLER};

/// Resolves locator tokens to handlers.
pub trait HandlerLocator<C: ?Sized>: Send + Sync {
    /// Returns the handler registered under `token`, if any.
    fn locate(&self, token: &str) -> Option<MessageHandler<C>>;
}

// ─── In-memory locator ────────────────────────────────────────────────────────

/// A [`HandlerLocator`] backed by a map.
pub struct InMemoryLocator<C: ?Sized> {
    handlers: RwLock<HashMap<String, MessageHandler<C>>>,
}

impl<C: ?Sized> InMemoryLocator<C> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `handler` under `token`, returning the handler it replaced.
    pub fn register(
        &self,
        token: impl Into<String>,
        handler: MessageHandler<C>,
    ) -> Option<MessageHandler<C>> {
        self.handlers.write().insert(token.into(), handler)
    }

    /// Removes the handler registered under `token`.
    pub fn unregister(&self, token: &str) -> Option<MessageHandler<C>> {
        self.handlers.write().remove(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.handlers.read().contains_key(token)
    }
}

impl<C: ?Sized> Default for InMemoryLocator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized + Send + Sync> HandlerLocator<C> for InMemoryLocator<C> {
    fn locate(&self, token: &str) -> Option<MessageHandler<C>> {
        self.handlers.read().get(token).cloned()
    }
}

impl<C: ?Sized> fmt::Debug for InMemoryLocator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut tokens: Vec<&str> = handlers.keys().map(String::as_str).collect();
        tokens.sort_unstable();
        f.debug_struct("InMemoryLocator")
            .field("tokens", &tokens)
            .finish()
    }
}

// ─── Plugin ───────────────────────────────────────────────────────────────────

/// Resolves [`MessageHandler::Locator`] tokens at the locate-handler tier.
///
/// Works with any bus whose parameters are [`DispatchParams`]; tokens the
/// locator does not know are left in place.
pub struct HandlerLocatorPlugin<C: ?Sized> {
    locator: Arc<dyn HandlerLocator<C>>,
    handles: ListenerHandles,
}

impl<C: ?Sized> HandlerLocatorPlugin<C> {
    pub fn new(locator: Arc<dyn HandlerLocator<C>>) -> Self {
        Self {
            locator,
            handles: ListenerHandles::new(),
        }
    }
}

impl<B, C, X> Plugin<B, DispatchParams<C, X>> for HandlerLocatorPlugin<C>
where
    B: ?Sized + 'static,
    C: ?Sized + Send + Sync + 'static,
    X: 'static,
{
    fn name(&self) -> &str {
        "handler-locator"
    }

    fn attach_to(&self, emitter: &ActionEventEmitter<B, DispatchParams<C, X>>) {
        let locator = Arc::clone(&self.locator);
        self.handles.track(emitter.attach(
            EVENT_DISPATCH,
            move |event| {
                let Some(MessageHandler::Locator(token)) = event.handler() else {
                    return Ok(());
                };
                let token = token.clone();

                match locator.locate(&token) {
                    Some(handler) => {
                        trace!(token = %token, kind = handler.kind(), "Handler located");
                        event.set_handler(handler);
                    }
                    None => debug!(token = %token, "No handler registered for token"),
                }
                Ok(())
            },
            PRIORITY_LOCATE_HANDLER,
        ));
    }

    fn detach_from(&self, emitter: &ActionEventEmitter<B, DispatchParams<C, X>>) {
        self.handles.detach_all(emitter);
    }
}

impl<C: ?Sized> fmt::Debug for HandlerLocatorPlugin<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerLocatorPlugin")
            .field("handles", &self.handles.len())
            .finish_non_exhaustive()
    }
}
