//! Priority-ordered extension points.
//!
//! An [`ActionEventEmitter`] is a registry of named extension points. Each
//! extension point holds a list of listeners ordered by priority: higher
//! priorities run first, equal priorities run in registration order.
//!
//! # Triggering
//!
//! [`ActionEventEmitter::trigger`] builds one [`ActionEvent`] and walks a
//! point-in-time snapshot of the listener list:
//!
//! 1. Listeners are invoked sequentially on the caller's thread
//! 2. A listener that returns `Err` aborts the trigger; the error is returned
//! 3. A listener that stops propagation ends the trigger early (not an error)
//!
//! Listeners attached or detached while a trigger is in progress take effect
//! from the next trigger on.
//!
//! ```rust,ignore
//! use conduit_core::ActionEventEmitter;
//!
//! let emitter: ActionEventEmitter<str, Vec<&'static str>> = ActionEventEmitter::new();
//!
//! emitter.attach("greet", |event| { event.push("second"); Ok(()) }, 0);
//! emitter.attach("greet", |event| { event.push("first"); Ok(()) }, 10);
//!
//! let mut seen = Vec::new();
//! emitter.trigger("greet", "target", &mut seen)?;
//! assert_eq!(seen, ["first", "second"]);
//! ```

pub mod action_event;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::foundation::error::BoxError;

pub use action_event::ActionEvent;

/// Result returned by every listener.
pub type ListenerResult = Result<(), BoxError>;

type Listener<T, P> = Arc<dyn Fn(&mut ActionEvent<'_, T, P>) -> ListenerResult + Send + Sync>;

static NEXT_EMITTER_ID: AtomicU64 = AtomicU64::new(1);

// =============================================================================
// Handles & Outcomes
// =============================================================================

/// Opaque token identifying one listener registration.
///
/// A handle only ever refers to the emitter that issued it; detaching it from
/// another emitter does nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerHandle {
    emitter_id: u64,
    event: String,
    id: u64,
}

impl ListenerHandle {
    /// Name of the extension point the listener was attached to.
    pub fn event(&self) -> &str {
        &self.event
    }
}

/// What happened during one trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TriggerOutcome {
    /// A listener stopped propagation.
    pub stopped: bool,
    /// Number of listeners that ran, including the one that stopped.
    pub invoked: usize,
}

// =============================================================================
// Emitter
// =============================================================================

struct Registration<T: ?Sized, P> {
    id: u64,
    priority: i32,
    listener: Listener<T, P>,
}

/// Registry of named extension points with priority-ordered listeners.
///
/// `T` is the target handed to listeners (usually the bus owning the emitter)
/// and `P` the typed parameter record shared across one trigger.
///
/// # Thread Safety
///
/// The registry sits behind a `parking_lot::RwLock`; the lock is released
/// before any listener runs, so listeners may attach or detach freely.
pub struct ActionEventEmitter<T: ?Sized, P> {
    id: u64,
    next_listener: AtomicU64,
    listeners: RwLock<HashMap<String, Vec<Registration<T, P>>>>,
}

impl<T: ?Sized, P> ActionEventEmitter<T, P> {
    /// Creates an emitter with no listeners.
    pub fn new() -> Self {
        Self {
            id: NEXT_EMITTER_ID.fetch_add(1, Ordering::Relaxed),
            next_listener: AtomicU64::new(1),
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `listener` on the extension point `event`.
    ///
    /// Higher `priority` runs earlier. Listeners sharing a priority run in
    /// the order they were attached.
    pub fn attach<F>(&self, event: impl Into<String>, listener: F, priority: i32) -> ListenerHandle
    where
        F: Fn(&mut ActionEvent<'_, T, P>) -> ListenerResult + Send + Sync + 'static,
    {
        let event = event.into();
        let id = self.next_listener.fetch_add(1, Ordering::Relaxed);

        let mut listeners = self.listeners.write();
        let registrations = listeners.entry(event.clone()).or_default();
        let position = registrations
            .iter()
            .position(|existing| existing.priority < priority)
            .unwrap_or(registrations.len());
        registrations.insert(
            position,
            Registration {
                id,
                priority,
                listener: Arc::new(listener),
            },
        );

        trace!(event = %event, priority, listener_id = id, "Listener attached");

        ListenerHandle {
            emitter_id: self.id,
            event,
            id,
        }
    }

    /// Removes the registration identified by `handle`.
    ///
    /// Returns `true` if a listener was removed. Detaching twice, or
    /// detaching a handle issued by another emitter, is a no-op.
    pub fn detach(&self, handle: &ListenerHandle) -> bool {
        if !self.owns(handle) {
            return false;
        }

        let mut listeners = self.listeners.write();
        let Some(registrations) = listeners.get_mut(&handle.event) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|registration| registration.id != handle.id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            listeners.remove(&handle.event);
        }

        removed
    }

    /// Returns `true` if `handle` was issued by this emitter.
    pub fn owns(&self, handle: &ListenerHandle) -> bool {
        handle.emitter_id == self.id
    }

    /// Triggers the extension point `event`.
    ///
    /// The listener list is snapshotted before the first listener runs. The
    /// first listener error is returned as-is and no further listeners run.
    pub fn trigger(
        &self,
        event: &str,
        target: &T,
        params: &mut P,
    ) -> Result<TriggerOutcome, BoxError> {
        let snapshot: Vec<Listener<T, P>> = match self.listeners.read().get(event) {
            Some(registrations) => registrations
                .iter()
                .map(|registration| Arc::clone(&registration.listener))
                .collect(),
            None => return Ok(TriggerOutcome::default()),
        };

        let mut action = ActionEvent::new(event, target, params);
        let mut outcome = TriggerOutcome::default();

        for listener in snapshot {
            outcome.invoked += 1;
            listener(&mut action)?;

            if action.propagation_is_stopped() {
                debug!(event, invoked = outcome.invoked, "Propagation stopped");
                outcome.stopped = true;
                break;
            }
        }

        Ok(outcome)
    }

    /// Number of listeners attached to `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }

    /// Returns `true` if at least one listener is attached to `event`.
    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Removes every listener attached to `event`, returning how many there were.
    pub fn clear_listeners(&self, event: &str) -> usize {
        self.listeners.write().remove(event).map_or(0, |removed| removed.len())
    }
}

impl<T: ?Sized, P> Default for ActionEventEmitter<T, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized, P> fmt::Debug for ActionEventEmitter<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(event, registrations)| (event.as_str(), registrations.len()))
            .collect();

        f.debug_struct("ActionEventEmitter")
            .field("id", &self.id)
            .field("listeners", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    type Recorder = ActionEventEmitter<(), Vec<&'static str>>;

    fn push(
        label: &'static str,
    ) -> impl Fn(&mut ActionEvent<'_, (), Vec<&'static str>>) -> ListenerResult + Send + Sync + 'static
    {
        move |event| {
            event.push(label);
            Ok(())
        }
    }

    #[test]
    fn test_priority_order() {
        let emitter = Recorder::new();
        emitter.attach("dispatch", push("low"), -10);
        emitter.attach("dispatch", push("high"), 100);
        emitter.attach("dispatch", push("zero"), 0);

        let mut seen = Vec::new();
        let outcome = emitter.trigger("dispatch", &(), &mut seen).unwrap();

        assert_eq!(seen, ["high", "zero", "low"]);
        assert_eq!(
            outcome,
            TriggerOutcome {
                stopped: false,
                invoked: 3
            }
        );
    }

    #[test]
    fn test_equal_priorities_keep_registration_order() {
        let emitter = Recorder::new();
        emitter.attach("dispatch", push("a"), 5);
        emitter.attach("dispatch", push("b"), 5);
        emitter.attach("dispatch", push("first"), 6);
        emitter.attach("dispatch", push("c"), 5);

        let mut seen = Vec::new();
        emitter.trigger("dispatch", &(), &mut seen).unwrap();

        assert_eq!(seen, ["first", "a", "b", "c"]);
    }

    #[test]
    fn test_stop_propagation() {
        let emitter = Recorder::new();
        emitter.attach("dispatch", push("before"), 10);
        emitter.attach(
            "dispatch",
            |event| {
                event.push("stopper");
                event.stop_propagation(true);
                Ok(())
            },
            5,
        );
        emitter.attach("dispatch", push("after"), 0);

        let mut seen = Vec::new();
        let outcome = emitter.trigger("dispatch", &(), &mut seen).unwrap();

        assert_eq!(seen, ["before", "stopper"]);
        assert!(outcome.stopped);
        assert_eq!(outcome.invoked, 2);
    }

    #[test]
    fn test_listener_error_aborts_trigger() {
        let emitter = Recorder::new();
        emitter.attach("dispatch", |_| Err(io::Error::other("boom").into()), 10);
        emitter.attach("dispatch", push("never"), 0);

        let mut seen = Vec::new();
        let err = emitter.trigger("dispatch", &(), &mut seen).unwrap_err();

        assert_eq!(err.to_string(), "boom");
        assert!(seen.is_empty());
    }

    #[test]
    fn test_trigger_uses_snapshot() {
        let emitter = Arc::new(Recorder::new());
        let inner = Arc::clone(&emitter);
        emitter.attach(
            "dispatch",
            move |event| {
                event.push("attacher");
                inner.attach("dispatch", push("late"), 100);
                Ok(())
            },
            0,
        );

        let mut first = Vec::new();
        emitter.trigger("dispatch", &(), &mut first).unwrap();
        assert_eq!(first, ["attacher"]);

        let mut second = Vec::new();
        emitter.trigger("dispatch", &(), &mut second).unwrap();
        assert_eq!(second, ["late", "attacher"]);
    }

    #[test]
    fn test_detach_is_idempotent() {
        let emitter = Recorder::new();
        let handle = emitter.attach("dispatch", push("gone"), 0);
        emitter.attach("dispatch", push("kept"), 0);

        assert!(emitter.detach(&handle));
        assert!(!emitter.detach(&handle));

        let mut seen = Vec::new();
        emitter.trigger("dispatch", &(), &mut seen).unwrap();
        assert_eq!(seen, ["kept"]);
    }

    #[test]
    fn test_foreign_handle_is_ignored() {
        let first = Recorder::new();
        let second = Recorder::new();
        let handle = first.attach("dispatch", push("mine"), 0);
        second.attach("dispatch", push("theirs"), 0);

        assert!(!second.owns(&handle));
        assert!(!second.detach(&handle));
        assert_eq!(second.listener_count("dispatch"), 1);
        assert_eq!(first.listener_count("dispatch"), 1);
    }

    #[test]
    fn test_trigger_without_listeners() {
        let emitter = Recorder::new();
        let mut seen = Vec::new();

        let outcome = emitter.trigger("finalize", &(), &mut seen).unwrap();

        assert_eq!(outcome, TriggerOutcome::default());
        assert!(!emitter.has_listeners("finalize"));
    }

    #[test]
    fn test_clear_listeners() {
        let emitter = Recorder::new();
        emitter.attach("dispatch", push("a"), 0);
        emitter.attach("dispatch", push("b"), 0);
        emitter.attach("finalize", push("c"), 0);

        assert_eq!(emitter.clear_listeners("dispatch"), 2);
        assert!(!emitter.has_listeners("dispatch"));
        assert!(emitter.has_listeners("finalize"));
    }

    #[test]
    fn test_target_is_visible() {
        let emitter: ActionEventEmitter<str, Option<String>> = ActionEventEmitter::new();
        emitter.attach(
            "dispatch",
            |event| {
                let target = event.target().to_owned();
                **event = Some(target);
                Ok(())
            },
            0,
        );

        let mut params = None;
        emitter.trigger("dispatch", "command-bus", &mut params).unwrap();
        assert_eq!(params.as_deref(), Some("command-bus"));
    }
}
