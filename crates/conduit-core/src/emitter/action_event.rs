//! The execution context handed to every listener of one trigger.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// The mutable record shared by all listeners invoked during one trigger.
///
/// An `ActionEvent` is built by [`ActionEventEmitter::trigger`] and lives
/// exactly as long as that trigger. It carries:
///
/// - the name of the extension point being triggered,
/// - the **target** (usually the bus that triggered it),
/// - a mutable borrow of the typed parameter record `P`,
/// - the propagation flag.
///
/// Because the parameters are borrowed rather than owned, a caller can
/// trigger several extension points with the *same* parameter record; this
/// is how the bus pipeline keeps `exception` and `message-handled` visible
/// from the `dispatch` trigger through to `finalize`.
///
/// `ActionEvent` dereferences to `P`, so listeners can call parameter
/// accessors directly:
///
/// ```rust,ignore
/// emitter.attach("dispatch", |event| {
///     if event.message_name() == Some("fetch-something") {
///         event.set_handler(handler.clone());
///     }
///     Ok(())
/// }, PRIORITY_ROUTE);
/// ```
///
/// [`ActionEventEmitter::trigger`]: super::ActionEventEmitter::trigger
pub struct ActionEvent<'a, T: ?Sized, P> {
    name: &'a str,
    target: &'a T,
    params: &'a mut P,
    stopped: bool,
}

impl<'a, T: ?Sized, P> ActionEvent<'a, T, P> {
    /// Creates a new action event with propagation enabled.
    pub fn new(name: &'a str, target: &'a T, params: &'a mut P) -> Self {
        Self {
            name,
            target,
            params,
            stopped: false,
        }
    }

    /// Name of the extension point currently being triggered.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The object that triggered the extension point.
    pub fn target(&self) -> &'a T {
        self.target
    }

    /// The parameter record.
    pub fn params(&self) -> &P {
        &*self.params
    }

    /// Mutable access to the parameter record.
    pub fn params_mut(&mut self) -> &mut P {
        &mut *self.params
    }

    /// Sets or clears the stop flag.
    ///
    /// Once set, the emitter invokes no further listeners for this trigger.
    pub fn stop_propagation(&mut self, flag: bool) {
        self.stopped = flag;
    }

    /// Returns `true` if a listener asked to stop propagation.
    pub fn propagation_is_stopped(&self) -> bool {
        self.stopped
    }
}

impl<T: ?Sized, P> Deref for ActionEvent<'_, T, P> {
    type Target = P;

    fn deref(&self) -> &Self::Target {
        &*self.params
    }
}

impl<T: ?Sized, P> DerefMut for ActionEvent<'_, T, P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.params
    }
}

impl<T: ?Sized, P: fmt::Debug> fmt::Debug for ActionEvent<'_, T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionEvent")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_are_written_through() {
        let target = "bus";
        let mut params = vec![1];

        {
            let mut event = ActionEvent::new("dispatch", &target, &mut params);
            event.push(2);
            event.params_mut().push(3);
            assert_eq!(event.name(), "dispatch");
            assert_eq!(*event.target(), "bus");
        }

        assert_eq!(params, vec![1, 2, 3]);
    }

    #[test]
    fn test_stop_propagation_toggles() {
        let mut params = ();
        let mut event = ActionEvent::new("finalize", &(), &mut params);

        assert!(!event.propagation_is_stopped());
        event.stop_propagation(true);
        assert!(event.propagation_is_stopped());
        event.stop_propagation(false);
        assert!(!event.propagation_is_stopped());
    }
}
