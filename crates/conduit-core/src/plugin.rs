//! Reversible bundles of listener registrations.
//!
//! A [`Plugin`] performs its own [`ActionEventEmitter::attach`] calls when it
//! is attached and keeps the returned handles in a [`ListenerHandles`], so a
//! later `detach_from` removes exactly the listeners that plugin added.
//!
//! ```rust,ignore
//! use conduit_core::{ActionEventEmitter, ListenerHandles, Plugin};
//!
//! #[derive(Default)]
//! struct AuditPlugin {
//!     handles: ListenerHandles,
//! }
//!
//! impl Plugin<CommandBus, CommandParams> for AuditPlugin {
//!     fn attach_to(&self, emitter: &ActionEventEmitter<CommandBus, CommandParams>) {
//!         self.handles.track(emitter.attach("finalize", |event| {
//!             tracing::info!(handled = event.is_handled(), "audit");
//!             Ok(())
//!         }, 0));
//!     }
//!
//!     fn detach_from(&self, emitter: &ActionEventEmitter<CommandBus, CommandParams>) {
//!         self.handles.detach_all(emitter);
//!     }
//! }
//! ```

use std::any::type_name;

use parking_lot::Mutex;

use crate::emitter::{ActionEventEmitter, ListenerHandle};

/// A bundle of listeners attached to and detached from an emitter as a unit.
pub trait Plugin<T: ?Sized, P>: Send + Sync {
    /// Human-readable plugin name, used in logs.
    fn name(&self) -> &str {
        type_name::<Self>()
    }

    /// Attaches the plugin's listeners, retaining their handles.
    fn attach_to(&self, emitter: &ActionEventEmitter<T, P>);

    /// Detaches every listener this plugin attached to `emitter`.
    ///
    /// Must be idempotent.
    fn detach_from(&self, emitter: &ActionEventEmitter<T, P>);
}

/// Handle storage for plugin implementations.
#[derive(Debug, Default)]
pub struct ListenerHandles {
    handles: Mutex<Vec<ListenerHandle>>,
}

impl ListenerHandles {
    /// Creates an empty handle set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers a handle for a later [`detach_all`](Self::detach_all).
    pub fn track(&self, handle: ListenerHandle) {
        self.handles.lock().push(handle);
    }

    /// Detaches every tracked handle issued by `emitter` and forgets it.
    ///
    /// Handles belonging to other emitters are kept. Returns the number of
    /// listeners actually removed.
    pub fn detach_all<T: ?Sized, P>(&self, emitter: &ActionEventEmitter<T, P>) -> usize {
        let owned: Vec<ListenerHandle> = {
            let mut handles = self.handles.lock();
            let (owned, others): (Vec<_>, Vec<_>) =
                handles.drain(..).partition(|handle| emitter.owns(handle));
            *handles = others;
            owned
        };

        owned.iter().filter(|handle| emitter.detach(handle)).count()
    }

    /// Number of tracked handles.
    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    /// Returns `true` if no handle is tracked.
    pub fn is_empty(&self) -> bool {
        self.handles.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Emitter = ActionEventEmitter<(), Vec<&'static str>>;

    #[derive(Default)]
    struct Tagger {
        handles: ListenerHandles,
    }

    impl Plugin<(), Vec<&'static str>> for Tagger {
        fn attach_to(&self, emitter: &Emitter) {
            self.handles.track(emitter.attach(
                "dispatch",
                |event| {
                    event.push("tagger");
                    Ok(())
                },
                10,
            ));
            self.handles.track(emitter.attach(
                "finalize",
                |event| {
                    event.push("tagger-finalize");
                    Ok(())
                },
                10,
            ));
        }

        fn detach_from(&self, emitter: &Emitter) {
            self.handles.detach_all(emitter);
        }
    }

    #[test]
    fn test_detach_removes_only_own_listeners() {
        let emitter = Emitter::new();
        emitter.attach(
            "dispatch",
            |event| {
                event.push("default");
                Ok(())
            },
            0,
        );

        let plugin = Tagger::default();
        plugin.attach_to(&emitter);
        assert_eq!(emitter.listener_count("dispatch"), 2);
        assert_eq!(plugin.handles.len(), 2);

        plugin.detach_from(&emitter);
        plugin.detach_from(&emitter);

        let mut seen = Vec::new();
        emitter.trigger("dispatch", &(), &mut seen).unwrap();
        assert_eq!(seen, ["default"]);
        assert!(!emitter.has_listeners("finalize"));
        assert!(plugin.handles.is_empty());
    }

    #[test]
    fn test_detach_all_keeps_foreign_handles() {
        let first = Emitter::new();
        let second = Emitter::new();
        let plugin = Tagger::default();

        plugin.attach_to(&first);
        plugin.attach_to(&second);
        assert_eq!(plugin.handles.detach_all(&first), 2);

        assert_eq!(plugin.handles.len(), 2);
        assert!(second.has_listeners("dispatch"));
        assert!(!first.has_listeners("dispatch"));
    }

    #[test]
    fn test_default_name() {
        let plugin = Tagger::default();
        assert!(Plugin::<(), Vec<&'static str>>::name(&plugin).ends_with("Tagger"));
    }
}
