//! Single-assignment results.
//!
//! A [`Deferred`] is the producer half, a [`Promise`] the observer half of
//! one result slot. Exactly one of [`Deferred::resolve`] and
//! [`Deferred::reject`] takes effect; every later attempt is ignored.
//!
//! The pair is independent of any async runtime:
//!
//! - observers registered with [`Promise::on_settled`] (or [`then`] /
//!   [`otherwise`]) run inline on the settling thread, or immediately if
//!   the promise has already settled;
//! - `Promise` also implements [`Future`], so it can be awaited on any
//!   executor when `T` and `E` are `Clone`.
//!
//! ```rust,ignore
//! let deferred: Deferred<u32, SharedError> = Deferred::new();
//! let promise = deferred.promise();
//!
//! std::thread::spawn(move || {
//!     deferred.resolve(42);
//! });
//!
//! assert_eq!(promise.await?, 42);
//! ```
//!
//! [`then`]: Promise::then
//! [`otherwise`]: Promise::otherwise

use std::fmt;
use std::future::Future;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

type Observer<T, E> = Box<dyn FnOnce(&Result<T, E>) + Send>;

enum State<T, E> {
    Pending {
        observers: Vec<Observer<T, E>>,
        wakers: Vec<Waker>,
    },
    Settled(Arc<Result<T, E>>),
}

struct Shared<T, E> {
    state: Mutex<State<T, E>>,
}

impl<T, E> Shared<T, E> {
    fn describe(&self) -> &'static str {
        match &*self.state.lock() {
            State::Pending { .. } => "pending",
            State::Settled(result) if result.is_ok() => "fulfilled",
            State::Settled(_) => "rejected",
        }
    }
}

// =============================================================================
// Deferred
// =============================================================================

/// The settling half of a single-assignment result.
///
/// Cloning a `Deferred` yields another handle to the same slot; a handler
/// may keep one and settle it later from another thread.
pub struct Deferred<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Deferred<T, E> {
    /// Creates an unsettled result slot.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::Pending {
                    observers: Vec::new(),
                    wakers: Vec::new(),
                }),
            }),
        }
    }

    /// Returns an observer handle for this slot.
    pub fn promise(&self) -> Promise<T, E> {
        Promise {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Fulfills the slot. Returns `false` if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Rejects the slot. Returns `false` if it was already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Returns `true` once the slot has been resolved or rejected.
    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Settled(_))
    }

    fn settle(&self, result: Result<T, E>) -> bool {
        let result = Arc::new(result);
        let previous = {
            let mut state = self.shared.state.lock();
            if matches!(*state, State::Settled(_)) {
                return false;
            }
            mem::replace(&mut *state, State::Settled(Arc::clone(&result)))
        };

        // Observers run outside the lock so they may inspect the promise.
        if let State::Pending { observers, wakers } = previous {
            for observer in observers {
                observer(&result);
            }
            for waker in wakers {
                waker.wake();
            }
        }

        true
    }
}

impl<T, E> Default for Deferred<T, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> Clone for Deferred<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Deferred<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("state", &self.shared.describe())
            .finish()
    }
}

// =============================================================================
// Promise
// =============================================================================

/// The observing half of a single-assignment result.
pub struct Promise<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Promise<T, E> {
    /// Returns `true` once the result is available.
    pub fn is_settled(&self) -> bool {
        matches!(*self.shared.state.lock(), State::Settled(_))
    }

    /// Returns a copy of the result, or `None` while pending.
    pub fn result(&self) -> Option<Result<T, E>>
    where
        T: Clone,
        E: Clone,
    {
        match &*self.shared.state.lock() {
            State::Settled(result) => Some(Result::clone(result)),
            State::Pending { .. } => None,
        }
    }

    /// Registers an observer for the result.
    ///
    /// Runs immediately if the result is already available, otherwise on the
    /// thread that settles the slot.
    pub fn on_settled<F>(&self, observer: F) -> &Self
    where
        F: FnOnce(&Result<T, E>) + Send + 'static,
    {
        let settled = {
            let mut state = self.shared.state.lock();
            match &mut *state {
                State::Settled(result) => Arc::clone(result),
                State::Pending { observers, .. } => {
                    observers.push(Box::new(observer));
                    return self;
                }
            }
        };

        observer(&settled);
        self
    }

    /// Registers an observer for the fulfilled value only.
    pub fn then<F>(&self, on_fulfilled: F) -> &Self
    where
        F: FnOnce(&T) + Send + 'static,
    {
        self.on_settled(move |result| {
            if let Ok(value) = result {
                on_fulfilled(value);
            }
        })
    }

    /// Registers an observer for the rejection error only.
    pub fn otherwise<F>(&self, on_rejected: F) -> &Self
    where
        F: FnOnce(&E) + Send + 'static,
    {
        self.on_settled(move |result| {
            if let Err(error) = result {
                on_rejected(error);
            }
        })
    }
}

impl<T, E> Clone for Promise<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> fmt::Debug for Promise<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.shared.describe())
            .finish()
    }
}

impl<T: Clone, E: Clone> Future for Promise<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut state = self.shared.state.lock();
        match &mut *state {
            State::Settled(result) => Poll::Ready(Result::clone(result)),
            State::Pending { wakers, .. } => {
                if !wakers.iter().any(|waker| waker.will_wake(cx.waker())) {
                    wakers.push(cx.waker().clone());
                }
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    type Slot = Deferred<u32, String>;

    #[test]
    fn test_first_settlement_wins() {
        let deferred = Slot::new();
        let promise = deferred.promise();

        assert!(deferred.resolve(1));
        assert!(!deferred.resolve(2));
        assert!(!deferred.reject("late".into()));

        assert_eq!(promise.result(), Some(Ok(1)));
    }

    #[test]
    fn test_observers_run_once_before_and_after_settlement() {
        let deferred = Slot::new();
        let promise = deferred.promise();
        let calls = Arc::new(AtomicUsize::new(0));

        let early = Arc::clone(&calls);
        promise.on_settled(move |result| {
            assert_eq!(result, &Err("nope".to_owned()));
            early.fetch_add(1, Ordering::SeqCst);
        });

        deferred.reject("nope".into());
        deferred.reject("again".into());

        let late = Arc::clone(&calls);
        promise.otherwise(move |error| {
            assert_eq!(error, "nope");
            late.fetch_add(1, Ordering::SeqCst);
        });
        Promise::then(&promise, |_| panic!("rejected promise must not fulfill"));

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pending_promise() {
        let deferred = Slot::new();
        let promise = deferred.promise();

        assert!(!promise.is_settled());
        assert_eq!(promise.result(), None);
        assert!(promise.clone().now_or_never().is_none());
        assert_eq!(format!("{promise:?}"), "Promise { state: \"pending\" }");

        deferred.resolve(7);
        assert!(deferred.is_settled());
        assert_eq!(promise.now_or_never(), Some(Ok(7)));
    }

    #[test]
    fn test_block_on_settled() {
        let deferred = Slot::new();
        deferred.resolve(3);

        assert_eq!(tokio_test::block_on(deferred.promise()), Ok(3));
    }

    #[tokio::test]
    async fn test_settled_from_another_thread() {
        let deferred = Slot::new();
        let promise = deferred.promise();

        let settler = deferred.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            settler.resolve(42);
        });

        assert_eq!(promise.await, Ok(42));
    }
}
