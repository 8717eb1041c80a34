//! Cooperative cancellation of pending operations.

use crate::loom::sync::atomic::{AtomicBool, Ordering};
use crate::loom::sync::{Arc, Mutex};
use slab::Slab;
use std::fmt::{self, Debug, Formatter};

/// Wakes one parked operation so it can observe the cancelled flag. The
/// closure acquires the scheduler mutex of the operation it belongs to
/// before signalling; without that, a cancellation racing the park could be
/// notified into the void and the waiter would sleep forever.
pub(crate) type Waker = Arc<dyn Fn() + Send + Sync>;

/// A cloneable handle for abandoning operations that have not started yet.
///
/// A token is passed to [`Cube::rotate_cancellable`](crate::Cube::rotate_cancellable)
/// or [`Cube::show_cancellable`](crate::Cube::show_cancellable). Calling
/// [`cancel`](CancelToken::cancel) from any thread makes those operations
/// fail with [`CubeError::Cancelled`](crate::CubeError::Cancelled) if they
/// are still pending or parked waiting for admission. An operation whose
/// body has begun is not interrupted: it completes normally and the
/// cancellation remains observable only on the token.
///
/// Cancellation is permanent; a cancelled token never resets.
///
/// # Examples
///
/// ```
/// use twistlock::{CancelToken, CubeError};
///
/// let cube = twistlock::new(3).unwrap();
/// let token = CancelToken::new();
/// token.cancel();
///
/// assert_eq!(cube.rotate_cancellable(0, 0, &token), Err(CubeError::Cancelled));
/// assert_eq!(cube.show().unwrap(), twistlock::new(3).unwrap().show().unwrap());
/// ```
pub struct CancelToken {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    /// One waker per operation currently parked with this token.
    waiters: Mutex<Slab<Waker>>,
}

impl CancelToken {
    /// Creates a token in the non-cancelled state.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                waiters: Mutex::new(Slab::new()),
            }),
        }
    }

    /// Cancels every pending or waiting operation holding this token, and
    /// all future ones.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);

        // Snapshot, then call with the registry unlocked: the wakers take
        // their scheduler mutex, which waiters hold while registering.
        let wakers: Vec<Waker> = {
            let waiters = self.inner.waiters.lock();
            waiters.iter().map(|(_, waker)| Arc::clone(waker)).collect()
        };

        for waker in wakers {
            waker();
        }
    }

    /// Whether [`cancel`](CancelToken::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Records a parked operation's waker so a concurrent `cancel` knows
    /// whom to wake. Dropping the returned registration unregisters it.
    pub(crate) fn register(&self, waker: Waker) -> Registration<'_> {
        let key = self.inner.waiters.lock().insert(waker);
        Registration { token: self, key }
    }
}

impl Clone for CancelToken {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for CancelToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

pub(crate) struct Registration<'token> {
    token: &'token CancelToken,
    key: usize,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token.inner.waiters.lock().remove(self.key);
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn cancel_is_sticky() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());

        let observer = token.clone();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(observer.is_cancelled());
    }

    #[test]
    fn cancel_runs_every_registered_waker() {
        let token = CancelToken::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let registrations: Vec<_> = (0..3)
            .map(|_| {
                let calls = Arc::clone(&calls);
                token.register(Arc::new(move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                }))
            })
            .collect();

        token.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        drop(registrations);
        token.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn registration_is_dropped() {
        let token = CancelToken::new();

        let registration = token.register(Arc::new(|| {}));
        assert_eq!(token.inner.waiters.lock().len(), 1);
        drop(registration);
        assert_eq!(token.inner.waiters.lock().len(), 0);
    }
}
