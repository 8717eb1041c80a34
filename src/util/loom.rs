//! `cfg(loom)`-switched aliases for the primitives the scheduler is built on.
//!
//! The real build runs on `parking_lot`, whose mutex is eventually fair and
//! whose condvars have no spurious wakeups. Loom models the poisoning std
//! API instead, so both are wrapped behind the same thin surface: `lock`
//! never returns a poison error and `Condvar::wait` takes and returns the
//! guard by value.

#[cfg(not(loom))]
pub mod sync {
    pub use parking_lot::MutexGuard;
    pub use std::sync::Arc;

    pub mod atomic {
        pub use std::sync::atomic::*;
    }

    pub struct Mutex<T>(parking_lot::Mutex<T>);

    impl<T> Mutex<T> {
        #[inline]
        pub fn new(value: T) -> Self {
            Self(parking_lot::Mutex::new(value))
        }

        #[inline]
        pub fn lock(&self) -> MutexGuard<'_, T> {
            self.0.lock()
        }
    }

    pub struct Condvar(parking_lot::Condvar);

    impl Condvar {
        #[inline]
        pub fn new() -> Self {
            Self(parking_lot::Condvar::new())
        }

        #[inline]
        pub fn wait<'a, T>(&self, mut guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
            self.0.wait(&mut guard);
            guard
        }

        #[inline]
        pub fn notify_one(&self) {
            self.0.notify_one();
        }

        #[inline]
        pub fn notify_all(&self) {
            self.0.notify_all();
        }
    }
}

#[cfg(loom)]
pub mod sync {
    pub use loom::sync::{Arc, MutexGuard};
    use std::sync::PoisonError;

    pub mod atomic {
        pub use loom::sync::atomic::*;
    }

    pub struct Mutex<T>(loom::sync::Mutex<T>);

    impl<T> Mutex<T> {
        pub fn new(value: T) -> Self {
            Self(loom::sync::Mutex::new(value))
        }

        pub fn lock(&self) -> MutexGuard<'_, T> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    pub struct Condvar(loom::sync::Condvar);

    impl Condvar {
        pub fn new() -> Self {
            Self(loom::sync::Condvar::new())
        }

        pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
            self.0.wait(guard).unwrap_or_else(PoisonError::into_inner)
        }

        pub fn notify_one(&self) {
            self.0.notify_one();
        }

        pub fn notify_all(&self) {
            self.0.notify_all();
        }
    }
}

#[cfg(loom)]
pub mod cell {
    pub use loom::cell::UnsafeCell;
}

#[cfg(not(loom))]
pub mod cell {
    use std::cell::UnsafeCell as StdUnsafeCell;

    #[repr(transparent)]
    pub struct UnsafeCell<T: ?Sized> {
        inner: StdUnsafeCell<T>,
    }

    impl<T> UnsafeCell<T> {
        #[inline(always)]
        pub fn new(value: T) -> Self {
            Self {
                inner: StdUnsafeCell::new(value),
            }
        }
    }

    impl<T: ?Sized> UnsafeCell<T> {
        #[inline(always)]
        pub fn with<F, R>(&self, f: F) -> R
        where
            F: FnOnce(*const T) -> R,
        {
            f(self.inner.get())
        }

        #[inline(always)]
        pub fn with_mut<F, R>(&self, f: F) -> R
        where
            F: FnOnce(*mut T) -> R,
        {
            f(self.inner.get())
        }
    }
}
