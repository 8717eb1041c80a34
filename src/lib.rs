#![deny(rust_2018_idioms, unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod cancel;
mod classify;
mod core;
mod cube;
mod grid;
mod util;

pub use cancel::CancelToken;
pub use cube::Cube;
pub(crate) use util::loom;

use cube::Hooks;
use std::fmt::{self, Debug, Formatter};
use thiserror::Error;

/// Creates a solved cube with the given edge length and no-op hooks.
///
/// If you want to attach hooks, see [`Builder`].
///
/// # Errors
///
/// [`CubeError::InvalidArgument`] if `size` is zero.
///
/// # Examples
///
/// ```
/// let cube = twistlock::new(3).unwrap();
/// assert_eq!(
///     cube.show().unwrap(),
///     "000000000111111111222222222333333333444444444555555555",
/// );
/// ```
pub fn new(size: usize) -> Result<Cube, CubeError> {
    Builder::new().size(size).build()
}

/// The error taxonomy of [`Cube`]'s operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum CubeError {
    /// A constructor or operation argument was out of range.
    #[error("{argument} out of range: {value}")]
    InvalidArgument {
        /// Name of the offending argument.
        argument: &'static str,
        /// The rejected value.
        value: usize,
    },

    /// The operation was cancelled through its [`CancelToken`] before its
    /// body started. The cube is unchanged by the cancelled call.
    #[error("operation cancelled before it started")]
    Cancelled,
}

/// A builder for a [`Cube`].
///
/// The four hooks run inside the operation's critical section, immediately
/// around the grid access, and outside any scheduler lock. They may block or
/// sleep; the scheduler tolerates long critical sections. Hooks observing
/// shared state therefore see it exactly as ordered by admission.
///
/// # Examples
///
/// ```
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let turns = Arc::new(AtomicUsize::new(0));
/// let counter = Arc::clone(&turns);
///
/// let cube = twistlock::Builder::new()
///     .size(2)
///     .after_rotate(move |_, _| {
///         counter.fetch_add(1, Ordering::Relaxed);
///     })
///     .build()
///     .unwrap();
///
/// cube.rotate(0, 0).unwrap();
/// cube.rotate(5, 1).unwrap();
/// assert_eq!(turns.load(Ordering::Relaxed), 2);
/// ```
///
/// Hooks must be `Send + Sync`:
///
/// ```compile_fail
/// use std::rc::Rc;
///
/// let marker = Rc::new(());
/// twistlock::Builder::new().before_show(move || {
///     let _ = &marker;
/// });
/// ```
pub struct Builder {
    size: usize,
    hooks: Hooks,
}

impl Builder {
    /// Creates a builder with edge length 3 and no-op hooks.
    pub fn new() -> Self {
        Self {
            size: 3,
            hooks: Hooks::default(),
        }
    }

    /// Sets the cube's edge length. Validated by [`build`](Builder::build).
    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    /// Invoked with `(side, layer)` right before each rotation permutes the
    /// grid.
    pub fn before_rotate(mut self, hook: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.hooks.before_rotate = Box::new(hook);
        self
    }

    /// Invoked with `(side, layer)` right after each rotation permuted the
    /// grid, while admission is still held.
    pub fn after_rotate(mut self, hook: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.hooks.after_rotate = Box::new(hook);
        self
    }

    /// Invoked right before each serialization reads the grid.
    pub fn before_show(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.before_show = Box::new(hook);
        self
    }

    /// Invoked right after each serialization read the grid, while admission
    /// is still held.
    pub fn after_show(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hooks.after_show = Box::new(hook);
        self
    }

    /// Consumes the builder and constructs the cube.
    ///
    /// # Errors
    ///
    /// [`CubeError::InvalidArgument`] if the configured size is zero.
    pub fn build(self) -> Result<Cube, CubeError> {
        if self.size == 0 {
            return Err(CubeError::InvalidArgument {
                argument: "size",
                value: 0,
            });
        }

        Ok(Cube::with_hooks(self.size, self.hooks))
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Builder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder").field("size", &self.size).finish()
    }
}

#[cfg(all(test, not(loom)))]
mod tests {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn send_types() {
        assert_send::<Cube>();
        assert_send::<CancelToken>();
        assert_send::<CubeError>();
    }

    #[test]
    fn sync_types() {
        assert_sync::<Cube>();
        assert_sync::<CancelToken>();
    }

    #[test]
    fn builder_defaults() {
        let cube = Builder::new().build().unwrap();
        assert_eq!(cube.size(), 3);
        assert_eq!(cube.num_sides(), 6);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert_eq!(
            new(0).unwrap_err(),
            CubeError::InvalidArgument {
                argument: "size",
                value: 0,
            }
        );
    }

    #[test]
    fn error_display() {
        let error = CubeError::InvalidArgument {
            argument: "layer",
            value: 9,
        };
        assert_eq!(error.to_string(), "layer out of range: 9");
        assert_eq!(
            CubeError::Cancelled.to_string(),
            "operation cancelled before it started"
        );
    }
}
