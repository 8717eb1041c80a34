//! The public cube facade: argument validation, the user hooks, and the
//! composition of classifier, scheduler and grid.

use crate::cancel::CancelToken;
use crate::classify::{self, NUM_SIDES};
use crate::core::{Cancelled, Scheduler};
use crate::grid::Grid;
use crate::CubeError;
use std::fmt::{self, Debug, Formatter};

pub(crate) type RotateHook = Box<dyn Fn(usize, usize) + Send + Sync>;
pub(crate) type ShowHook = Box<dyn Fn() + Send + Sync>;

pub(crate) struct Hooks {
    pub before_rotate: RotateHook,
    pub after_rotate: RotateHook,
    pub before_show: ShowHook,
    pub after_show: ShowHook,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            before_rotate: Box::new(|_, _| {}),
            after_rotate: Box::new(|_, _| {}),
            before_show: Box::new(|| {}),
            after_show: Box::new(|| {}),
        }
    }
}

/// A shared, mutable N×N×N twisty cube.
///
/// All methods take `&self`; the cube is meant to be placed in an
/// [`Arc`](std::sync::Arc) and hammered from many threads. Rotations of the
/// same axis at distinct depths run concurrently; everything else is
/// serialized by the admission scheduler, which is fair in both directions.
///
/// Constructed through [`crate::new`] or [`Builder`](crate::Builder).
pub struct Cube {
    grid: Grid,
    scheduler: Scheduler,
    hooks: Hooks,
    size: usize,
}

// SAFETY: the grid's cells are only touched under scheduler admission:
// `show` holds a read permit (no writer active), `rotate` holds a write
// permit for the plane it permutes (no reader active, no other writer on an
// overlapping plane). The hooks are required to be Send + Sync.
unsafe impl Send for Cube {}
unsafe impl Sync for Cube {}

impl Cube {
    pub(crate) fn with_hooks(size: usize, hooks: Hooks) -> Self {
        debug_assert!(size >= 1);
        Self {
            grid: Grid::new(size),
            scheduler: Scheduler::new(size),
            hooks,
            size,
        }
    }

    /// The edge length this cube was built with.
    ///
    /// # Examples
    ///
    /// ```
    /// let cube = twistlock::new(4).unwrap();
    /// assert_eq!(cube.size(), 4);
    /// ```
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// The number of sides of a cube. Always 6.
    #[inline]
    pub const fn num_sides(&self) -> usize {
        NUM_SIDES
    }

    /// Rotates the `layer`-th slice behind `side`, clockwise as seen from
    /// outside `side`. Blocks until the rotation's plane is admitted.
    ///
    /// `rotate(side, 0)` also turns face `side` itself; `rotate(side, n-1)`
    /// is the opposite face turned counter-clockwise.
    ///
    /// # Errors
    ///
    /// [`CubeError::InvalidArgument`] if `side > 5` or `layer >= size`.
    ///
    /// # Examples
    ///
    /// ```
    /// let cube = twistlock::new(3).unwrap();
    /// cube.rotate(3, 0).unwrap();
    /// assert!(cube.show().unwrap().starts_with("002002002"));
    /// ```
    pub fn rotate(&self, side: usize, layer: usize) -> Result<(), CubeError> {
        self.rotate_inner(side, layer, None)
    }

    /// Like [`rotate`](Cube::rotate), but abandons the attempt with
    /// [`CubeError::Cancelled`] if `token` is cancelled before the rotation
    /// body starts. A cancellation delivered after that is ignored here and
    /// left observable on the token; the rotation completes.
    pub fn rotate_cancellable(
        &self,
        side: usize,
        layer: usize,
        token: &CancelToken,
    ) -> Result<(), CubeError> {
        self.rotate_inner(side, layer, Some(token))
    }

    /// Serializes the whole cube: faces 0..6, row-major, one color digit
    /// per cell, `6 * size * size` characters in total. Blocks until no
    /// rotation is active or waiting.
    ///
    /// The returned string reflects every rotation that completed before
    /// this call was admitted and none admitted after it.
    ///
    /// # Examples
    ///
    /// ```
    /// let cube = twistlock::new(2).unwrap();
    /// assert_eq!(cube.show().unwrap(), "000011112222333344445555");
    /// ```
    pub fn show(&self) -> Result<String, CubeError> {
        self.show_inner(None)
    }

    /// Like [`show`](Cube::show), but abandons the attempt with
    /// [`CubeError::Cancelled`] if `token` is cancelled before the
    /// serialization starts.
    pub fn show_cancellable(&self, token: &CancelToken) -> Result<String, CubeError> {
        self.show_inner(Some(token))
    }

    fn rotate_inner(
        &self,
        side: usize,
        layer: usize,
        cancel: Option<&CancelToken>,
    ) -> Result<(), CubeError> {
        if side >= NUM_SIDES {
            return Err(CubeError::InvalidArgument {
                argument: "side",
                value: side,
            });
        }
        if layer >= self.size {
            return Err(CubeError::InvalidArgument {
                argument: "layer",
                value: layer,
            });
        }

        let plane = classify::classify(side, layer, self.size);
        let _permit = self
            .scheduler
            .write(plane, cancel)
            .map_err(|_: Cancelled| CubeError::Cancelled)?;

        (self.hooks.before_rotate)(side, layer);
        // SAFETY: the write permit grants exclusive access to every cell of
        // `plane`'s slab, which is exactly the set `apply_rotation` touches;
        // arguments were range-checked above.
        unsafe { self.grid.apply_rotation(side, layer) };
        (self.hooks.after_rotate)(side, layer);

        Ok(())
    }

    fn show_inner(&self, cancel: Option<&CancelToken>) -> Result<String, CubeError> {
        let _permit = self
            .scheduler
            .read(cancel)
            .map_err(|_: Cancelled| CubeError::Cancelled)?;

        (self.hooks.before_show)();
        // SAFETY: the read permit excludes all writers.
        let state = unsafe { self.grid.serialize_state() };
        (self.hooks.after_show)();

        Ok(state)
    }
}

impl Debug for Cube {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cube").field("size", &self.size).finish()
    }
}
