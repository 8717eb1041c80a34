//! Classification of rotations into conflict planes.
//!
//! Opposite sides turn the same stack of layers, just counted from the other
//! end, so a rotation is identified by the plane it permutes rather than by
//! the `(side, layer)` pair the caller names. Two rotations commute exactly
//! when their planes differ; the scheduler only ever sees planes.

pub(crate) const NUM_SIDES: usize = 6;
pub(crate) const NUM_AXES: usize = 3;

/// The three families of parallel rotation planes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) enum Axis {
    /// Planes orthogonal to the up/down sides.
    Ud = 0,
    /// Planes orthogonal to the left/right sides.
    Lr = 1,
    /// Planes orthogonal to the front/back sides.
    Fb = 2,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Axis::Ud,
            1 => Axis::Lr,
            2 => Axis::Fb,
            _ => unreachable!("axis index out of range: {index}"),
        }
    }
}

/// A single rotation plane: an axis and a depth along it.
///
/// Depth is measured from the primary side of the axis (up, left, front), so
/// `classify(0, l, n)` and `classify(5, n - 1 - l, n)` name the same plane.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub(crate) struct Plane {
    pub axis: Axis,
    pub depth: usize,
}

/// Maps a validated `(side, layer)` pair to the plane it permutes.
#[inline]
pub(crate) fn classify(side: usize, layer: usize, size: usize) -> Plane {
    debug_assert!(side < NUM_SIDES && layer < size);

    let (axis, depth) = match side {
        0 => (Axis::Ud, layer),
        5 => (Axis::Ud, size - 1 - layer),
        1 => (Axis::Lr, layer),
        3 => (Axis::Lr, size - 1 - layer),
        2 => (Axis::Fb, layer),
        4 => (Axis::Fb, size - 1 - layer),
        _ => unreachable!("side out of range: {side}"),
    };

    Plane { axis, depth }
}

/// The side facing away from `side`.
#[inline]
pub(crate) fn opposite(side: usize) -> usize {
    debug_assert!(side < NUM_SIDES);

    match side {
        0 => 5,
        5 => 0,
        1 => 3,
        3 => 1,
        2 => 4,
        4 => 2,
        _ => unreachable!("side out of range: {side}"),
    }
}
