//! The color grid and its rotation primitive.
//!
//! The grid is not thread-safe on its own: both primitives are `unsafe fn`s
//! whose contracts require the caller to hold admission from the scheduler.
//! Cells are individual [`UnsafeCell`]s so that two writers permuting
//! disjoint planes never materialize overlapping `&mut` borrows, and so loom
//! can track every access when the scheduler is model-checked.
//!
//! Rather than encoding one ring table per side, rotations are derived
//! mechanically: each face has a basis mapping `(row, col)` to a point in
//! the cube, a rotation is a 90 degree turn of positions and face normals
//! about the turned side's axis, and the target sticker is recovered by
//! inverting the basis of the face the normal lands on.

use crate::classify::NUM_SIDES;
use crate::loom::cell::UnsafeCell;

type Vec3 = [i32; 3];

/// Outward normals, indexed by side. The world frame is `x` left to right,
/// `y` bottom to top, `z` back to front.
const NORMALS: [Vec3; NUM_SIDES] = [
    [0, 1, 0],
    [-1, 0, 0],
    [0, 0, 1],
    [1, 0, 0],
    [0, 0, -1],
    [0, -1, 0],
];

/// Face bases: up is viewed from above with the back side at the top of the
/// view, down from below with the front side at the top, and the four side
/// faces head-on with up at the top (back viewed from behind the cube).
fn sticker_position(side: usize, r: i32, c: i32, m: i32) -> Vec3 {
    match side {
        0 => [c, m, r],
        1 => [0, m - r, c],
        2 => [c, m - r, m],
        3 => [m, m - r, m - c],
        4 => [m - c, m - r, 0],
        5 => [c, 0, m - r],
        _ => unreachable!("side out of range: {side}"),
    }
}

fn sticker_index(side: usize, pos: Vec3, m: i32) -> (i32, i32) {
    let [x, y, z] = pos;
    match side {
        0 => (z, x),
        1 => (m - y, z),
        2 => (m - y, x),
        3 => (m - y, m - z),
        4 => (m - y, m - x),
        5 => (m - z, x),
        _ => unreachable!("side out of range: {side}"),
    }
}

fn side_from_normal(normal: Vec3) -> usize {
    match normal {
        [0, 1, 0] => 0,
        [-1, 0, 0] => 1,
        [0, 0, 1] => 2,
        [1, 0, 0] => 3,
        [0, 0, -1] => 4,
        [0, -1, 0] => 5,
        _ => unreachable!("not a face normal: {normal:?}"),
    }
}

/// Rotates a point 90 degrees about `side`'s axis, clockwise as seen from
/// outside `side`. Passing `m = 0` yields the linear part, which is how
/// normals are turned.
fn rotate(side: usize, v: Vec3, m: i32) -> Vec3 {
    let [x, y, z] = v;
    match side {
        0 => [m - z, y, x],
        5 => [z, y, m - x],
        3 => [x, z, m - y],
        1 => [x, m - z, y],
        2 => [y, m - x, z],
        4 => [m - y, x, z],
        _ => unreachable!("side out of range: {side}"),
    }
}

/// The world axis a side's layers stack along, and the fixed coordinate of
/// the layer's slab on that axis.
fn slab_coordinate(side: usize, layer: i32, m: i32) -> (usize, i32) {
    match side {
        0 => (1, m - layer),
        5 => (1, layer),
        1 => (0, layer),
        3 => (0, m - layer),
        2 => (2, m - layer),
        4 => (2, layer),
        _ => unreachable!("side out of range: {side}"),
    }
}

pub(crate) struct Grid {
    size: usize,
    faces: Box<[Box<[UnsafeCell<u8>]>]>,
}

impl Grid {
    /// Creates a solved grid: every cell of face `i` holds color `i`.
    pub fn new(size: usize) -> Self {
        debug_assert!(size >= 1);

        let faces = (0..NUM_SIDES)
            .map(|side| {
                (0..size * size)
                    .map(|_| UnsafeCell::new(side as u8))
                    .collect::<Vec<_>>()
                    .into_boxed_slice()
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self { size, faces }
    }

    /// Permutes the cells of the layer slab named by `(side, layer)`.
    ///
    /// # Safety
    ///
    /// `side` and `layer` must be in range, and the caller must have
    /// exclusive access to every cell of the slab for the duration of the
    /// call, i.e. hold write admission for the corresponding plane.
    pub unsafe fn apply_rotation(&self, side: usize, layer: usize) {
        debug_assert!(side < NUM_SIDES && layer < self.size);

        let m = self.size as i32 - 1;
        let (axis, plane) = slab_coordinate(side, layer as i32, m);

        let mut sources = Vec::new();
        let mut targets = Vec::new();

        for face in 0..NUM_SIDES {
            for r in 0..=m {
                for c in 0..=m {
                    let pos = sticker_position(face, r, c, m);
                    if pos[axis] != plane {
                        continue;
                    }

                    let new_pos = rotate(side, pos, m);
                    let new_face = side_from_normal(rotate(side, NORMALS[face], 0));
                    let (nr, nc) = sticker_index(new_face, new_pos, m);

                    sources.push((face, r, c));
                    targets.push((new_face, nr, nc));
                }
            }
        }

        // Every source is read before any target is written; the permutation
        // cycles through overlapping cells.
        let colors: Vec<u8> = sources
            .iter()
            .map(|&(face, r, c)| {
                // SAFETY: slab cells are exclusively ours per the contract.
                unsafe { self.read_cell(face, r, c) }
            })
            .collect();

        for (&(face, r, c), color) in targets.iter().zip(colors) {
            // SAFETY: as above; the rotation maps the slab onto itself.
            unsafe { self.write_cell(face, r, c, color) };
        }
    }

    /// Serializes the whole grid: faces `0..6`, row-major, one digit per
    /// cell.
    ///
    /// # Safety
    ///
    /// The caller must guarantee no cell is concurrently written, i.e. hold
    /// read admission.
    pub unsafe fn serialize_state(&self) -> String {
        let mut out = String::with_capacity(NUM_SIDES * self.size * self.size);

        for face in self.faces.iter() {
            for cell in face.iter() {
                // SAFETY: no concurrent writers per the contract.
                let color = cell.with(|ptr| unsafe { *ptr });
                out.push((b'0' + color) as char);
            }
        }

        out
    }

    unsafe fn read_cell(&self, face: usize, r: i32, c: i32) -> u8 {
        let cell = &self.faces[face][r as usize * self.size + c as usize];
        // SAFETY: forwarded to the caller.
        cell.with(|ptr| unsafe { *ptr })
    }

    unsafe fn write_cell(&self, face: usize, r: i32, c: i32, color: u8) {
        let cell = &self.faces[face][r as usize * self.size + c as usize];
        // SAFETY: forwarded to the caller.
        cell.with_mut(|ptr| unsafe { *ptr = color });
    }
}
