//! Pure bookkeeping for the admission scheduler.
//!
//! Everything here lives under the scheduler mutex and never blocks. The
//! scheduler proper decides *when* to consult this state; the methods here
//! only keep the counters coherent.
//!
//! Admission hand-off is recorded as **tickets**: when a leaving or entering
//! thread picks a waiter to admit, it increments the target gate's ticket
//! count under the mutex before signalling. The woken waiter consumes one
//! ticket after reacquiring the mutex and only then completes its own
//! bookkeeping. An outstanding ticket therefore marks an admission decision
//! that has been made but not yet acted on, and both the direct-entry
//! predicates and the exit protocols treat it as occupancy.

use crate::classify::{Axis, Plane, NUM_AXES};
use hashbrown::HashSet;
use std::collections::hash_map::RandomState;

type DepthSet = HashSet<usize, RandomState>;

pub(super) struct SchedState {
    layers: usize,

    active_readers: u32,
    active_writers: u32,
    writing_axis: Option<Axis>,
    busy_depths: DepthSet,

    waiting_readers: u32,
    /// Gate-indexed (`axis * layers + depth`) waiting-writer counts.
    waiting_writers: Box<[u32]>,
    waiting_writers_by_axis: [u32; NUM_AXES],

    reader_tickets: u32,
    writer_tickets: Box<[u32]>,
    outstanding_tickets: u32,

    /// Round-robin cursor over axes. Starts empty and is advanced before
    /// being read, so the first admission lands on axis 0.
    last_admitted_axis: Option<usize>,
}

impl SchedState {
    pub fn new(layers: usize) -> Self {
        Self {
            layers,
            active_readers: 0,
            active_writers: 0,
            writing_axis: None,
            busy_depths: DepthSet::with_hasher(RandomState::new()),
            waiting_readers: 0,
            waiting_writers: vec![0; NUM_AXES * layers].into_boxed_slice(),
            waiting_writers_by_axis: [0; NUM_AXES],
            reader_tickets: 0,
            writer_tickets: vec![0; NUM_AXES * layers].into_boxed_slice(),
            outstanding_tickets: 0,
            last_admitted_axis: None,
        }
    }

    #[inline]
    fn gate(&self, plane: Plane) -> usize {
        plane.axis.index() * self.layers + plane.depth
    }

    #[inline]
    pub fn active_readers(&self) -> u32 {
        self.active_readers
    }

    #[inline]
    pub fn active_writers(&self) -> u32 {
        self.active_writers
    }

    #[inline]
    pub fn waiting_readers(&self) -> u32 {
        self.waiting_readers
    }

    #[inline]
    pub fn reader_tickets(&self) -> u32 {
        self.reader_tickets
    }

    #[inline]
    pub fn waiting_writers_at(&self, plane: Plane) -> u32 {
        self.waiting_writers[self.gate(plane)]
    }

    #[inline]
    pub fn writer_tickets_at(&self, plane: Plane) -> u32 {
        self.writer_tickets[self.gate(plane)]
    }

    #[inline]
    pub fn total_waiting_writers(&self) -> u32 {
        self.waiting_writers_by_axis.iter().sum()
    }

    #[inline]
    pub fn writer_tickets_total(&self) -> u32 {
        self.outstanding_tickets - self.reader_tickets
    }

    #[inline]
    pub fn outstanding_tickets(&self) -> u32 {
        self.outstanding_tickets
    }

    /// A read may enter directly iff no writer is active or waiting.
    #[inline]
    pub fn writers_obstruct_readers(&self) -> bool {
        self.active_writers > 0 || self.total_waiting_writers() > 0
    }

    /// A write may enter directly iff nothing is active and no admission
    /// baton is outstanding. Compatible same-axis writers do not bypass the
    /// waiting line while a cohort is active.
    #[inline]
    pub fn may_write_immediately(&self) -> bool {
        self.active_readers == 0 && self.active_writers == 0 && self.outstanding_tickets == 0
    }

    pub fn begin_read(&mut self) {
        debug_assert_eq!(self.active_writers, 0);
        self.active_readers += 1;
    }

    /// Returns true when this was the last active reader.
    pub fn finish_read(&mut self) -> bool {
        debug_assert!(self.active_readers > 0);
        self.active_readers -= 1;
        self.active_readers == 0
    }

    pub fn begin_write(&mut self, plane: Plane) {
        debug_assert_eq!(self.active_readers, 0);
        debug_assert!(self.writing_axis.map_or(true, |axis| axis == plane.axis));
        debug_assert!(!self.busy_depths.contains(&plane.depth));

        self.active_writers += 1;
        self.writing_axis = Some(plane.axis);
        self.busy_depths.insert(plane.depth);
    }

    /// Returns true when this was the last active writer; the axis claim is
    /// dropped at that point.
    pub fn finish_write(&mut self, plane: Plane) -> bool {
        debug_assert!(self.active_writers > 0);
        debug_assert_eq!(self.writing_axis, Some(plane.axis));

        self.active_writers -= 1;
        self.busy_depths.remove(&plane.depth);

        if self.active_writers == 0 {
            self.writing_axis = None;
            true
        } else {
            false
        }
    }

    pub fn add_waiting_reader(&mut self) {
        self.waiting_readers += 1;
    }

    pub fn remove_waiting_reader(&mut self) {
        debug_assert!(self.waiting_readers > 0);
        self.waiting_readers -= 1;
    }

    pub fn add_waiting_writer(&mut self, plane: Plane) {
        let gate = self.gate(plane);
        self.waiting_writers[gate] += 1;
        self.waiting_writers_by_axis[plane.axis.index()] += 1;
    }

    pub fn remove_waiting_writer(&mut self, plane: Plane) {
        let gate = self.gate(plane);
        debug_assert!(self.waiting_writers[gate] > 0);
        self.waiting_writers[gate] -= 1;
        self.waiting_writers_by_axis[plane.axis.index()] -= 1;
    }

    pub fn issue_reader_ticket(&mut self) {
        debug_assert_eq!(self.active_writers, 0);
        debug_assert!(self.reader_tickets < self.waiting_readers);
        self.reader_tickets += 1;
        self.outstanding_tickets += 1;
    }

    pub fn take_reader_ticket(&mut self) -> bool {
        if self.reader_tickets > 0 {
            self.reader_tickets -= 1;
            self.outstanding_tickets -= 1;
            true
        } else {
            false
        }
    }

    pub fn issue_writer_ticket(&mut self, plane: Plane) {
        let gate = self.gate(plane);
        debug_assert_eq!(self.active_readers, 0);
        debug_assert!(self.writer_tickets[gate] < self.waiting_writers[gate]);
        self.writer_tickets[gate] += 1;
        self.outstanding_tickets += 1;
    }

    pub fn take_writer_ticket(&mut self, plane: Plane) -> bool {
        let gate = self.gate(plane);
        if self.writer_tickets[gate] > 0 {
            self.writer_tickets[gate] -= 1;
            self.outstanding_tickets -= 1;
            true
        } else {
            false
        }
    }

    /// The next depth on `axis` holding a waiter that is neither busy nor
    /// already ticketed, scanning upward from `from`.
    pub fn next_chain_depth(&self, axis: Axis, from: usize) -> Option<usize> {
        (from..self.layers).find(|&depth| {
            let plane = Plane { axis, depth };
            !self.busy_depths.contains(&depth)
                && self.waiting_writers_at(plane) > self.writer_tickets_at(plane)
        })
    }

    /// Round-robin admission choice: advance the cursor modulo the axis
    /// count, skip axes without an unticketed waiter, and pick the lowest
    /// eligible depth. Advances the cursor only when a choice is made.
    pub fn next_round_robin(&mut self) -> Option<Plane> {
        let start = self.last_admitted_axis.map_or(0, |axis| (axis + 1) % NUM_AXES);

        for offset in 0..NUM_AXES {
            let index = (start + offset) % NUM_AXES;
            if self.waiting_writers_by_axis[index] == 0 {
                continue;
            }

            let axis = Axis::from_index(index);
            if let Some(depth) = self.next_chain_depth(axis, 0) {
                self.last_admitted_axis = Some(index);
                return Some(Plane { axis, depth });
            }
        }

        None
    }

    /// Checks the cross-field invariants. Compiled out of release builds.
    pub fn assert_invariants(&self) {
        debug_assert!(self.active_readers == 0 || self.active_writers == 0);
        debug_assert_eq!(self.active_writers as usize, self.busy_depths.len());
        debug_assert_eq!(self.writing_axis.is_some(), self.active_writers > 0);
        debug_assert!(self.reader_tickets <= self.waiting_readers);
        debug_assert!(self
            .writer_tickets
            .iter()
            .zip(self.waiting_writers.iter())
            .all(|(tickets, waiting)| tickets <= waiting));
        debug_assert_eq!(
            self.outstanding_tickets,
            self.reader_tickets + self.writer_tickets.iter().sum::<u32>()
        );
        debug_assert!(self.reader_tickets == 0 || self.active_writers == 0);
        debug_assert!(self.writer_tickets_total() == 0 || self.active_readers == 0);
        for axis in 0..NUM_AXES {
            let by_gate: u32 = self.waiting_writers[axis * self.layers..(axis + 1) * self.layers]
                .iter()
                .sum();
            debug_assert_eq!(by_gate, self.waiting_writers_by_axis[axis]);
        }
        // When nothing is active, every parked waiter must have a pending
        // baton somewhere, or be obstructed by one.
        debug_assert!(
            self.active_readers > 0
                || self.active_writers > 0
                || self.outstanding_tickets > 0
                || (self.waiting_readers == 0 && self.total_waiting_writers() == 0)
        );
    }
}
