//! The admission scheduler.
//!
//! One mutex guards all bookkeeping. Waiters park on gates: one condvar per
//! `(axis, depth)` plane for writers, one shared condvar for readers. Every
//! wake-up is explicit and chosen under the mutex by the thread that makes
//! room, which is what the fairness policy hangs off:
//!
//! - readers wait whenever a writer is active *or waiting*, and admit each
//!   other in a cascade once the first one is through;
//! - writers wait unless the scheduler is completely idle, and are admitted
//!   per-axis round-robin, each admitted writer chain-waking the next
//!   compatible depth on its axis;
//! - admission decisions travel as tickets (see [`state`]), so a woken
//!   thread resumes with its admission already reserved and nothing can
//!   steal the slot in between.
//!
//! Entry and exit are paired through RAII permits; a panicking caller still
//! runs the exit protocol.

mod state;

use crate::cancel::CancelToken;
use crate::classify::{Plane, NUM_AXES};
use crate::loom::sync::{Arc, Condvar, Mutex, MutexGuard};
use state::SchedState;
use tracing::trace;

/// Marker error: the operation was abandoned before its body ran.
pub(crate) struct Cancelled;

pub(crate) struct Scheduler {
    // Arc'd so cancellation wakers can take the mutex without borrowing the
    // scheduler.
    state: Arc<Mutex<SchedState>>,
    reader_gate: Arc<Condvar>,
    writer_gates: Box<[Arc<Condvar>]>,
    layers: usize,
}

impl Scheduler {
    pub fn new(layers: usize) -> Self {
        debug_assert!(layers >= 1);

        let writer_gates = (0..NUM_AXES * layers)
            .map(|_| Arc::new(Condvar::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            state: Arc::new(Mutex::new(SchedState::new(layers))),
            reader_gate: Arc::new(Condvar::new()),
            writer_gates,
            layers,
        }
    }

    #[inline]
    fn gate(&self, plane: Plane) -> &Arc<Condvar> {
        &self.writer_gates[plane.axis.index() * self.layers + plane.depth]
    }

    /// A waker for `gate`, for the cancellation registry. Taking the
    /// scheduler mutex before signalling closes the race against a waiter
    /// that has checked its token but not parked yet.
    fn cancel_waker(&self, gate: &Arc<Condvar>) -> crate::cancel::Waker {
        let state = Arc::clone(&self.state);
        let gate = Arc::clone(gate);
        Arc::new(move || {
            let guard = state.lock();
            gate.notify_all();
            drop(guard);
        })
    }

    /// Admits the caller as a reader, parking it while any writer is active
    /// or waiting. Honors `cancel` until admission completes.
    pub fn read(&self, cancel: Option<&CancelToken>) -> Result<ReadPermit<'_>, Cancelled> {
        if is_cancelled(cancel) {
            return Err(Cancelled);
        }

        let mut state = self.state.lock();

        if state.writers_obstruct_readers() {
            state.add_waiting_reader();
            let registration =
                cancel.map(|token| token.register(self.cancel_waker(&self.reader_gate)));
            trace!(waiting = state.waiting_readers(), "reader parked");

            loop {
                if state.take_reader_ticket() {
                    break;
                }

                if is_cancelled(cancel) {
                    // A baton aimed at this thread cannot be pending here:
                    // tickets are checked first under the same mutex hold.
                    state.remove_waiting_reader();
                    self.admit_after_departure(&mut state);
                    state.assert_invariants();
                    return Err(Cancelled);
                }

                state = self.reader_gate.wait(state);
            }

            drop(registration);
            state.remove_waiting_reader();
            state.begin_read();

            // Cascade: each admitted reader forwards one baton.
            if state.waiting_readers() > 0 {
                state.issue_reader_ticket();
                self.reader_gate.notify_one();
            }

            if is_cancelled(cancel) {
                self.release_read(state);
                return Err(Cancelled);
            }
        } else {
            state.begin_read();
        }

        state.assert_invariants();
        drop(state);
        Ok(ReadPermit { scheduler: self })
    }

    /// Admits the caller as the writer of `plane`. Writers funnel through
    /// the waiting line whenever anything is active, compatible or not.
    pub fn write(&self, plane: Plane, cancel: Option<&CancelToken>) -> Result<WritePermit<'_>, Cancelled> {
        if is_cancelled(cancel) {
            return Err(Cancelled);
        }

        let mut state = self.state.lock();

        if state.may_write_immediately() {
            debug_assert_eq!(state.total_waiting_writers(), 0);
            state.begin_write(plane);
        } else {
            let gate = self.gate(plane);
            state.add_waiting_writer(plane);
            let registration = cancel.map(|token| token.register(self.cancel_waker(gate)));
            trace!(
                axis = plane.axis.index(),
                depth = plane.depth,
                "writer parked"
            );

            loop {
                if state.take_writer_ticket(plane) {
                    break;
                }

                if is_cancelled(cancel) {
                    state.remove_waiting_writer(plane);
                    self.admit_after_departure(&mut state);
                    state.assert_invariants();
                    return Err(Cancelled);
                }

                state = gate.wait(state);
            }

            drop(registration);
            state.remove_waiting_writer(plane);
            state.begin_write(plane);
            self.chain_wake(&mut state, plane);

            if is_cancelled(cancel) {
                self.release_write(state, plane);
                return Err(Cancelled);
            }
        }

        state.assert_invariants();
        drop(state);
        Ok(WritePermit {
            scheduler: self,
            plane,
        })
    }

    /// Forwards admission to the next waiter on the same axis at a depth
    /// above the entering writer's, if one exists.
    fn chain_wake(&self, state: &mut SchedState, plane: Plane) {
        if let Some(depth) = state.next_chain_depth(plane.axis, plane.depth + 1) {
            let next = Plane {
                axis: plane.axis,
                depth,
            };
            state.issue_writer_ticket(next);
            self.gate(next).notify_one();
            trace!(
                axis = next.axis.index(),
                depth = next.depth,
                "writer chain-woken"
            );
        }
    }

    /// Round-robin writer admission. Returns false when no writer is
    /// eligible.
    fn admit_round_robin(&self, state: &mut SchedState) -> bool {
        match state.next_round_robin() {
            Some(plane) => {
                state.issue_writer_ticket(plane);
                self.gate(plane).notify_one();
                trace!(
                    axis = plane.axis.index(),
                    depth = plane.depth,
                    "writer admitted round-robin"
                );
                true
            }
            None => false,
        }
    }

    /// Runs after a waiter removed itself without being admitted. The
    /// departed waiter may have been the last obstruction in front of the
    /// remaining parked operations.
    fn admit_after_departure(&self, state: &mut SchedState) {
        if state.active_writers() > 0 {
            return;
        }

        // The last waiting writer left while readers were parked behind it.
        if state.total_waiting_writers() == 0
            && state.waiting_readers() > 0
            && state.reader_tickets() == 0
        {
            state.issue_reader_ticket();
            self.reader_gate.notify_one();
            return;
        }

        if state.active_readers() == 0 && state.outstanding_tickets() == 0 {
            if state.waiting_readers() > 0 {
                state.issue_reader_ticket();
                self.reader_gate.notify_one();
            } else {
                self.admit_round_robin(state);
            }
        }
    }

    fn release_read(&self, mut state: MutexGuard<'_, SchedState>) {
        let last = state.finish_read();

        // With batons still in flight the reader cohort is not drained; the
        // woken reader continues the protocol when it resumes.
        if last && state.reader_tickets() == 0 {
            // Writers go first on a read exit.
            if !self.admit_round_robin(&mut state) && state.waiting_readers() > 0 {
                state.issue_reader_ticket();
                self.reader_gate.notify_one();
            }
        }

        state.assert_invariants();
    }

    fn release_write(&self, mut state: MutexGuard<'_, SchedState>, plane: Plane) {
        let last = state.finish_write(plane);

        // Same as the read side: an outstanding writer baton means a cohort
        // member has been admitted but has not resumed yet.
        if last && state.writer_tickets_total() == 0 {
            if state.waiting_readers() > 0 {
                debug_assert_eq!(state.reader_tickets(), 0);
                state.issue_reader_ticket();
                self.reader_gate.notify_one();
            } else {
                self.admit_round_robin(&mut state);
            }
        }

        state.assert_invariants();
    }
}

/// Read admission. Dropping it runs the read exit protocol.
pub(crate) struct ReadPermit<'scheduler> {
    scheduler: &'scheduler Scheduler,
}

impl Drop for ReadPermit<'_> {
    fn drop(&mut self) {
        let state = self.scheduler.state.lock();
        self.scheduler.release_read(state);
    }
}

/// Write admission for one plane. Dropping it runs the write exit protocol.
pub(crate) struct WritePermit<'scheduler> {
    scheduler: &'scheduler Scheduler,
    plane: Plane,
}

impl Drop for WritePermit<'_> {
    fn drop(&mut self) {
        let state = self.scheduler.state.lock();
        self.scheduler.release_write(state, self.plane);
    }
}

#[inline]
fn is_cancelled(cancel: Option<&CancelToken>) -> bool {
    cancel.map_or(false, CancelToken::is_cancelled)
}
