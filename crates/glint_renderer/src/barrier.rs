//! Reusable frame barrier with a completion action.
//!
//! Like `std::sync::Barrier`, but the last thread to arrive runs a closure
//! before anyone is released, and the barrier can be closed to free waiting
//! threads at shutdown.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct State {
    arrived: usize,
    generation: u64,
    closed: bool,
}

#[derive(Debug)]
pub struct FrameBarrier {
    parties: usize,
    state: Mutex<State>,
    released: Condvar,
}

impl FrameBarrier {
    pub fn new(parties: usize) -> Self {
        Self {
            parties: parties.max(1),
            state: Mutex::new(State {
                arrived: 0,
                generation: 0,
                closed: false,
            }),
            released: Condvar::new(),
        }
    }

    pub fn parties(&self) -> usize {
        self.parties
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until all parties have arrived.
    ///
    /// The last arrival runs `completion` (without holding the barrier lock)
    /// and then releases the rest. Returns false if the barrier is or
    /// becomes closed, in which case `completion` may not have run.
    pub fn arrive_and_wait(&self, completion: impl FnOnce()) -> bool {
        let mut state = self.lock();
        if state.closed {
            return false;
        }

        state.arrived += 1;
        if state.arrived == self.parties {
            state.arrived = 0;
            drop(state);

            completion();

            let mut state = self.lock();
            state.generation = state.generation.wrapping_add(1);
            let open = !state.closed;
            drop(state);
            self.released.notify_all();
            return open;
        }

        let generation = state.generation;
        let state = self
            .released
            .wait_while(state, |s| s.generation == generation && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        !state.closed
    }

    /// Release all waiters; later arrivals return immediately.
    pub fn close(&self) {
        self.lock().closed = true;
        self.released.notify_all();
    }

    pub fn reset(&self) {
        let mut state = self.lock();
        state.arrived = 0;
        state.closed = false;
    }
}
