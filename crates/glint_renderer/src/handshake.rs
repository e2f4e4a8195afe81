//! Turn-taking between the control thread and the worker group.
//!
//! Exactly one side holds the turn at any time. The worker side (the frame
//! barrier's completion action) hands the turn over with
//! [`Handshake::signal_ready`] and blocks in [`Handshake::wait_for_release`];
//! the control thread takes it with [`Handshake::wait_for_ready`] and hands
//! it back when the returned [`ControlTurn`] is dropped.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    Workers,
    Control,
}

#[derive(Debug)]
struct State {
    turn: Turn,
    closed: bool,
}

#[derive(Debug)]
pub struct Handshake {
    state: Mutex<State>,
    changed: Condvar,
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                turn: Turn::Workers,
                closed: false,
            }),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Worker side: give the turn to the control thread.
    pub fn signal_ready(&self) {
        self.lock().turn = Turn::Control;
        self.changed.notify_all();
    }

    /// Worker side: block until the control thread has handed the turn
    /// back, or the handshake is closed.
    pub fn wait_for_release(&self) {
        let state = self.lock();
        let _state = self
            .changed
            .wait_while(state, |s| s.turn == Turn::Control && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Control side: block until the workers signal, then hold the turn
    /// until the guard drops. `None` once the handshake is closed.
    pub fn wait_for_ready(&self) -> Option<ControlTurn<'_>> {
        let state = self.lock();
        let state = self
            .changed
            .wait_while(state, |s| s.turn == Turn::Workers && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);
        if state.closed {
            return None;
        }
        Some(ControlTurn { handshake: self })
    }

    /// Wake everyone and make every wait return immediately from now on.
    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Back to the initial state (workers' turn, open) for another run.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.turn = Turn::Workers;
        state.closed = false;
    }

    fn release(&self) {
        self.lock().turn = Turn::Workers;
        self.changed.notify_all();
    }
}

/// The control thread's turn. Dropping it wakes the workers.
#[must_use = "the workers resume as soon as the turn is dropped"]
#[derive(Debug)]
pub struct ControlTurn<'a> {
    handshake: &'a Handshake,
}

impl Drop for ControlTurn<'_> {
    fn drop(&mut self) {
        self.handshake.release();
    }
}
