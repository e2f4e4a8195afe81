//! Lockstep worker pool.
//!
//! A [`Scheduler`] runs one [`Workload`] on a fixed set of worker threads
//! and a [`Host`] on the calling (control) thread. While synchronized, each
//! tick goes: all workers meet at the frame barrier, the barrier completion
//! hands the turn to the control thread, the host runs, the turn comes back
//! and the workers run one tick each. Host and worker code therefore never
//! overlap. Unsynchronized, both sides free-run.
//!
//! Switching back to lockstep only takes effect at the workers' next tick
//! boundary, so one tick of worker output may still be computed against
//! state the host changed in the same tick.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::barrier::FrameBarrier;
use crate::handshake::Handshake;

/// Work executed on every worker thread.
pub trait Workload: Sync {
    /// Per-worker state, created on the worker's own thread.
    type State;

    fn worker_init(&self, index: usize) -> Self::State;

    /// One tick of work for worker `index`.
    fn worker_run(&self, index: usize, state: &mut Self::State);

    /// Runs once per synchronized tick on the last worker to arrive, before
    /// the control thread is released.
    fn worker_sync(&self) {}
}

/// Control-thread side of a run.
pub trait Host<W: Workload> {
    /// One control tick. Returning false ends the run.
    fn main_run(&mut self, workload: &W, scheduler: &Scheduler) -> bool;
}

#[derive(Debug)]
pub struct Scheduler {
    worker_count: usize,
    synchronize: AtomicBool,
    running: AtomicBool,
    handshake: Handshake,
    barrier: FrameBarrier,
}

impl Scheduler {
    /// Create a scheduler with `worker_count` workers (at least one).
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        Self {
            worker_count,
            synchronize: AtomicBool::new(true),
            running: AtomicBool::new(false),
            handshake: Handshake::new(),
            barrier: FrameBarrier::new(worker_count),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    pub fn is_synchronized(&self) -> bool {
        self.synchronize.load(Ordering::Acquire)
    }

    /// Switch lockstep on or off. Takes effect at the next tick boundary.
    pub fn set_synchronized(&self, synchronized: bool) {
        self.synchronize.store(synchronized, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Ask the run to end after the current tick.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }

    /// Start the workers and drive `host` on this thread until it returns
    /// false or [`Scheduler::stop`] is called. Workers are joined before
    /// returning.
    pub fn run<W, H>(&self, workload: &W, host: &mut H) -> io::Result<()>
    where
        W: Workload,
        H: Host<W>,
    {
        self.handshake.reset();
        self.barrier.reset();
        self.running.store(true, Ordering::Release);

        log::debug!(
            "Starting {} workers ({})",
            self.worker_count,
            if self.is_synchronized() { "synchronized" } else { "free-running" }
        );

        thread::scope(|s| {
            for index in 0..self.worker_count {
                let spawned = thread::Builder::new()
                    .name(format!("glint-worker-{}", index))
                    .spawn_scoped(s, move || self.worker_loop(workload, index));
                if let Err(err) = spawned {
                    self.shutdown();
                    return Err(err);
                }
            }

            self.control_loop(workload, host);
            self.shutdown();
            Ok(())
        })?;

        log::debug!("All workers joined");
        Ok(())
    }

    fn worker_loop<W: Workload>(&self, workload: &W, index: usize) {
        let _guard = ShutdownOnPanic(self);
        let mut state = workload.worker_init(index);

        while self.is_running() {
            if self.is_synchronized() {
                self.barrier.arrive_and_wait(|| {
                    workload.worker_sync();
                    self.handshake.signal_ready();
                    self.handshake.wait_for_release();
                });
                if !self.is_running() {
                    break;
                }
            }
            workload.worker_run(index, &mut state);
        }
    }

    fn control_loop<W: Workload, H: Host<W>>(&self, workload: &W, host: &mut H) {
        while self.is_running() {
            let keep_running = if self.is_synchronized() {
                match self.handshake.wait_for_ready() {
                    Some(turn) => {
                        let keep_running = host.main_run(workload, self);
                        if !keep_running {
                            // Must be visible before the workers are released
                            self.stop();
                        }
                        drop(turn);
                        keep_running
                    }
                    None => false,
                }
            } else {
                host.main_run(workload, self)
            };

            if !keep_running {
                self.stop();
            }
        }
    }

    /// Stop and wake every blocked thread.
    fn shutdown(&self) {
        self.stop();
        self.handshake.close();
        self.barrier.close();
    }
}

/// Unblocks the other threads if a worker panics, so the run can unwind
/// instead of deadlocking at the barrier.
struct ShutdownOnPanic<'a>(&'a Scheduler);

impl Drop for ShutdownOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            log::error!("Worker panicked, stopping the run");
            self.0.shutdown();
        }
    }
}
