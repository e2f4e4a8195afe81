use glint_renderer::{Host, Scheduler, Workload};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Records overlap between worker ticks and control ticks.
#[derive(Default)]
struct Instrumented {
    active_workers: AtomicUsize,
    in_main: AtomicBool,
    worker_ticks: AtomicUsize,
    sync_calls: AtomicUsize,
    violations: AtomicUsize,
}

impl Workload for Instrumented {
    type State = ();

    fn worker_init(&self, _index: usize) {}

    fn worker_run(&self, _index: usize, _state: &mut ()) {
        self.active_workers.fetch_add(1, Ordering::SeqCst);
        if self.in_main.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_micros(200));
        if self.in_main.load(Ordering::SeqCst) {
            self.violations.fetch_add(1, Ordering::SeqCst);
        }
        self.worker_ticks.fetch_add(1, Ordering::SeqCst);
        self.active_workers.fetch_sub(1, Ordering::SeqCst);
    }

    fn worker_sync(&self) {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountdownHost {
    remaining: usize,
    /// Switch to free-running after this many ticks, if set
    unsync_after: Option<usize>,
    ticks: usize,
}

impl CountdownHost {
    fn new(remaining: usize) -> Self {
        Self {
            remaining,
            unsync_after: None,
            ticks: 0,
        }
    }
}

impl Host<Instrumented> for CountdownHost {
    fn main_run(&mut self, workload: &Instrumented, scheduler: &Scheduler) -> bool {
        self.ticks += 1;

        if scheduler.is_synchronized() {
            workload.in_main.store(true, Ordering::SeqCst);
            if workload.active_workers.load(Ordering::SeqCst) != 0 {
                workload.violations.fetch_add(1, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_micros(200));
            if workload.active_workers.load(Ordering::SeqCst) != 0 {
                workload.violations.fetch_add(1, Ordering::SeqCst);
            }
            workload.in_main.store(false, Ordering::SeqCst);
        }

        if self.unsync_after == Some(self.ticks) {
            scheduler.set_synchronized(false);
        }

        self.remaining -= 1;
        self.remaining > 0
    }
}

#[test]
fn synchronized_ticks_never_overlap() {
    init_logging();
    for workers in [1, 2, 8] {
        for _ in 0..3 {
            let scheduler = Scheduler::new(workers);
            let workload = Instrumented::default();
            scheduler.run(&workload, &mut CountdownHost::new(25)).unwrap();

            assert_eq!(workload.violations.load(Ordering::SeqCst), 0, "{} workers", workers);
            assert_eq!(workload.worker_ticks.load(Ordering::SeqCst), 24 * workers);
            // Every synchronized tick, including the one that saw the stop
            assert_eq!(workload.sync_calls.load(Ordering::SeqCst), 25);
        }
    }
}

#[test]
fn shutdown_from_free_running_mode() {
    init_logging();
    for workers in [1, 2, 8] {
        let scheduler = Scheduler::new(workers);
        let workload = Instrumented::default();
        let mut host = CountdownHost {
            remaining: 200,
            unsync_after: Some(3),
            ticks: 0,
        };
        scheduler.run(&workload, &mut host).unwrap();

        assert_eq!(host.ticks, 200);
        assert!(!scheduler.is_synchronized());
        assert!(!scheduler.is_running());
        assert_eq!(workload.active_workers.load(Ordering::SeqCst), 0);
    }
}

#[test]
fn resynchronizing_restores_lockstep() {
    struct Toggle {
        ticks: usize,
    }

    impl Host<Instrumented> for Toggle {
        fn main_run(&mut self, workload: &Instrumented, scheduler: &Scheduler) -> bool {
            self.ticks += 1;
            if self.ticks > 20 && scheduler.is_synchronized() {
                // Back in lockstep: workers must be parked
                if workload.active_workers.load(Ordering::SeqCst) != 0 {
                    workload.violations.fetch_add(1, Ordering::SeqCst);
                }
            }
            match self.ticks {
                5 => scheduler.set_synchronized(false),
                // Takes effect at the next tick boundary
                15 => scheduler.set_synchronized(true),
                _ => {}
            }
            self.ticks < 40
        }
    }

    init_logging();
    let scheduler = Scheduler::new(4);
    let workload = Instrumented::default();
    scheduler.run(&workload, &mut Toggle { ticks: 0 }).unwrap();
    assert_eq!(workload.violations.load(Ordering::SeqCst), 0);
}

#[test]
fn stop_request_ends_the_run() {
    struct StopVia;

    impl Host<Instrumented> for StopVia {
        fn main_run(&mut self, workload: &Instrumented, scheduler: &Scheduler) -> bool {
            if workload.worker_ticks.load(Ordering::SeqCst) >= 10 {
                scheduler.stop();
            }
            true
        }
    }

    init_logging();
    let scheduler = Scheduler::new(2);
    let workload = Instrumented::default();
    scheduler.run(&workload, &mut StopVia).unwrap();
    assert!(workload.worker_ticks.load(Ordering::SeqCst) >= 10);
}
