//! The progressive renderer: the scheduler's workload and host for path
//! tracing into a [`Display`].
//!
//! Workers each own one scanline band of the [`Framebuffer`] and blend one
//! jittered sample per pixel per tick. The control thread presents the
//! pixels, applies camera input and resizes, and turns lockstep off once
//! the camera has been still long enough.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use glint_core::RenderSettings;

use crate::camera::Camera;
use crate::controller::OrbitController;
use crate::display::Display;
use crate::export::SaveTarget;
use crate::framebuffer::{Framebuffer, Snapshot};
use crate::input::Key;
use crate::object::Object;
use crate::rng::Seed;
use crate::scheduler::{Host, Scheduler, Workload};
use crate::world::World;

/// Camera state read by the workers once per tick.
#[derive(Debug, Clone)]
pub struct View {
    pub camera: Camera,
    /// Bumped whenever the camera or image size changes; bands seeing a new
    /// epoch restart their running mean.
    pub epoch: u64,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the workers and the control thread.
pub struct RenderShared {
    world: World,
    view: RwLock<View>,
    frame: RwLock<Framebuffer>,
    max_depth: i32,
    /// Sum of worker tick durations since the last stats report
    productive_nanos: AtomicU64,
}

impl RenderShared {
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn view(&self) -> View {
        read(&self.view).clone()
    }

    pub fn snapshot(&self) -> Snapshot {
        read(&self.frame).snapshot()
    }

    fn take_productive(&self) -> Duration {
        Duration::from_nanos(self.productive_nanos.swap(0, Ordering::Relaxed))
    }
}

impl Workload for RenderShared {
    type State = Seed;

    fn worker_init(&self, index: usize) -> Seed {
        Seed::for_worker(index)
    }

    fn worker_run(&self, index: usize, seed: &mut Seed) {
        let start = Instant::now();
        let View { camera, epoch } = self.view();

        let frame = read(&self.frame);
        if index >= frame.band_count() {
            return;
        }
        let (width, height) = frame.size();
        let x_max = width.saturating_sub(1).max(1) as f32;
        let y_max = height.saturating_sub(1).max(1) as f32;

        let mut band = frame.band(index);
        let weight_new = band.begin_sample(epoch);
        let weight_old = 1.0 - weight_new;

        for y in band.rows() {
            for x in 0..width {
                let jitter_x = seed.signed() * weight_old;
                let jitter_y = seed.signed() * weight_old;
                let u = (x as f32 + jitter_x) / x_max;
                let v = (y as f32 + jitter_y) / y_max;

                let ray = camera.get_ray(u, v);
                let color = self.world.raytrace(&ray, self.max_depth, seed);
                band.blend(x, y, color, weight_new);
            }
        }
        frame.publish(index, &band);

        let elapsed = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
        self.productive_nanos.fetch_add(elapsed, Ordering::Relaxed);
    }
}

/// Tick timing, logged once per second.
#[derive(Debug)]
struct FrameStats {
    window_start: Instant,
    ticks: u32,
    real: Duration,
    productive: Duration,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            ticks: 0,
            real: Duration::ZERO,
            productive: Duration::ZERO,
        }
    }

    fn record(&mut self, real: Duration, productive: Duration, frames_still: u32) {
        self.ticks += 1;
        self.real += real;
        self.productive += productive;

        let elapsed = self.window_start.elapsed();
        if elapsed < Duration::from_secs(1) {
            return;
        }

        let ticks = self.ticks.max(1) as f64;
        log::info!(
            "{:.1} ticks/s, real {:.2} ms, productive {:.2} ms, {} still",
            self.ticks as f64 / elapsed.as_secs_f64(),
            self.real.as_secs_f64() * 1000.0 / ticks,
            self.productive.as_secs_f64() * 1000.0 / ticks,
            frames_still
        );
        *self = Self::new();
    }
}

/// Control-thread state: the display, camera input and saving.
pub struct ControlState<D> {
    display: D,
    controller: OrbitController,
    converge_after: u32,
    save_target: Option<SaveTarget>,
    save_held: bool,
    last_tick: Instant,
    stats: FrameStats,
}

impl<D: Display> ControlState<D> {
    fn save(&mut self, shared: &RenderShared) {
        let Some(target) = self.save_target.as_mut() else {
            log::warn!("No save target configured");
            return;
        };
        match target.save(&shared.snapshot()) {
            Ok(path) => log::info!("Render saved to {}", path.display()),
            Err(err) => log::error!("Failed to save render: {}", err),
        }
    }
}

impl<D: Display> Host<RenderShared> for ControlState<D> {
    fn main_run(&mut self, shared: &RenderShared, scheduler: &Scheduler) -> bool {
        let now = Instant::now();
        let dt = now - self.last_tick;
        self.last_tick = now;
        self.stats
            .record(dt, shared.take_productive(), self.controller.frames_still());

        read(&shared.frame).copy_pixels_to(self.display.pixels_mut());
        if !self.display.update() {
            return false;
        }

        let input = self.display.input();
        if input.is_key_down(Key::Escape) {
            log::info!("Escape pressed, stopping");
            return false;
        }

        let save_down = input.is_key_down(Key::P);
        let save_pressed = save_down && !self.save_held;
        self.save_held = save_down;
        if save_pressed {
            self.save(shared);
        }

        let size = self.display.size();
        let mut camera = read(&shared.view).camera.clone();
        let moved = self.controller.update(
            self.display.input(),
            size,
            dt.as_secs_f32(),
            &mut camera.transform,
        );

        let resized = self.display.resized();
        if resized {
            // Waits out a free-running tick still rendering the old size
            write(&shared.frame).resize(size.0, size.1);
            self.controller.reset();
            log::info!("Resized to {}x{}", size.0, size.1);
        }

        if moved || resized {
            if size.0 > 0 && size.1 > 0 {
                let fov = camera.vertical_fov();
                camera.update(fov, size.0 as f32 / size.1 as f32);
            }
            let mut view = write(&shared.view);
            view.camera = camera;
            view.epoch = view.epoch.wrapping_add(1);
        }

        let converged = self.controller.frames_still() > self.converge_after;
        if scheduler.is_synchronized() == converged {
            scheduler.set_synchronized(!converged);
            if converged {
                log::info!("Converging, workers free-running");
            } else {
                log::info!("Camera moved, workers synchronized");
            }
        }

        true
    }
}

/// A path tracer driving a [`Display`] until it asks to stop.
pub struct ProgressiveRenderer<D> {
    shared: RenderShared,
    control: ControlState<D>,
    scheduler: Scheduler,
}

impl<D: Display> ProgressiveRenderer<D> {
    pub fn new(display: D, mut world: World, mut camera: Camera, settings: &RenderSettings) -> Self {
        let worker_count = settings.resolved_worker_count();
        let (width, height) = display.size();
        if width > 0 && height > 0 {
            let fov = camera.vertical_fov();
            camera.update(fov, width as f32 / height as f32);
        }
        world.set_ray_epsilon(settings.ray_epsilon);

        let mut controller = OrbitController::new();
        controller.sync_from(&camera.transform);

        log::info!(
            "Renderer: {}x{}, {} workers, {} objects, max depth {}",
            width,
            height,
            worker_count,
            world.len(),
            settings.max_depth
        );

        Self {
            shared: RenderShared {
                world,
                view: RwLock::new(View { camera, epoch: 0 }),
                frame: RwLock::new(Framebuffer::new(width, height, worker_count)),
                max_depth: settings.max_depth,
                productive_nanos: AtomicU64::new(0),
            },
            control: ControlState {
                display,
                controller,
                converge_after: settings.converge_after,
                save_target: None,
                save_held: false,
                last_tick: Instant::now(),
                stats: FrameStats::new(),
            },
            scheduler: Scheduler::new(worker_count),
        }
    }

    /// Add an object. Only possible before (or between) runs.
    pub fn add(&mut self, object: Object) {
        self.shared.world.add(object);
    }

    pub fn world(&self) -> &World {
        &self.shared.world
    }

    /// Where P saves to.
    pub fn set_save_target(&mut self, target: SaveTarget) {
        self.control.save_target = Some(target);
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Render until the display stops. Blocks the calling thread.
    pub fn run(&mut self) -> io::Result<()> {
        self.control.last_tick = Instant::now();
        self.scheduler.run(&self.shared, &mut self.control)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.shared.snapshot()
    }

    pub fn view(&self) -> View {
        self.shared.view()
    }

    pub fn display(&self) -> &D {
        &self.control.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.control.display
    }

    pub fn frames_still(&self) -> u32 {
        self.control.controller.frames_still()
    }
}
