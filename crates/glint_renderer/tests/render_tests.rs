use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use glint_core::{RenderSettings, SceneDescription};
use glint_renderer::{
    build_scene, demo, Camera, Color, Display, Framebuffer, HeadlessDisplay, Material, Object,
    ProgressiveRenderer, SaveTarget, Seed, Shade, ShadingPoint, Sphere, Transform, Vec3, World,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn settings(workers: usize, width: u32, height: u32) -> RenderSettings {
    RenderSettings {
        worker_count: Some(workers),
        width,
        height,
        ..Default::default()
    }
}

fn render_emissive_floor(
    workers: usize,
    width: usize,
    height: usize,
    ticks: u64,
) -> ProgressiveRenderer<HeadlessDisplay> {
    let settings = settings(workers, width as u32, height as u32);
    let setup = demo::emissive_floor(&settings);
    let display = HeadlessDisplay::new(width, height, ticks);
    let mut renderer = ProgressiveRenderer::new(display, setup.world, setup.camera, &settings);
    renderer.run().unwrap();
    renderer
}

#[test]
fn emissive_floor_is_lit_and_bounded() {
    init_logging();
    let renderer = render_emissive_floor(4, 32, 24, 40);
    let snapshot = renderer.snapshot();

    // Center pixel sees the floor: lit by the lamp, never brighter than
    // lamp radiance times floor albedo
    let bound = 2.0 * 0.5;
    let floor = snapshot.radiance_at(16, 12);
    assert!(floor.min_element() > 0.0, "{:?}", floor);
    assert!(floor.max_element() <= bound + 1e-5, "{:?}", floor);

    // Top row is empty sky, which is deterministic
    let backdrop = Color::splat(0.1);
    for x in 0..32 {
        assert_eq!(snapshot.radiance_at(x, 0), backdrop);
    }
}

#[test]
fn floor_estimate_variance_shrinks_with_samples() {
    let settings = RenderSettings::default();
    let setup = demo::emissive_floor(&settings);
    let ray = setup.camera.get_ray(0.5, 0.5);

    // Independent estimators, one per seed, each a running mean in a 1x1 band
    let estimators = 48;
    let checkpoints = [4usize, 16, 64, 256];
    let mut means = vec![Vec::new(); checkpoints.len()];

    for k in 0..estimators {
        let mut seed = Seed::for_worker(k + 1);
        let fb = Framebuffer::new(1, 1, 1);
        let mut band = fb.band(0);
        let mut n = 0;
        for (slot, &checkpoint) in checkpoints.iter().enumerate() {
            while n < checkpoint {
                let w = band.begin_sample(0);
                let sample = setup.world.raytrace(&ray, settings.max_depth, &mut seed);
                band.blend(0, 0, sample, w);
                n += 1;
            }
            means[slot].push(band.accumulated(0, 0).x);
        }
    }

    let variance = |values: &[f32]| {
        let mean = values.iter().sum::<f32>() / values.len() as f32;
        values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / values.len() as f32
    };
    let variances: Vec<f32> = means.iter().map(|m| variance(m.as_slice())).collect();

    // 16x more samples should cut variance by roughly 16x; allow a wide margin
    assert!(variances[0] > 0.0);
    assert!(variances[2] < variances[0] * 0.5, "{:?}", variances);
    assert!(variances[3] < variances[1] * 0.5, "{:?}", variances);
}

#[test]
fn single_worker_matches_many_on_backdrop() {
    let one = render_emissive_floor(1, 16, 12, 6).snapshot();
    let many = render_emissive_floor(8, 16, 12, 6).snapshot();
    for x in 0..16 {
        assert_eq!(one.radiance_at(x, 0), many.radiance_at(x, 0));
    }
}

#[test]
fn headless_render_saves_to_disk() {
    init_logging();
    let dir = std::env::temp_dir().join(format!("glint_render_test_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let renderer = render_emissive_floor(2, 20, 10, 5);
    let mut target = SaveTarget::new(dir.join("render.png"));
    let path = target.save(&renderer.snapshot()).unwrap();

    let image = image::open(&path).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (20, 10));
    // Sky pixels are opaque and not black
    let sky = image.get_pixel(0, 0).0;
    assert_eq!(sky[3], 255);
    assert!(sky[0] > 0);

    let hdr = target.base().with_file_name("render.hdr");
    glint_renderer::save(&hdr, &renderer.snapshot()).unwrap();
    assert!(std::fs::metadata(&hdr).unwrap().len() > 0);

    std::fs::remove_dir_all(dir).ok();
}

#[test]
fn resize_during_run_reallocates() {
    init_logging();
    let settings = settings(3, 16, 16);
    let setup = demo::emissive_floor(&settings);
    let mut display = HeadlessDisplay::new(16, 16, 8);
    display.request_resize(24, 12);

    let mut renderer = ProgressiveRenderer::new(display, setup.world, setup.camera, &settings);
    renderer.run().unwrap();

    let snapshot = renderer.snapshot();
    assert_eq!((snapshot.width, snapshot.height), (24, 12));
    assert_eq!(renderer.display().size(), (24, 12));
    assert_eq!(snapshot.radiance_at(5, 0), Color::splat(0.1));
    assert!((renderer.view().camera.aspect() - 2.0).abs() < 1e-6);
}

#[test]
fn bundled_normals_scene_renders() {
    init_logging();
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../scenes/normals.json");
    let mut description = SceneDescription::load(path).unwrap();
    description.settings.worker_count = Some(4);
    let setup = build_scene(&description).unwrap();
    assert_eq!(setup.world.len(), 2);

    let display = HeadlessDisplay::new(64, 48, 6);
    let mut renderer = ProgressiveRenderer::new(display, setup.world, setup.camera, &setup.settings);
    renderer.run().unwrap();
    let snapshot = renderer.snapshot();

    // The sphere faces the camera at the image center
    let center = snapshot.radiance_at(32, 24);
    assert!(center.z > 0.9, "center normal color {center:?}");
    assert!((center.x - 0.5).abs() < 0.15 && (center.y - 0.5).abs() < 0.15, "{center:?}");

    // Above the sphere and the grid floor only the black backdrop is seen
    assert_eq!(snapshot.radiance_at(0, 0), Color::ZERO);
}

/// A terminal surface that takes `delay` per shading call, to make worker
/// ticks slow and countable.
struct SlowSurface {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl Material for SlowSurface {
    fn shade(&self, _point: &ShadingPoint, _seed: &mut Seed) -> Shade {
        std::thread::sleep(self.delay);
        self.calls.fetch_add(1, Ordering::Relaxed);
        Shade::terminal(Color::splat(0.5))
    }
}

#[test]
fn free_running_control_is_not_paced_by_workers() {
    init_logging();
    const WIDTH: usize = 4;
    const HEIGHT: usize = 4;
    const CONTROL_TICKS: u64 = 400;

    // The camera sits inside a huge sphere, so every pixel shades once per
    // tick and one worker tick takes at least 16 * 2 ms
    let calls = Arc::new(AtomicUsize::new(0));
    let mut world = World::new();
    world.add(Object::new(
        Box::new(Sphere),
        Arc::new(SlowSurface {
            calls: Arc::clone(&calls),
            delay: Duration::from_millis(2),
        }),
        Transform::from_euler(Vec3::ZERO, Vec3::ZERO, Vec3::splat(100.0)),
    ));

    let settings = RenderSettings {
        converge_after: 1,
        ..settings(1, WIDTH as u32, HEIGHT as u32)
    };
    let display = HeadlessDisplay::new(WIDTH, HEIGHT, CONTROL_TICKS);
    let mut renderer = ProgressiveRenderer::new(display, world, Camera::default(), &settings);
    renderer.run().unwrap();

    assert!(!renderer.scheduler().is_synchronized(), "run must end free-running");
    assert_eq!(renderer.display().ticks(), CONTROL_TICKS);

    let pixels = WIDTH * HEIGHT;
    let worker_ticks = calls.load(Ordering::Relaxed).div_ceil(pixels);
    assert!(
        (worker_ticks as u64) * 10 < CONTROL_TICKS,
        "{} worker ticks for {} control ticks: presenting waited on the workers",
        worker_ticks,
        CONTROL_TICKS
    );
}
