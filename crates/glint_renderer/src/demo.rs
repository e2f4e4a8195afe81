//! Built-in scenes, selectable by name from the viewer.

use std::f32::consts::{FRAC_PI_2, PI};
use std::sync::Arc;

use glint_core::RenderSettings;
use glint_math::{Transform, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::camera::Camera;
use crate::environment::Environment;
use crate::material::{Color, Dielectric, Emissive, Lambertian, Material, Metallic, Portal};
use crate::object::Object;
use crate::scene::SceneSetup;
use crate::shape::{Inverted, Plane, Rectangle, SingleSided, Sphere};
use crate::world::World;

/// Names accepted by [`by_name`], default first.
pub const NAMES: &[&str] = &["showcase", "emissive_floor"];

/// Seed for the scattered small spheres, so the showcase looks the same on
/// every run
const SCATTER_SEED: u64 = 7;

pub fn by_name(name: &str, settings: &RenderSettings) -> Option<SceneSetup> {
    match name {
        "showcase" => Some(showcase(settings)),
        "emissive_floor" => Some(emissive_floor(settings)),
        _ => None,
    }
}

fn camera_for(settings: &RenderSettings, transform: Transform) -> Camera {
    let aspect = settings.width.max(1) as f32 / settings.height.max(1) as f32;
    Camera::new(transform, settings.vertical_fov, aspect)
}

/// Y=0 plane turned to face +Y.
fn floor() -> Transform {
    Transform::from_euler(Vec3::ZERO, Vec3::new(PI, 0.0, 0.0), Vec3::ONE)
}

fn sphere(center: Vec3, radius: f32) -> Transform {
    Transform::new(center, Default::default(), Vec3::splat(radius))
}

/// A lit floor with a hollow glass ball, a rough mirror, a portal pair and
/// a field of small random spheres.
pub fn showcase(settings: &RenderSettings) -> SceneSetup {
    let mut world = World::new();
    world.set_ray_epsilon(settings.ray_epsilon);

    let ground: Arc<dyn Material> = Arc::new(Lambertian::new(Color::splat(0.5)));
    world.add(Object::new(Box::new(Plane), ground, floor()));

    let lamp: Arc<dyn Material> = Arc::new(Emissive::new(Color::new(1.0, 0.9, 0.75), 4.0));
    world.add(Object::new(Box::new(Sphere), lamp, sphere(Vec3::new(-1.5, 3.5, -2.0), 0.7)));

    // Hollow glass: the inner surface is inverted so rays inside the shell
    // see it as glass-to-air
    let glass: Arc<dyn Material> = Arc::new(Dielectric::new(1.5));
    let center = Vec3::new(0.0, 1.0, 0.0);
    world.add(Object::new(Box::new(Sphere), glass.clone(), sphere(center, 1.0)));
    world.add(Object::new(Box::new(Inverted(Sphere)), glass, sphere(center, 0.9)));

    let metal: Arc<dyn Material> = Arc::new(Metallic::new(Color::new(0.8, 0.7, 0.6), 0.3));
    world.add(Object::new(Box::new(Sphere), metal, sphere(Vec3::new(2.3, 0.8, -0.5), 0.8)));

    // Two upright single-sided rectangles facing the camera; looking into
    // either one shows the view behind the other
    let left = Transform::from_euler(Vec3::new(-3.5, 1.2, -3.0), Vec3::new(-FRAC_PI_2, 0.0, 0.0), Vec3::splat(0.8));
    let right = Transform::from_euler(Vec3::new(3.5, 1.2, -3.0), Vec3::new(-FRAC_PI_2, 0.0, 0.0), Vec3::splat(0.8));
    world.add(Object::new(
        Box::new(SingleSided(Rectangle)),
        Arc::new(Portal::new(&left, &right)),
        left,
    ));
    world.add(Object::new(
        Box::new(SingleSided(Rectangle)),
        Arc::new(Portal::new(&right, &left)),
        right,
    ));

    let mut rng = StdRng::seed_from_u64(SCATTER_SEED);
    for a in -5..5 {
        for b in -5..2 {
            let center = Vec3::new(
                a as f32 + 0.9 * rng.gen::<f32>(),
                0.2,
                b as f32 + 0.9 * rng.gen::<f32>(),
            );
            let clear_of_main = [Vec3::new(0.0, 0.2, 0.0), Vec3::new(2.3, 0.2, -0.5)]
                .iter()
                .all(|c| (center - *c).length() > 1.3);
            if !clear_of_main {
                continue;
            }

            let choose: f32 = rng.gen();
            let material: Arc<dyn Material> = if choose < 0.8 {
                let albedo = Color::new(
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                    rng.gen::<f32>() * rng.gen::<f32>(),
                );
                Arc::new(Lambertian::new(albedo))
            } else if choose < 0.95 {
                let albedo = Color::new(
                    rng.gen_range(0.5..1.0),
                    rng.gen_range(0.5..1.0),
                    rng.gen_range(0.5..1.0),
                );
                Arc::new(Metallic::new(albedo, rng.gen_range(0.0..0.5)))
            } else {
                Arc::new(Dielectric::new(1.5))
            };
            world.add(Object::new(Box::new(Sphere), material, sphere(center, 0.2)));
        }
    }

    let camera = camera_for(
        settings,
        Transform::from_euler(Vec3::new(0.0, 1.6, 6.0), Vec3::new(-0.15, 0.0, 0.0), Vec3::ONE),
    );

    SceneSetup {
        world,
        camera,
        settings: settings.clone(),
    }
}

/// One emissive sphere above one diffuse floor, under a dim uniform sky,
/// seen from 30 degrees above the horizon. The top rows are empty sky.
pub fn emissive_floor(settings: &RenderSettings) -> SceneSetup {
    let mut world = World::new().with_environment(Environment::Solid(Color::splat(0.1)));
    world.set_ray_epsilon(settings.ray_epsilon);

    world.add(Object::new(
        Box::new(Plane),
        Arc::new(Lambertian::new(Color::splat(0.5))),
        floor(),
    ));
    world.add(Object::new(
        Box::new(Sphere),
        Arc::new(Emissive::new(Color::ONE, 2.0)),
        sphere(Vec3::new(0.0, 1.5, -3.0), 0.75),
    ));

    let camera = camera_for(
        settings,
        Transform::from_euler(Vec3::new(0.0, 3.0, 3.0), Vec3::new(-PI / 6.0, 0.0, 0.0), Vec3::ONE),
    );

    SceneSetup {
        world,
        camera,
        settings: settings.clone(),
    }
}
