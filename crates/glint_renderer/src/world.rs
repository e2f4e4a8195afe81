//! Scene container and the recursive path tracer.
//!
//! Nearest-hit search is a linear scan in insertion order. Each object is
//! tested against a range that shrinks to the closest depth found so far.

use glint_math::{Interval, Ray, Vec3};

use crate::environment::Environment;
use crate::material::{Color, ShadingPoint};
use crate::object::{HitInfo, Object};
use crate::rng::Seed;

/// Default distance a scattered ray is pushed off the surface it left.
pub const DEFAULT_RAY_EPSILON: f32 = 0.005;

/// Outcome of tracing one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// World hit position (zero on a miss)
    pub position: Vec3,
    /// Shading normal (zero on a miss)
    pub normal: Vec3,
    /// Attenuation for the continuation, or direct color of a terminal hit
    pub attenuation: Color,
    /// Emitted light at the hit; the backdrop radiance on a miss
    pub emission: Color,
    /// Continuation ray, already offset by the ray epsilon
    pub scattered: Option<Ray>,
}

/// All objects plus the environment. Populated before rendering and
/// read-only afterwards.
pub struct World {
    objects: Vec<Object>,
    environment: Environment,
    ray_epsilon: f32,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Create a new empty world with the default sky gradient.
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            environment: Environment::default(),
            ray_epsilon: DEFAULT_RAY_EPSILON,
        }
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn set_ray_epsilon(&mut self, epsilon: f32) {
        self.ray_epsilon = epsilon;
    }

    /// Add an object. The world owns it until it is dropped.
    pub fn add(&mut self, object: Object) {
        self.objects.push(object);
    }

    /// Get the number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check if the world is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    /// Nearest hit with depth inside `range`.
    ///
    /// The bound shrinks to each hit's depth but stays inclusive, so on equal
    /// depth the object added later wins.
    pub fn closest_hit(&self, ray: &Ray, range: Interval) -> Option<HitInfo<'_>> {
        let mut closest: Option<HitInfo<'_>> = None;
        let mut closest_so_far = range.max;

        for object in &self.objects {
            if let Some(hit) = object.intersect(ray, range.with_max(closest_so_far)) {
                closest_so_far = hit.depth;
                closest = Some(hit);
            }
        }

        closest
    }

    /// Trace one segment: nearest hit, then the material's response.
    ///
    /// A miss yields the backdrop as emission with no continuation.
    pub fn trace_single(&self, ray: &Ray, range: Interval, seed: &mut Seed) -> TraceResult {
        let Some(hit) = self.closest_hit(ray, range) else {
            return TraceResult {
                position: Vec3::ZERO,
                normal: Vec3::ZERO,
                attenuation: Color::ZERO,
                emission: self.environment.sample(ray.direction),
                scattered: None,
            };
        };

        let point = ShadingPoint {
            position: hit.position,
            normal: hit.object.normal(&hit),
            incoming: ray.direction,
            front_facing: hit.front_facing,
        };
        let material = hit.object.material();
        let shade = material.shade(&point, seed);
        let emission = material.emission(&point, seed);

        TraceResult {
            position: point.position,
            normal: point.normal,
            attenuation: shade.attenuation,
            emission,
            scattered: shade.scattered.map(|r| r.nudged(self.ray_epsilon)),
        }
    }

    /// Radiance along `ray`, following at most `depth` segments.
    ///
    /// `depth <= 0` is black. A path that ends without scattering returns
    /// its emission plus the material's direct color.
    pub fn raytrace(&self, ray: &Ray, depth: i32, seed: &mut Seed) -> Color {
        if depth <= 0 {
            return Color::ZERO;
        }

        let result = self.trace_single(ray, Interval::FORWARD, seed);
        match result.scattered {
            Some(scattered) => {
                result.emission + result.attenuation * self.raytrace(&scattered, depth - 1, seed)
            }
            None => result.emission + result.attenuation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Emissive, Lambertian, Material, NormalDebug};
    use crate::shape::{Plane, Sphere};
    use glint_math::Transform;
    use std::sync::Arc;

    fn add(world: &mut World, shape: Box<dyn crate::Shape>, material: Arc<dyn Material>, at: Vec3) {
        world.add(Object::new(shape, material, Transform::from_position(at)));
    }

    #[test]
    fn test_depth_zero_is_black() {
        let mut world = World::new().with_environment(Environment::Solid(Color::ONE));
        add(&mut world, Box::new(Sphere), Arc::new(Emissive::new(Color::ONE, 10.0)), Vec3::NEG_Z * 3.0);

        let mut seed = Seed::default();
        for direction in [Vec3::NEG_Z, Vec3::Y, Vec3::X] {
            let ray = Ray::new(Vec3::ZERO, direction);
            assert_eq!(world.raytrace(&ray, 0, &mut seed), Color::ZERO);
            assert_eq!(world.raytrace(&ray, -3, &mut seed), Color::ZERO);
        }
    }

    #[test]
    fn test_miss_returns_backdrop() {
        let world = World::new().with_environment(Environment::Solid(Color::new(0.1, 0.2, 0.3)));
        let mut seed = Seed::default();

        let result = world.trace_single(&Ray::new(Vec3::ZERO, Vec3::X), Interval::FORWARD, &mut seed);
        assert!(result.scattered.is_none());
        assert_eq!(result.emission, Color::new(0.1, 0.2, 0.3));
        assert_eq!(world.raytrace(&Ray::new(Vec3::ZERO, Vec3::X), 4, &mut seed), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_nearest_hit_wins_regardless_of_order() {
        let far: Arc<dyn Material> = Arc::new(Emissive::new(Color::X, 1.0));
        let near: Arc<dyn Material> = Arc::new(Emissive::new(Color::Y, 1.0));

        let mut world = World::new();
        add(&mut world, Box::new(Sphere), far, Vec3::new(0.0, 0.0, -10.0));
        add(&mut world, Box::new(Sphere), near, Vec3::new(0.0, 0.0, -4.0));

        let mut seed = Seed::default();
        let color = world.raytrace(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), 4, &mut seed);
        assert_eq!(color, Color::Y);

        let hit = world.closest_hit(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), Interval::FORWARD).unwrap();
        assert!((hit.depth - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_equal_depth_goes_to_later_object() {
        let first: Arc<dyn Material> = Arc::new(Emissive::new(Color::X, 1.0));
        let second: Arc<dyn Material> = Arc::new(Emissive::new(Color::Y, 1.0));

        let mut world = World::new();
        add(&mut world, Box::new(Sphere), first, Vec3::new(0.0, 0.0, -4.0));
        add(&mut world, Box::new(Sphere), second, Vec3::new(0.0, 0.0, -4.0));

        let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
        let hit = world.closest_hit(&ray, Interval::FORWARD).unwrap();
        assert!(std::ptr::eq(hit.object, &world.objects()[1]));

        let mut seed = Seed::default();
        assert_eq!(world.raytrace(&ray, 4, &mut seed), Color::Y);
    }

    #[test]
    fn test_terminal_material_returns_direct_color() {
        let mut world = World::new();
        add(&mut world, Box::new(Sphere), Arc::new(NormalDebug), Vec3::new(0.0, 0.0, -3.0));

        let mut seed = Seed::default();
        let color = world.raytrace(&Ray::new(Vec3::ZERO, Vec3::NEG_Z), 4, &mut seed);
        assert!((color - Color::new(0.5, 0.5, 1.0)).length() < 1e-5, "{:?}", color);
    }

    #[test]
    fn test_scattered_origin_is_offset() {
        let mut world = World::new();
        world.set_ray_epsilon(0.01);
        add(&mut world, Box::new(Plane), Arc::new(Lambertian::new(Color::ONE)), Vec3::ZERO);

        let mut seed = Seed::default();
        // From below, hitting the plane's front face
        let result = world.trace_single(&Ray::new(Vec3::NEG_Y, Vec3::Y), Interval::FORWARD, &mut seed);
        let scattered = result.scattered.unwrap();
        let expected = result.position + scattered.direction * 0.01;
        assert!((scattered.origin - expected).length() < 1e-6);
        assert!(scattered.origin.y < 0.0, "offset must leave the surface on the ray's side");
    }

    #[test]
    fn test_lambertian_under_white_sky_is_albedo_bounded() {
        // Floor under a uniform white sky: every bounce escapes or hits the
        // floor again, so the estimate never exceeds 1 and is at least albedo^depth.
        let mut world = World::new().with_environment(Environment::Solid(Color::ONE));
        world.add(Object::new(
            Box::new(Plane),
            Arc::new(Lambertian::new(Color::splat(0.5))),
            Transform::from_euler(Vec3::ZERO, Vec3::new(std::f32::consts::PI, 0.0, 0.0), Vec3::ONE),
        ));

        let mut seed = Seed::default();
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, -1.0, -1.0).normalize());
        for _ in 0..100 {
            let c = world.raytrace(&ray, 4, &mut seed);
            assert!(c.x <= 0.5 + 1e-5 && c.x >= 0.0625 - 1e-5, "{:?}", c);
        }
    }
}
