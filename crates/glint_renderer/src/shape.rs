//! Canonical local-space shapes.
//!
//! Every shape lives at the origin of its own frame with a fixed size; the
//! owning [`Object`](crate::Object) carries the pose. Intersection receives a
//! ray already mapped into local space with a unit-length direction.

use glint_math::{Ray, Vec3};

/// Parallel-ray threshold for the plane test.
const PLANE_EPSILON: f32 = 1e-8;

/// Local-space intersection result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalHit {
    /// Hit point in the shape's frame
    pub position: Vec3,
    /// Whether the ray approached from the side the outward normal faces
    pub front_facing: bool,
}

/// Geometry that can be intersected in its own frame.
pub trait Shape: Send + Sync {
    /// Intersect a local-space ray with unit direction.
    ///
    /// Returns `None` when there is no hit. Hits behind the ray origin may be
    /// reported; the caller filters them by depth.
    fn intersect(&self, ray: &Ray) -> Option<LocalHit>;

    /// Outward geometric normal at a local hit position (not necessarily unit
    /// length).
    fn normal(&self, local_position: Vec3) -> Vec3;
}

impl Shape for Box<dyn Shape> {
    fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        (**self).intersect(ray)
    }

    fn normal(&self, local_position: Vec3) -> Vec3 {
        (**self).normal(local_position)
    }
}

/// Unit sphere centered at the local origin.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sphere;

impl Shape for Sphere {
    fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        let oc = ray.origin;
        let a = 1.0;
        let half_b = oc.dot(ray.direction);
        let c = oc.dot(oc) - 1.0;

        let discriminant = half_b * half_b - a * c;
        if discriminant < 0.0 {
            return None;
        }

        // Outside: nearer root. Inside: the far root is the exit point.
        let front_facing = oc.length_squared() >= 1.0;
        let sqrt_d = discriminant.sqrt();
        let root = if front_facing {
            (-half_b - sqrt_d) / a
        } else {
            (-half_b + sqrt_d) / a
        };

        Some(LocalHit {
            position: ray.at(root),
            front_facing,
        })
    }

    fn normal(&self, local_position: Vec3) -> Vec3 {
        local_position
    }
}

/// Infinite plane at local Y=0, facing -Y.
#[derive(Debug, Clone, Copy, Default)]
pub struct Plane;

impl Shape for Plane {
    fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        // dot(normal, direction) with normal = -Y
        let cos_theta = -ray.direction.y;
        if cos_theta.abs() < PLANE_EPSILON {
            return None;
        }

        let t = ray.origin.y / cos_theta;
        Some(LocalHit {
            position: ray.at(t),
            front_facing: cos_theta < 0.0,
        })
    }

    fn normal(&self, _local_position: Vec3) -> Vec3 {
        Vec3::NEG_Y
    }
}

/// The local Y=0 plane clipped to [-1, 1] on X and Z.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rectangle;

impl Shape for Rectangle {
    fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        Plane.intersect(ray).filter(|hit| {
            (-1.0..=1.0).contains(&hit.position.x) && (-1.0..=1.0).contains(&hit.position.z)
        })
    }

    fn normal(&self, local_position: Vec3) -> Vec3 {
        Plane.normal(local_position)
    }
}

/// Keeps only hits where the ray approaches the front face.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleSided<S>(pub S);

impl<S: Shape> Shape for SingleSided<S> {
    fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        self.0.intersect(ray).filter(|hit| hit.front_facing)
    }

    fn normal(&self, local_position: Vec3) -> Vec3 {
        self.0.normal(local_position)
    }
}

/// Swaps front and back: the facing flag and the outward normal are both
/// inverted, so the inside of a closed shape behaves like its outside.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inverted<S>(pub S);

impl<S: Shape> Shape for Inverted<S> {
    fn intersect(&self, ray: &Ray) -> Option<LocalHit> {
        self.0.intersect(ray).map(|hit| LocalHit {
            front_facing: !hit.front_facing,
            ..hit
        })
    }

    fn normal(&self, local_position: Vec3) -> Vec3 {
        -self.0.normal(local_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn test_sphere_from_outside_takes_smaller_root() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let hit = Sphere.intersect(&ray).unwrap();

        assert!(hit.front_facing);
        assert!(approx(hit.position, Vec3::new(0.0, 0.0, 1.0)), "got {:?}", hit.position);
    }

    #[test]
    fn test_sphere_from_inside_takes_larger_root() {
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
        let hit = Sphere.intersect(&ray).unwrap();

        assert!(!hit.front_facing);
        assert!(approx(hit.position, Vec3::Y), "got {:?}", hit.position);
    }

    #[test]
    fn test_sphere_roots_match_quadratic() {
        // Off-axis ray: o = (0.3, 0.2, 4), d = -Z
        let origin = Vec3::new(0.3, 0.2, 4.0);
        let ray = Ray::new(origin, Vec3::NEG_Z);
        let hit = Sphere.intersect(&ray).unwrap();

        let half_b = origin.dot(Vec3::NEG_Z);
        let c = origin.length_squared() - 1.0;
        let t = -half_b - (half_b * half_b - c).sqrt();
        assert!(approx(hit.position, ray.at(t)));
        assert!((hit.position.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_on_surface_counts_as_outside() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::NEG_Z);
        let hit = Sphere.intersect(&ray).unwrap();
        assert!(hit.front_facing, "|oc|^2 == 1 is front facing");
    }

    #[test]
    fn test_sphere_miss() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z);
        assert!(Sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_plane_facing() {
        // From below, approaching the -Y face
        let below = Plane
            .intersect(&Ray::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y))
            .unwrap();
        assert!(below.front_facing);
        assert!(approx(below.position, Vec3::ZERO));

        // From above, hitting the back
        let above = Plane
            .intersect(&Ray::new(Vec3::new(1.0, 3.0, 0.0), Vec3::NEG_Y))
            .unwrap();
        assert!(!above.front_facing);
        assert!(approx(above.position, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_plane_parallel_ray_misses() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert!(Plane.intersect(&ray).is_none());
    }

    #[test]
    fn test_rectangle_clips_to_unit_square() {
        let inside = Ray::new(Vec3::new(0.9, 1.0, -0.9), Vec3::NEG_Y);
        let outside = Ray::new(Vec3::new(1.1, 1.0, 0.0), Vec3::NEG_Y);

        assert!(Rectangle.intersect(&inside).is_some());
        assert!(Rectangle.intersect(&outside).is_none());
    }

    #[test]
    fn test_single_sided_drops_back_hits() {
        let shape = SingleSided(Plane);
        assert!(shape.intersect(&Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_Y)).is_none());
        assert!(shape.intersect(&Ray::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y)).is_some());
    }

    #[test]
    fn test_inverted_flips_facing_and_normal() {
        let shape = Inverted(Sphere);
        let hit = shape
            .intersect(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z))
            .unwrap();

        assert!(!hit.front_facing);
        assert!(approx(shape.normal(hit.position), Vec3::NEG_Z));
    }

    #[test]
    fn test_single_sided_inverted_sphere_only_hit_from_inside() {
        let shell = SingleSided(Inverted(Sphere));
        assert!(shell.intersect(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)).is_none());
        assert!(shell.intersect(&Ray::new(Vec3::ZERO, Vec3::X)).is_some());
    }

    #[test]
    fn test_boxed_shape_delegates() {
        let boxed: Box<dyn Shape> = Box::new(Rectangle);
        let wrapped = SingleSided(boxed);
        assert!(wrapped.intersect(&Ray::new(Vec3::new(0.0, -1.0, 0.0), Vec3::Y)).is_some());
    }
}
