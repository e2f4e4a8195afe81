//! Placed geometry: a shape, a pose and a material.
//!
//! Rays are tested in the shape's local frame by mapping them through the
//! cached inverse pose. Hits are mapped back to world space and ranked by
//! the signed distance along the *world* ray, so objects with different
//! non-uniform scales stay comparable.

use std::sync::Arc;

use glint_math::{signed_length, Interval, Mat4, Ray, Transform, Vec3};

use crate::material::Material;
use crate::shape::Shape;

/// One scene object. Immutable once added to a [`World`](crate::World).
pub struct Object {
    shape: Box<dyn Shape>,
    material: Arc<dyn Material>,
    transform: Transform,
    inverse: Mat4,
}

/// A ray/object intersection, valid for the duration of one trace.
#[derive(Clone, Copy)]
pub struct HitInfo<'a> {
    /// Signed distance from the world ray origin along its direction
    pub depth: f32,
    /// World-space hit point
    pub position: Vec3,
    /// Hit point in the object's frame
    pub local_position: Vec3,
    pub front_facing: bool,
    pub object: &'a Object,
    /// The world ray mapped into the object's frame
    pub local_ray: Ray,
}

impl Object {
    /// Place `shape` with `transform`. Scale components must be non-zero.
    pub fn new(shape: Box<dyn Shape>, material: Arc<dyn Material>, transform: Transform) -> Self {
        Self {
            shape,
            material,
            inverse: transform.inverse_matrix(),
            transform,
        }
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn material(&self) -> &dyn Material {
        self.material.as_ref()
    }

    /// Intersect a world-space ray, keeping only hits whose depth lies in
    /// `range` (inclusive).
    pub fn intersect(&self, ray: &Ray, range: Interval) -> Option<HitInfo<'_>> {
        let local_ray = ray.transformed(&self.inverse).normalized();
        let local = self.shape.intersect(&local_ray)?;

        let position = self.transform.matrix().transform_point3(local.position);
        let depth = signed_length(position - ray.origin, ray.direction);
        if !range.contains(depth) {
            return None;
        }

        Some(HitInfo {
            depth,
            position,
            local_position: local.position,
            front_facing: local.front_facing,
            object: self,
            local_ray,
        })
    }

    /// World-space unit normal at a hit, flipped to the side the ray came
    /// from when the hit is not front facing.
    pub fn normal(&self, hit: &HitInfo<'_>) -> Vec3 {
        let normal = (self.transform.normal_matrix() * self.shape.normal(hit.local_position))
            .normalize_or_zero();
        if hit.front_facing {
            normal
        } else {
            -normal
        }
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("transform", &self.transform)
            .finish_non_exhaustive()
    }
}
