//! Glint math types.
//!
//! Thin layer over glam with the few types every other crate needs:
//! rays, affine poses and scalar intervals.

// Re-export glam for convenience
pub use glam::*;

mod interval;
mod ray;
mod transform;

pub use interval::Interval;
pub use ray::Ray;
pub use transform::Transform;

/// Length of `v`, carrying the sign of its projection onto `dir`.
///
/// Used to report hit depths along a world ray: a point behind the ray
/// origin gets a negative depth even though its distance is positive.
#[inline]
pub fn signed_length(v: Vec3, dir: Vec3) -> f32 {
    v.length().copysign(v.dot(dir))
}
