use crate::{Mat4, Vec3};

/// A ray in 3D space: a starting point and a direction.
///
/// The direction is not required to be unit length. Local-space
/// intersection tests need a unit direction, so callers mapping a ray into a
/// shape's frame follow [`Ray::transformed`] with [`Ray::normalized`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Map the ray through an affine matrix.
    ///
    /// The origin is transformed as a point, the direction as a vector
    /// (no translation). The direction keeps whatever length the matrix
    /// gives it, so mapping through a matrix and its inverse restores the
    /// original ray.
    #[inline]
    pub fn transformed(&self, matrix: &Mat4) -> Ray {
        Ray {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Same origin, unit-length direction.
    #[inline]
    pub fn normalized(&self) -> Ray {
        Ray {
            origin: self.origin,
            direction: self.direction.normalize(),
        }
    }

    /// Same direction, origin pushed `distance` along it.
    #[inline]
    pub fn nudged(&self, distance: f32) -> Ray {
        Ray {
            origin: self.at(distance),
            direction: self.direction,
        }
    }
}
