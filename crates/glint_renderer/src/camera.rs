//! Pinhole camera for primary ray generation.

use glint_math::{Ray, Transform, Vec3};

/// Camera looking down its local -Z axis with +Y up.
#[derive(Debug, Clone)]
pub struct Camera {
    pub transform: Transform,
    /// Vertical field of view in degrees
    vertical_fov: f32,
    aspect: f32,

    // Cached half extents of the image plane at distance 1
    half_width: f32,
    half_height: f32,
}

impl Camera {
    /// Create a new camera at `transform`.
    pub fn new(transform: Transform, vertical_fov: f32, aspect: f32) -> Self {
        let mut camera = Self {
            transform,
            vertical_fov,
            aspect,
            half_width: 0.0,
            half_height: 0.0,
        };
        camera.update(vertical_fov, aspect);
        camera
    }

    /// Recompute the image plane, e.g. after a resize.
    pub fn update(&mut self, vertical_fov: f32, aspect: f32) {
        self.vertical_fov = vertical_fov;
        self.aspect = aspect;
        self.half_height = (vertical_fov.to_radians() * 0.5).tan();
        self.half_width = self.half_height * aspect;
    }

    pub fn vertical_fov(&self) -> f32 {
        self.vertical_fov
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Primary ray through image coordinates `u`, `v` in [0, 1], where
    /// `v = 0` is the top row.
    pub fn get_ray(&self, u: f32, v: f32) -> Ray {
        let local = Vec3::new(
            (2.0 * u - 1.0) * self.half_width,
            (1.0 - 2.0 * v) * self.half_height,
            -1.0,
        );
        let direction = (self.transform.linear() * local).normalize();
        Ray::new(self.transform.position(), direction)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Transform::from_position(Vec3::new(0.0, 1.0, 5.0)), 70.0, 800.0 / 608.0)
    }
}
