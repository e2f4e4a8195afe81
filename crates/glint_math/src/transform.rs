//! Affine pose: position, orientation and non-uniform scale.
//!
//! The world matrix and the normal matrix are cached and rebuilt on every
//! setter, so readers never see a matrix that disagrees with the components.

use glam::{EulerRot, Mat3, Mat4, Quat, Vec3};

use crate::Ray;

/// Placement of an object or camera in the world.
///
/// Scale components must be non-zero; the normal matrix is the
/// inverse-transpose of the rotation/scale block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    position: Vec3,
    orientation: Quat,
    scale: Vec3,
    matrix: Mat4,
    normal_matrix: Mat3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
        scale: Vec3::ONE,
        matrix: Mat4::IDENTITY,
        normal_matrix: Mat3::IDENTITY,
    };

    /// Create a transform from its components.
    pub fn new(position: Vec3, orientation: Quat, scale: Vec3) -> Self {
        let mut transform = Self {
            position,
            orientation: orientation.normalize(),
            scale,
            matrix: Mat4::IDENTITY,
            normal_matrix: Mat3::IDENTITY,
        };
        transform.rebuild();
        transform
    }

    /// Create a transform from Euler angles in radians (pitch, yaw, roll).
    pub fn from_euler(position: Vec3, euler: Vec3, scale: Vec3) -> Self {
        Self::new(position, euler_to_quat(euler), scale)
    }

    /// Create a transform with only translation.
    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY, Vec3::ONE)
    }

    fn rebuild(&mut self) {
        // Order: Scale -> Rotate -> Translate (SRT)
        self.matrix =
            Mat4::from_scale_rotation_translation(self.scale, self.orientation, self.position);
        self.normal_matrix = Mat3::from_mat4(self.matrix).inverse().transpose();
    }

    /// World matrix.
    #[inline]
    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    /// Inverse-transpose of the upper 3x3 block, for transforming normals.
    #[inline]
    pub fn normal_matrix(&self) -> Mat3 {
        self.normal_matrix
    }

    /// Rotation and scale without translation.
    #[inline]
    pub fn linear(&self) -> Mat3 {
        Mat3::from_mat4(self.matrix)
    }

    /// Inverse of the world matrix. Not cached; callers that need it per
    /// ray keep their own copy.
    pub fn inverse_matrix(&self) -> Mat4 {
        self.matrix.inverse()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.rebuild();
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
        self.rebuild();
    }

    /// Set the orientation from Euler angles in radians (pitch, yaw, roll).
    pub fn set_euler(&mut self, euler: Vec3) {
        self.set_orientation(euler_to_quat(euler));
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.rebuild();
    }

    /// Move in world space.
    pub fn translate(&mut self, translation: Vec3) {
        self.set_position(self.position + translation);
    }

    /// Move along the transform's own (rotated and scaled) axes.
    pub fn translate_local(&mut self, translation: Vec3) {
        self.translate(self.linear() * translation);
    }

    /// Local +Z in world space, scaled.
    pub fn forward(&self) -> Vec3 {
        self.matrix.z_axis.truncate()
    }

    /// Map a local-space ray into world space. The direction is scaled with
    /// the pose, not renormalized.
    pub fn apply(&self, ray: &Ray) -> Ray {
        ray.transformed(&self.matrix)
    }
}

fn euler_to_quat(euler: Vec3) -> Quat {
    Quat::from_euler(EulerRot::YXZ, euler.y, euler.x, euler.z)
}
