//! Double-buffered node transform
//!
//! Every scene node owns one [`Transform`]. Mutations are *relative*: each
//! call post-multiplies onto the running matrix, so moving after a rotation
//! moves along the rotated axes. The matrix of the previous simulation tick is
//! kept so the renderer can blend between the two states.

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Per-node affine state plus the previous tick's matrix
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// Accumulated translation
    position: Vec3,

    /// Accumulated per-axis scale factors
    scale: Vec3,

    /// Accumulated rotation about X, in degrees
    pitch: f32,

    /// Accumulated rotation about Y, in degrees
    yaw: f32,

    /// Accumulated rotation about Z, in degrees
    roll: f32,

    /// Current model matrix
    matrix: Mat4,

    /// Model matrix at the start of the current tick
    previous: Mat4,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Identity transform; previous equals current
    pub fn identity() -> Self {
        Self {
            position: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            matrix: Mat4::identity(),
            previous: Mat4::identity(),
        }
    }

    /// Build a transform by translating, rotating about X/Y/Z (degrees) and
    /// scaling, in that order. The previous matrix matches the result so the
    /// first interpolated frame does not blend from identity.
    pub fn from_parts(position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        let mut transform = Self::identity();
        transform.translate(position);
        transform.rotate_x(rotation_degrees.x);
        transform.rotate_y(rotation_degrees.y);
        transform.rotate_z(rotation_degrees.z);
        transform.scale(scale);
        transform.previous = transform.matrix;
        transform
    }

    /// Move by `delta` in the transform's current local frame
    pub fn translate(&mut self, delta: Vec3) {
        self.position += delta;
        self.matrix *= Mat4::new_translation(&delta);
    }

    /// Rotate about the local X axis
    pub fn rotate_x(&mut self, degrees: f32) {
        self.pitch += degrees;
        self.matrix *= Mat4::rotation_x(utils::deg_to_rad(degrees));
    }

    /// Rotate about the local Y axis
    pub fn rotate_y(&mut self, degrees: f32) {
        self.yaw += degrees;
        self.matrix *= Mat4::rotation_y(utils::deg_to_rad(degrees));
    }

    /// Rotate about the local Z axis
    pub fn rotate_z(&mut self, degrees: f32) {
        self.roll += degrees;
        self.matrix *= Mat4::rotation_z(utils::deg_to_rad(degrees));
    }

    /// Scale componentwise by `factor`
    pub fn scale(&mut self, factor: Vec3) {
        self.scale.component_mul_assign(&factor);
        self.matrix *= Mat4::new_nonuniform_scaling(&factor);
    }

    /// Snapshot the current matrix as the previous-tick state.
    ///
    /// Call once per fixed tick, before that tick's mutations.
    pub fn update(&mut self) {
        self.previous = self.matrix;
    }

    /// Linear blend `previous + (current - previous) * alpha`.
    ///
    /// This is a componentwise matrix blend, not a rotation-aware one; large
    /// per-tick rotations shear slightly mid-blend. Alpha is not clamped.
    pub fn interpolated(&self, alpha: f32) -> Mat4 {
        utils::lerp_matrix(&self.previous, &self.matrix, alpha)
    }

    /// Accumulated translation
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Accumulated scale factors
    pub fn scale_factors(&self) -> Vec3 {
        self.scale
    }

    /// Accumulated rotation as (pitch, yaw, roll) in degrees
    pub fn rotation_degrees(&self) -> Vec3 {
        Vec3::new(self.pitch, self.yaw, self.roll)
    }

    /// Current model matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Model matrix of the previous tick
    pub fn previous_matrix(&self) -> &Mat4 {
        &self.previous
    }
}
