//! Perspective camera

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// 3D perspective camera looking at a target point
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Eye position in world space
    pub position: Vec3,
    /// Point the camera looks at
    pub target: Vec3,
    /// Up direction
    pub up: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Width over height
    pub aspect: f32,
    /// Near plane distance
    pub near: f32,
    /// Far plane distance
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(Vec3::new(0.0, 2.0, 8.0), 60.0, 16.0 / 9.0, 0.1, 100.0)
    }
}

impl Camera {
    /// Camera at `position` looking at the origin
    pub fn perspective(position: Vec3, fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            target: Vec3::zeros(),
            up: Vec3::y(),
            fov: utils::deg_to_rad(fov_degrees),
            aspect,
            near,
            far,
        }
    }

    /// Move the eye
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        log::trace!("Camera position updated to: {:?}", position);
    }

    /// Point at `target` with the given up vector
    pub fn look_at(&mut self, target: Vec3, up: Vec3) {
        self.target = target;
        self.up = up;
    }

    /// Update the aspect ratio after a resize
    pub fn set_aspect_ratio(&mut self, aspect: f32) {
        if (self.aspect - aspect).abs() > 0.01 {
            log::debug!("Camera aspect ratio changed: {:.3} -> {:.3}", self.aspect, aspect);
        }
        self.aspect = aspect;
    }

    /// Circle the target at the current distance and height
    pub fn orbit(&mut self, degrees: f32) {
        let offset = self.position - self.target;
        let rotation = utils::euler_degrees_to_rotation(&Vec3::new(0.0, degrees, 0.0));
        self.position = self.target + rotation * offset;
    }

    /// World-to-view matrix
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.target, self.up)
    }

    /// View-to-clip matrix
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_gl(self.fov, self.aspect, self.near, self.far)
    }

    /// World-to-clip matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
