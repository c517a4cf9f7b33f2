//! Axis-aligned bounding box with a local and world representation

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

/// Axis-Aligned Bounding Box
///
/// The local box is set once from mesh geometry; the cached box is the
/// world-space box recomputed from the owning node's transform every tick.
/// All accessors except [`AABB::local_min`]/[`AABB::local_max`] read the
/// cached box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    local_min: Vec3,
    local_max: Vec3,
    cached_min: Vec3,
    cached_max: Vec3,
}

impl Default for AABB {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl AABB {
    /// Create a box from local min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            local_min: min,
            local_max: max,
            cached_min: min,
            cached_max: max,
        }
    }

    /// Smallest box enclosing all `points`; `None` for an empty iterator
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec3>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p)));
        Some(Self::new(min, max))
    }

    /// Smallest box enclosing both boxes' local extents
    pub fn merged(&self, other: &AABB) -> Self {
        Self::new(self.local_min.inf(&other.local_min), self.local_max.sup(&other.local_max))
    }

    /// Recompute the world box from translation, per-axis scale and Euler
    /// rotation in degrees (`Rz * Ry * Rx`).
    ///
    /// The eight local corners are scaled, rotated and translated, and the
    /// cached box is re-derived as their enclosing box. Without rotation this
    /// is `local * scale + translation` per axis.
    pub fn update(&mut self, translation: &Vec3, scale: &Vec3, rotation_degrees: &Vec3) {
        let rotation = utils::euler_degrees_to_rotation(rotation_degrees).to_homogeneous();
        let matrix = Mat4::new_translation(translation) * rotation * Mat4::new_nonuniform_scaling(scale);
        self.update_from_matrix(&matrix);
    }

    /// Recompute the world box as the enclosing box of the local corners
    /// transformed by `model`
    pub fn update_from_matrix(&mut self, model: &Mat4) {
        let mut min = Vec3::repeat(f32::INFINITY);
        let mut max = Vec3::repeat(f32::NEG_INFINITY);
        for corner in self.local_corners() {
            let world = model.transform_point(&Point3::from(corner)).coords;
            min = min.inf(&world);
            max = max.sup(&world);
        }

        self.cached_min = min;
        self.cached_max = max;
    }

    fn local_corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.local_min, self.local_max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// World minimum X
    pub fn min_x(&self) -> f32 {
        self.cached_min.x
    }

    /// World minimum Y
    pub fn min_y(&self) -> f32 {
        self.cached_min.y
    }

    /// World minimum Z
    pub fn min_z(&self) -> f32 {
        self.cached_min.z
    }

    /// World maximum X
    pub fn max_x(&self) -> f32 {
        self.cached_max.x
    }

    /// World maximum Y
    pub fn max_y(&self) -> f32 {
        self.cached_max.y
    }

    /// World maximum Z
    pub fn max_z(&self) -> f32 {
        self.cached_max.z
    }

    /// World minimum corner
    pub fn min_point(&self) -> Vec3 {
        self.cached_min
    }

    /// World maximum corner
    pub fn max_point(&self) -> Vec3 {
        self.cached_max
    }

    /// Local minimum corner (model space)
    pub fn local_min(&self) -> Vec3 {
        self.local_min
    }

    /// Local maximum corner (model space)
    pub fn local_max(&self) -> Vec3 {
        self.local_max
    }

    /// Center of the world box
    pub fn center(&self) -> Vec3 {
        (self.cached_min + self.cached_max) * 0.5
    }

    /// Half-size of the world box
    pub fn extents(&self) -> Vec3 {
        (self.cached_max - self.cached_min) * 0.5
    }

    /// Check if the world box contains a point
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.cached_min.x
            && point.x <= self.cached_max.x
            && point.y >= self.cached_min.y
            && point.y <= self.cached_max.y
            && point.z >= self.cached_min.z
            && point.z <= self.cached_max.z
    }

    /// Check if two world boxes overlap
    pub fn intersects(&self, other: &AABB) -> bool {
        self.cached_min.x <= other.cached_max.x
            && self.cached_max.x >= other.cached_min.x
            && self.cached_min.y <= other.cached_max.y
            && self.cached_max.y >= other.cached_min.y
            && self.cached_min.z <= other.cached_max.z
            && self.cached_max.z >= other.cached_min.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> AABB {
        AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_translate_scale_without_rotation() {
        let mut aabb = unit_box();
        aabb.update(&Vec3::new(5.0, 0.0, 0.0), &Vec3::new(2.0, 2.0, 2.0), &Vec3::zeros());

        assert_eq!(aabb.min_point(), Vec3::new(3.0, -2.0, -2.0));
        assert_eq!(aabb.max_point(), Vec3::new(7.0, 2.0, 2.0));
        // Local box is untouched
        assert_eq!(aabb.local_min(), Vec3::new(-1.0, -1.0, -1.0));
    }

    #[test]
    fn test_rotation_encloses_rotated_corners() {
        let mut aabb = AABB::new(Vec3::new(-2.0, -1.0, -1.0), Vec3::new(2.0, 1.0, 1.0));
        aabb.update(&Vec3::zeros(), &Vec3::new(1.0, 1.0, 1.0), &Vec3::new(0.0, 0.0, 90.0));

        // Long axis now lies along Y
        assert_relative_eq!(aabb.max_x(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.max_y(), 2.0, epsilon = 1e-5);
        assert_relative_eq!(aabb.min_y(), -2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_matrix_update_follows_rotated_frame() {
        // Translating after a quarter turn about Z moves along world +Y
        let model = Mat4::new_rotation(Vec3::z() * std::f32::consts::FRAC_PI_2)
            * Mat4::new_translation(&Vec3::new(5.0, 0.0, 0.0));
        let mut aabb = unit_box();
        aabb.update_from_matrix(&model);

        assert_relative_eq!(aabb.center(), Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(aabb.extents(), Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-5);
        assert!(aabb.contains_point(Vec3::new(0.0, 5.0, 0.0)));
        assert!(!aabb.contains_point(Vec3::new(5.0, 0.0, 0.0)));
    }

    #[test]
    fn test_negative_scale_keeps_min_below_max() {
        let mut aabb = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        aabb.update(&Vec3::zeros(), &Vec3::new(-1.0, 1.0, 1.0), &Vec3::zeros());
        assert_eq!(aabb.min_x(), -1.0);
        assert_eq!(aabb.max_x(), 0.0);
    }

    #[test]
    fn test_from_points() {
        let aabb = AABB::from_points(vec![
            Vec3::new(1.0, -3.0, 0.0),
            Vec3::new(-2.0, 0.5, 4.0),
        ])
        .unwrap();
        assert_eq!(aabb.min_point(), Vec3::new(-2.0, -3.0, 0.0));
        assert_eq!(aabb.max_point(), Vec3::new(1.0, 0.5, 4.0));
        assert!(AABB::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_contains_and_intersects() {
        let a = unit_box();
        let b = AABB::new(Vec3::new(0.5, 0.5, 0.5), Vec3::new(3.0, 3.0, 3.0));
        let c = AABB::new(Vec3::new(5.0, 5.0, 5.0), Vec3::new(7.0, 7.0, 7.0));

        assert!(a.contains_point(Vec3::zeros()));
        assert!(!a.contains_point(Vec3::new(2.0, 0.0, 0.0)));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
