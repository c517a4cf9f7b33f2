//! Light definitions
//!
//! Lights are plain values owned by the caller (the engine context keeps a
//! [`LightingEnvironment`]). A point or spot light can be anchored to a
//! scene node, usually one in the `Light` category, in which case its
//! position follows that node's interpolated transform.

use crate::foundation::math::{utils, Vec3};
use crate::scene::{NodeId, Scene};

/// Types of lights supported by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Parallel rays lighting the whole screen
    Directional,
    /// Omnidirectional light bounded by a sphere
    Point,
    /// Cone of light bounded by a cone
    Spot,
}

/// Light source
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    /// Light kind
    pub light_type: LightType,
    /// World position (point, spot); ignored when anchored
    pub position: Vec3,
    /// Unit direction (directional, spot)
    pub direction: Vec3,
    /// Linear RGB color
    pub color: Vec3,
    /// Scalar intensity
    pub intensity: f32,
    /// Distance at which the light fades to black (point, spot)
    pub range: f32,
    /// Inner cone half-angle in degrees (spot)
    pub inner_cone_degrees: f32,
    /// Outer cone half-angle in degrees (spot)
    pub outer_cone_degrees: f32,
    /// Whether a directional light renders into the shadow map
    pub casts_shadows: bool,
    /// Node whose position the light follows
    pub anchor: Option<NodeId>,
}

impl Light {
    /// Sun-like light
    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            position: Vec3::zeros(),
            direction: direction.normalize(),
            color,
            intensity,
            range: 0.0,
            inner_cone_degrees: 0.0,
            outer_cone_degrees: 0.0,
            casts_shadows: false,
            anchor: None,
        }
    }

    /// Bulb-like light
    pub fn point(position: Vec3, color: Vec3, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            position,
            direction: Vec3::zeros(),
            color,
            intensity,
            range,
            inner_cone_degrees: 0.0,
            outer_cone_degrees: 0.0,
            casts_shadows: false,
            anchor: None,
        }
    }

    /// Flashlight-like light
    pub fn spot(
        position: Vec3,
        direction: Vec3,
        color: Vec3,
        intensity: f32,
        range: f32,
        inner_cone_degrees: f32,
        outer_cone_degrees: f32,
    ) -> Self {
        Self {
            light_type: LightType::Spot,
            position,
            direction: direction.normalize(),
            color,
            intensity,
            range,
            inner_cone_degrees,
            outer_cone_degrees: outer_cone_degrees.max(inner_cone_degrees),
            casts_shadows: false,
            anchor: None,
        }
    }

    /// Builder pattern: toggle shadow casting
    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }

    /// Builder pattern: follow a scene node
    pub fn anchored_to(mut self, node: NodeId) -> Self {
        self.anchor = Some(node);
        self
    }

    /// True for lights drawn through a stencil-masked volume
    pub fn is_local(&self) -> bool {
        matches!(self.light_type, LightType::Point | LightType::Spot)
    }

    /// Radius of the bounding volume; the shader falls off to zero here
    pub fn volume_radius(&self) -> f32 {
        self.range.max(0.0)
    }

    /// Radius of the spot cone's base at `range`
    pub fn cone_base_radius(&self) -> f32 {
        self.range * utils::deg_to_rad(self.outer_cone_degrees).tan()
    }

    /// Position for this frame: the anchor's interpolated translation, or
    /// the stored position if unanchored or the anchor is gone
    pub fn resolved_position(&self, scene: &Scene, alpha: f32) -> Vec3 {
        match self.anchor.and_then(|id| scene.node(id)) {
            Some(node) => {
                let m = node.transform.interpolated(alpha);
                Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
            }
            None => self.position,
        }
    }
}

/// Set of lights plus ambient term
#[derive(Debug, Clone, PartialEq)]
pub struct LightingEnvironment {
    /// All lights
    pub lights: Vec<Light>,
    /// Ambient color
    pub ambient_color: Vec3,
    /// Ambient intensity
    pub ambient_intensity: f32,
}

impl LightingEnvironment {
    /// Empty environment with dim white ambient
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            ambient_color: Vec3::new(1.0, 1.0, 1.0),
            ambient_intensity: 0.1,
        }
    }

    /// Builder pattern: add a light
    pub fn add_light(mut self, light: Light) -> Self {
        self.lights.push(light);
        self
    }

    /// Builder pattern: set the ambient term
    pub fn with_ambient(mut self, color: Vec3, intensity: f32) -> Self {
        self.ambient_color = color;
        self.ambient_intensity = intensity;
        self
    }

    /// Point and spot lights
    pub fn local_lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter().filter(|l| l.is_local())
    }

    /// Directional lights
    pub fn directional_lights(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter().filter(|l| l.light_type == LightType::Directional)
    }

    /// First directional light that casts shadows
    pub fn shadow_caster(&self) -> Option<&Light> {
        self.directional_lights().find(|l| l.casts_shadows)
    }

    /// Forget lights anchored to nodes that are no longer in `scene`
    pub fn retain_live_anchors(&mut self, scene: &Scene) {
        self.lights
            .retain(|light| light.anchor.map_or(true, |id| scene.contains(id)));
    }

    /// Warm interior: one soft sun plus a bulb
    pub fn indoor_warm() -> Self {
        Self::new()
            .with_ambient(Vec3::new(1.0, 0.9, 0.8), 0.2)
            .add_light(Light::directional(
                Vec3::new(-0.3, -1.0, -0.5),
                Vec3::new(1.0, 0.95, 0.8),
                0.8,
            ))
            .add_light(Light::point(
                Vec3::new(2.0, 3.0, 2.0),
                Vec3::new(1.0, 0.9, 0.7),
                1.0,
                10.0,
            ))
    }

    /// Bright shadow-casting sun
    pub fn outdoor_daylight() -> Self {
        Self::new()
            .with_ambient(Vec3::new(0.5, 0.7, 1.0), 0.3)
            .add_light(
                Light::directional(Vec3::new(-0.2, -1.0, -0.3), Vec3::new(1.0, 1.0, 0.9), 1.0)
                    .with_shadows(true),
            )
    }
}

impl Default for LightingEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeDesc;
    use approx::assert_relative_eq;

    #[test]
    fn test_anchored_light_follows_node() {
        let mut scene = Scene::new();
        let anchor = scene.create_node(NodeDesc::new("lamp")).unwrap();
        scene.snapshot_transforms();
        scene.translate(anchor, Vec3::new(4.0, 0.0, 0.0), false);

        let light = Light::point(Vec3::new(9.0, 9.0, 9.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 5.0).anchored_to(anchor);
        assert_relative_eq!(light.resolved_position(&scene, 0.5), Vec3::new(2.0, 0.0, 0.0));

        scene.remove_node(anchor).unwrap();
        assert_eq!(light.resolved_position(&scene, 0.5), Vec3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_retain_live_anchors() {
        let mut scene = Scene::new();
        let anchor = scene.create_node(NodeDesc::new("lamp")).unwrap();
        let mut env = LightingEnvironment::indoor_warm()
            .add_light(Light::point(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0), 1.0, 3.0).anchored_to(anchor));
        assert_eq!(env.local_lights().count(), 2);

        scene.remove_node(anchor).unwrap();
        env.retain_live_anchors(&scene);
        assert_eq!(env.local_lights().count(), 1);
    }

    #[test]
    fn test_spot_cone_geometry() {
        let spot = Light::spot(Vec3::zeros(), Vec3::new(0.0, -2.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0, 10.0, 20.0, 45.0);
        assert_relative_eq!(spot.direction.norm(), 1.0);
        assert_relative_eq!(spot.cone_base_radius(), 10.0, epsilon = 1e-4);
        assert!(spot.is_local());
    }

    #[test]
    fn test_shadow_caster_selection() {
        assert!(LightingEnvironment::indoor_warm().shadow_caster().is_none());
        assert!(LightingEnvironment::outdoor_daylight().shadow_caster().is_some());
    }
}
