//! Directional light shadow map
//!
//! One square depth-only framebuffer rendered from an orthographic light
//! frustum centered on a focus point (the camera target). The directional
//! light shader samples it with 3x3 PCF.

use super::api::{
    BlendMode, ClearFlags, DepthAttachment, Face, Framebuffer, FramebufferDesc, FramebufferHandle,
    FramebufferTarget, ProgramHandle, RenderBackend, TextureHandle, UniformValue,
};
use super::gbuffer::create_complete_framebuffer;
use super::lighting::Light;
use super::RenderResult;
use crate::core::config::ShadowConfig;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use crate::scene::{Renderform, Scene};

/// Shadow map and light frustum
#[derive(Debug)]
pub struct ShadowRenderer {
    framebuffer: Framebuffer,
    resolution: u32,
    half_extent: f32,
    depth_range: (f32, f32),
    light_view_projection: Mat4,
}

impl ShadowRenderer {
    /// Allocate the depth map; incompleteness is fatal
    pub fn new(backend: &mut dyn RenderBackend, config: &ShadowConfig) -> RenderResult<Self> {
        let desc = FramebufferDesc {
            label: "shadow_map".to_string(),
            width: config.resolution,
            height: config.resolution,
            color_attachments: Vec::new(),
            depth: DepthAttachment::Depth,
        };
        let framebuffer = create_complete_framebuffer(backend, &desc)?;
        log::info!("Shadow map {}x{}", config.resolution, config.resolution);

        Ok(Self {
            framebuffer,
            resolution: config.resolution,
            half_extent: config.frustum_half_extent,
            depth_range: config.depth_range,
            light_view_projection: Mat4::identity(),
        })
    }

    /// Light view-projection for a light looking at `focus`
    pub fn compute_light_view_projection(&self, light: &Light, focus: Vec3) -> Mat4 {
        let (near, far) = self.depth_range;
        let direction = light.direction.normalize();
        let eye = focus - direction * ((near + far) * 0.5);
        let up = if direction.y.abs() > 0.99 { Vec3::z() } else { Vec3::y() };
        let e = self.half_extent;
        Mat4::orthographic_gl(-e, e, -e, e, near, far) * Mat4::look_at(eye, focus, up)
    }

    /// Render every live draw entry depth-only; returns the draw count.
    ///
    /// Culled nodes still cast shadows. Stale entries and entries whose draw
    /// fails are skipped here and reported by the geometry pass.
    #[allow(clippy::too_many_arguments)]
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        program: ProgramHandle,
        scene: &Scene,
        renderform: &Renderform,
        light: &Light,
        focus: Vec3,
        alpha: f32,
    ) -> RenderResult<usize> {
        self.light_view_projection = self.compute_light_view_projection(light, focus);

        backend.bind_framebuffer(FramebufferTarget::Both, Some(self.framebuffer.handle));
        backend.set_viewport(0, 0, self.resolution, self.resolution);
        backend.set_draw_buffers(&[]);
        backend.set_color_mask(false);
        backend.set_depth_state(true, true);
        backend.set_stencil_test(false);
        backend.set_blend_mode(BlendMode::Disabled);
        // Front-face culling keeps acne off lit surfaces
        backend.set_cull_face(Some(Face::Front));
        backend.clear(ClearFlags::DEPTH, [0.0; 4]);

        backend.use_program(program)?;
        backend.set_uniform(
            "u_light_view_projection",
            UniformValue::Mat4(self.light_view_projection.to_cols_array()),
        );

        let mut draws = 0;
        for batch in renderform.values() {
            for entry in &batch.draws {
                let Some(node) = scene.node(entry.node) else {
                    continue;
                };
                let model = node.transform.interpolated(alpha);
                backend.set_uniform("u_model", UniformValue::Mat4(model.to_cols_array()));
                if let Err(e) = backend.draw_indexed(entry.vertex_array, entry.index_count) {
                    log::debug!("Shadow pass skipping draw of model '{}': {}", entry.model, e);
                    continue;
                }
                draws += 1;
            }
        }

        backend.set_color_mask(true);
        log::trace!("Shadow pass: {} draw(s)", draws);
        Ok(draws)
    }

    /// Framebuffer object
    pub fn handle(&self) -> FramebufferHandle {
        self.framebuffer.handle
    }

    /// Depth texture sampled by the directional light pass
    pub fn depth_texture(&self) -> Option<TextureHandle> {
        self.framebuffer.depth_texture
    }

    /// Matrix used by the most recent [`ShadowRenderer::render`]
    pub fn light_view_projection(&self) -> Mat4 {
        self.light_view_projection
    }

    /// Release the depth map
    pub fn destroy(&self, backend: &mut dyn RenderBackend) {
        backend.delete_framebuffer(&self.framebuffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Point3;
    use crate::render::backends::HeadlessBackend;
    use crate::render::RenderError;
    use approx::assert_relative_eq;

    fn sun() -> Light {
        Light::directional(Vec3::new(0.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 1.0).with_shadows(true)
    }

    #[test]
    fn test_focus_maps_to_center_of_depth_range() {
        let mut backend = HeadlessBackend::new();
        let shadow = ShadowRenderer::new(&mut backend, &ShadowConfig::default()).unwrap();
        let focus = Vec3::new(3.0, 0.0, -2.0);
        let clip = shadow
            .compute_light_view_projection(&sun(), focus)
            .transform_point(&Point3::from(focus));
        assert_relative_eq!(clip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y, 0.0, epsilon = 1e-5);
        assert!(clip.z.abs() < 0.05);
        shadow.destroy(&mut backend);
    }

    #[test]
    fn test_incomplete_shadow_map_is_fatal() {
        let mut backend = HeadlessBackend::new().with_incomplete_framebuffers();
        let err = ShadowRenderer::new(&mut backend, &ShadowConfig::default()).unwrap_err();
        assert!(matches!(err, RenderError::FramebufferIncomplete { ref label, .. } if label == "shadow_map"));
    }

    #[test]
    fn test_depth_map_has_no_color_targets() {
        let mut backend = HeadlessBackend::new();
        let shadow = ShadowRenderer::new(&mut backend, &ShadowConfig::default()).unwrap();
        assert!(shadow.depth_texture().is_some());
        assert_eq!(backend.live_textures(), 1);
        shadow.destroy(&mut backend);
    }
}
