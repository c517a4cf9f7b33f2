//! Deferred renderer
//!
//! One frame runs these passes in order:
//!
//! 1. **Shadow** (optional): depth-only render from the shadow-casting
//!    directional light into the shadow map.
//! 2. **Geometry**: every render-form draw entry into the G-buffer, with
//!    depth test and write on and blending off. Ambient light is written to
//!    the final target here.
//! 3. The G-buffer surface targets are bound as textures.
//! 4. **Point and spot lights**, one at a time: clear stencil, mark the
//!    light volume in the stencil buffer (back faces increment and front
//!    faces decrement on depth fail), then shade pixels with a non-zero
//!    stencil value additively, drawing the volume's back faces.
//! 5. **Directional lights**: full-screen quad, additive, shadow map bound.
//! 6. **Final**: blit the final target to the default framebuffer.
//!
//! Depth written by the geometry pass is never cleared before the light
//! passes have used it.

use super::api::{
    BlendMode, ClearFlags, CompareFunc, Face, FramebufferTarget, MeshBuffers, RenderBackend,
    StencilOp, TextureKind, UniformValue,
};
use super::camera::Camera;
use super::gbuffer::GBuffer;
use super::light_volumes::{volume_transform, LightVolumes};
use super::lighting::{Light, LightType, LightingEnvironment};
use super::shaders::ShaderPrograms;
use super::shadow::ShadowRenderer;
use super::{RenderError, RenderResult};
use crate::assets::Material;
use crate::core::config::RendererConfig;
use crate::foundation::math::{utils, Mat4Ext, Vec3};
use crate::scene::{Renderform, Scene};

const DIFFUSE_UNIT: u32 = 0;
const SPECULAR_UNIT: u32 = 1;
const NORMAL_UNIT: u32 = 2;
const SHADOW_UNIT: u32 = 3;

/// Counters for one rendered frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Geometry pass draws
    pub draw_calls: usize,
    /// Shadow pass draws
    pub shadow_draw_calls: usize,
    /// Lights shaded (local and directional)
    pub lights_rendered: usize,
    /// Draw entries left out because their node is gone or their GPU
    /// resources could not be bound or drawn
    pub skipped_entries: usize,
    /// Draw entries of culled nodes
    pub culled_entries: usize,
}

/// Deferred shading pipeline and the GPU objects it owns
#[derive(Debug)]
pub struct DeferredRenderer {
    gbuffer: GBuffer,
    shadow: Option<ShadowRenderer>,
    programs: ShaderPrograms,
    volumes: LightVolumes,
    clear_color: [f32; 4],
    released: bool,
}

impl DeferredRenderer {
    /// Compile shaders, upload light volumes and allocate the G-buffer and
    /// (when enabled) the shadow map.
    ///
    /// Shader failures and incomplete framebuffers are returned; whatever was
    /// created before the failure is released.
    pub fn new(backend: &mut dyn RenderBackend, config: &RendererConfig) -> RenderResult<Self> {
        config
            .validate()
            .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;
        log::info!(
            "Initializing deferred renderer on '{}' at {}x{}",
            backend.name(),
            config.width,
            config.height
        );

        let programs = ShaderPrograms::compile(backend)?;

        let volumes = match LightVolumes::create(backend) {
            Ok(volumes) => volumes,
            Err(e) => {
                programs.destroy(backend);
                return Err(e);
            }
        };

        let gbuffer = match GBuffer::new(backend, config.width, config.height) {
            Ok(gbuffer) => gbuffer,
            Err(e) => {
                volumes.destroy(backend);
                programs.destroy(backend);
                return Err(e);
            }
        };

        let shadow = if config.shadows.enabled {
            match ShadowRenderer::new(backend, &config.shadows) {
                Ok(shadow) => Some(shadow),
                Err(e) => {
                    gbuffer.destroy(backend);
                    volumes.destroy(backend);
                    programs.destroy(backend);
                    return Err(e);
                }
            }
        } else {
            None
        };

        Ok(Self {
            gbuffer,
            shadow,
            programs,
            volumes,
            clear_color: config.clear_color,
            released: false,
        })
    }

    /// G-buffer in use
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    /// Shadow renderer, if shadows are enabled
    pub fn shadow(&self) -> Option<&ShadowRenderer> {
        self.shadow.as_ref()
    }

    /// Compiled programs
    pub fn programs(&self) -> &ShaderPrograms {
        &self.programs
    }

    /// Render one frame with transforms interpolated by `alpha`
    pub fn render(
        &mut self,
        backend: &mut dyn RenderBackend,
        scene: &Scene,
        renderform: &Renderform,
        camera: &Camera,
        lights: &LightingEnvironment,
        alpha: f32,
    ) -> RenderResult<FrameStats> {
        if self.released {
            return Err(RenderError::RenderingFailed("renderer has been destroyed".to_string()));
        }
        let mut stats = FrameStats::default();

        // Shadow
        let mut shadow_caster = None;
        if let (Some(shadow), Some(light)) = (self.shadow.as_mut(), lights.shadow_caster()) {
            stats.shadow_draw_calls = shadow.render(
                backend,
                self.programs.shadow_depth,
                scene,
                renderform,
                light,
                camera.target,
                alpha,
            )?;
            shadow_caster = Some(light);
        }

        self.geometry_pass(backend, scene, renderform, camera, lights, alpha, &mut stats)?;

        // G-buffer reads start here
        for (unit, attachment) in GBuffer::SURFACE_TARGETS.iter().enumerate() {
            backend.bind_texture(unit as u32, TextureKind::Texture2D, self.gbuffer.texture(*attachment))?;
        }
        backend.set_draw_buffers(&[GBuffer::FINAL]);

        for light in lights.local_lights() {
            let position = light.resolved_position(scene, alpha);
            self.stencil_pass(backend, light, position, camera)?;
            self.local_light_pass(backend, light, position, camera)?;
            stats.lights_rendered += 1;
        }

        self.directional_pass(backend, lights, shadow_caster, camera, &mut stats)?;

        // Final
        backend.set_blend_mode(BlendMode::Disabled);
        backend.set_depth_state(true, true);
        let size = self.gbuffer.size();
        backend.bind_framebuffer(FramebufferTarget::Both, None);
        backend.blit_to_default(self.gbuffer.handle(), GBuffer::FINAL, size, size)?;

        log::trace!(
            "Frame: {} draw(s), {} light(s), {} skipped",
            stats.draw_calls,
            stats.lights_rendered,
            stats.skipped_entries
        );
        Ok(stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn geometry_pass(
        &self,
        backend: &mut dyn RenderBackend,
        scene: &Scene,
        renderform: &Renderform,
        camera: &Camera,
        lights: &LightingEnvironment,
        alpha: f32,
        stats: &mut FrameStats,
    ) -> RenderResult<()> {
        let (width, height) = self.gbuffer.size();
        backend.bind_framebuffer(FramebufferTarget::Both, Some(self.gbuffer.handle()));
        backend.set_viewport(0, 0, width, height);
        backend.set_color_mask(true);

        // Surface targets clear to zero so empty pixels read as "no geometry"
        backend.set_draw_buffers(&GBuffer::SURFACE_TARGETS);
        backend.clear(ClearFlags::COLOR, [0.0; 4]);
        backend.set_draw_buffers(&[GBuffer::FINAL]);
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH | ClearFlags::STENCIL, self.clear_color);
        backend.set_draw_buffers(&GBuffer::GEOMETRY_TARGETS);

        backend.set_depth_state(true, true);
        backend.set_stencil_test(false);
        backend.set_blend_mode(BlendMode::Disabled);
        backend.set_cull_face(Some(Face::Back));

        backend.use_program(self.programs.geometry)?;
        backend.set_uniform(
            "u_view_projection",
            UniformValue::Mat4(camera.view_projection_matrix().to_cols_array()),
        );
        let ambient = lights.ambient_color * lights.ambient_intensity;
        backend.set_uniform("u_ambient", UniformValue::Vec3(ambient.into()));

        for (name, batch) in renderform {
            if let Err(e) = bind_material(backend, &batch.material) {
                log::warn!(
                    "Skipping {} draw(s) under material '{}': material bind failed: {}",
                    batch.draws.len(),
                    name,
                    e
                );
                stats.skipped_entries += batch.draws.len();
                continue;
            }
            for entry in &batch.draws {
                let Some(node) = scene.node(entry.node) else {
                    log::warn!(
                        "Skipping draw of model '{}' under material '{}': node {:?} no longer exists",
                        entry.model,
                        name,
                        entry.node
                    );
                    stats.skipped_entries += 1;
                    continue;
                };
                if node.culled {
                    stats.culled_entries += 1;
                    continue;
                }
                let model = node.transform.interpolated(alpha);
                backend.set_uniform("u_model", UniformValue::Mat4(model.to_cols_array()));
                if let Err(e) = backend.draw_indexed(entry.vertex_array, entry.index_count) {
                    log::warn!(
                        "Skipping draw of model '{}' under material '{}': {}",
                        entry.model,
                        name,
                        e
                    );
                    stats.skipped_entries += 1;
                    continue;
                }
                stats.draw_calls += 1;
            }
        }
        Ok(())
    }

    fn stencil_pass(
        &self,
        backend: &mut dyn RenderBackend,
        light: &Light,
        position: Vec3,
        camera: &Camera,
    ) -> RenderResult<()> {
        backend.set_stencil_test(true);
        backend.clear(ClearFlags::STENCIL, [0.0; 4]);

        backend.set_color_mask(false);
        backend.set_depth_state(true, false);
        backend.set_cull_face(None);
        backend.set_blend_mode(BlendMode::Disabled);
        backend.set_stencil_func(CompareFunc::Always, 0, 0);
        backend.set_stencil_op(Face::Back, StencilOp::Keep, StencilOp::IncrementWrap, StencilOp::Keep);
        backend.set_stencil_op(Face::Front, StencilOp::Keep, StencilOp::DecrementWrap, StencilOp::Keep);

        backend.use_program(self.programs.stencil)?;
        self.draw_volume(backend, light, position, camera)
    }

    fn local_light_pass(
        &self,
        backend: &mut dyn RenderBackend,
        light: &Light,
        position: Vec3,
        camera: &Camera,
    ) -> RenderResult<()> {
        backend.set_color_mask(true);
        backend.set_stencil_func(CompareFunc::NotEqual, 0, 0xFF);
        backend.set_depth_state(false, false);
        backend.set_blend_mode(BlendMode::Additive);
        backend.set_cull_face(Some(Face::Front));

        let program = match light.light_type {
            LightType::Spot => self.programs.spot_light,
            _ => self.programs.point_light,
        };
        backend.use_program(program)?;
        self.set_shading_uniforms(backend, light, camera);
        backend.set_uniform("u_light_position", UniformValue::Vec3(position.into()));
        backend.set_uniform("u_light_range", UniformValue::Float(light.range));
        if light.light_type == LightType::Spot {
            backend.set_uniform("u_light_direction", UniformValue::Vec3(light.direction.into()));
            let inner = utils::deg_to_rad(light.inner_cone_degrees).cos();
            let outer = utils::deg_to_rad(light.outer_cone_degrees).cos();
            backend.set_uniform("u_inner_cos", UniformValue::Float(inner));
            backend.set_uniform("u_outer_cos", UniformValue::Float(outer));
        }
        self.draw_volume(backend, light, position, camera)
    }

    fn directional_pass(
        &self,
        backend: &mut dyn RenderBackend,
        lights: &LightingEnvironment,
        shadow_caster: Option<&Light>,
        camera: &Camera,
        stats: &mut FrameStats,
    ) -> RenderResult<()> {
        backend.set_stencil_test(false);
        backend.set_color_mask(true);
        backend.set_depth_state(false, false);
        backend.set_cull_face(None);
        backend.set_blend_mode(BlendMode::Additive);

        let shadow = self.shadow.as_ref().filter(|_| shadow_caster.is_some());
        let mut program_bound = false;
        for light in lights.directional_lights() {
            if !program_bound {
                backend.use_program(self.programs.directional_light)?;
                match shadow {
                    Some(shadow) => {
                        backend.bind_texture(SHADOW_UNIT, TextureKind::Texture2D, shadow.depth_texture())?;
                        backend.set_uniform(
                            "u_light_view_projection",
                            UniformValue::Mat4(shadow.light_view_projection().to_cols_array()),
                        );
                    }
                    None => backend.bind_texture(SHADOW_UNIT, TextureKind::Texture2D, None)?,
                }
                program_bound = true;
            }

            let casts = shadow.is_some() && shadow_caster.map_or(false, |caster| std::ptr::eq(caster, light));
            backend.set_uniform("u_has_shadow_map", UniformValue::Int(casts as i32));
            self.set_shading_uniforms(backend, light, camera);
            backend.set_uniform("u_light_direction", UniformValue::Vec3(light.direction.into()));
            draw_mesh(backend, &self.volumes.quad)?;
            stats.lights_rendered += 1;
        }
        Ok(())
    }

    fn set_shading_uniforms(&self, backend: &mut dyn RenderBackend, light: &Light, camera: &Camera) {
        let (width, height) = self.gbuffer.size();
        backend.set_uniform("u_gbuffer_position", UniformValue::Int(0));
        backend.set_uniform("u_gbuffer_normal", UniformValue::Int(1));
        backend.set_uniform("u_gbuffer_albedo_spec", UniformValue::Int(2));
        backend.set_uniform("u_shadow_map", UniformValue::Int(SHADOW_UNIT as i32));
        backend.set_uniform("u_screen_size", UniformValue::Vec2([width as f32, height as f32]));
        backend.set_uniform("u_camera_position", UniformValue::Vec3(camera.position.into()));
        backend.set_uniform("u_light_color", UniformValue::Vec3(light.color.into()));
        backend.set_uniform("u_light_intensity", UniformValue::Float(light.intensity));
    }

    fn draw_volume(
        &self,
        backend: &mut dyn RenderBackend,
        light: &Light,
        position: Vec3,
        camera: &Camera,
    ) -> RenderResult<()> {
        backend.set_uniform(
            "u_view_projection",
            UniformValue::Mat4(camera.view_projection_matrix().to_cols_array()),
        );
        backend.set_uniform(
            "u_model",
            UniformValue::Mat4(volume_transform(light, position).to_cols_array()),
        );
        draw_mesh(backend, self.volumes.for_light(light.light_type))
    }

    /// Recreate the G-buffer at a new size. A zero size (minimized window)
    /// keeps the current G-buffer.
    pub fn resize(&mut self, backend: &mut dyn RenderBackend, width: u32, height: u32) -> RenderResult<()> {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return Ok(());
        }
        if self.gbuffer.size() == (width, height) {
            return Ok(());
        }
        let gbuffer = GBuffer::new(backend, width, height)?;
        self.gbuffer.destroy(backend);
        self.gbuffer = gbuffer;
        log::info!("Renderer resized to {}x{}", width, height);
        Ok(())
    }

    /// Release every GPU object the renderer owns
    pub fn destroy(mut self, backend: &mut dyn RenderBackend) {
        if let Some(shadow) = &self.shadow {
            shadow.destroy(backend);
        }
        self.gbuffer.destroy(backend);
        self.volumes.destroy(backend);
        self.programs.destroy(backend);
        self.released = true;
        log::debug!("Deferred renderer destroyed");
    }
}

impl Drop for DeferredRenderer {
    fn drop(&mut self) {
        if !self.released {
            log::warn!("DeferredRenderer dropped without destroy(); GPU objects leaked");
        }
    }
}

fn bind_material(backend: &mut dyn RenderBackend, material: &Material) -> RenderResult<()> {
    let maps = [
        (DIFFUSE_UNIT, material.diffuse, "u_diffuse_map", "u_has_diffuse_map"),
        (SPECULAR_UNIT, material.specular, "u_specular_map", "u_has_specular_map"),
        (NORMAL_UNIT, material.normal, "u_normal_map", "u_has_normal_map"),
    ];
    for (unit, texture, sampler, flag) in maps {
        backend.bind_texture(unit, TextureKind::Texture2D, texture)?;
        backend.set_uniform(sampler, UniformValue::Int(unit as i32));
        backend.set_uniform(flag, UniformValue::Int(texture.is_some() as i32));
    }
    backend.set_uniform("u_diffuse_color", UniformValue::Vec3(material.diffuse_color));
    backend.set_uniform("u_roughness", UniformValue::Float(material.roughness));
    backend.set_uniform("u_metallic", UniformValue::Float(material.metallic));
    Ok(())
}

fn draw_mesh(backend: &mut dyn RenderBackend, mesh: &MeshBuffers) -> RenderResult<()> {
    backend.draw_indexed(mesh.vertex_array, mesh.index_count)
}
