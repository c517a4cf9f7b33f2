//! Deferred pipeline ordering tests against the headless command log

use super::api::{ClearFlags, CompareFunc, Face, StencilOp, TextureHandle, VertexArrayHandle};
use super::*;
use crate::assets::{ImageData, MaterialDesc, MaterialStore, ModelData, ModelStore, TextureStore};
use crate::core::config::RendererConfig;
use crate::foundation::math::Vec3;
use crate::scene::{NodeDesc, NodeId, RenderformCreator, Scene};

struct Fixture {
    backend: HeadlessBackend,
    models: ModelStore,
    materials: MaterialStore,
    scene: Scene,
    renderform: RenderformCreator,
    renderer: Option<DeferredRenderer>,
    camera: Camera,
}

impl Fixture {
    fn new(config: RendererConfig) -> Self {
        let mut backend = HeadlessBackend::new();
        let renderer = DeferredRenderer::new(&mut backend, &config).unwrap();

        let mut models = ModelStore::new();
        models.load("cube", &ModelData::cube(), &mut backend).unwrap();
        let mut materials = MaterialStore::new();
        materials
            .load("brick", &MaterialDesc::from_color([0.6, 0.2, 0.1]), &TextureStore::new())
            .unwrap();
        backend.take_commands();

        Self {
            backend,
            models,
            materials,
            scene: Scene::new(),
            renderform: RenderformCreator::new(),
            renderer: Some(renderer),
            camera: Camera::default(),
        }
    }

    fn with_cubes(mut self, count: usize) -> Self {
        for i in 0..count {
            let desc = NodeDesc::new(format!("cube{}", i)).with_model("cube").with_materials(["brick"]);
            self.scene.create_node(desc).unwrap();
        }
        self.sync();
        self
    }

    fn sync(&mut self) {
        let updates = self.scene.pull_updates();
        self.renderform
            .update(&updates, &self.scene, &self.models, &self.materials)
            .unwrap();
    }

    fn renderer(&self) -> &DeferredRenderer {
        self.renderer.as_ref().unwrap()
    }

    fn render(&mut self, lights: &LightingEnvironment) -> (FrameStats, Vec<Command>) {
        self.backend.take_commands();
        let stats = self
            .renderer
            .as_mut()
            .unwrap()
            .render(
                &mut self.backend,
                &self.scene,
                self.renderform.renderform(),
                &self.camera,
                lights,
                1.0,
            )
            .unwrap();
        (stats, self.backend.take_commands())
    }

    fn cube_vertex_array(&self) -> VertexArrayHandle {
        self.models["cube"].meshes()[0].buffers.vertex_array
    }

    fn gbuffer_textures(&self) -> Vec<TextureHandle> {
        GBuffer::SURFACE_TARGETS
            .iter()
            .filter_map(|a| self.renderer().gbuffer().texture(*a))
            .collect()
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.destroy(&mut self.backend);
        }
        self.models.clear(&mut self.backend);
    }
}

fn no_shadows() -> RendererConfig {
    RendererConfig::new(320, 240).with_shadows(false)
}

fn white() -> Vec3 {
    Vec3::new(1.0, 1.0, 1.0)
}

fn point_lights(count: usize) -> LightingEnvironment {
    (0..count).fold(LightingEnvironment::new(), |env, i| {
        env.add_light(Light::point(Vec3::new(i as f32, 2.0, 0.0), white(), 1.0, 5.0))
    })
}

fn positions(commands: &[Command], pred: impl Fn(&Command) -> bool) -> Vec<usize> {
    commands
        .iter()
        .enumerate()
        .filter(|(_, c)| pred(c))
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn test_geometry_pass_precedes_gbuffer_reads() {
    let mut fx = Fixture::new(no_shadows()).with_cubes(3);
    let cube = fx.cube_vertex_array();
    let gbuffer_textures = fx.gbuffer_textures();
    let (stats, commands) = fx.render(&point_lights(2));
    assert_eq!(stats.draw_calls, 3);

    let geometry_draws = positions(&commands, |c| {
        matches!(c, Command::DrawIndexed { vertex_array, .. } if *vertex_array == cube)
    });
    let gbuffer_reads = positions(&commands, |c| {
        matches!(c, Command::BindTexture { texture: Some(t), .. } if gbuffer_textures.contains(t))
    });
    assert_eq!(geometry_draws.len(), 3);
    assert_eq!(gbuffer_reads.len(), 3);
    assert!(geometry_draws.iter().max() < gbuffer_reads.iter().min());
}

#[test]
fn test_stencil_is_cleared_before_every_local_light() {
    let mut fx = Fixture::new(no_shadows()).with_cubes(1);
    let lights = point_lights(2).add_light(Light::spot(
        Vec3::new(0.0, 4.0, 0.0),
        Vec3::new(0.0, -1.0, 0.0),
        white(),
        1.0,
        8.0,
        15.0,
        30.0,
    ));
    let (stats, commands) = fx.render(&lights);
    assert_eq!(stats.lights_rendered, 3);

    let stencil_clears = positions(&commands, |c| *c == Command::Clear(ClearFlags::STENCIL));
    assert_eq!(stencil_clears.len(), 3);

    // Each clear is followed by exactly a stencil draw and a light draw
    let cube = fx.cube_vertex_array();
    let volume_draws = positions(&commands, |c| {
        matches!(c, Command::DrawIndexed { vertex_array, .. } if *vertex_array != cube)
    });
    for (n, clear) in stencil_clears.iter().enumerate() {
        let next_clear = stencil_clears.get(n + 1).copied().unwrap_or(usize::MAX);
        let draws_between = volume_draws.iter().filter(|d| **d > *clear && **d < next_clear).count();
        assert_eq!(draws_between, 2, "light {} should draw its volume twice", n);
    }
}

#[test]
fn test_depth_is_not_cleared_between_geometry_and_lights() {
    let mut fx = Fixture::new(no_shadows()).with_cubes(2);
    let lights = point_lights(3).add_light(Light::directional(Vec3::new(0.0, -1.0, 0.0), white(), 0.5));
    let (_, commands) = fx.render(&lights);

    let cube = fx.cube_vertex_array();
    let last_geometry = *positions(&commands, |c| {
        matches!(c, Command::DrawIndexed { vertex_array, .. } if *vertex_array == cube)
    })
    .last()
    .unwrap();
    let blit = positions(&commands, |c| matches!(c, Command::BlitToDefault { .. }))[0];

    let depth_clears = positions(&commands, |c| matches!(c, Command::Clear(f) if f.contains(ClearFlags::DEPTH)));
    assert_eq!(depth_clears.len(), 1);
    assert!(depth_clears[0] < last_geometry);
    assert!(last_geometry < blit);
}

#[test]
fn test_stencil_and_light_pass_state() {
    let mut fx = Fixture::new(no_shadows()).with_cubes(1);
    let (_, commands) = fx.render(&point_lights(1));

    let clear = positions(&commands, |c| *c == Command::Clear(ClearFlags::STENCIL))[0];
    let after = &commands[clear..];
    let expect_in_order = [
        Command::ColorMask(false),
        Command::DepthState { test: true, write: false },
        Command::CullFace(None),
        Command::StencilFunc { func: CompareFunc::Always, reference: 0, mask: 0 },
        Command::StencilOp {
            face: Face::Back,
            stencil_fail: StencilOp::Keep,
            depth_fail: StencilOp::IncrementWrap,
            pass: StencilOp::Keep,
        },
        Command::StencilOp {
            face: Face::Front,
            stencil_fail: StencilOp::Keep,
            depth_fail: StencilOp::DecrementWrap,
            pass: StencilOp::Keep,
        },
        Command::ColorMask(true),
        Command::StencilFunc { func: CompareFunc::NotEqual, reference: 0, mask: 0xFF },
        Command::DepthState { test: false, write: false },
        Command::Blend(api::BlendMode::Additive),
        Command::CullFace(Some(Face::Front)),
    ];

    let mut cursor = 0;
    for expected in &expect_in_order {
        let found = after[cursor..]
            .iter()
            .position(|c| c == expected)
            .unwrap_or_else(|| panic!("{:?} missing or out of order", expected));
        cursor += found + 1;
    }
}

#[test]
fn test_final_target_is_blitted_last() {
    let mut fx = Fixture::new(no_shadows()).with_cubes(1);
    let (_, commands) = fx.render(&LightingEnvironment::new());
    let gbuffer = fx.renderer().gbuffer().handle();
    assert_eq!(
        commands.last(),
        Some(&Command::BlitToDefault { source: gbuffer, attachment: GBuffer::FINAL })
    );
}

#[test]
fn test_shadow_pass_runs_first_for_a_shadow_caster() {
    let mut fx = Fixture::new(RendererConfig::new(320, 240)).with_cubes(2);
    let shadow_fb = fx.renderer().shadow().unwrap().handle();
    let gbuffer_fb = fx.renderer().gbuffer().handle();
    let (stats, commands) = fx.render(&LightingEnvironment::outdoor_daylight());
    assert_eq!(stats.shadow_draw_calls, 2);

    let binds: Vec<_> = commands
        .iter()
        .filter_map(|c| match c {
            Command::BindFramebuffer { framebuffer, .. } => Some(*framebuffer),
            _ => None,
        })
        .collect();
    assert_eq!(binds, vec![Some(shadow_fb), Some(gbuffer_fb), None]);

    let depth_texture = fx.renderer().shadow().unwrap().depth_texture();
    assert!(commands.iter().any(|c| *c == Command::BindTexture { unit: 3, texture: depth_texture }));
}

#[test]
fn test_no_shadow_pass_without_caster() {
    let mut fx = Fixture::new(RendererConfig::new(320, 240)).with_cubes(1);
    let shadow_fb = fx.renderer().shadow().unwrap().handle();
    let (stats, commands) = fx.render(&LightingEnvironment::indoor_warm());
    assert_eq!(stats.shadow_draw_calls, 0);
    assert!(!commands
        .iter()
        .any(|c| *c == Command::BindFramebuffer { target: api::FramebufferTarget::Both, framebuffer: Some(shadow_fb) }));
}

#[test]
fn test_stale_entry_is_skipped() {
    let mut fx = Fixture::new(no_shadows()).with_cubes(2);
    let gone: NodeId = fx.scene.find_node_by_uuid("cube0").unwrap();
    fx.scene.remove_node(gone).unwrap();
    // Render-form not yet synced, so its entry is stale

    let (stats, _) = fx.render(&LightingEnvironment::new());
    assert_eq!(stats.skipped_entries, 1);
    assert_eq!(stats.draw_calls, 1);

    fx.sync();
    let (stats, _) = fx.render(&LightingEnvironment::new());
    assert_eq!(stats.skipped_entries, 0);
}

#[test]
fn test_entries_with_released_meshes_are_skipped() {
    let mut fx = Fixture::new(RendererConfig::new(320, 240)).with_cubes(2);
    fx.models.clear(&mut fx.backend);

    let (stats, commands) = fx.render(&LightingEnvironment::outdoor_daylight());
    assert_eq!(stats.skipped_entries, 2);
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(stats.shadow_draw_calls, 0);
    assert!(stats.lights_rendered > 0);
    assert!(matches!(commands.last(), Some(Command::BlitToDefault { .. })));
}

#[test]
fn test_batch_with_unbindable_material_is_skipped() {
    let mut fx = Fixture::new(no_shadows()).with_cubes(1);
    let mut textures = TextureStore::new();
    let handle = textures
        .load("crate_wood", &ImageData::solid_color(2, 2, [120, 80, 40, 255]), &mut fx.backend)
        .unwrap()
        .handle;
    fx.materials
        .load("wood", &MaterialDesc::from_color([1.0; 3]).with_diffuse_texture("crate_wood"), &textures)
        .unwrap();
    for uuid in ["crate_a", "crate_b"] {
        fx.scene
            .create_node(NodeDesc::new(uuid).with_model("cube").with_materials(["wood"]))
            .unwrap();
    }
    fx.sync();
    fx.backend.delete_texture(handle);

    let (stats, _) = fx.render(&point_lights(1));
    assert_eq!(stats.skipped_entries, 2);
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.lights_rendered, 1);
    textures.clear(&mut fx.backend);
}

#[test]
fn test_culled_nodes_skip_geometry_but_cast_shadows() {
    let mut fx = Fixture::new(RendererConfig::new(320, 240)).with_cubes(2);
    let id = fx.scene.find_node_by_uuid("cube1").unwrap();
    fx.scene.node_mut(id).unwrap().culled = true;

    let (stats, _) = fx.render(&LightingEnvironment::outdoor_daylight());
    assert_eq!(stats.draw_calls, 1);
    assert_eq!(stats.culled_entries, 1);
    assert_eq!(stats.shadow_draw_calls, 2);
}

#[test]
fn test_incomplete_framebuffer_is_fatal_at_construction() {
    let mut backend = HeadlessBackend::new().with_incomplete_framebuffers();
    let err = DeferredRenderer::new(&mut backend, &no_shadows()).unwrap_err();
    assert!(matches!(err, RenderError::FramebufferIncomplete { .. }));
    assert_eq!(backend.live_programs(), 0);
    assert_eq!(backend.live_meshes(), 0);
    assert_eq!(backend.live_framebuffers(), 0);
}

#[test]
fn test_shader_failure_is_fatal_at_construction() {
    let mut backend = HeadlessBackend::new().with_shader_failure("directional");
    let err = DeferredRenderer::new(&mut backend, &no_shadows()).unwrap_err();
    assert!(matches!(err, RenderError::ShaderCompilation { .. }));
    assert_eq!(backend.live_programs(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let mut backend = HeadlessBackend::new();
    let err = DeferredRenderer::new(&mut backend, &RendererConfig::new(0, 240)).unwrap_err();
    assert!(matches!(err, RenderError::InitializationFailed(_)));
}

#[test]
fn test_resize_recreates_gbuffer() {
    let mut fx = Fixture::new(no_shadows());
    let before = fx.renderer().gbuffer().handle();
    let framebuffers = fx.backend.live_framebuffers();

    let renderer = fx.renderer.as_mut().unwrap();
    renderer.resize(&mut fx.backend, 800, 600).unwrap();
    assert_eq!(renderer.gbuffer().size(), (800, 600));
    assert_ne!(renderer.gbuffer().handle(), before);
    assert_eq!(fx.backend.live_framebuffers(), framebuffers);

    // Minimized windows report a zero size
    renderer.resize(&mut fx.backend, 0, 0).unwrap();
    assert_eq!(renderer.gbuffer().size(), (800, 600));
}

#[test]
fn test_destroy_releases_everything() {
    let mut backend = HeadlessBackend::new();
    let renderer = DeferredRenderer::new(&mut backend, &RendererConfig::new(64, 64)).unwrap();
    renderer.destroy(&mut backend);
    assert_eq!(backend.live_programs(), 0);
    assert_eq!(backend.live_meshes(), 0);
    assert_eq!(backend.live_framebuffers(), 0);
    assert_eq!(backend.live_textures(), 0);
}

#[test]
fn test_anchored_light_uses_interpolated_node_position() {
    let mut fx = Fixture::new(no_shadows());
    fx.backend = std::mem::take(&mut fx.backend).with_uniform_recording();
    let lamp = fx.scene.create_node(NodeDesc::new("lamp")).unwrap();
    fx.scene.snapshot_transforms();
    fx.scene.translate(lamp, Vec3::new(0.0, 6.0, 0.0), false);

    let lights = LightingEnvironment::new()
        .add_light(Light::point(Vec3::zeros(), white(), 1.0, 4.0).anchored_to(lamp));
    let (_, commands) = fx.render(&lights);
    assert!(commands.iter().any(|c| *c
        == Command::Uniform {
            name: "u_light_position".to_string(),
            value: api::UniformValue::Vec3([0.0, 6.0, 0.0]),
        }));
}
