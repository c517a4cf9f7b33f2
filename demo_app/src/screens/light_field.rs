//! Grid of cubes under many moving local lights

use deferred_engine::prelude::*;

use super::{load_common_assets, ShowcaseScreen};

const GRID: i32 = 6;
const SPACING: f32 = 2.5;
const POINT_LIGHTS: usize = 12;
const ORBIT_RADIUS: f32 = 6.0;

pub struct LightFieldScreen {
    elapsed: f32,
    cubes: Vec<NodeId>,
}

impl LightFieldScreen {
    pub const NAME: &'static str = "light_field";

    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            cubes: Vec::new(),
        }
    }

    fn light_position(index: usize, elapsed: f32) -> Vec3 {
        let phase = index as f32 / POINT_LIGHTS as f32 * std::f32::consts::TAU;
        let angle = phase + elapsed * 0.5;
        let radius = ORBIT_RADIUS * (0.6 + 0.4 * (phase * 3.0).sin());
        Vec3::new(angle.cos() * radius, 1.5 + (elapsed + phase).sin() * 0.5, angle.sin() * radius)
    }

    fn light_color(index: usize) -> Vec3 {
        let hue = index as f32 / POINT_LIGHTS as f32 * std::f32::consts::TAU;
        Vec3::new(
            0.5 + 0.5 * hue.cos(),
            0.5 + 0.5 * (hue + 2.094).cos(),
            0.5 + 0.5 * (hue + 4.189).cos(),
        )
    }
}

impl Screen for LightFieldScreen {
    fn on_init(&mut self, ctx: &mut EngineContext) -> Result<(), ScreenError> {
        load_common_assets(ctx)?;
        self.elapsed = 0.0;
        self.cubes.clear();

        let bounds = ctx.models["cube"].bounds();
        ctx.scene.create_node(
            NodeDesc::new("floor")
                .with_model("plane")
                .with_materials(["marble"])
                .with_bounds(ctx.models["plane"].bounds()),
        )?;
        let offset = (GRID - 1) as f32 * SPACING * 0.5;
        for x in 0..GRID {
            for z in 0..GRID {
                let material = if (x + z) % 2 == 0 { "brick" } else { "gold" };
                let transform = Transform::from_parts(
                    Vec3::new(x as f32 * SPACING - offset, 0.5, z as f32 * SPACING - offset),
                    Vec3::zeros(),
                    Vec3::new(1.0, 1.0, 1.0),
                );
                let id = ctx.scene.create_node(
                    NodeDesc::new(format!("cube_{}_{}", x, z))
                        .with_model("cube")
                        .with_materials([material])
                        .with_bounds(bounds)
                        .with_transform(transform),
                )?;
                self.cubes.push(id);
            }
        }

        let mut lights = LightingEnvironment::new().with_ambient(Vec3::new(0.6, 0.6, 0.8), 0.05);
        for i in 0..POINT_LIGHTS {
            lights = lights.add_light(Light::point(Self::light_position(i, 0.0), Self::light_color(i), 1.5, 4.0));
        }
        for (i, x) in [-1.0f32, 1.0].into_iter().enumerate() {
            let position = Vec3::new(x * 8.0, 7.0, 0.0);
            lights = lights.add_light(Light::spot(
                position,
                (Vec3::zeros() - position).normalize(),
                if i == 0 { Vec3::new(1.0, 0.4, 0.3) } else { Vec3::new(0.3, 0.5, 1.0) },
                4.0,
                20.0,
                10.0,
                20.0,
            ));
        }
        ctx.lights = lights;

        ctx.camera.set_position(Vec3::new(0.0, 10.0, 16.0));
        ctx.camera.look_at(Vec3::zeros(), Vec3::y());
        log::info!(
            "Light field built: {} cubes, {} lights",
            self.cubes.len(),
            ctx.lights.lights.len()
        );
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EngineContext, dt: f32) -> ScreenTransition {
        self.elapsed += dt;

        let point_lights = ctx
            .lights
            .lights
            .iter_mut()
            .filter(|light| light.light_type == LightType::Point);
        for (i, light) in point_lights.enumerate() {
            light.position = Self::light_position(i, self.elapsed);
        }
        for (i, id) in self.cubes.iter().enumerate() {
            let spin = if i % 2 == 0 { 45.0 } else { -45.0 };
            ctx.scene.rotate_y(*id, spin * dt, false);
        }
        ScreenTransition::None
    }

    fn on_event(&mut self, _ctx: &mut EngineContext, event: &InputEvent) -> ScreenTransition {
        match event {
            InputEvent::Key { key: KeyCode::Tab, pressed: true } => {
                ScreenTransition::Switch(ShowcaseScreen::NAME.to_string())
            }
            InputEvent::Key { key: KeyCode::Escape, pressed: true } => ScreenTransition::Quit,
            _ => ScreenTransition::None,
        }
    }

    fn on_shutdown(&mut self, _ctx: &mut EngineContext) {
        self.cubes.clear();
    }
}
