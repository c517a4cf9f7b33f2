//! Pedestal scene loaded from JSON, lit by a shadow-casting sun, a bobbing
//! lamp and a spot light

use deferred_engine::prelude::*;

use super::{load_common_assets, LightFieldScreen};

const SCENE: &str = include_str!("../../resources/scenes/showcase.json");

/// Degrees per second
const PEDESTAL_SPIN: f32 = 30.0;
const CAMERA_ORBIT: f32 = 4.0;

pub struct ShowcaseScreen {
    elapsed: f32,
    pedestal: Option<NodeId>,
    lamp: Option<NodeId>,
}

impl ShowcaseScreen {
    pub const NAME: &'static str = "showcase";

    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            pedestal: None,
            lamp: None,
        }
    }

    fn toggle_hidden_crate(&self, ctx: &mut EngineContext) {
        let Some(id) = ctx.scene.find_node_by_uuid("hidden_crate") else {
            return;
        };
        if let Some(node) = ctx.scene.node_mut(id) {
            node.culled = !node.culled;
            log::info!("Hidden crate culled: {}", node.culled);
        }
    }
}

impl Screen for ShowcaseScreen {
    fn on_init(&mut self, ctx: &mut EngineContext) -> Result<(), ScreenError> {
        load_common_assets(ctx)?;

        let desc = SceneDesc::from_json(SCENE)?;
        SceneFactory::new(&ctx.models).build(&mut ctx.scene, &desc)?;
        log::info!("Showcase scene built with {} objects", desc.object_count());

        let lamp = ctx
            .scene
            .find_node_by_uuid("lamp")
            .ok_or_else(|| ScreenError::InitializationFailed {
                screen: Self::NAME.to_string(),
                reason: "scene has no lamp node".to_string(),
            })?;
        self.lamp = Some(lamp);
        self.pedestal = ctx.scene.find_node_by_uuid("pedestal");
        self.elapsed = 0.0;

        ctx.lights = LightingEnvironment::outdoor_daylight()
            .add_light(Light::point(Vec3::zeros(), Vec3::new(1.0, 0.8, 0.6), 2.0, 8.0).anchored_to(lamp))
            .add_light(Light::spot(
                Vec3::new(0.0, 6.0, 6.0),
                Vec3::new(0.0, -1.0, -1.0).normalize(),
                Vec3::new(0.6, 0.7, 1.0),
                3.0,
                15.0,
                15.0,
                25.0,
            ));

        ctx.camera.set_position(Vec3::new(0.0, 4.0, 12.0));
        ctx.camera.look_at(Vec3::new(0.0, 1.0, 0.0), Vec3::y());
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut EngineContext, dt: f32) -> ScreenTransition {
        self.elapsed += dt;

        if let Some(pedestal) = self.pedestal {
            ctx.scene.rotate_y(pedestal, PEDESTAL_SPIN * dt, true);
        }
        if let Some(lamp) = self.lamp {
            // Velocity of a sine bob
            let dy = (self.elapsed * 2.0).cos() * dt;
            ctx.scene.translate(lamp, Vec3::new(0.0, dy, 0.0), false);
        }
        ctx.camera.orbit(CAMERA_ORBIT * dt);
        ScreenTransition::None
    }

    fn on_event(&mut self, ctx: &mut EngineContext, event: &InputEvent) -> ScreenTransition {
        match event {
            InputEvent::Key { key: KeyCode::Tab, pressed: true } => {
                ScreenTransition::Switch(LightFieldScreen::NAME.to_string())
            }
            InputEvent::Key { key: KeyCode::Escape, pressed: true } => ScreenTransition::Quit,
            InputEvent::Key { key: KeyCode::C, pressed: true } => {
                self.toggle_hidden_crate(ctx);
                ScreenTransition::None
            }
            _ => ScreenTransition::None,
        }
    }

    fn on_shutdown(&mut self, _ctx: &mut EngineContext) {
        self.pedestal = None;
        self.lamp = None;
        log::debug!("Showcase ran for {:.1}s", self.elapsed);
    }
}
