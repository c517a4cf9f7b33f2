//! # Deferred Engine
//!
//! A small real-time 3D engine built around a scene graph and a deferred
//! shading renderer.
//!
//! ## Features
//!
//! - **Scene Graph**: arena-owned nodes with parent-propagated transform edits
//!   and double-buffered transforms for interpolated rendering
//! - **Render-form**: draw lists grouped by material, kept in sync with the
//!   scene incrementally
//! - **Deferred Rendering**: G-buffer, stencil-masked light volumes and a
//!   directional shadow pass over a backend-agnostic GPU interface
//! - **Asset Stores**: models, textures, cube maps and materials by name
//! - **Screens**: game states driven by a fixed-step loop
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deferred_engine::prelude::*;
//!
//! struct Showcase;
//!
//! impl Screen for Showcase {
//!     fn on_init(&mut self, ctx: &mut EngineContext) -> Result<(), ScreenError> {
//!         ctx.models.load("cube", &ModelData::cube(), ctx.backend.as_mut())?;
//!         ctx.materials.load("red", &MaterialDesc::from_color([0.8, 0.1, 0.1]), &ctx.textures)?;
//!         ctx.scene.create_node(NodeDesc::new("cube").with_model("cube").with_materials(["red"]))?;
//!         ctx.lights = LightingEnvironment::outdoor_daylight();
//!         Ok(())
//!     }
//!
//!     fn on_update(&mut self, ctx: &mut EngineContext, dt: f32) -> ScreenTransition {
//!         if let Some(cube) = ctx.scene.find_node_by_uuid("cube") {
//!             ctx.scene.rotate_y(cube, 45.0 * dt, true);
//!         }
//!         ScreenTransition::None
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::new(ApplicationConfig::default(), Box::new(HeadlessBackend::new()))?;
//!     engine.register_screen("showcase", Box::new(Showcase))?;
//!     engine.switch_screen("showcase")?;
//!     while engine.is_running() {
//!         engine.frame(1.0 / 60.0)?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions, clippy::too_many_arguments)]

// Core engine modules
pub mod core;
pub mod config;
pub mod foundation;

pub mod assets;
pub mod audio;
pub mod input;
pub mod render;
pub mod scene;

pub mod engine;
pub mod screen;

pub use engine::{Engine, EngineContext, EngineError};
pub use screen::{Screen, ScreenError, ScreenManager, ScreenTransition};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        Engine, EngineContext, EngineError,
        Screen, ScreenError, ScreenManager, ScreenTransition,
        foundation::{
            math::{Mat4, Vec3},
            time::{FixedTimestep, Timer},
        },
        assets::{
            CubemapStore, ImageData, MaterialDesc, MaterialStore, ModelData, ModelStore,
            TextureStore,
        },
        audio::{AudioSystem, PlaybackHandle, SoundBuffer},
        input::{InputEvent, InputState, KeyCode, MouseButton},
        render::{
            Camera, DeferredRenderer, FrameStats, HeadlessBackend, Light, LightType,
            LightingEnvironment, RenderBackend,
        },
        scene::{
            NodeCategory, NodeDesc, NodeId, Scene, SceneDesc, SceneFactory, RenderformCreator,
            Transform, AABB,
        },
        core::config::{ApplicationConfig, Config, EngineConfig, RendererConfig, ShadowConfig},
    };
}
