//! Core engine implementation
//!
//! [`Engine`] owns the [`EngineContext`] (GPU backend, stores, scene,
//! render-form, renderer, camera, lights, audio) and the [`ScreenManager`],
//! and drives both with a fixed-step loop:
//!
//! ```text
//! frame(dt):
//!   for each due tick:
//!     scene.snapshot_transforms()
//!     active_screen.on_update(ctx, step)
//!     scene.refresh_bounds()
//!     renderform.update(scene.pull_updates())
//!   audio.update()
//!   active_screen.on_render(ctx, alpha)
//!   renderer.render(..., alpha)
//! ```

use thiserror::Error;

use crate::assets::{AssetError, CubemapStore, MaterialStore, ModelStore, TextureStore};
use crate::audio::AudioSystem;
use crate::core::config::{ApplicationConfig, ConfigError};
use crate::foundation::time::{FixedTimestep, Timer};
use crate::input::{InputEvent, InputState};
use crate::render::{
    Camera, DeferredRenderer, FrameStats, LightingEnvironment, RenderBackend, RenderError,
};
use crate::scene::{RenderformCreator, RenderformError, Scene};
use crate::screen::{Screen, ScreenError, ScreenManager, ScreenTransition};

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine initialization failed
    #[error("Engine initialization failed: {0}")]
    InitializationFailed(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rendering failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Screen setup or switching failed
    #[error("Screen error: {0}")]
    Screen(#[from] ScreenError),

    /// Asset loading failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Everything a screen can touch
pub struct EngineContext {
    /// GPU command seam
    pub backend: Box<dyn RenderBackend>,
    /// Uploaded models
    pub models: ModelStore,
    /// Uploaded 2D textures
    pub textures: TextureStore,
    /// Uploaded cube maps
    pub cubemaps: CubemapStore,
    /// Resolved materials
    pub materials: MaterialStore,
    /// Scene graph
    pub scene: Scene,
    /// Material-grouped draw lists
    pub renderform: RenderformCreator,
    /// Deferred renderer, `None` after shutdown
    pub renderer: Option<DeferredRenderer>,
    /// View camera
    pub camera: Camera,
    /// Lights of the current scene
    pub lights: LightingEnvironment,
    /// Sound playback
    pub audio: AudioSystem,
    /// Keyboard and mouse state
    pub input: InputState,
    /// Configuration the engine was built with
    pub config: ApplicationConfig,
}

impl EngineContext {
    /// Build the renderer on `backend` and empty stores
    pub fn new(mut backend: Box<dyn RenderBackend>, config: ApplicationConfig) -> Result<Self, EngineError> {
        let renderer = DeferredRenderer::new(backend.as_mut(), &config.renderer)
            .map_err(|e| EngineError::InitializationFailed(format!("Renderer: {}", e)))?;

        let mut camera = Camera::default();
        camera.set_aspect_ratio(config.renderer.width as f32 / config.renderer.height as f32);

        Ok(Self {
            backend,
            models: ModelStore::new(),
            textures: TextureStore::new(),
            cubemaps: CubemapStore::new(),
            materials: MaterialStore::new(),
            scene: Scene::new(),
            renderform: RenderformCreator::new(),
            renderer: Some(renderer),
            camera,
            lights: LightingEnvironment::new(),
            audio: AudioSystem::silent(),
            input: InputState::new(),
            config,
        })
    }

    /// Fold the pending scene deltas into the render-form
    pub fn sync_renderform(&mut self) -> Result<(), RenderformError> {
        if !self.scene.has_pending_updates() {
            return Ok(());
        }
        let updates = self.scene.pull_updates();
        self.renderform
            .update(&updates, &self.scene, &self.models, &self.materials)
    }

    /// Drop every node, draw entry and light. Stores keep their assets.
    pub fn reset_scene(&mut self) {
        self.scene.clear();
        let _ = self.scene.pull_updates();
        self.renderform.clear();
        self.lights = LightingEnvironment::new();
        self.audio.stop_all();
    }

    /// Render the current state at interpolation factor `alpha`
    pub fn render(&mut self, alpha: f32) -> Result<FrameStats, RenderError> {
        let renderer = self
            .renderer
            .as_mut()
            .ok_or_else(|| RenderError::RenderingFailed("renderer has been shut down".to_string()))?;
        renderer.render(
            self.backend.as_mut(),
            &self.scene,
            self.renderform.renderform(),
            &self.camera,
            &self.lights,
            alpha,
        )
    }

    /// Resize the render targets and the camera aspect
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resize(self.backend.as_mut(), width, height)?;
        }
        self.camera.set_aspect_ratio(width as f32 / height as f32);
        self.config.renderer.width = width;
        self.config.renderer.height = height;
        Ok(())
    }

    /// Release every GPU object and stop audio
    pub fn shutdown(&mut self) {
        self.reset_scene();
        self.audio.shutdown();
        let backend = self.backend.as_mut();
        self.materials.clear();
        self.models.clear(backend);
        self.textures.clear(backend);
        self.cubemaps.clear(backend);
        if let Some(renderer) = self.renderer.take() {
            renderer.destroy(backend);
        }
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("backend", &self.backend.name())
            .field("models", &self.models.len())
            .field("materials", &self.materials.len())
            .field("nodes", &self.scene.len())
            .field("draws", &self.renderform.draw_count())
            .finish()
    }
}

/// Main engine struct
///
/// The engine coordinates all subsystems and manages the main loop.
pub struct Engine {
    ctx: EngineContext,
    screens: ScreenManager,
    timestep: FixedTimestep,
    timer: Timer,
    last_stats: FrameStats,
    running: bool,
    shut_down: bool,
}

impl Engine {
    /// Create a new engine instance rendering through `backend`
    pub fn new(config: ApplicationConfig, backend: Box<dyn RenderBackend>) -> Result<Self, EngineError> {
        log::info!("Initializing engine on {} backend...", backend.name());
        config.validate()?;

        let timestep = FixedTimestep::new(config.engine.tick_rate, config.engine.max_ticks_per_frame);
        let ctx = EngineContext::new(backend, config)?;

        Ok(Self {
            ctx,
            screens: ScreenManager::new(),
            timestep,
            timer: Timer::new(),
            last_stats: FrameStats::default(),
            running: true,
            shut_down: false,
        })
    }

    /// Builder pattern: replace the silent audio system
    pub fn with_audio(mut self, audio: AudioSystem) -> Self {
        self.ctx.audio = audio;
        self
    }

    /// Register a screen under `name`
    pub fn register_screen(&mut self, name: impl Into<String>, screen: Box<dyn Screen>) -> Result<(), EngineError> {
        self.screens.register(name, screen)?;
        Ok(())
    }

    /// Activate a screen
    pub fn switch_screen(&mut self, name: &str) -> Result<(), EngineError> {
        self.screens.switch_to(name, &mut self.ctx)?;
        Ok(())
    }

    /// Feed one input event to the engine and the active screen
    pub fn handle_event(&mut self, event: InputEvent) -> Result<(), EngineError> {
        self.ctx.input.handle_event(&event);
        match event {
            InputEvent::CloseRequested => {
                self.quit();
                return Ok(());
            }
            InputEvent::Resized { width, height } => self.ctx.resize(width, height)?,
            _ => {}
        }

        let transition = match self.screens.active_mut() {
            Some(screen) => screen.on_event(&mut self.ctx, &event),
            None => ScreenTransition::None,
        };
        self.apply_transition(transition)
    }

    /// Advance by `dt` seconds of real time and render one frame
    pub fn frame(&mut self, dt: f32) -> Result<FrameStats, EngineError> {
        if !self.running {
            return Ok(FrameStats::default());
        }
        self.timer.update();

        let ticks = self.timestep.advance(dt);
        let step = self.timestep.step();
        for _ in 0..ticks {
            self.ctx.scene.snapshot_transforms();
            let transition = match self.screens.active_mut() {
                Some(screen) => screen.on_update(&mut self.ctx, step),
                None => ScreenTransition::None,
            };
            self.ctx.scene.refresh_bounds();
            if let Err(e) = self.ctx.sync_renderform() {
                log::warn!("Render-form update failed: {}", e);
            }

            let switching = transition != ScreenTransition::None;
            self.apply_transition(transition)?;
            if switching || !self.running {
                break;
            }
        }
        if ticks > 0 {
            self.ctx.input.end_frame();
        }

        self.ctx.audio.update();
        self.ctx.lights.retain_live_anchors(&self.ctx.scene);
        if !self.running {
            return Ok(FrameStats::default());
        }

        let alpha = self.timestep.alpha();
        if let Some(screen) = self.screens.active_mut() {
            screen.on_render(&mut self.ctx, alpha);
        }
        let stats = self.ctx.render(alpha)?;
        log::trace!(
            "Frame {}: {} ticks, {} draws, {} lights",
            self.timer.frame_count(),
            ticks,
            stats.draw_calls,
            stats.lights_rendered
        );
        self.last_stats = stats;
        Ok(stats)
    }

    fn apply_transition(&mut self, transition: ScreenTransition) -> Result<(), EngineError> {
        match transition {
            ScreenTransition::None => {}
            ScreenTransition::Switch(name) => self.switch_screen(&name)?,
            ScreenTransition::Quit => self.quit(),
        }
        Ok(())
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the engine should keep running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Name of the active screen
    pub fn active_screen(&self) -> Option<&str> {
        self.screens.active_name()
    }

    /// Statistics of the last rendered frame
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    /// Frame timer
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Shared engine state
    pub fn context(&self) -> &EngineContext {
        &self.ctx
    }

    /// Shared engine state, mutable
    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.ctx
    }

    /// Shut the active screen down and release every GPU object
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.screens.shutdown_active(&mut self.ctx);
        self.ctx.shutdown();
        self.running = false;
        self.shut_down = true;
        log::info!(
            "Engine shutdown complete after {} frames ({:.1} fps average)",
            self.timer.frame_count(),
            self.timer.average_fps()
        );
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
