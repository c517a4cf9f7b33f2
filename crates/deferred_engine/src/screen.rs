//! Screens (game states)
//!
//! A [`Screen`] builds its scene on init, mutates it every simulation tick
//! and tears down on shutdown. The [`ScreenManager`] owns every registered
//! screen by name and keeps exactly one of them active.

use std::collections::HashMap;

use thiserror::Error;

use crate::assets::AssetError;
use crate::engine::EngineContext;
use crate::input::InputEvent;
use crate::scene::{RenderformError, SceneError};

/// Screen errors
#[derive(Error, Debug)]
pub enum ScreenError {
    /// No screen registered under this name
    #[error("Unknown screen '{0}'")]
    UnknownScreen(String),

    /// A screen with this name is already registered
    #[error("Screen '{0}' is already registered")]
    DuplicateScreen(String),

    /// Screen setup failed
    #[error("Screen '{screen}' failed to initialize: {reason}")]
    InitializationFailed {
        /// Screen being initialized
        screen: String,
        /// What went wrong
        reason: String,
    },

    /// Scene construction failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Asset loading failed
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    /// Render-form could not be built
    #[error("Render-form error: {0}")]
    Renderform(#[from] RenderformError),
}

/// What the engine should do after a screen callback
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScreenTransition {
    /// Stay on the current screen
    #[default]
    None,
    /// Shut this screen down and activate the named one
    Switch(String),
    /// Stop the engine
    Quit,
}

/// One game state
pub trait Screen {
    /// Build the scene, load assets, place lights and camera
    fn on_init(&mut self, ctx: &mut EngineContext) -> Result<(), ScreenError>;

    /// Advance the simulation by one fixed tick of `dt` seconds
    fn on_update(&mut self, ctx: &mut EngineContext, dt: f32) -> ScreenTransition;

    /// Called once per frame before the renderer draws, with the
    /// interpolation factor the frame will be rendered at
    fn on_render(&mut self, _ctx: &mut EngineContext, _alpha: f32) {}

    /// React to an input event
    fn on_event(&mut self, _ctx: &mut EngineContext, _event: &InputEvent) -> ScreenTransition {
        ScreenTransition::None
    }

    /// Release whatever the screen owns outside the scene
    fn on_shutdown(&mut self, _ctx: &mut EngineContext) {}
}

/// Owns screens by name, one active at a time
#[derive(Default)]
pub struct ScreenManager {
    screens: HashMap<String, Box<dyn Screen>>,
    active: Option<String>,
}

impl ScreenManager {
    /// No screens
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a screen. Names are unique.
    pub fn register(&mut self, name: impl Into<String>, screen: Box<dyn Screen>) -> Result<(), ScreenError> {
        let name = name.into();
        if self.screens.contains_key(&name) {
            return Err(ScreenError::DuplicateScreen(name));
        }
        log::debug!("Registered screen '{}'", name);
        self.screens.insert(name, screen);
        Ok(())
    }

    /// Make `name` the active screen.
    ///
    /// The current screen is shut down and the scene cleared before the new
    /// screen initializes. If initialization fails no screen is active.
    pub fn switch_to(&mut self, name: &str, ctx: &mut EngineContext) -> Result<(), ScreenError> {
        if !self.screens.contains_key(name) {
            return Err(ScreenError::UnknownScreen(name.to_string()));
        }

        self.shutdown_active(ctx);
        ctx.reset_scene();

        let screen = self
            .screens
            .get_mut(name)
            .ok_or_else(|| ScreenError::UnknownScreen(name.to_string()))?;
        screen.on_init(ctx)?;
        self.active = Some(name.to_string());

        // The first frame of the new screen draws what on_init built
        if let Err(e) = ctx.sync_renderform() {
            log::warn!("Screen '{}' built an incomplete render-form: {}", name, e);
        }
        log::info!("Switched to screen '{}'", name);
        Ok(())
    }

    /// Shut down the active screen, leaving none active
    pub fn shutdown_active(&mut self, ctx: &mut EngineContext) {
        if let Some(name) = self.active.take() {
            if let Some(screen) = self.screens.get_mut(&name) {
                screen.on_shutdown(ctx);
                log::debug!("Screen '{}' shut down", name);
            }
        }
    }

    /// The active screen
    pub fn active_mut(&mut self) -> Option<&mut dyn Screen> {
        let name = self.active.as_deref()?;
        let screen = self.screens.get_mut(name)?;
        Some(screen.as_mut())
    }

    /// Name of the active screen
    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// Whether a screen is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.screens.contains_key(name)
    }

    /// Number of registered screens
    pub fn len(&self) -> usize {
        self.screens.len()
    }

    /// No screens registered
    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }
}

impl std::fmt::Debug for ScreenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.screens.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ScreenManager")
            .field("screens", &names)
            .field("active", &self.active)
            .finish()
    }
}
