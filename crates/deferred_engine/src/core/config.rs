//! # Unified Configuration System
//!
//! All configuration structures for the engine live here: renderer sizing and
//! shadow settings, the fixed-step loop, logging and the asset directory.
//!
//! Every struct is serde-serializable so a complete [`ApplicationConfig`] can
//! be loaded from a TOML or RON file through the [`Config`] trait, and every
//! struct carries builder-style `with_*` setters for code-side configuration.

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// # Shadow Configuration
///
/// Controls the optional directional-light shadow pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShadowConfig {
    /// Whether the shadow pass runs at all
    pub enabled: bool,
    /// Square shadow map resolution in texels
    pub resolution: u32,
    /// Half-extent of the orthographic light frustum in world units
    pub frustum_half_extent: f32,
    /// Depth range of the light frustum
    pub depth_range: (f32, f32),
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            resolution: 2048,
            frustum_half_extent: 25.0,
            depth_range: (0.1, 100.0),
        }
    }
}

/// # Renderer Configuration
///
/// Framebuffer sizing and per-frame settings of the deferred renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RendererConfig {
    /// Render target width in pixels
    pub width: u32,
    /// Render target height in pixels
    pub height: u32,
    /// Clear color of the final target (RGBA)
    pub clear_color: [f32; 4],
    /// Shadow pass settings
    pub shadows: ShadowConfig,
}

impl RendererConfig {
    /// Create a renderer configuration for the given target size
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            shadows: ShadowConfig::default(),
        }
    }

    /// Set the clear color
    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    /// Enable or disable the shadow pass
    pub fn with_shadows(mut self, enabled: bool) -> Self {
        self.shadows.enabled = enabled;
        self
    }

    /// Set the shadow map resolution
    pub fn with_shadow_resolution(mut self, resolution: u32) -> Self {
        self.shadows.resolution = resolution;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Render target size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.shadows.enabled && self.shadows.resolution == 0 {
            return Err(ConfigError::Invalid("Shadow map resolution must be non-zero".to_string()));
        }
        let (near, far) = self.shadows.depth_range;
        if near >= far {
            return Err(ConfigError::Invalid(format!(
                "Shadow depth range is empty: near {} >= far {}",
                near, far
            )));
        }
        Ok(())
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

/// # Engine Configuration
///
/// Core engine behavior: logging and the fixed simulation step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Maximum simulation ticks run in one frame
    pub max_ticks_per_frame: u32,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            tick_rate: 60,
            max_ticks_per_frame: 8,
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set the simulation tick rate
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::Invalid("Tick rate must be at least 1".to_string()));
        }
        if self.max_ticks_per_frame == 0 {
            return Err(ConfigError::Invalid("Max ticks per frame must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Asset Configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetConfig {
    /// Base directory for assets
    pub assets_dir: String,
}

impl AssetConfig {
    /// Create a new asset configuration
    pub fn new() -> Self {
        Self {
            assets_dir: "resources".to_string(),
        }
    }

    /// Set assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Rendering system configuration
    pub renderer: RendererConfig,
    /// Asset system configuration
    pub assets: AssetConfig,
}

impl ApplicationConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.renderer.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ApplicationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_sized_target_is_rejected() {
        let config = RendererConfig::new(0, 720);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_toml_and_ron() {
        let config = ApplicationConfig {
            engine: EngineConfig::new().with_tick_rate(30),
            renderer: RendererConfig::new(640, 480).with_shadows(false),
            assets: AssetConfig::new().with_assets_dir("data"),
        };

        let toml_text = toml::to_string_pretty(&config).unwrap();
        let from_toml = ApplicationConfig::parse(&toml_text, Path::new("app.toml")).unwrap();
        assert_eq!(from_toml, config);

        let ron_text = ron::to_string(&config).unwrap();
        let from_ron = ApplicationConfig::parse(&ron_text, Path::new("app.ron")).unwrap();
        assert_eq!(from_ron.renderer.width, 640);
        assert!(!from_ron.renderer.shadows.enabled);
    }

    #[test]
    fn test_unknown_extension() {
        let result = ApplicationConfig::parse("", Path::new("app.ini"));
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
