//! # Rendering System
//!
//! Deferred shading over a backend-agnostic GPU interface.
//!
//! ## Architecture
//!
//! - **api**: the [`RenderBackend`] trait plus the handle and state types crossing it
//! - **backends**: a recording [`HeadlessBackend`] and an OpenGL backend (feature `gl`)
//! - **deferred**: the [`DeferredRenderer`] frame: shadow, geometry, stencil-masked
//!   light volumes, directional lights, final blit
//! - **gbuffer / shadow**: the offscreen targets the frame renders into
//! - **lighting / light_volumes**: light values and the proxy meshes that bound them
//! - **camera**: perspective camera
//!
//! Framebuffer incompleteness and shader failures are setup errors and come
//! back from [`DeferredRenderer::new`]. Problems with a single draw entry
//! during a frame are logged and skipped.

pub mod api;
pub mod backends;
pub mod camera;
pub mod deferred;
pub mod gbuffer;
pub mod light_volumes;
pub mod lighting;
pub mod shaders;
pub mod shadow;

#[cfg(test)]
mod pipeline_tests;

pub use api::{BackendResult, RenderBackend};
pub use backends::{Command, HeadlessBackend};
pub use camera::Camera;
pub use deferred::{DeferredRenderer, FrameStats};
pub use gbuffer::GBuffer;
pub use lighting::{Light, LightType, LightingEnvironment};
pub use shadow::ShadowRenderer;

#[cfg(feature = "gl")]
pub use backends::GlBackend;

use thiserror::Error;

/// Errors that can occur during rendering operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    /// Renderer setup failed
    #[error("Renderer initialization failed: {0}")]
    InitializationFailed(String),

    /// A framebuffer failed its completeness check
    #[error("Framebuffer '{label}' is incomplete: {reason}")]
    FramebufferIncomplete {
        /// Framebuffer label
        label: String,
        /// Driver status
        reason: String,
    },

    /// A shader failed to compile or link
    #[error("Shader '{label}' failed to compile: {log}")]
    ShaderCompilation {
        /// Program label
        label: String,
        /// Compiler or linker log
        log: String,
    },

    /// A handle does not refer to a live GPU object
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// A rendering operation failed during execution
    #[error("Rendering failed: {0}")]
    RenderingFailed(String),

    /// Backend-specific error
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
