//! Rendering backend implementations
//!
//! [`HeadlessBackend`] is always built. The OpenGL backend needs the `gl`
//! cargo feature and a context created by the application.

pub mod headless;

#[cfg(feature = "gl")]
pub mod gl;

pub use headless::{Command, HeadlessBackend};

#[cfg(feature = "gl")]
pub use gl::GlBackend;
