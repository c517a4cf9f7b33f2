//! Public rendering API
//!
//! The backend trait every GPU implementation provides, and the handle and
//! state types that cross it.

pub mod render_backend;
pub mod types;

pub use render_backend::{BackendResult, RenderBackend};
pub use types::{
    BlendMode, BufferHandle, ClearFlags, CompareFunc, DepthAttachment, Face, Framebuffer,
    FramebufferDesc, FramebufferHandle, FramebufferStatus, FramebufferTarget, MeshBuffers,
    ProgramHandle, StencilOp, TextureDesc, TextureFilter, TextureFormat, TextureHandle,
    TextureKind, UniformValue, VertexArrayHandle,
};
