//! Backend abstraction trait for the rendering system
//!
//! The deferred renderer and the asset stores talk to the GPU only through
//! [`RenderBackend`]. It mirrors a GL-style state machine closely enough that
//! an OpenGL implementation is a thin translation, while a recording backend
//! can stand in for tests and headless runs.

use super::types::{
    BlendMode, ClearFlags, CompareFunc, Face, Framebuffer, FramebufferDesc, FramebufferHandle,
    FramebufferStatus, FramebufferTarget, MeshBuffers, ProgramHandle, StencilOp, TextureDesc,
    TextureHandle, TextureKind, UniformValue, VertexArrayHandle,
};
use crate::assets::Vertex;
use crate::render::RenderError;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Main rendering backend trait
pub trait RenderBackend {
    /// Human-readable backend name for logs
    fn name(&self) -> &str;

    // === Resources ===

    /// Upload interleaved vertices and `u32` indices
    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshBuffers>;

    /// Release a mesh's buffers and vertex array
    fn delete_mesh(&mut self, mesh: &MeshBuffers);

    /// Create a 2D texture, optionally filled with tightly packed `pixels`
    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> BackendResult<TextureHandle>;

    /// Create a cubemap from six faces ordered +X, -X, +Y, -Y, +Z, -Z
    fn create_cubemap(&mut self, desc: &TextureDesc, faces: [&[u8]; 6]) -> BackendResult<TextureHandle>;

    /// Release a texture or cubemap
    fn delete_texture(&mut self, texture: TextureHandle);

    /// Create a framebuffer and its attachment textures.
    ///
    /// Creation succeeding does not mean the framebuffer is complete; check
    /// with [`RenderBackend::framebuffer_status`].
    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> BackendResult<Framebuffer>;

    /// Completeness of a framebuffer
    fn framebuffer_status(&mut self, framebuffer: FramebufferHandle) -> FramebufferStatus;

    /// Release a framebuffer together with its attachment textures
    fn delete_framebuffer(&mut self, framebuffer: &Framebuffer);

    /// Compile and link a program
    fn create_program(&mut self, label: &str, vertex_src: &str, fragment_src: &str) -> BackendResult<ProgramHandle>;

    /// Release a program
    fn delete_program(&mut self, program: ProgramHandle);

    // === State ===

    /// Bind an offscreen framebuffer, or the default one for `None`
    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>);

    /// Set the viewport rectangle
    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32);

    /// Select which color attachments receive fragment output
    fn set_draw_buffers(&mut self, attachments: &[u32]);

    /// Depth test and depth write switches
    fn set_depth_state(&mut self, test: bool, write: bool);

    /// Enable or disable stencil testing
    fn set_stencil_test(&mut self, enabled: bool);

    /// Stencil comparison for both faces
    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32);

    /// Stencil update for one face, as (stencil fail, depth fail, pass)
    fn set_stencil_op(&mut self, face: Face, stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp);

    /// Color blending
    fn set_blend_mode(&mut self, mode: BlendMode);

    /// Face culling, `None` disables it
    fn set_cull_face(&mut self, face: Option<Face>);

    /// Enable or disable writes to all color channels
    fn set_color_mask(&mut self, enabled: bool);

    /// Clear the selected buffers of the bound framebuffer
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);

    // === Drawing ===

    /// Make a program current
    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()>;

    /// Set a uniform on the current program; unknown names are ignored
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    /// Bind a texture to a texture unit, or unbind with `None`
    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: Option<TextureHandle>) -> BackendResult<()>;

    /// Draw `index_count` indices from a vertex array as triangles
    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> BackendResult<()>;

    /// Copy one color attachment of `source` to the default framebuffer
    fn blit_to_default(
        &mut self,
        source: FramebufferHandle,
        attachment: u32,
        source_size: (u32, u32),
        target_size: (u32, u32),
    ) -> BackendResult<()>;
}
