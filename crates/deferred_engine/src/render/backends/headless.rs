//! Recording backend without a GPU
//!
//! [`HeadlessBackend`] hands out handles, validates them on use and appends
//! every call to a [`Command`] log. Tests assert on the log to check pass
//! ordering; the demo uses it to run without a window. Failure injection
//! covers the two setup-fatal cases: incomplete framebuffers and shader
//! compilation errors.

use std::collections::HashSet;

use crate::assets::Vertex;
use crate::render::api::{
    BackendResult, BlendMode, BufferHandle, ClearFlags, CompareFunc, DepthAttachment, Face,
    Framebuffer, FramebufferDesc, FramebufferHandle, FramebufferStatus, FramebufferTarget,
    MeshBuffers, ProgramHandle, RenderBackend, StencilOp, TextureDesc, TextureHandle, TextureKind,
    UniformValue, VertexArrayHandle,
};
use crate::render::RenderError;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
#[allow(missing_docs)]
pub enum Command {
    CreateMesh { vertex_array: VertexArrayHandle, vertices: usize, indices: usize },
    DeleteMesh(VertexArrayHandle),
    CreateTexture { texture: TextureHandle, width: u32, height: u32 },
    CreateCubemap { texture: TextureHandle, size: u32 },
    DeleteTexture(TextureHandle),
    CreateFramebuffer { framebuffer: FramebufferHandle, label: String },
    DeleteFramebuffer(FramebufferHandle),
    CreateProgram { program: ProgramHandle, label: String },
    DeleteProgram(ProgramHandle),
    BindFramebuffer { target: FramebufferTarget, framebuffer: Option<FramebufferHandle> },
    Viewport { width: u32, height: u32 },
    DrawBuffers(Vec<u32>),
    DepthState { test: bool, write: bool },
    StencilTest(bool),
    StencilFunc { func: CompareFunc, reference: i32, mask: u32 },
    StencilOp { face: Face, stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp },
    Blend(BlendMode),
    CullFace(Option<Face>),
    ColorMask(bool),
    Clear(ClearFlags),
    UseProgram(ProgramHandle),
    Uniform { name: String, value: UniformValue },
    BindTexture { unit: u32, texture: Option<TextureHandle> },
    DrawIndexed { vertex_array: VertexArrayHandle, index_count: u32 },
    BlitToDefault { source: FramebufferHandle, attachment: u32 },
}

/// Backend that records instead of rendering
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u32,
    commands: Vec<Command>,
    record_uniforms: bool,

    buffers: HashSet<BufferHandle>,
    vertex_arrays: HashSet<VertexArrayHandle>,
    textures: HashSet<TextureHandle>,
    framebuffers: HashSet<FramebufferHandle>,
    programs: HashSet<ProgramHandle>,

    incomplete_framebuffers: bool,
    failing_shader: Option<String>,
}

impl HeadlessBackend {
    /// Create a backend with an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Report every framebuffer as incomplete
    pub fn with_incomplete_framebuffers(mut self) -> Self {
        self.incomplete_framebuffers = true;
        self
    }

    /// Fail compilation of programs whose label contains `label`
    /// (an empty string fails every program)
    pub fn with_shader_failure(mut self, label: impl Into<String>) -> Self {
        self.failing_shader = Some(label.into());
        self
    }

    /// Also record `set_uniform` calls (off by default to keep logs short)
    pub fn with_uniform_recording(mut self) -> Self {
        self.record_uniforms = true;
        self
    }

    /// Recorded commands in call order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Take the log, leaving it empty
    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Number of live textures (including framebuffer attachments)
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Number of live meshes
    pub fn live_meshes(&self) -> usize {
        self.vertex_arrays.len()
    }

    /// Number of live framebuffers
    pub fn live_framebuffers(&self) -> usize {
        self.framebuffers.len()
    }

    /// Number of live programs
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn record(&mut self, command: Command) {
        log::trace!("headless: {:?}", command);
        self.commands.push(command);
    }

    fn new_texture(&mut self) -> TextureHandle {
        let texture = TextureHandle(self.allocate());
        self.textures.insert(texture);
        texture
    }
}

fn check_pixels(desc: &TextureDesc, pixels: &[u8]) -> BackendResult<()> {
    let expected = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel();
    if pixels.len() != expected {
        return Err(RenderError::BackendError(format!(
            "Texture data is {} bytes, expected {} for {}x{} {:?}",
            pixels.len(),
            expected,
            desc.width,
            desc.height,
            desc.format
        )));
    }
    Ok(())
}

impl RenderBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshBuffers> {
        if let Some(bad) = indices.iter().find(|i| **i as usize >= vertices.len()) {
            return Err(RenderError::BackendError(format!(
                "Index {} out of range for {} vertices",
                bad,
                vertices.len()
            )));
        }

        let vertex_array = VertexArrayHandle(self.allocate());
        let vertex_buffer = BufferHandle(self.allocate());
        let index_buffer = BufferHandle(self.allocate());
        self.vertex_arrays.insert(vertex_array);
        self.buffers.insert(vertex_buffer);
        self.buffers.insert(index_buffer);

        self.record(Command::CreateMesh {
            vertex_array,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        Ok(MeshBuffers {
            vertex_array,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        })
    }

    fn delete_mesh(&mut self, mesh: &MeshBuffers) {
        self.vertex_arrays.remove(&mesh.vertex_array);
        self.buffers.remove(&mesh.vertex_buffer);
        self.buffers.remove(&mesh.index_buffer);
        self.record(Command::DeleteMesh(mesh.vertex_array));
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> BackendResult<TextureHandle> {
        if let Some(pixels) = pixels {
            check_pixels(desc, pixels)?;
        }
        let texture = self.new_texture();
        self.record(Command::CreateTexture {
            texture,
            width: desc.width,
            height: desc.height,
        });
        Ok(texture)
    }

    fn create_cubemap(&mut self, desc: &TextureDesc, faces: [&[u8]; 6]) -> BackendResult<TextureHandle> {
        for face in faces {
            check_pixels(desc, face)?;
        }
        let texture = self.new_texture();
        self.record(Command::CreateCubemap { texture, size: desc.width });
        Ok(texture)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
        self.record(Command::DeleteTexture(texture));
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> BackendResult<Framebuffer> {
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::BackendError(format!(
                "Framebuffer '{}' has zero size",
                desc.label
            )));
        }
        let handle = FramebufferHandle(self.allocate());
        self.framebuffers.insert(handle);

        let color_textures = desc.color_attachments.iter().map(|_| self.new_texture()).collect();
        let depth_texture = match desc.depth {
            DepthAttachment::None => None,
            DepthAttachment::Depth | DepthAttachment::DepthStencil => Some(self.new_texture()),
        };

        self.record(Command::CreateFramebuffer {
            framebuffer: handle,
            label: desc.label.clone(),
        });
        Ok(Framebuffer {
            handle,
            color_textures,
            depth_texture,
            width: desc.width,
            height: desc.height,
        })
    }

    fn framebuffer_status(&mut self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        if !self.framebuffers.contains(&framebuffer) {
            return FramebufferStatus::Incomplete(format!("{:?} does not exist", framebuffer));
        }
        if self.incomplete_framebuffers {
            return FramebufferStatus::Incomplete("FRAMEBUFFER_INCOMPLETE_ATTACHMENT".to_string());
        }
        FramebufferStatus::Complete
    }

    fn delete_framebuffer(&mut self, framebuffer: &Framebuffer) {
        for texture in framebuffer.color_textures.iter().chain(framebuffer.depth_texture.iter()) {
            self.textures.remove(texture);
        }
        self.framebuffers.remove(&framebuffer.handle);
        self.record(Command::DeleteFramebuffer(framebuffer.handle));
    }

    fn create_program(&mut self, label: &str, vertex_src: &str, fragment_src: &str) -> BackendResult<ProgramHandle> {
        if let Some(failing) = &self.failing_shader {
            if label.contains(failing.as_str()) {
                return Err(RenderError::ShaderCompilation {
                    label: label.to_string(),
                    log: "0:1(1): error: injected failure".to_string(),
                });
            }
        }
        if vertex_src.trim().is_empty() || fragment_src.trim().is_empty() {
            return Err(RenderError::ShaderCompilation {
                label: label.to_string(),
                log: "empty shader source".to_string(),
            });
        }

        let program = ProgramHandle(self.allocate());
        self.programs.insert(program);
        self.record(Command::CreateProgram {
            program,
            label: label.to_string(),
        });
        Ok(program)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        self.programs.remove(&program);
        self.record(Command::DeleteProgram(program));
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>) {
        self.record(Command::BindFramebuffer { target, framebuffer });
    }

    fn set_viewport(&mut self, _x: i32, _y: i32, width: u32, height: u32) {
        self.record(Command::Viewport { width, height });
    }

    fn set_draw_buffers(&mut self, attachments: &[u32]) {
        self.record(Command::DrawBuffers(attachments.to_vec()));
    }

    fn set_depth_state(&mut self, test: bool, write: bool) {
        self.record(Command::DepthState { test, write });
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        self.record(Command::StencilTest(enabled));
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        self.record(Command::StencilFunc { func, reference, mask });
    }

    fn set_stencil_op(&mut self, face: Face, stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        self.record(Command::StencilOp {
            face,
            stencil_fail,
            depth_fail,
            pass,
        });
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.record(Command::Blend(mode));
    }

    fn set_cull_face(&mut self, face: Option<Face>) {
        self.record(Command::CullFace(face));
    }

    fn set_color_mask(&mut self, enabled: bool) {
        self.record(Command::ColorMask(enabled));
    }

    fn clear(&mut self, flags: ClearFlags, _color: [f32; 4]) {
        self.record(Command::Clear(flags));
    }

    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        if !self.programs.contains(&program) {
            return Err(RenderError::InvalidHandle(format!("{:?}", program)));
        }
        self.record(Command::UseProgram(program));
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        if self.record_uniforms {
            self.record(Command::Uniform {
                name: name.to_string(),
                value,
            });
        }
    }

    fn bind_texture(&mut self, unit: u32, _kind: TextureKind, texture: Option<TextureHandle>) -> BackendResult<()> {
        if let Some(texture) = texture {
            if !self.textures.contains(&texture) {
                return Err(RenderError::InvalidHandle(format!("{:?}", texture)));
            }
        }
        self.record(Command::BindTexture { unit, texture });
        Ok(())
    }

    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> BackendResult<()> {
        if !self.vertex_arrays.contains(&vertex_array) {
            return Err(RenderError::InvalidHandle(format!("{:?}", vertex_array)));
        }
        self.record(Command::DrawIndexed {
            vertex_array,
            index_count,
        });
        Ok(())
    }

    fn blit_to_default(
        &mut self,
        source: FramebufferHandle,
        attachment: u32,
        _source_size: (u32, u32),
        _target_size: (u32, u32),
    ) -> BackendResult<()> {
        if !self.framebuffers.contains(&source) {
            return Err(RenderError::InvalidHandle(format!("{:?}", source)));
        }
        self.record(Command::BlitToDefault { source, attachment });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::TextureFormat;

    fn triangle() -> (Vec<Vertex>, Vec<u32>) {
        let vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0]),
            Vertex::new([1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0]),
            Vertex::new([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0]),
        ];
        (vertices, vec![0, 1, 2])
    }

    #[test]
    fn test_mesh_lifecycle() {
        let mut backend = HeadlessBackend::new();
        let (vertices, indices) = triangle();
        let mesh = backend.create_mesh(&vertices, &indices).unwrap();
        assert_eq!(mesh.index_count, 3);
        assert_eq!(backend.live_meshes(), 1);

        backend.draw_indexed(mesh.vertex_array, 3).unwrap();
        backend.delete_mesh(&mesh);
        assert_eq!(backend.live_meshes(), 0);
        assert!(matches!(
            backend.draw_indexed(mesh.vertex_array, 3),
            Err(RenderError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_out_of_range_index_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let (vertices, _) = triangle();
        assert!(backend.create_mesh(&vertices, &[0, 1, 3]).is_err());
    }

    #[test]
    fn test_texture_size_is_checked() {
        let mut backend = HeadlessBackend::new();
        let desc = TextureDesc::new(2, 2, TextureFormat::Rgba8);
        assert!(backend.create_texture(&desc, Some(&[0u8; 15])).is_err());
        assert!(backend.create_texture(&desc, Some(&[0u8; 16])).is_ok());
    }

    #[test]
    fn test_framebuffer_owns_its_attachments() {
        let mut backend = HeadlessBackend::new();
        let framebuffer = backend
            .create_framebuffer(&FramebufferDesc {
                label: "gbuffer".to_string(),
                width: 4,
                height: 4,
                color_attachments: vec![TextureFormat::Rgba16F, TextureFormat::Rgba8],
                depth: DepthAttachment::DepthStencil,
            })
            .unwrap();
        assert_eq!(backend.live_textures(), 3);
        assert_eq!(backend.framebuffer_status(framebuffer.handle), FramebufferStatus::Complete);

        backend.delete_framebuffer(&framebuffer);
        assert_eq!(backend.live_textures(), 0);
        assert_eq!(backend.live_framebuffers(), 0);
    }

    #[test]
    fn test_failure_injection() {
        let mut backend = HeadlessBackend::new()
            .with_incomplete_framebuffers()
            .with_shader_failure("light");

        let framebuffer = backend
            .create_framebuffer(&FramebufferDesc {
                label: "shadow".to_string(),
                width: 8,
                height: 8,
                color_attachments: Vec::new(),
                depth: DepthAttachment::Depth,
            })
            .unwrap();
        assert!(matches!(
            backend.framebuffer_status(framebuffer.handle),
            FramebufferStatus::Incomplete(_)
        ));

        assert!(backend.create_program("geometry", "void main(){}", "void main(){}").is_ok());
        assert!(matches!(
            backend.create_program("point_light", "void main(){}", "void main(){}"),
            Err(RenderError::ShaderCompilation { .. })
        ));
    }
}
