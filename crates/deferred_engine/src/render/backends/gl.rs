//! OpenGL 3.3 core backend over `glow`
//!
//! The caller owns window and context creation and hands over a current
//! [`glow::Context`]. Engine handles are small integers mapped to the native
//! GL objects kept in this backend.

#![allow(unsafe_code)]

use std::collections::HashMap;

use glow::HasContext;

use crate::assets::Vertex;
use crate::render::api::{
    BackendResult, BlendMode, BufferHandle, ClearFlags, CompareFunc, DepthAttachment, Face,
    Framebuffer, FramebufferDesc, FramebufferHandle, FramebufferStatus, FramebufferTarget,
    MeshBuffers, ProgramHandle, RenderBackend, StencilOp, TextureDesc, TextureFilter,
    TextureFormat, TextureHandle, TextureKind, UniformValue, VertexArrayHandle,
};
use crate::render::RenderError;

/// Rendering backend issuing OpenGL calls
///
/// # Safety
///
/// The wrapped context must stay current on the calling thread for the whole
/// lifetime of the backend.
pub struct GlBackend {
    gl: glow::Context,
    next_handle: u32,

    buffers: HashMap<BufferHandle, glow::Buffer>,
    vertex_arrays: HashMap<VertexArrayHandle, glow::VertexArray>,
    textures: HashMap<TextureHandle, (glow::Texture, TextureKind)>,
    framebuffers: HashMap<FramebufferHandle, glow::Framebuffer>,
    programs: HashMap<ProgramHandle, glow::Program>,

    current_program: Option<glow::Program>,
}

impl GlBackend {
    /// Wrap a current OpenGL context
    pub fn new(gl: glow::Context) -> Self {
        let version = gl.version();
        log::info!(
            "OpenGL backend: {}.{} {}",
            version.major,
            version.minor,
            version.vendor_info
        );
        Self {
            gl,
            next_handle: 0,
            buffers: HashMap::new(),
            vertex_arrays: HashMap::new(),
            textures: HashMap::new(),
            framebuffers: HashMap::new(),
            programs: HashMap::new(),
            current_program: None,
        }
    }

    /// Borrow the wrapped context
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn allocate(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn texture(&self, handle: TextureHandle) -> BackendResult<glow::Texture> {
        self.textures
            .get(&handle)
            .map(|(texture, _)| *texture)
            .ok_or_else(|| RenderError::InvalidHandle(format!("{:?}", handle)))
    }

    fn framebuffer(&self, handle: FramebufferHandle) -> BackendResult<glow::Framebuffer> {
        self.framebuffers
            .get(&handle)
            .copied()
            .ok_or_else(|| RenderError::InvalidHandle(format!("{:?}", handle)))
    }

    unsafe fn compile_stage(&self, label: &str, stage: u32, source: &str) -> BackendResult<glow::Shader> {
        let shader = self
            .gl
            .create_shader(stage)
            .map_err(|e| RenderError::BackendError(format!("create_shader: {}", e)))?;
        self.gl.shader_source(shader, source);
        self.gl.compile_shader(shader);
        if !self.gl.get_shader_compile_status(shader) {
            let log = self.gl.get_shader_info_log(shader);
            self.gl.delete_shader(shader);
            return Err(RenderError::ShaderCompilation {
                label: label.to_string(),
                log,
            });
        }
        Ok(shader)
    }

    unsafe fn apply_filter(&self, target: u32, desc: &TextureDesc) {
        let (min, mag) = match (desc.filter, desc.mipmaps) {
            (TextureFilter::Nearest, _) => (glow::NEAREST, glow::NEAREST),
            (TextureFilter::Linear, true) => (glow::LINEAR_MIPMAP_LINEAR, glow::LINEAR),
            (TextureFilter::Linear, false) => (glow::LINEAR, glow::LINEAR),
        };
        self.gl.tex_parameter_i32(target, glow::TEXTURE_MIN_FILTER, min as i32);
        self.gl.tex_parameter_i32(target, glow::TEXTURE_MAG_FILTER, mag as i32);
        self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        self.gl.tex_parameter_i32(target, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);
    }
}

/// (internal format, pixel format, pixel type)
fn gl_format(format: TextureFormat) -> (i32, u32, u32) {
    match format {
        TextureFormat::R8 => (glow::R8 as i32, glow::RED, glow::UNSIGNED_BYTE),
        TextureFormat::Rgb8 => (glow::RGB8 as i32, glow::RGB, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba8 => (glow::RGBA8 as i32, glow::RGBA, glow::UNSIGNED_BYTE),
        TextureFormat::Rgba16F => (glow::RGBA16F as i32, glow::RGBA, glow::FLOAT),
        TextureFormat::Depth32F => (glow::DEPTH_COMPONENT32F as i32, glow::DEPTH_COMPONENT, glow::FLOAT),
        TextureFormat::Depth24Stencil8 => (
            glow::DEPTH24_STENCIL8 as i32,
            glow::DEPTH_STENCIL,
            glow::UNSIGNED_INT_24_8,
        ),
    }
}

fn gl_compare(func: CompareFunc) -> u32 {
    match func {
        CompareFunc::Always => glow::ALWAYS,
        CompareFunc::Never => glow::NEVER,
        CompareFunc::Less => glow::LESS,
        CompareFunc::LessEqual => glow::LEQUAL,
        CompareFunc::Equal => glow::EQUAL,
        CompareFunc::NotEqual => glow::NOTEQUAL,
    }
}

fn gl_stencil_op(op: StencilOp) -> u32 {
    match op {
        StencilOp::Keep => glow::KEEP,
        StencilOp::Zero => glow::ZERO,
        StencilOp::IncrementWrap => glow::INCR_WRAP,
        StencilOp::DecrementWrap => glow::DECR_WRAP,
    }
}

fn gl_face(face: Face) -> u32 {
    match face {
        Face::Front => glow::FRONT,
        Face::Back => glow::BACK,
        Face::FrontAndBack => glow::FRONT_AND_BACK,
    }
}

fn gl_framebuffer_target(target: FramebufferTarget) -> u32 {
    match target {
        FramebufferTarget::Both => glow::FRAMEBUFFER,
        FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
        FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
    }
}

fn gl_texture_target(kind: TextureKind) -> u32 {
    match kind {
        TextureKind::Texture2D => glow::TEXTURE_2D,
        TextureKind::Cubemap => glow::TEXTURE_CUBE_MAP,
    }
}

impl RenderBackend for GlBackend {
    fn name(&self) -> &str {
        "opengl"
    }

    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u32]) -> BackendResult<MeshBuffers> {
        let stride = std::mem::size_of::<Vertex>() as i32;
        let (vao, vbo, ibo) = unsafe {
            let vao = self
                .gl
                .create_vertex_array()
                .map_err(|e| RenderError::BackendError(format!("create_vertex_array: {}", e)))?;
            let vbo = self
                .gl
                .create_buffer()
                .map_err(|e| RenderError::BackendError(format!("create_buffer: {}", e)))?;
            let ibo = self
                .gl
                .create_buffer()
                .map_err(|e| RenderError::BackendError(format!("create_buffer: {}", e)))?;

            self.gl.bind_vertex_array(Some(vao));
            self.gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck::cast_slice(vertices), glow::STATIC_DRAW);
            self.gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            self.gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(indices),
                glow::STATIC_DRAW,
            );

            // position, normal, tex_coord, tangent
            let layout = [(0, 3, 0), (1, 3, 12), (2, 2, 24), (3, 3, 32)];
            for (location, size, offset) in layout {
                self.gl.enable_vertex_attrib_array(location);
                self.gl
                    .vertex_attrib_pointer_f32(location, size, glow::FLOAT, false, stride, offset);
            }

            self.gl.bind_vertex_array(None);
            (vao, vbo, ibo)
        };

        let mesh = MeshBuffers {
            vertex_array: VertexArrayHandle(self.allocate()),
            vertex_buffer: BufferHandle(self.allocate()),
            index_buffer: BufferHandle(self.allocate()),
            index_count: indices.len() as u32,
        };
        self.vertex_arrays.insert(mesh.vertex_array, vao);
        self.buffers.insert(mesh.vertex_buffer, vbo);
        self.buffers.insert(mesh.index_buffer, ibo);
        Ok(mesh)
    }

    fn delete_mesh(&mut self, mesh: &MeshBuffers) {
        unsafe {
            if let Some(vao) = self.vertex_arrays.remove(&mesh.vertex_array) {
                self.gl.delete_vertex_array(vao);
            }
            for buffer in [mesh.vertex_buffer, mesh.index_buffer] {
                if let Some(native) = self.buffers.remove(&buffer) {
                    self.gl.delete_buffer(native);
                }
            }
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: Option<&[u8]>) -> BackendResult<TextureHandle> {
        let (internal, format, ty) = gl_format(desc.format);
        let texture = unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|e| RenderError::BackendError(format!("create_texture: {}", e)))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                internal,
                desc.width as i32,
                desc.height as i32,
                0,
                format,
                ty,
                glow::PixelUnpackData::Slice(pixels),
            );
            self.apply_filter(glow::TEXTURE_2D, desc);
            if desc.mipmaps && pixels.is_some() {
                self.gl.generate_mipmap(glow::TEXTURE_2D);
            }
            self.gl.bind_texture(glow::TEXTURE_2D, None);
            texture
        };

        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, (texture, TextureKind::Texture2D));
        Ok(handle)
    }

    fn create_cubemap(&mut self, desc: &TextureDesc, faces: [&[u8]; 6]) -> BackendResult<TextureHandle> {
        let (internal, format, ty) = gl_format(desc.format);
        let texture = unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|e| RenderError::BackendError(format!("create_texture: {}", e)))?;
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, Some(texture));
            self.gl.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            for (i, face) in faces.iter().enumerate() {
                self.gl.tex_image_2d(
                    glow::TEXTURE_CUBE_MAP_POSITIVE_X + i as u32,
                    0,
                    internal,
                    desc.width as i32,
                    desc.height as i32,
                    0,
                    format,
                    ty,
                    glow::PixelUnpackData::Slice(Some(face)),
                );
            }
            self.apply_filter(glow::TEXTURE_CUBE_MAP, desc);
            self.gl
                .tex_parameter_i32(glow::TEXTURE_CUBE_MAP, glow::TEXTURE_WRAP_R, glow::CLAMP_TO_EDGE as i32);
            if desc.mipmaps {
                self.gl.generate_mipmap(glow::TEXTURE_CUBE_MAP);
            }
            self.gl.bind_texture(glow::TEXTURE_CUBE_MAP, None);
            texture
        };

        let handle = TextureHandle(self.allocate());
        self.textures.insert(handle, (texture, TextureKind::Cubemap));
        Ok(handle)
    }

    fn delete_texture(&mut self, texture: TextureHandle) {
        if let Some((native, _)) = self.textures.remove(&texture) {
            unsafe { self.gl.delete_texture(native) };
        }
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> BackendResult<Framebuffer> {
        let mut color_textures = Vec::with_capacity(desc.color_attachments.len());
        for format in &desc.color_attachments {
            color_textures.push(
                self.create_texture(&TextureDesc::render_target(desc.width, desc.height, *format), None)?,
            );
        }
        let depth_texture = match desc.depth {
            DepthAttachment::None => None,
            DepthAttachment::Depth => Some(self.create_texture(
                &TextureDesc::render_target(desc.width, desc.height, TextureFormat::Depth32F),
                None,
            )?),
            DepthAttachment::DepthStencil => Some(self.create_texture(
                &TextureDesc::render_target(desc.width, desc.height, TextureFormat::Depth24Stencil8),
                None,
            )?),
        };

        let native = unsafe {
            let fbo = self
                .gl
                .create_framebuffer()
                .map_err(|e| RenderError::BackendError(format!("create_framebuffer: {}", e)))?;
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            for (i, texture) in color_textures.iter().enumerate() {
                self.gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    glow::COLOR_ATTACHMENT0 + i as u32,
                    glow::TEXTURE_2D,
                    Some(self.texture(*texture)?),
                    0,
                );
            }
            if let Some(depth) = depth_texture {
                let attachment = match desc.depth {
                    DepthAttachment::DepthStencil => glow::DEPTH_STENCIL_ATTACHMENT,
                    _ => glow::DEPTH_ATTACHMENT,
                };
                self.gl.framebuffer_texture_2d(
                    glow::FRAMEBUFFER,
                    attachment,
                    glow::TEXTURE_2D,
                    Some(self.texture(depth)?),
                    0,
                );
            }
            if color_textures.is_empty() {
                self.gl.draw_buffer(glow::NONE);
                self.gl.read_buffer(glow::NONE);
            }
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            fbo
        };

        let handle = FramebufferHandle(self.allocate());
        self.framebuffers.insert(handle, native);
        log::debug!("Created framebuffer '{}' ({}x{})", desc.label, desc.width, desc.height);

        Ok(Framebuffer {
            handle,
            color_textures,
            depth_texture,
            width: desc.width,
            height: desc.height,
        })
    }

    fn framebuffer_status(&mut self, framebuffer: FramebufferHandle) -> FramebufferStatus {
        let native = match self.framebuffer(framebuffer) {
            Ok(native) => native,
            Err(e) => return FramebufferStatus::Incomplete(e.to_string()),
        };
        let status = unsafe {
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, Some(native));
            let status = self.gl.check_framebuffer_status(glow::FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            status
        };
        match status {
            glow::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => {
                FramebufferStatus::Incomplete("FRAMEBUFFER_INCOMPLETE_ATTACHMENT".to_string())
            }
            glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
                FramebufferStatus::Incomplete("FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT".to_string())
            }
            glow::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Incomplete("FRAMEBUFFER_UNSUPPORTED".to_string()),
            other => FramebufferStatus::Incomplete(format!("status 0x{:X}", other)),
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: &Framebuffer) {
        if let Some(native) = self.framebuffers.remove(&framebuffer.handle) {
            unsafe { self.gl.delete_framebuffer(native) };
        }
        for texture in framebuffer.color_textures.iter().chain(framebuffer.depth_texture.iter()) {
            self.delete_texture(*texture);
        }
    }

    fn create_program(&mut self, label: &str, vertex_src: &str, fragment_src: &str) -> BackendResult<ProgramHandle> {
        let program = unsafe {
            let vertex = self.compile_stage(label, glow::VERTEX_SHADER, vertex_src)?;
            let fragment = match self.compile_stage(label, glow::FRAGMENT_SHADER, fragment_src) {
                Ok(fragment) => fragment,
                Err(e) => {
                    self.gl.delete_shader(vertex);
                    return Err(e);
                }
            };

            let program = self
                .gl
                .create_program()
                .map_err(|e| RenderError::BackendError(format!("create_program: {}", e)))?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            let linked = self.gl.get_program_link_status(program);

            for shader in [vertex, fragment] {
                self.gl.detach_shader(program, shader);
                self.gl.delete_shader(shader);
            }
            if !linked {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(RenderError::ShaderCompilation {
                    label: label.to_string(),
                    log,
                });
            }
            program
        };

        let handle = ProgramHandle(self.allocate());
        self.programs.insert(handle, program);
        log::debug!("Linked program '{}'", label);
        Ok(handle)
    }

    fn delete_program(&mut self, program: ProgramHandle) {
        if let Some(native) = self.programs.remove(&program) {
            if self.current_program == Some(native) {
                self.current_program = None;
            }
            unsafe { self.gl.delete_program(native) };
        }
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>) {
        let native = framebuffer.and_then(|handle| self.framebuffers.get(&handle).copied());
        if framebuffer.is_some() && native.is_none() {
            log::warn!("Binding unknown framebuffer {:?}; using the default one", framebuffer);
        }
        unsafe { self.gl.bind_framebuffer(gl_framebuffer_target(target), native) };
    }

    fn set_viewport(&mut self, x: i32, y: i32, width: u32, height: u32) {
        unsafe { self.gl.viewport(x, y, width as i32, height as i32) };
    }

    fn set_draw_buffers(&mut self, attachments: &[u32]) {
        let buffers: Vec<u32> = attachments.iter().map(|i| glow::COLOR_ATTACHMENT0 + i).collect();
        unsafe { self.gl.draw_buffers(&buffers) };
    }

    fn set_depth_state(&mut self, test: bool, write: bool) {
        unsafe {
            if test {
                self.gl.enable(glow::DEPTH_TEST);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
            self.gl.depth_mask(write);
        }
    }

    fn set_stencil_test(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::STENCIL_TEST);
            } else {
                self.gl.disable(glow::STENCIL_TEST);
            }
        }
    }

    fn set_stencil_func(&mut self, func: CompareFunc, reference: i32, mask: u32) {
        unsafe { self.gl.stencil_func(gl_compare(func), reference, mask) };
    }

    fn set_stencil_op(&mut self, face: Face, stencil_fail: StencilOp, depth_fail: StencilOp, pass: StencilOp) {
        unsafe {
            self.gl.stencil_op_separate(
                gl_face(face),
                gl_stencil_op(stencil_fail),
                gl_stencil_op(depth_fail),
                gl_stencil_op(pass),
            )
        };
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        unsafe {
            match mode {
                BlendMode::Disabled => self.gl.disable(glow::BLEND),
                BlendMode::Additive => {
                    self.gl.enable(glow::BLEND);
                    self.gl.blend_equation(glow::FUNC_ADD);
                    self.gl.blend_func(glow::ONE, glow::ONE);
                }
                BlendMode::Alpha => {
                    self.gl.enable(glow::BLEND);
                    self.gl.blend_equation(glow::FUNC_ADD);
                    self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
                }
            }
        }
    }

    fn set_cull_face(&mut self, face: Option<Face>) {
        unsafe {
            match face {
                Some(face) => {
                    self.gl.enable(glow::CULL_FACE);
                    self.gl.cull_face(gl_face(face));
                }
                None => self.gl.disable(glow::CULL_FACE),
            }
        }
    }

    fn set_color_mask(&mut self, enabled: bool) {
        unsafe { self.gl.color_mask(enabled, enabled, enabled, enabled) };
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= glow::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= glow::DEPTH_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::STENCIL) {
            mask |= glow::STENCIL_BUFFER_BIT;
        }
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(mask);
        }
    }

    fn use_program(&mut self, program: ProgramHandle) -> BackendResult<()> {
        let native = self
            .programs
            .get(&program)
            .copied()
            .ok_or_else(|| RenderError::InvalidHandle(format!("{:?}", program)))?;
        unsafe { self.gl.use_program(Some(native)) };
        self.current_program = Some(native);
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let Some(program) = self.current_program else {
            return;
        };
        unsafe {
            let Some(location) = self.gl.get_uniform_location(program, name) else {
                return;
            };
            let location = Some(&location);
            match value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(location, v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(location, v[0], v[1]),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(location, v[0], v[1], v[2]),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(location, v[0], v[1], v[2], v[3]),
                UniformValue::Mat4(m) => self.gl.uniform_matrix_4_f32_slice(location, false, &m),
            }
        }
    }

    fn bind_texture(&mut self, unit: u32, kind: TextureKind, texture: Option<TextureHandle>) -> BackendResult<()> {
        let native = texture.map(|t| self.texture(t)).transpose()?;
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(gl_texture_target(kind), native);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, vertex_array: VertexArrayHandle, index_count: u32) -> BackendResult<()> {
        let vao = self
            .vertex_arrays
            .get(&vertex_array)
            .copied()
            .ok_or_else(|| RenderError::InvalidHandle(format!("{:?}", vertex_array)))?;
        unsafe {
            self.gl.bind_vertex_array(Some(vao));
            self.gl
                .draw_elements(glow::TRIANGLES, index_count as i32, glow::UNSIGNED_INT, 0);
            self.gl.bind_vertex_array(None);
        }
        Ok(())
    }

    fn blit_to_default(
        &mut self,
        source: FramebufferHandle,
        attachment: u32,
        source_size: (u32, u32),
        target_size: (u32, u32),
    ) -> BackendResult<()> {
        let native = self.framebuffer(source)?;
        unsafe {
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, Some(native));
            self.gl.read_buffer(glow::COLOR_ATTACHMENT0 + attachment);
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
            self.gl.blit_framebuffer(
                0,
                0,
                source_size.0 as i32,
                source_size.1 as i32,
                0,
                0,
                target_size.0 as i32,
                target_size.1 as i32,
                glow::COLOR_BUFFER_BIT,
                glow::LINEAR,
            );
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, None);
        }
        Ok(())
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        let leaked = self.vertex_arrays.len() + self.textures.len() + self.framebuffers.len() + self.programs.len();
        if leaked > 0 {
            log::warn!("GlBackend dropped with {} live GPU object(s)", leaked);
        }
    }
}
