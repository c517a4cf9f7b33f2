//! Geometry buffer
//!
//! Four color targets plus a depth-stencil attachment:
//!
//! | attachment | format    | contents                         |
//! |------------|-----------|----------------------------------|
//! | 0          | RGBA16F   | world position, w = 1 on geometry |
//! | 1          | RGBA16F   | world normal, metallic           |
//! | 2          | RGBA8     | albedo, specular                 |
//! | 3          | RGBA8     | final color, lights accumulate   |

use super::api::{
    DepthAttachment, Framebuffer, FramebufferDesc, FramebufferHandle, FramebufferStatus,
    RenderBackend, TextureFormat, TextureHandle,
};
use super::{RenderError, RenderResult};

/// Create a framebuffer and insist it is complete.
///
/// An incomplete framebuffer is deleted before the error is returned.
pub(crate) fn create_complete_framebuffer(
    backend: &mut dyn RenderBackend,
    desc: &FramebufferDesc,
) -> RenderResult<Framebuffer> {
    let framebuffer = backend.create_framebuffer(desc)?;
    match backend.framebuffer_status(framebuffer.handle) {
        FramebufferStatus::Complete => {
            log::debug!("Framebuffer '{}' created at {}x{}", desc.label, desc.width, desc.height);
            Ok(framebuffer)
        }
        FramebufferStatus::Incomplete(reason) => {
            backend.delete_framebuffer(&framebuffer);
            log::error!("Framebuffer '{}' is incomplete: {}", desc.label, reason);
            Err(RenderError::FramebufferIncomplete {
                label: desc.label.clone(),
                reason,
            })
        }
    }
}

/// Offscreen targets of the geometry and light passes
#[derive(Debug)]
pub struct GBuffer {
    framebuffer: Framebuffer,
}

impl GBuffer {
    /// World position attachment
    pub const POSITION: u32 = 0;
    /// World normal attachment
    pub const NORMAL: u32 = 1;
    /// Albedo + specular attachment
    pub const ALBEDO_SPEC: u32 = 2;
    /// Lit color attachment
    pub const FINAL: u32 = 3;
    /// Attachments written by the geometry pass
    pub const GEOMETRY_TARGETS: [u32; 4] = [Self::POSITION, Self::NORMAL, Self::ALBEDO_SPEC, Self::FINAL];
    /// Attachments sampled by the light passes
    pub const SURFACE_TARGETS: [u32; 3] = [Self::POSITION, Self::NORMAL, Self::ALBEDO_SPEC];

    /// Allocate the G-buffer; incompleteness is fatal
    pub fn new(backend: &mut dyn RenderBackend, width: u32, height: u32) -> RenderResult<Self> {
        let desc = FramebufferDesc {
            label: "gbuffer".to_string(),
            width,
            height,
            color_attachments: vec![
                TextureFormat::Rgba16F,
                TextureFormat::Rgba16F,
                TextureFormat::Rgba8,
                TextureFormat::Rgba8,
            ],
            depth: DepthAttachment::DepthStencil,
        };
        let framebuffer = create_complete_framebuffer(backend, &desc)?;
        Ok(Self { framebuffer })
    }

    /// Framebuffer object
    pub fn handle(&self) -> FramebufferHandle {
        self.framebuffer.handle
    }

    /// Texture behind a color attachment
    pub fn texture(&self, attachment: u32) -> Option<TextureHandle> {
        self.framebuffer.color_textures.get(attachment as usize).copied()
    }

    /// Width and height in pixels
    pub fn size(&self) -> (u32, u32) {
        (self.framebuffer.width, self.framebuffer.height)
    }

    /// Release the framebuffer and its textures
    pub fn destroy(&self, backend: &mut dyn RenderBackend) {
        backend.delete_framebuffer(&self.framebuffer);
    }
}
