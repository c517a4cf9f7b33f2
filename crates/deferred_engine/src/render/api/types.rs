//! Opaque GPU handles and the small enums used to drive pipeline state

use bitflags::bitflags;

/// Handle to a vertex or index buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Handle to a vertex array object (buffer bindings plus attribute layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayHandle(pub u32);

/// Handle to a 2D texture or cubemap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Handle to an offscreen framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferHandle(pub u32);

/// Handle to a linked shader program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// GPU buffers backing one uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshBuffers {
    /// Vertex array with the attribute layout bound
    pub vertex_array: VertexArrayHandle,
    /// Interleaved vertex data
    pub vertex_buffer: BufferHandle,
    /// `u32` indices
    pub index_buffer: BufferHandle,
    /// Number of indices to draw
    pub index_count: u32,
}

/// Pixel storage of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8-bit single channel
    R8,
    /// 8-bit RGB
    Rgb8,
    /// 8-bit RGBA
    Rgba8,
    /// 16-bit float RGBA (G-buffer normals and positions)
    Rgba16F,
    /// 32-bit float depth (shadow maps)
    Depth32F,
    /// 24-bit depth plus 8-bit stencil
    Depth24Stencil8,
}

impl TextureFormat {
    /// Format matching an 8-bit image with `channels` channels
    pub fn from_channels(channels: u8) -> Option<Self> {
        match channels {
            1 => Some(Self::R8),
            3 => Some(Self::Rgb8),
            4 => Some(Self::Rgba8),
            _ => None,
        }
    }

    /// Bytes per texel for uploadable formats
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::R8 => 1,
            Self::Rgb8 => 3,
            Self::Rgba8 | Self::Depth32F | Self::Depth24Stencil8 => 4,
            Self::Rgba16F => 8,
        }
    }

    /// True for depth and depth-stencil formats
    pub fn is_depth(self) -> bool {
        matches!(self, Self::Depth32F | Self::Depth24Stencil8)
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear, with mipmaps when generated
    Linear,
}

/// Texture creation parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Storage format
    pub format: TextureFormat,
    /// Min/mag filter
    pub filter: TextureFilter,
    /// Generate a mip chain after upload
    pub mipmaps: bool,
}

impl TextureDesc {
    /// Linear-filtered, mipmapped texture description
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            filter: TextureFilter::Linear,
            mipmaps: true,
        }
    }

    /// Nearest-filtered render target description
    pub fn render_target(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            format,
            filter: TextureFilter::Nearest,
            mipmaps: false,
        }
    }
}

/// Texture binding target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    /// 2D texture
    Texture2D,
    /// Six-faced cubemap
    Cubemap,
}

/// Depth attachment of a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthAttachment {
    /// No depth buffer
    None,
    /// Depth only, sampleable (shadow maps)
    Depth,
    /// Depth plus stencil (G-buffer)
    DepthStencil,
}

/// Framebuffer creation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferDesc {
    /// Debug label
    pub label: String,
    /// Width of every attachment
    pub width: u32,
    /// Height of every attachment
    pub height: u32,
    /// One color texture per entry, attached in order
    pub color_attachments: Vec<TextureFormat>,
    /// Depth attachment kind
    pub depth: DepthAttachment,
}

/// Created framebuffer and the textures it owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    /// Framebuffer object
    pub handle: FramebufferHandle,
    /// Color textures in attachment order
    pub color_textures: Vec<TextureHandle>,
    /// Depth texture, if requested
    pub depth_texture: Option<TextureHandle>,
    /// Attachment width
    pub width: u32,
    /// Attachment height
    pub height: u32,
}

/// Completeness check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferStatus {
    /// Usable as a render target
    Complete,
    /// Not usable; carries the driver's reason
    Incomplete(String),
}

/// Which framebuffer binding point to set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// Draw and read
    Both,
    /// Draw only
    Draw,
    /// Read only
    Read,
}

/// Polygon face selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// Front faces
    Front,
    /// Back faces
    Back,
    /// Both faces
    FrontAndBack,
}

/// Depth/stencil comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    /// Always passes
    Always,
    /// Never passes
    Never,
    /// Passes if less
    Less,
    /// Passes if less or equal
    LessEqual,
    /// Passes if equal
    Equal,
    /// Passes if not equal
    NotEqual,
}

/// Stencil buffer update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    /// Keep the current value
    Keep,
    /// Set to zero
    Zero,
    /// Increment with wrap
    IncrementWrap,
    /// Decrement with wrap
    DecrementWrap,
}

/// Color blending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Blending off
    Disabled,
    /// `src + dst`, used to accumulate lights
    Additive,
    /// `src * a + dst * (1 - a)`
    Alpha,
}

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Color attachments selected by the draw buffers
        const COLOR = 1 << 0;
        /// Depth buffer
        const DEPTH = 1 << 1;
        /// Stencil buffer
        const STENCIL = 1 << 2;
    }
}

/// Value uploaded to a shader uniform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// `int` or sampler unit
    Int(i32),
    /// `float`
    Float(f32),
    /// `vec2`
    Vec2([f32; 2]),
    /// `vec3`
    Vec3([f32; 3]),
    /// `vec4`
    Vec4([f32; 4]),
    /// Column-major `mat4`
    Mat4([f32; 16]),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_channels() {
        assert_eq!(TextureFormat::from_channels(4), Some(TextureFormat::Rgba8));
        assert_eq!(TextureFormat::from_channels(3), Some(TextureFormat::Rgb8));
        assert_eq!(TextureFormat::from_channels(2), None);
        assert!(TextureFormat::Depth24Stencil8.is_depth());
        assert!(!TextureFormat::Rgba16F.is_depth());
    }

    #[test]
    fn test_clear_flags_combine() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(flags.contains(ClearFlags::DEPTH));
        assert!(!flags.contains(ClearFlags::STENCIL));
    }
}
