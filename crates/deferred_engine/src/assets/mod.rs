//! Asset management system
//!
//! Stores take decoded data (geometry, pixels, material descriptions), push
//! it to the GPU through a [`RenderBackend`](crate::render::api::RenderBackend)
//! and hand back descriptions holding opaque handles. Every store is keyed by
//! a unique name and owns its GPU objects until `clear` is called.

pub mod cubemap_store;
pub mod geometry;
pub mod image_loader;
pub mod material_desc;
pub mod material_store;
pub mod model_store;
pub mod texture_store;

mod store;

pub use cubemap_store::{Cubemap, CubemapStore, CUBEMAP_FACES};
pub use geometry::{MeshData, ModelData, Vertex};
pub use image_loader::ImageData;
pub use material_desc::{MaterialDesc, ValidationWarning};
pub use material_store::{Material, MaterialStore};
pub use model_store::{Mesh, Model, ModelStore};
pub use texture_store::{Texture, TextureStore};

use thiserror::Error;

use crate::render::RenderError;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// Name already used in this store
    #[error("{kind} '{name}' is already loaded")]
    AlreadyLoaded {
        /// Store kind
        kind: &'static str,
        /// Duplicate name
        name: String,
    },

    /// Name not loaded in this store
    #[error("{kind} '{name}' not found")]
    NotFound {
        /// Store kind
        kind: &'static str,
        /// Missing name
        name: String,
    },

    /// Material references a texture that is not loaded
    #[error("Material '{material}' references unknown texture '{texture}'")]
    UnknownTexture {
        /// Material being loaded
        material: String,
        /// Missing texture name
        texture: String,
    },

    /// Pixel data inconsistent with its dimensions
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Geometry that cannot be drawn
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// IO error during asset loading
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoder failure
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// Malformed description file
    #[error("Parse error: {0}")]
    Parse(String),

    /// GPU upload failed
    #[error("GPU upload failed: {0}")]
    Gpu(#[from] RenderError),
}
