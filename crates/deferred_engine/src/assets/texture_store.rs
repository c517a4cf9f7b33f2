//! 2D textures keyed by name

use std::ops::Index;
use std::path::Path;

use super::store::NamedStore;
use super::{AssetError, ImageData};
use crate::render::api::{RenderBackend, TextureDesc, TextureFormat, TextureHandle};

/// An uploaded 2D texture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    /// GPU handle
    pub handle: TextureHandle,
    /// Width in texels
    pub width: u32,
    /// Height in texels
    pub height: u32,
    /// Storage format
    pub format: TextureFormat,
}

/// Loaded textures
#[derive(Debug)]
pub struct TextureStore {
    textures: NamedStore<Texture>,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            textures: NamedStore::new("texture"),
        }
    }

    /// Upload decoded pixels under `name`
    pub fn load(&mut self, name: &str, image: &ImageData, backend: &mut dyn RenderBackend) -> Result<&Texture, AssetError> {
        self.textures.ensure_free(name)?;
        image.validate()?;

        let format = image.format()?;
        let handle = backend.create_texture(&TextureDesc::new(image.width, image.height, format), Some(&image.pixels))?;
        self.textures.insert(
            name,
            Texture {
                handle,
                width: image.width,
                height: image.height,
                format,
            },
        )
    }

    /// Decode an image file (PNG and the other formats `image` supports)
    /// and upload it under `name`
    pub fn load_from_file<P: AsRef<Path>>(
        &mut self,
        name: &str,
        path: P,
        backend: &mut dyn RenderBackend,
    ) -> Result<&Texture, AssetError> {
        self.textures.ensure_free(name)?;
        let image = ImageData::from_file(path)?;
        self.load(name, &image, backend)
    }

    /// Look up a texture
    pub fn get(&self, name: &str) -> Option<&Texture> {
        self.textures.get(name)
    }

    /// GPU handle of a texture
    pub fn handle(&self, name: &str) -> Option<TextureHandle> {
        self.get(name).map(|t| t.handle)
    }

    /// True if a texture is loaded under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains(name)
    }

    /// Number of loaded textures
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    /// True if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every texture
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        for (_, texture) in self.textures.drain() {
            backend.delete_texture(texture.handle);
        }
    }
}

impl Index<&str> for TextureStore {
    type Output = Texture;

    fn index(&self, name: &str) -> &Texture {
        self.textures.index(name)
    }
}

impl Drop for TextureStore {
    fn drop(&mut self) {
        self.textures.warn_if_leaking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::HeadlessBackend;

    #[test]
    fn test_load_and_clear() {
        let mut backend = HeadlessBackend::new();
        let mut store = TextureStore::new();
        let texture = *store
            .load("white", &ImageData::solid_color(4, 4, [255; 4]), &mut backend)
            .unwrap();

        assert_eq!(texture.format, TextureFormat::Rgba8);
        assert_eq!(store.handle("white"), Some(texture.handle));
        assert_eq!(store["white"].width, 4);

        store.clear(&mut backend);
        assert!(store.is_empty());
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn test_missing_file_is_a_decode_error() {
        let mut backend = HeadlessBackend::new();
        let mut store = TextureStore::new();
        let err = store
            .load_from_file("missing", "does/not/exist.png", &mut backend)
            .unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let mut store = TextureStore::new();
        let image = ImageData::solid_color(1, 1, [0; 4]);
        store.load("black", &image, &mut backend).unwrap();
        assert!(matches!(
            store.load("black", &image, &mut backend),
            Err(AssetError::AlreadyLoaded { .. })
        ));
        store.clear(&mut backend);
    }
}
