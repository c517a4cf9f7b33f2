//! Cubemaps keyed by name

use std::path::Path;

use super::store::NamedStore;
use super::{AssetError, ImageData};
use crate::render::api::{RenderBackend, TextureDesc, TextureHandle};

/// Face order expected by [`CubemapStore::load`]
pub const CUBEMAP_FACES: [&str; 6] = ["+x", "-x", "+y", "-y", "+z", "-z"];

/// An uploaded cubemap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cubemap {
    /// GPU handle
    pub handle: TextureHandle,
    /// Edge length of every face
    pub size: u32,
}

/// Loaded cubemaps
#[derive(Debug)]
pub struct CubemapStore {
    cubemaps: NamedStore<Cubemap>,
}

impl Default for CubemapStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CubemapStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            cubemaps: NamedStore::new("cubemap"),
        }
    }

    /// Upload six faces (+X, -X, +Y, -Y, +Z, -Z) under `name`.
    ///
    /// Faces must be square, equally sized and share a channel count.
    pub fn load(&mut self, name: &str, faces: &[ImageData; 6], backend: &mut dyn RenderBackend) -> Result<&Cubemap, AssetError> {
        self.cubemaps.ensure_free(name)?;

        let first = &faces[0];
        for (face, label) in faces.iter().zip(CUBEMAP_FACES) {
            face.validate()?;
            if face.width != face.height {
                return Err(AssetError::InvalidImage(format!(
                    "cubemap '{}' face {} is {}x{}, faces must be square",
                    name, label, face.width, face.height
                )));
            }
            if face.width != first.width || face.channels != first.channels {
                return Err(AssetError::InvalidImage(format!(
                    "cubemap '{}' face {} does not match face {}",
                    name, label, CUBEMAP_FACES[0]
                )));
            }
        }

        let desc = TextureDesc::new(first.width, first.height, first.format()?);
        let pixels = [
            faces[0].pixels.as_slice(),
            faces[1].pixels.as_slice(),
            faces[2].pixels.as_slice(),
            faces[3].pixels.as_slice(),
            faces[4].pixels.as_slice(),
            faces[5].pixels.as_slice(),
        ];
        let handle = backend.create_cubemap(&desc, pixels)?;

        self.cubemaps.insert(
            name,
            Cubemap {
                handle,
                size: first.width,
            },
        )
    }

    /// Decode six face files and upload them under `name`
    pub fn load_from_files<P: AsRef<Path>>(
        &mut self,
        name: &str,
        paths: [P; 6],
        backend: &mut dyn RenderBackend,
    ) -> Result<&Cubemap, AssetError> {
        self.cubemaps.ensure_free(name)?;
        let [a, b, c, d, e, f] = paths;
        let faces = [
            ImageData::from_file(a)?,
            ImageData::from_file(b)?,
            ImageData::from_file(c)?,
            ImageData::from_file(d)?,
            ImageData::from_file(e)?,
            ImageData::from_file(f)?,
        ];
        self.load(name, &faces, backend)
    }

    /// Look up a cubemap
    pub fn get(&self, name: &str) -> Option<&Cubemap> {
        self.cubemaps.get(name)
    }

    /// True if a cubemap is loaded under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.cubemaps.contains(name)
    }

    /// Number of loaded cubemaps
    pub fn len(&self) -> usize {
        self.cubemaps.len()
    }

    /// True if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every cubemap
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        for (_, cubemap) in self.cubemaps.drain() {
            backend.delete_texture(cubemap.handle);
        }
    }
}

impl Drop for CubemapStore {
    fn drop(&mut self) {
        self.cubemaps.warn_if_leaking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::HeadlessBackend;

    fn faces(size: u32) -> [ImageData; 6] {
        std::array::from_fn(|i| ImageData::solid_color(size, size, [i as u8 * 40, 0, 0, 255]))
    }

    #[test]
    fn test_load_six_faces() {
        let mut backend = HeadlessBackend::new();
        let mut store = CubemapStore::new();
        let cubemap = *store.load("sky", &faces(8), &mut backend).unwrap();
        assert_eq!(cubemap.size, 8);
        assert_eq!(backend.live_textures(), 1);

        store.clear(&mut backend);
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn test_mismatched_faces_are_rejected() {
        let mut backend = HeadlessBackend::new();
        let mut store = CubemapStore::new();

        let mut mixed = faces(8);
        mixed[3] = ImageData::solid_color(4, 4, [0; 4]);
        assert!(matches!(
            store.load("sky", &mixed, &mut backend),
            Err(AssetError::InvalidImage(_))
        ));

        let mut oblong = faces(8);
        oblong[0] = ImageData::solid_color(8, 4, [0; 4]);
        assert!(matches!(
            store.load("sky", &oblong, &mut backend),
            Err(AssetError::InvalidImage(_))
        ));
        assert_eq!(backend.live_textures(), 0);
    }
}
