//! Resolved materials keyed by name
//!
//! A [`Material`] is a [`MaterialDesc`] whose texture names have been
//! resolved against a [`TextureStore`]. Materials own no GPU objects of
//! their own; the textures stay owned by the texture store.

use std::ops::Index;

use super::store::NamedStore;
use super::{AssetError, MaterialDesc, TextureStore, ValidationWarning};
use crate::render::api::TextureHandle;

/// Shading inputs of one material
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Name the material was loaded under
    pub name: String,
    /// Albedo texture
    pub diffuse: Option<TextureHandle>,
    /// Specular intensity texture
    pub specular: Option<TextureHandle>,
    /// Normal map
    pub normal: Option<TextureHandle>,
    /// Albedo multiplier
    pub diffuse_color: [f32; 3],
    /// Roughness in [0, 1]
    pub roughness: f32,
    /// Metallic in [0, 1]
    pub metallic: f32,
    /// Reflectivity in [0, 1]
    pub reflectivity: f32,
    /// Transparency in [0, 1]
    pub transparency: f32,
}

/// Loaded materials
#[derive(Debug)]
pub struct MaterialStore {
    materials: NamedStore<Material>,
}

impl Default for MaterialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            materials: NamedStore::new("material"),
        }
    }

    /// Resolve `desc` and store it under `name`.
    ///
    /// Unknown texture names fail the load. Out-of-range scalars are clamped
    /// and reported in the returned warnings, which are also logged.
    pub fn load(
        &mut self,
        name: &str,
        desc: &MaterialDesc,
        textures: &TextureStore,
    ) -> Result<Vec<ValidationWarning>, AssetError> {
        self.materials.ensure_free(name)?;

        let resolve = |texture: &Option<String>| -> Result<Option<TextureHandle>, AssetError> {
            match texture {
                None => Ok(None),
                Some(texture) => textures.handle(texture).map(Some).ok_or_else(|| AssetError::UnknownTexture {
                    material: name.to_string(),
                    texture: texture.clone(),
                }),
            }
        };
        let diffuse = resolve(&desc.diffuse_texture)?;
        let specular = resolve(&desc.specular_texture)?;
        let normal = resolve(&desc.normal_texture)?;

        let (clean, warnings) = desc.sanitized();
        for warning in &warnings {
            log::warn!("Material '{}': {}", name, warning);
        }

        self.materials.insert(
            name,
            Material {
                name: name.to_string(),
                diffuse,
                specular,
                normal,
                diffuse_color: clean.diffuse_color,
                roughness: clean.roughness,
                metallic: clean.metallic,
                reflectivity: clean.reflectivity,
                transparency: clean.transparency,
            },
        )?;
        Ok(warnings)
    }

    /// Parse a JSON description and load it under `name`
    pub fn load_json(
        &mut self,
        name: &str,
        json: &str,
        textures: &TextureStore,
    ) -> Result<Vec<ValidationWarning>, AssetError> {
        let desc = MaterialDesc::from_json(json)?;
        self.load(name, &desc, textures)
    }

    /// Look up a material
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    /// True if a material is loaded under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.materials.contains(name)
    }

    /// Number of loaded materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// True if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every material; the referenced textures are untouched
    pub fn clear(&mut self) {
        self.materials.drain().for_each(drop);
    }
}

impl Index<&str> for MaterialStore {
    type Output = Material;

    fn index(&self, name: &str) -> &Material {
        self.materials.index(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageData;
    use crate::render::backends::HeadlessBackend;

    #[test]
    fn test_textures_are_resolved() {
        let mut backend = HeadlessBackend::new();
        let mut textures = TextureStore::new();
        let brick = textures
            .load("brick", &ImageData::solid_color(2, 2, [200, 80, 60, 255]), &mut backend)
            .unwrap()
            .handle;

        let mut materials = MaterialStore::new();
        let warnings = materials
            .load("brick", &MaterialDesc::default().with_diffuse_texture("brick"), &textures)
            .unwrap();

        assert!(warnings.is_empty());
        assert_eq!(materials["brick"].diffuse, Some(brick));
        assert_eq!(materials["brick"].normal, None);
        textures.clear(&mut backend);
    }

    #[test]
    fn test_unknown_texture_fails() {
        let textures = TextureStore::new();
        let mut materials = MaterialStore::new();
        let err = materials
            .load("brick", &MaterialDesc::default().with_normal_texture("missing"), &textures)
            .unwrap_err();

        assert!(matches!(err, AssetError::UnknownTexture { ref texture, .. } if texture == "missing"));
        assert!(!materials.contains("brick"));
    }

    #[test]
    fn test_json_load_clamps() {
        let textures = TextureStore::new();
        let mut materials = MaterialStore::new();
        let warnings = materials
            .load_json("shiny", r#"{ "metallic": 4.0 }"#, &textures)
            .unwrap();

        assert_eq!(warnings.len(), 1);
        assert_eq!(materials["shiny"].metallic, 1.0);
    }
}
