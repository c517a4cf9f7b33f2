//! GPU-resident models keyed by name

use std::ops::Index;

use super::store::NamedStore;
use super::{AssetError, ModelData};
use crate::render::api::{MeshBuffers, RenderBackend};
use crate::scene::AABB;

/// One uploaded mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mesh {
    /// Vertex array, buffers and index count
    pub buffers: MeshBuffers,
    /// Index into the owning node's material list
    pub material_slot: usize,
}

/// An uploaded model
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    meshes: Vec<Mesh>,
    bounds: AABB,
}

impl Model {
    /// Name the model was loaded under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Meshes in source order
    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    /// Model-space bounding box over every vertex
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// Largest material slot used plus one
    pub fn material_slot_count(&self) -> usize {
        self.meshes.iter().map(|m| m.material_slot + 1).max().unwrap_or(0)
    }
}

/// Loaded models
#[derive(Debug)]
pub struct ModelStore {
    models: NamedStore<Model>,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            models: NamedStore::new("model"),
        }
    }

    /// Upload every mesh of `data` under `name`.
    ///
    /// Nothing stays on the GPU if any mesh fails.
    pub fn load(&mut self, name: &str, data: &ModelData, backend: &mut dyn RenderBackend) -> Result<&Model, AssetError> {
        self.models.ensure_free(name)?;
        if data.meshes.is_empty() {
            return Err(AssetError::InvalidMesh(format!("model '{}' has no meshes", name)));
        }
        for (i, mesh) in data.meshes.iter().enumerate() {
            mesh.validate()
                .map_err(|e| AssetError::InvalidMesh(format!("model '{}' mesh {}: {}", name, i, e)))?;
        }

        let mut meshes = Vec::with_capacity(data.meshes.len());
        for mesh in &data.meshes {
            match backend.create_mesh(&mesh.vertices, &mesh.indices) {
                Ok(buffers) => meshes.push(Mesh {
                    buffers,
                    material_slot: mesh.material_slot,
                }),
                Err(e) => {
                    for uploaded in &meshes {
                        backend.delete_mesh(&uploaded.buffers);
                    }
                    return Err(AssetError::Gpu(e));
                }
            }
        }

        let bounds = AABB::from_points(data.positions()).unwrap_or_default();
        log::info!("Model '{}': {} mesh(es)", name, meshes.len());
        self.models.insert(
            name,
            Model {
                name: name.to_string(),
                meshes,
                bounds,
            },
        )
    }

    /// Register a model without uploading anything, bypassing validation
    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, name: &str, meshes: Vec<Mesh>) -> Result<&Model, AssetError> {
        self.models.insert(
            name,
            Model {
                name: name.to_string(),
                meshes,
                bounds: AABB::default(),
            },
        )
    }

    /// Look up a model
    pub fn get(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    /// Look up a model, failing with [`AssetError::NotFound`]
    pub fn require(&self, name: &str) -> Result<&Model, AssetError> {
        self.models.require(name)
    }

    /// True if a model is loaded under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains(name)
    }

    /// Number of loaded models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// True if nothing is loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loaded model names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.names()
    }

    /// Release every model's GPU buffers
    pub fn clear(&mut self, backend: &mut dyn RenderBackend) {
        for (_, model) in self.models.drain() {
            for mesh in &model.meshes {
                backend.delete_mesh(&mesh.buffers);
            }
        }
    }
}

impl Index<&str> for ModelStore {
    type Output = Model;

    fn index(&self, name: &str) -> &Model {
        self.models.index(name)
    }
}

impl Drop for ModelStore {
    fn drop(&mut self) {
        self.models.warn_if_leaking();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MeshData, Vertex};
    use crate::foundation::math::Vec3;
    use crate::render::backends::HeadlessBackend;

    #[test]
    fn test_load_uploads_every_mesh() {
        let mut backend = HeadlessBackend::new();
        let mut store = ModelStore::new();
        let mut data = ModelData::cube();
        data.meshes.push(ModelData::plane(4.0).meshes.remove(0).with_material_slot(1));

        let model = store.load("crate", &data, &mut backend).unwrap();
        assert_eq!(model.meshes().len(), 2);
        assert_eq!(model.material_slot_count(), 2);
        assert_eq!(model.bounds().local_min(), Vec3::new(-2.0, -0.5, -2.0));
        assert_eq!(model.bounds().local_max(), Vec3::new(2.0, 0.5, 2.0));
        assert_eq!(backend.live_meshes(), 2);

        assert_eq!(store["crate"].name(), "crate");
        store.clear(&mut backend);
        assert_eq!(backend.live_meshes(), 0);
    }

    #[test]
    fn test_duplicate_name_uploads_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut store = ModelStore::new();
        store.load("cube", &ModelData::cube(), &mut backend).unwrap();

        let err = store.load("cube", &ModelData::cube(), &mut backend).unwrap_err();
        assert!(matches!(err, AssetError::AlreadyLoaded { .. }));
        assert_eq!(backend.live_meshes(), 1);
        store.clear(&mut backend);
    }

    #[test]
    fn test_invalid_mesh_is_rejected_before_upload() {
        let mut backend = HeadlessBackend::new();
        let mut store = ModelStore::new();
        let v = Vertex::new([0.0; 3], [0.0, 1.0, 0.0], [0.0; 2]);
        let data = ModelData::new(vec![
            MeshData::new(vec![v; 3], vec![0, 1, 2]),
            MeshData::new(vec![v; 3], vec![0, 1, 9]),
        ]);

        assert!(matches!(
            store.load("broken", &data, &mut backend),
            Err(AssetError::InvalidMesh(_))
        ));
        assert_eq!(backend.live_meshes(), 0);
        assert!(!store.contains("broken"));
    }
}
