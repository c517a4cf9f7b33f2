//! Build scene nodes from a JSON description
//!
//! ```json
//! {
//!   "objects": [
//!     { "uuid": "table", "model": "cube", "materials": ["wood"],
//!       "position": [0, 0.5, 0], "scale": [2, 0.1, 1],
//!       "children": [ { "model": "cube", "materials": ["brick"] } ] },
//!     { "uuid": "lamp", "category": "light", "position": [0, 3, 0] }
//!   ]
//! }
//! ```
//!
//! Objects without a `uuid` get a random one. Local bounds come from the
//! referenced model when it is loaded.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{NodeCategory, NodeDesc, NodeId, Scene, SceneError, SceneResult, Transform};
use crate::assets::ModelStore;
use crate::foundation::math::Vec3;

/// One object and its children
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectDesc {
    /// Unique identifier, random when absent
    pub uuid: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Material names by mesh slot
    pub materials: Vec<String>,
    /// Category bucket
    pub category: NodeCategory,
    /// Initial translation
    pub position: [f32; 3],
    /// Initial Euler rotation in degrees (X, Y, Z)
    pub rotation: [f32; 3],
    /// Initial scale
    pub scale: [f32; 3],
    /// Initial culled flag
    pub culled: bool,
    /// Child objects
    pub children: Vec<ObjectDesc>,
}

impl Default for ObjectDesc {
    fn default() -> Self {
        Self {
            uuid: None,
            model: None,
            materials: Vec::new(),
            category: NodeCategory::Normal,
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
            culled: false,
            children: Vec::new(),
        }
    }
}

/// Top-level scene description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDesc {
    /// Root objects
    #[serde(default)]
    pub objects: Vec<ObjectDesc>,
}

impl SceneDesc {
    /// Parse a JSON description
    pub fn from_json(json: &str) -> SceneResult<Self> {
        serde_json::from_str(json).map_err(|e| SceneError::Parse(e.to_string()))
    }

    /// Read and parse a JSON description file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SceneResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SceneError::Parse(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Total number of objects including children
    pub fn object_count(&self) -> usize {
        fn count(objects: &[ObjectDesc]) -> usize {
            objects.iter().map(|o| 1 + count(&o.children)).sum()
        }
        count(&self.objects)
    }
}

/// Turns descriptions into scene nodes
pub struct SceneFactory<'a> {
    models: &'a ModelStore,
}

impl<'a> SceneFactory<'a> {
    /// Factory resolving bounds against `models`
    pub fn new(models: &'a ModelStore) -> Self {
        Self { models }
    }

    /// Describe one object, without its children
    pub fn node_desc(&self, object: &ObjectDesc) -> NodeDesc {
        let mut desc = match &object.uuid {
            Some(uuid) => NodeDesc::new(uuid.clone()),
            None => NodeDesc::with_random_uuid(),
        };
        desc = desc
            .with_materials(object.materials.iter().cloned())
            .with_category(object.category)
            .with_culled(object.culled)
            .with_transform(Transform::from_parts(
                Vec3::from(object.position),
                Vec3::from(object.rotation),
                Vec3::from(object.scale),
            ));

        if let Some(model) = &object.model {
            match self.models.get(model) {
                Some(loaded) => desc = desc.with_bounds(loaded.bounds()),
                None => log::warn!("Object references model '{}' which is not loaded", model),
            }
            desc = desc.with_model(model.clone());
        }
        desc
    }

    /// Create every object of `scene_desc` in `scene`; returns the root ids.
    ///
    /// Stops at the first failing object. Nodes created before it stay.
    pub fn build(&self, scene: &mut Scene, scene_desc: &SceneDesc) -> SceneResult<Vec<NodeId>> {
        let mut roots = Vec::with_capacity(scene_desc.objects.len());
        for object in &scene_desc.objects {
            roots.push(self.build_object(scene, None, object)?);
        }
        Ok(roots)
    }

    fn build_object(&self, scene: &mut Scene, parent: Option<NodeId>, object: &ObjectDesc) -> SceneResult<NodeId> {
        let desc = self.node_desc(object);
        let id = match parent {
            Some(parent) => scene.create_child_node(parent, desc)?,
            None => scene.create_node(desc)?,
        };
        if let Some(node) = scene.node_mut(id) {
            node.refresh_bounds();
        }
        for child in &object.children {
            self.build_object(scene, Some(id), child)?;
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ModelData;
    use crate::render::backends::HeadlessBackend;

    const TABLE: &str = r#"{
        "objects": [
            { "uuid": "table", "model": "cube", "materials": ["wood"],
              "position": [0, 1, 0], "scale": [2, 2, 2],
              "children": [ { "model": "cube", "materials": ["brick"] } ] },
            { "uuid": "lamp", "category": "light", "position": [0, 3, 0] }
        ]
    }"#;

    #[test]
    fn test_build_hierarchy_from_json() {
        let mut backend = HeadlessBackend::new();
        let mut models = ModelStore::new();
        models.load("cube", &ModelData::cube(), &mut backend).unwrap();

        let desc = SceneDesc::from_json(TABLE).unwrap();
        assert_eq!(desc.object_count(), 3);

        let mut scene = Scene::new();
        let roots = SceneFactory::new(&models).build(&mut scene, &desc).unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(scene.len(), 3);

        let table = scene.find_node_by_uuid("table").unwrap();
        assert_eq!(scene.node(table).unwrap().children().len(), 1);
        // Cube is 1 unit wide, scaled by 2 and lifted by 1
        let aabb = scene.node(table).unwrap().aabb;
        assert_eq!(aabb.min_y(), 0.0);
        assert_eq!(aabb.max_y(), 2.0);

        let lamp = scene.find_node_by_uuid("lamp").unwrap();
        assert_eq!(scene.node(lamp).unwrap().category(), NodeCategory::Light);
        assert_eq!(scene.nodes_in_category(NodeCategory::Light), &[lamp]);

        models.clear(&mut backend);
    }

    #[test]
    fn test_missing_uuid_gets_random_one() {
        let models = ModelStore::new();
        let factory = SceneFactory::new(&models);
        let a = factory.node_desc(&ObjectDesc::default());
        let b = factory.node_desc(&ObjectDesc::default());
        assert!(!a.uuid.is_empty());
        assert_ne!(a.uuid, b.uuid);
    }

    #[test]
    fn test_duplicate_uuid_in_description_fails() {
        let models = ModelStore::new();
        let desc = SceneDesc::from_json(r#"{ "objects": [ { "uuid": "a" }, { "uuid": "a" } ] }"#).unwrap();
        let mut scene = Scene::new();
        let err = SceneFactory::new(&models).build(&mut scene, &desc).unwrap_err();
        assert_eq!(err, SceneError::DuplicateUuid("a".to_string()));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(SceneDesc::from_json("{ objects: 1 }"), Err(SceneError::Parse(_))));
    }
}
