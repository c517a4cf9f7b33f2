//! Scene nodes
//!
//! A [`SceneNode`] is plain data owned by the [`Scene`](super::Scene) arena.
//! Hierarchy links are [`NodeId`] handles: the parent link is a non-owning
//! back-reference and the children list is the set of nodes whose lifetime the
//! parent owns. Both sides of a link are kept in sync by the scene's
//! `attach`/`detach`, never by the node alone.

use serde::{Deserialize, Serialize};

use super::{Transform, AABB};

slotmap::new_key_type! {
    /// Stable handle to a node in a [`Scene`](super::Scene).
    ///
    /// Handles of removed nodes are never reused for a different node; lookups
    /// with a stale handle return `None`.
    pub struct NodeId;
}

/// What a node represents, used to bucket nodes for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Renderable geometry
    #[default]
    Normal,
    /// Light anchor (no geometry)
    Light,
    /// Placeholder that neither renders nor lights
    Invalid,
}

/// Everything needed to create a node
#[derive(Debug, Clone)]
pub struct NodeDesc {
    /// Unique identifier within the scene
    pub uuid: String,
    /// Model name in the model store, `None` for nodes without geometry
    pub model: Option<String>,
    /// Material names indexed by the model's mesh material slots
    pub materials: Vec<String>,
    /// Category bucket
    pub category: NodeCategory,
    /// Model-space bounding box
    pub bounds: AABB,
    /// Initial culled flag
    pub culled: bool,
    /// Initial transform
    pub transform: Transform,
}

impl NodeDesc {
    /// Describe a normal node with no model yet
    pub fn new(uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            model: None,
            materials: Vec::new(),
            category: NodeCategory::Normal,
            bounds: AABB::default(),
            culled: false,
            transform: Transform::identity(),
        }
    }

    /// Describe a node with a fresh random UUID
    pub fn with_random_uuid() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    /// Builder pattern: set the model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Builder pattern: set the material list
    pub fn with_materials<I, S>(mut self, materials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.materials = materials.into_iter().map(Into::into).collect();
        self
    }

    /// Builder pattern: set the category
    pub fn with_category(mut self, category: NodeCategory) -> Self {
        self.category = category;
        self
    }

    /// Builder pattern: set the local bounding box
    pub fn with_bounds(mut self, bounds: AABB) -> Self {
        self.bounds = bounds;
        self
    }

    /// Builder pattern: set the culled flag
    pub fn with_culled(mut self, culled: bool) -> Self {
        self.culled = culled;
        self
    }

    /// Builder pattern: set the initial transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }
}

/// A node in the scene hierarchy
#[derive(Debug, Clone)]
pub struct SceneNode {
    uuid: String,
    model: Option<String>,
    materials: Vec<String>,
    category: NodeCategory,
    /// Node transform
    pub transform: Transform,
    /// Node bounds
    pub aabb: AABB,
    /// Set by culling; culled nodes are skipped by the renderer
    pub culled: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    pub(crate) fn from_desc(desc: NodeDesc) -> Self {
        Self {
            uuid: desc.uuid,
            model: desc.model,
            materials: desc.materials,
            category: desc.category,
            transform: desc.transform,
            aabb: desc.bounds,
            culled: desc.culled,
            parent: None,
            children: Vec::new(),
        }
    }

    /// Unique identifier
    pub fn uuid(&self) -> &str {
        &self.uuid
    }

    /// Model name, if the node has geometry
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Material names by mesh slot
    pub fn materials(&self) -> &[String] {
        &self.materials
    }

    /// Category bucket
    pub fn category(&self) -> NodeCategory {
        self.category
    }

    pub(crate) fn set_category(&mut self, category: NodeCategory) {
        self.category = category;
    }

    /// Parent handle, `None` for roots
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    /// Child handles in insertion order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Add a child handle; returns `false` if it was already present
    pub fn add_child(&mut self, child: NodeId) -> bool {
        if self.children.contains(&child) {
            return false;
        }
        self.children.push(child);
        true
    }

    /// Remove a child handle; returns `false` if it was not present
    pub fn remove_child(&mut self, child: NodeId) -> bool {
        let before = self.children.len();
        self.children.retain(|c| *c != child);
        self.children.len() != before
    }

    /// Recompute the world box from the current model matrix, so the box
    /// follows the geometry the renderer draws
    pub fn refresh_bounds(&mut self) {
        self.aabb.update_from_matrix(self.transform.matrix());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec3};
    use approx::assert_relative_eq;
    use slotmap::SlotMap;

    #[test]
    fn test_add_child_is_idempotent() {
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        let child = ids.insert(());

        let mut node = SceneNode::from_desc(NodeDesc::new("parent"));
        assert!(node.add_child(child));
        assert!(!node.add_child(child));
        assert_eq!(node.children(), &[child]);
    }

    #[test]
    fn test_remove_missing_child_is_noop() {
        let mut ids: SlotMap<NodeId, ()> = SlotMap::with_key();
        let child = ids.insert(());
        let other = ids.insert(());

        let mut node = SceneNode::from_desc(NodeDesc::new("parent"));
        node.add_child(child);
        assert!(!node.remove_child(other));
        assert!(node.remove_child(child));
        assert!(node.children().is_empty());
    }

    #[test]
    fn test_desc_builder() {
        let desc = NodeDesc::new("cube0")
            .with_model("cube")
            .with_materials(["brick"])
            .with_category(NodeCategory::Normal);
        let node = SceneNode::from_desc(desc);
        assert_eq!(node.model(), Some("cube"));
        assert_eq!(node.materials(), &["brick".to_string()]);
        assert!(node.parent().is_none());
    }

    #[test]
    fn test_bounds_follow_model_matrix() {
        let bounds = AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let mut node = SceneNode::from_desc(NodeDesc::new("spun").with_bounds(bounds));
        node.transform.rotate_z(90.0);
        node.transform.translate(Vec3::new(5.0, 0.0, 0.0));
        node.refresh_bounds();

        let origin = node.transform.matrix().transform_point(&Point3::origin()).coords;
        assert_relative_eq!(origin, Vec3::new(0.0, 5.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(node.aabb.center(), origin, epsilon = 1e-5);
        assert!(node.aabb.contains_point(origin));
    }
}
