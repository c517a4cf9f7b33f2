//! Scene graph: arena of nodes plus change tracking
//!
//! The [`Scene`] is the only owner of [`SceneNode`]s. Everything else holds
//! [`NodeId`] handles. Alongside the arena it keeps a UUID index, a
//! per-category index and two delta queues (nodes added, nodes removed) that
//! a consumer drains once per tick with [`Scene::pull_updates`].

use std::collections::HashMap;

use slotmap::SlotMap;

use super::{NodeCategory, NodeDesc, NodeId, SceneError, SceneNode, SceneResult};
use crate::foundation::math::Vec3;

/// Snapshot of the deltas accumulated since the previous pull
#[derive(Debug, Default)]
pub struct SceneUpdates {
    /// Nodes created since the last pull and still alive, in creation order
    pub new_nodes: Vec<NodeId>,
    /// Nodes removed since the last pull, in removal order
    pub deleted_nodes: Vec<DeletedNode>,
    /// Live nodes whose category changed after they were last pulled
    pub recategorized: Vec<NodeId>,
}

impl SceneUpdates {
    /// True when there is nothing to fold
    pub fn is_empty(&self) -> bool {
        self.new_nodes.is_empty() && self.deleted_nodes.is_empty() && self.recategorized.is_empty()
    }
}

/// A node that left the scene, handed over to the delta consumer
#[derive(Debug)]
pub struct DeletedNode {
    /// Handle the node had while it was alive
    pub id: NodeId,
    /// The removed node itself
    pub node: SceneNode,
}

/// Owner of all scene nodes
#[derive(Debug, Default)]
pub struct Scene {
    nodes: SlotMap<NodeId, SceneNode>,
    by_uuid: HashMap<String, NodeId>,
    categories: HashMap<NodeCategory, Vec<NodeId>>,
    added: Vec<NodeId>,
    deleted: Vec<DeletedNode>,
    recategorized: Vec<NodeId>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root node.
    ///
    /// Fails if the UUID is empty or already used by a live node.
    pub fn create_node(&mut self, desc: NodeDesc) -> SceneResult<NodeId> {
        if desc.uuid.is_empty() {
            return Err(SceneError::EmptyUuid);
        }
        if self.by_uuid.contains_key(&desc.uuid) {
            return Err(SceneError::DuplicateUuid(desc.uuid));
        }

        let uuid = desc.uuid.clone();
        let category = desc.category;
        let id = self.nodes.insert(SceneNode::from_desc(desc));

        self.by_uuid.insert(uuid, id);
        self.categories.entry(category).or_default().push(id);
        self.added.push(id);

        log::trace!("Created scene node {:?} in {:?}", id, category);
        Ok(id)
    }

    /// Create a node and attach it under `parent`
    pub fn create_child_node(&mut self, parent: NodeId, desc: NodeDesc) -> SceneResult<NodeId> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let child = self.create_node(desc)?;
        self.attach(parent, child)?;
        Ok(child)
    }

    /// Make `child` a child of `parent`, keeping both sides of the link in
    /// sync. A child that already has another parent is moved.
    ///
    /// Returns `Ok(false)` if the link already existed.
    pub fn attach(&mut self, parent: NodeId, child: NodeId) -> SceneResult<bool> {
        if !self.nodes.contains_key(parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let previous_parent = self
            .nodes
            .get(child)
            .ok_or(SceneError::NodeNotFound(child))?
            .parent();

        if previous_parent == Some(parent) {
            return Ok(false);
        }
        if parent == child || self.is_ancestor(child, parent) {
            return Err(SceneError::CycleDetected { parent, child });
        }

        if let Some(old) = previous_parent {
            if let Some(old_node) = self.nodes.get_mut(old) {
                old_node.remove_child(child);
            }
        }
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.add_child(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.set_parent(Some(parent));
        }
        Ok(true)
    }

    /// Detach `child` from its parent; it becomes a root.
    ///
    /// Returns `Ok(false)` if it already was one.
    pub fn detach(&mut self, child: NodeId) -> SceneResult<bool> {
        let parent = self
            .nodes
            .get(child)
            .ok_or(SceneError::NodeNotFound(child))?
            .parent();

        let Some(parent) = parent else {
            return Ok(false);
        };
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.remove_child(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.set_parent(None);
        }
        Ok(true)
    }

    /// True if `ancestor` is on the parent chain of `node`
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.nodes.get(node).and_then(SceneNode::parent);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id).and_then(SceneNode::parent);
        }
        false
    }

    /// Remove a node together with its whole subtree.
    ///
    /// Every removed node is moved into the deleted delta queue. Returns the
    /// number of nodes removed.
    pub fn remove_node(&mut self, id: NodeId) -> SceneResult<usize> {
        if !self.nodes.contains_key(id) {
            return Err(SceneError::NodeNotFound(id));
        }
        self.detach(id)?;

        let subtree = self.subtree(id);
        for node_id in &subtree {
            let Some(node) = self.nodes.remove(*node_id) else {
                continue;
            };
            self.by_uuid.remove(node.uuid());
            if let Some(bucket) = self.categories.get_mut(&node.category()) {
                bucket.retain(|n| n != node_id);
            }
            self.deleted.push(DeletedNode { id: *node_id, node });
        }

        log::trace!("Removed {} scene node(s) rooted at {:?}", subtree.len(), id);
        Ok(subtree.len())
    }

    /// Remove the node with the given UUID and its subtree
    pub fn remove_by_uuid(&mut self, uuid: &str) -> SceneResult<usize> {
        let id = self
            .find_node_by_uuid(uuid)
            .ok_or_else(|| SceneError::UnknownUuid(uuid.to_string()))?;
        self.remove_node(id)
    }

    /// Remove every node
    pub fn clear(&mut self) {
        let roots: Vec<NodeId> = self.roots().collect();
        for root in roots {
            // Roots come from the live arena
            let _ = self.remove_node(root);
        }
    }

    /// `id` followed by all of its descendants, depth first
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children().iter().rev().copied());
        }
        out
    }

    /// Look up a live node by UUID
    pub fn find_node_by_uuid(&self, uuid: &str) -> Option<NodeId> {
        self.by_uuid.get(uuid).copied()
    }

    /// Borrow a node
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id)
    }

    /// Mutably borrow a node
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id)
    }

    /// True if the handle refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the scene has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate live nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter()
    }

    /// Iterate root nodes
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.parent().is_none())
            .map(|(id, _)| id)
    }

    /// Live node handles grouped by category
    pub fn categories(&self) -> &HashMap<NodeCategory, Vec<NodeId>> {
        &self.categories
    }

    /// Live node handles in one category
    pub fn nodes_in_category(&self, category: NodeCategory) -> &[NodeId] {
        self.categories.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Move a node to a different category bucket
    pub fn set_category(&mut self, id: NodeId, category: NodeCategory) -> SceneResult<()> {
        let node = self.nodes.get_mut(id).ok_or(SceneError::NodeNotFound(id))?;
        let old = node.category();
        if old == category {
            return Ok(());
        }
        node.set_category(category);

        if let Some(bucket) = self.categories.get_mut(&old) {
            bucket.retain(|n| *n != id);
        }
        self.categories.entry(category).or_default().push(id);

        // Nodes not pulled yet are folded from their current state anyway
        if !self.added.contains(&id) && !self.recategorized.contains(&id) {
            self.recategorized.push(id);
        }
        Ok(())
    }

    /// Move a node, optionally broadcasting the same delta to all descendants
    pub fn translate(&mut self, id: NodeId, delta: Vec3, propagate: bool) -> bool {
        self.for_each_target(id, propagate, |node| node.transform.translate(delta))
    }

    /// Rotate a node about X (degrees), optionally broadcasting to descendants
    pub fn rotate_x(&mut self, id: NodeId, degrees: f32, propagate: bool) -> bool {
        self.for_each_target(id, propagate, |node| node.transform.rotate_x(degrees))
    }

    /// Rotate a node about Y (degrees), optionally broadcasting to descendants
    pub fn rotate_y(&mut self, id: NodeId, degrees: f32, propagate: bool) -> bool {
        self.for_each_target(id, propagate, |node| node.transform.rotate_y(degrees))
    }

    /// Rotate a node about Z (degrees), optionally broadcasting to descendants
    pub fn rotate_z(&mut self, id: NodeId, degrees: f32, propagate: bool) -> bool {
        self.for_each_target(id, propagate, |node| node.transform.rotate_z(degrees))
    }

    /// Scale a node, optionally broadcasting to descendants
    pub fn scale(&mut self, id: NodeId, factor: Vec3, propagate: bool) -> bool {
        self.for_each_target(id, propagate, |node| node.transform.scale(factor))
    }

    fn for_each_target<F>(&mut self, id: NodeId, propagate: bool, mut op: F) -> bool
    where
        F: FnMut(&mut SceneNode),
    {
        if !self.nodes.contains_key(id) {
            log::debug!("Ignoring transform edit on missing node {:?}", id);
            return false;
        }
        let targets = if propagate { self.subtree(id) } else { vec![id] };
        for target in targets {
            if let Some(node) = self.nodes.get_mut(target) {
                op(node);
            }
        }
        true
    }

    /// Snapshot every transform as the previous-tick state (start of a tick)
    pub fn snapshot_transforms(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.transform.update();
        }
    }

    /// Recompute every world bounding box from its transform (end of a tick)
    pub fn refresh_bounds(&mut self) {
        for (_, node) in self.nodes.iter_mut() {
            node.refresh_bounds();
        }
    }

    /// True if a pull would return something
    pub fn has_pending_updates(&self) -> bool {
        !self.added.is_empty() || !self.deleted.is_empty() || !self.recategorized.is_empty()
    }

    /// Drain the delta queues.
    ///
    /// Nodes created and removed since the previous pull only show up in
    /// `deleted_nodes`. A second pull without mutation in between is empty.
    pub fn pull_updates(&mut self) -> SceneUpdates {
        let nodes = &self.nodes;
        let new_nodes = self
            .added
            .drain(..)
            .filter(|id| nodes.contains_key(*id))
            .collect();
        let recategorized = self
            .recategorized
            .drain(..)
            .filter(|id| nodes.contains_key(*id))
            .collect();

        SceneUpdates {
            new_nodes,
            deleted_nodes: std::mem::take(&mut self.deleted),
            recategorized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube(uuid: &str) -> NodeDesc {
        NodeDesc::new(uuid).with_model("cube").with_materials(["brick"])
    }

    #[test]
    fn test_create_then_pull_drains_once() {
        let mut scene = Scene::new();
        let id = scene.create_node(cube("cube0")).unwrap();

        let first = scene.pull_updates();
        assert_eq!(first.new_nodes, vec![id]);
        assert!(first.deleted_nodes.is_empty());

        let second = scene.pull_updates();
        assert!(second.is_empty());
        assert!(!scene.has_pending_updates());
    }

    #[test]
    fn test_duplicate_uuid_is_rejected() {
        let mut scene = Scene::new();
        let first = scene.create_node(cube("cube0")).unwrap();
        let err = scene.create_node(cube("cube0")).unwrap_err();

        assert_eq!(err, SceneError::DuplicateUuid("cube0".to_string()));
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.find_node_by_uuid("cube0"), Some(first));
    }

    #[test]
    fn test_empty_uuid_is_rejected() {
        let mut scene = Scene::new();
        assert_eq!(scene.create_node(NodeDesc::new("")).unwrap_err(), SceneError::EmptyUuid);
    }

    #[test]
    fn test_uuid_is_reusable_after_removal() {
        let mut scene = Scene::new();
        let old = scene.create_node(cube("cube0")).unwrap();
        scene.remove_node(old).unwrap();
        let new = scene.create_node(cube("cube0")).unwrap();

        assert_ne!(old, new);
        assert!(scene.node(old).is_none());
    }

    #[test]
    fn test_add_and_remove_in_one_window_is_net_removed() {
        let mut scene = Scene::new();
        let id = scene.create_node(cube("temp")).unwrap();
        scene.remove_node(id).unwrap();

        let updates = scene.pull_updates();
        assert!(updates.new_nodes.is_empty());
        assert_eq!(updates.deleted_nodes.len(), 1);
        assert_eq!(updates.deleted_nodes[0].id, id);
        assert_eq!(updates.deleted_nodes[0].node.uuid(), "temp");
    }

    #[test]
    fn test_attach_keeps_both_sides_in_sync() {
        let mut scene = Scene::new();
        let a = scene.create_node(cube("a")).unwrap();
        let b = scene.create_node(cube("b")).unwrap();
        let c = scene.create_node(cube("c")).unwrap();

        assert!(scene.attach(a, c).unwrap());
        assert!(!scene.attach(a, c).unwrap());
        assert_eq!(scene.node(c).unwrap().parent(), Some(a));

        // Reparenting moves the child
        assert!(scene.attach(b, c).unwrap());
        assert!(scene.node(a).unwrap().children().is_empty());
        assert_eq!(scene.node(b).unwrap().children(), &[c]);
        assert_eq!(scene.node(c).unwrap().parent(), Some(b));

        assert!(scene.detach(c).unwrap());
        assert!(scene.node(b).unwrap().children().is_empty());
        assert!(scene.node(c).unwrap().parent().is_none());
        assert!(!scene.detach(c).unwrap());
    }

    #[test]
    fn test_attach_rejects_cycles() {
        let mut scene = Scene::new();
        let root = scene.create_node(cube("root")).unwrap();
        let mid = scene.create_child_node(root, cube("mid")).unwrap();
        let leaf = scene.create_child_node(mid, cube("leaf")).unwrap();

        assert!(matches!(scene.attach(leaf, root), Err(SceneError::CycleDetected { .. })));
        assert!(matches!(scene.attach(root, root), Err(SceneError::CycleDetected { .. })));
        assert_eq!(scene.node(root).unwrap().parent(), None);
    }

    #[test]
    fn test_remove_takes_the_subtree() {
        let mut scene = Scene::new();
        let root = scene.create_node(cube("root")).unwrap();
        let child = scene.create_child_node(root, cube("child")).unwrap();
        let grandchild = scene.create_child_node(child, cube("grandchild")).unwrap();
        let sibling = scene.create_node(cube("sibling")).unwrap();
        scene.pull_updates();

        assert_eq!(scene.remove_node(child).unwrap(), 2);
        assert!(scene.contains(root));
        assert!(scene.contains(sibling));
        assert!(!scene.contains(grandchild));
        assert!(scene.node(root).unwrap().children().is_empty());
        assert!(scene.find_node_by_uuid("grandchild").is_none());

        let deleted: Vec<NodeId> = scene.pull_updates().deleted_nodes.iter().map(|d| d.id).collect();
        assert_eq!(deleted, vec![child, grandchild]);
    }

    #[test]
    fn test_category_index_tracks_mutations() {
        let mut scene = Scene::new();
        let cube0 = scene.create_node(cube("cube0")).unwrap();
        let light0 = scene
            .create_node(NodeDesc::new("light0").with_category(NodeCategory::Light))
            .unwrap();

        assert_eq!(scene.nodes_in_category(NodeCategory::Normal), &[cube0]);
        assert_eq!(scene.nodes_in_category(NodeCategory::Light), &[light0]);

        scene.set_category(cube0, NodeCategory::Invalid).unwrap();
        assert!(scene.nodes_in_category(NodeCategory::Normal).is_empty());
        assert_eq!(scene.nodes_in_category(NodeCategory::Invalid), &[cube0]);

        scene.remove_node(light0).unwrap();
        assert!(scene.nodes_in_category(NodeCategory::Light).is_empty());
    }

    #[test]
    fn test_recategorize_after_pull_is_reported() {
        let mut scene = Scene::new();
        let id = scene.create_node(cube("cube0")).unwrap();

        // Before the first pull the change is folded into the add
        scene.set_category(id, NodeCategory::Light).unwrap();
        let updates = scene.pull_updates();
        assert_eq!(updates.new_nodes, vec![id]);
        assert!(updates.recategorized.is_empty());

        scene.set_category(id, NodeCategory::Normal).unwrap();
        assert_eq!(scene.pull_updates().recategorized, vec![id]);
    }

    #[test]
    fn test_propagated_move_is_a_broadcast() {
        let mut scene = Scene::new();
        let parent = scene.create_node(cube("p")).unwrap();
        let child = scene.create_child_node(parent, cube("c")).unwrap();
        let delta = Vec3::new(1.0, 2.0, 3.0);

        assert!(scene.translate(parent, delta, true));
        assert_eq!(scene.node(parent).unwrap().transform.position(), delta);
        assert_eq!(scene.node(child).unwrap().transform.position(), delta);

        assert!(scene.translate(parent, delta, false));
        assert_eq!(scene.node(parent).unwrap().transform.position(), delta * 2.0);
        assert_eq!(scene.node(child).unwrap().transform.position(), delta);
    }

    #[test]
    fn test_edits_on_missing_nodes_are_noops() {
        let mut scene = Scene::new();
        let id = scene.create_node(cube("gone")).unwrap();
        scene.remove_node(id).unwrap();

        assert!(!scene.translate(id, Vec3::x(), true));
        assert!(!scene.rotate_y(id, 10.0, false));
        assert!(matches!(scene.remove_node(id), Err(SceneError::NodeNotFound(_))));
    }

    #[test]
    fn test_refresh_bounds_uses_transform() {
        let mut scene = Scene::new();
        let bounds = crate::scene::AABB::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let id = scene.create_node(cube("cube0").with_bounds(bounds)).unwrap();

        scene.translate(id, Vec3::new(5.0, 0.0, 0.0), false);
        scene.refresh_bounds();
        assert_eq!(scene.node(id).unwrap().aabb.min_x(), 4.0);
        assert_eq!(scene.node(id).unwrap().aabb.max_x(), 6.0);
    }

    #[test]
    fn test_clear_records_every_node() {
        let mut scene = Scene::new();
        let root = scene.create_node(cube("root")).unwrap();
        scene.create_child_node(root, cube("child")).unwrap();
        scene.create_node(cube("other")).unwrap();
        scene.pull_updates();

        scene.clear();
        assert!(scene.is_empty());
        assert_eq!(scene.pull_updates().deleted_nodes.len(), 3);
    }
}
