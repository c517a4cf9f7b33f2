//! Incremental draw-call grouping
//!
//! The render-form maps each material name to the draw entries using it.
//! [`RenderformCreator::update`] folds the scene's deltas into it once per
//! tick; it is never rebuilt from scratch. A draw entry exists exactly while
//! its node is live in the scene.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

use super::{NodeCategory, NodeId, Scene, SceneUpdates};
use crate::assets::{Material, MaterialStore, ModelStore};
use crate::render::api::{BufferHandle, VertexArrayHandle};

/// Errors raised while folding a node into the render-form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderformError {
    /// Node references a model that is not loaded
    #[error("Node '{node}' references unknown model '{model}'")]
    UnknownModel {
        /// Node UUID
        node: String,
        /// Missing model name
        model: String,
    },

    /// Node references a material that is not loaded
    #[error("Node '{node}' references unknown material '{material}'")]
    UnknownMaterial {
        /// Node UUID
        node: String,
        /// Missing material name
        material: String,
    },

    /// A mesh's material slot is past the end of the node's material list
    #[error("Node '{node}' mesh {mesh} uses material slot {slot} but has {available} material(s)")]
    MaterialSlotOutOfRange {
        /// Node UUID
        node: String,
        /// Mesh index in the model
        mesh: usize,
        /// Requested slot
        slot: usize,
        /// Length of the node's material list
        available: usize,
    },
}

/// One indexed draw of one mesh of one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawEntry {
    /// Node whose interpolated transform positions the draw
    pub node: NodeId,
    /// Model name
    pub model: String,
    /// Mesh index within the model
    pub mesh_index: usize,
    /// Vertex array to draw from
    pub vertex_array: VertexArrayHandle,
    /// Index buffer bound to the vertex array
    pub index_buffer: BufferHandle,
    /// Number of indices
    pub index_count: u32,
}

/// Draws sharing a material
#[derive(Debug, Clone, PartialEq)]
pub struct RenderformBatch {
    /// Resolved material, copied when the batch was created
    pub material: Material,
    /// Draw entries in insertion order
    pub draws: Vec<DrawEntry>,
}

/// Material name to batch, iterated in name order
pub type Renderform = BTreeMap<String, RenderformBatch>;

/// Maintains the render-form from scene deltas
#[derive(Debug, Default)]
pub struct RenderformCreator {
    renderform: Renderform,
    materials_by_node: HashMap<NodeId, BTreeSet<String>>,
}

impl RenderformCreator {
    /// Create an empty render-form
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one drain of scene deltas.
    ///
    /// New nodes are added first, then deleted nodes are removed, then
    /// recategorized nodes are re-folded. A node that fails to resolve is
    /// skipped without partial entries and the remaining deltas are still
    /// applied. The first failure is returned; later ones are logged.
    pub fn update(
        &mut self,
        updates: &SceneUpdates,
        scene: &Scene,
        models: &ModelStore,
        materials: &MaterialStore,
    ) -> Result<(), RenderformError> {
        let mut first_error = None;
        let mut report = |error: RenderformError| {
            if first_error.is_none() {
                first_error = Some(error);
            } else {
                log::warn!("Render-form: {}", error);
            }
        };

        for id in &updates.new_nodes {
            if let Err(e) = self.add_node(*id, scene, models, materials) {
                report(e);
            }
        }
        for deleted in &updates.deleted_nodes {
            self.remove_node(deleted.id);
        }
        for id in &updates.recategorized {
            self.remove_node(*id);
            if let Err(e) = self.add_node(*id, scene, models, materials) {
                report(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn add_node(
        &mut self,
        id: NodeId,
        scene: &Scene,
        models: &ModelStore,
        materials: &MaterialStore,
    ) -> Result<(), RenderformError> {
        let Some(node) = scene.node(id) else {
            log::debug!("Render-form: node {:?} vanished before folding", id);
            return Ok(());
        };
        if node.category() != NodeCategory::Normal || self.materials_by_node.contains_key(&id) {
            return Ok(());
        }
        let Some(model_name) = node.model() else {
            return Ok(());
        };

        let model = models.get(model_name).ok_or_else(|| RenderformError::UnknownModel {
            node: node.uuid().to_string(),
            model: model_name.to_string(),
        })?;

        // Resolve every mesh before touching the render-form
        let mut staged = Vec::with_capacity(model.meshes().len());
        for (mesh_index, mesh) in model.meshes().iter().enumerate() {
            let material_name = node.materials().get(mesh.material_slot).ok_or_else(|| {
                RenderformError::MaterialSlotOutOfRange {
                    node: node.uuid().to_string(),
                    mesh: mesh_index,
                    slot: mesh.material_slot,
                    available: node.materials().len(),
                }
            })?;
            let material = materials.get(material_name).ok_or_else(|| RenderformError::UnknownMaterial {
                node: node.uuid().to_string(),
                material: material_name.clone(),
            })?;
            staged.push((
                material,
                DrawEntry {
                    node: id,
                    model: model_name.to_string(),
                    mesh_index,
                    vertex_array: mesh.buffers.vertex_array,
                    index_buffer: mesh.buffers.index_buffer,
                    index_count: mesh.buffers.index_count,
                },
            ));
        }

        if staged.is_empty() {
            log::debug!("Render-form: model '{}' of {} has no meshes", model_name, node.uuid());
            return Ok(());
        }

        let used = self.materials_by_node.entry(id).or_default();
        for (material, draw) in staged {
            used.insert(material.name.clone());
            self.renderform
                .entry(material.name.clone())
                .or_insert_with(|| RenderformBatch {
                    material: material.clone(),
                    draws: Vec::new(),
                })
                .draws
                .push(draw);
        }

        log::trace!("Render-form: added {} ({})", node.uuid(), model_name);
        Ok(())
    }

    fn remove_node(&mut self, id: NodeId) {
        let Some(used) = self.materials_by_node.remove(&id) else {
            return;
        };
        for material in used {
            if let Some(batch) = self.renderform.get_mut(&material) {
                batch.draws.retain(|draw| draw.node != id);
                if batch.draws.is_empty() {
                    self.renderform.remove(&material);
                }
            }
        }
    }

    /// Current render-form
    pub fn renderform(&self) -> &Renderform {
        &self.renderform
    }

    /// Batch for one material
    pub fn batch(&self, material: &str) -> Option<&RenderformBatch> {
        self.renderform.get(material)
    }

    /// Total number of draw entries
    pub fn draw_count(&self) -> usize {
        self.renderform.values().map(|batch| batch.draws.len()).sum()
    }

    /// True if any draw entry belongs to `id`
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.materials_by_node.contains_key(&id)
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.renderform.clear();
        self.materials_by_node.clear();
    }
}
