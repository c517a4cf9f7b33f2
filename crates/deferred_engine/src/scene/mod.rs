//! Scene management system
//!
//! Hierarchical scene graph with double-buffered transforms, per-node
//! bounding boxes and incremental change tracking. The render-form creator
//! turns those changes into material-grouped draw lists for the renderer.

pub mod aabb;
pub mod factory;
pub mod node;
pub mod renderform;
pub mod scene_graph;
pub mod transform;

#[cfg(test)]
mod scene_tests;

pub use aabb::AABB;
pub use factory::{ObjectDesc, SceneDesc, SceneFactory};
pub use node::{NodeCategory, NodeDesc, NodeId, SceneNode};
pub use renderform::{DrawEntry, Renderform, RenderformBatch, RenderformCreator, RenderformError};
pub use scene_graph::{DeletedNode, Scene, SceneUpdates};
pub use transform::Transform;

use thiserror::Error;

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A live node already uses this UUID
    #[error("Node UUID '{0}' is already in use")]
    DuplicateUuid(String),

    /// Nodes need a non-empty UUID
    #[error("Node UUID must not be empty")]
    EmptyUuid,

    /// Handle does not refer to a live node
    #[error("Node {0:?} not found")]
    NodeNotFound(NodeId),

    /// No live node has this UUID
    #[error("No node with UUID '{0}'")]
    UnknownUuid(String),

    /// The link would make a node its own ancestor
    #[error("Attaching {child:?} under {parent:?} would create a cycle")]
    CycleDetected {
        /// Requested parent
        parent: NodeId,
        /// Requested child
        child: NodeId,
    },

    /// Malformed scene description
    #[error("Scene description error: {0}")]
    Parse(String),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
