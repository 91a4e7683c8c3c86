//! Scene graph error types
//!
//! Raised by the structural primitives when a mutation would break the
//! forest/node-map invariants, and by `SceneGraph::check_integrity`.

use crate::models::{Dimension, NodeId};
use thiserror::Error;

/// Structural invariant violations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An id is already registered in the node map
    #[error("Node '{id}' is already registered in the graph")]
    DuplicateId { id: NodeId },

    /// The requested parent is not part of the graph
    #[error("Parent node '{id}' does not exist")]
    ParentNotFound { id: NodeId },

    /// A subtree references a child that it does not carry
    #[error("Subtree node '{parent}' references missing child '{child}'")]
    DanglingChild { parent: NodeId, child: NodeId },

    /// A subtree must carry at least its root
    #[error("Subtree has no nodes")]
    EmptySubtree,

    /// Children attached under a node without the container capability
    #[error("Node '{id}' is not a container")]
    NotAContainer { id: NodeId },

    /// Child dimension does not match its container
    #[error("Node '{child}' ({child_dimension}) cannot nest under '{parent}' ({parent_dimension})")]
    DimensionMismatch {
        child: NodeId,
        child_dimension: Dimension,
        parent: NodeId,
        parent_dimension: Dimension,
    },

    /// A registered node cannot be reached from the roots
    #[error("Node '{id}' is registered but unreachable from the roots")]
    Unreachable { id: NodeId },

    /// A node is reachable through more than one path
    #[error("Node '{id}' is reachable more than once")]
    ReachableTwice { id: NodeId },

    /// A reachable id has no node map entry
    #[error("Node '{id}' is reachable but missing from the node map")]
    MissingEntry { id: NodeId },

    /// Parent map disagrees with the children lists
    #[error("Parent relation for '{id}' is inconsistent: {context}")]
    ParentMismatch { id: NodeId, context: String },
}

impl GraphError {
    pub fn duplicate_id(id: &NodeId) -> Self {
        Self::DuplicateId { id: id.clone() }
    }

    pub fn parent_not_found(id: &NodeId) -> Self {
        Self::ParentNotFound { id: id.clone() }
    }

    pub fn parent_mismatch(id: &NodeId, context: impl Into<String>) -> Self {
        Self::ParentMismatch {
            id: id.clone(),
            context: context.into(),
        }
    }
}
