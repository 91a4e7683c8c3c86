//! Drop / reparent validation
//!
//! The rule shared by every structural command: a target parent must
//!
//! 1. exist,
//! 2. not be the dragged node itself,
//! 3. not be a descendant of the dragged node (walk the target's ancestors),
//! 4. be a container,
//! 5. match the dragged node's dimension.
//!
//! Existence short-circuits; the remaining checks are all mandatory. The rule
//! is written against [`NodeTopology`] so that commands can evaluate it on the
//! reactive hierarchy snapshot and operations can re-check it on the live
//! graph once they hold the document.

use crate::models::{Dimension, NodeId};
use serde::Serialize;
use thiserror::Error;

/// Placement capabilities of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub dimension: Dimension,
    pub is_container: bool,
}

/// Read-only structural view used by validation
pub trait NodeTopology {
    fn contains_node(&self, id: &NodeId) -> bool;
    fn parent_id(&self, id: &NodeId) -> Option<&NodeId>;
    fn placement(&self, id: &NodeId) -> Option<Placement>;
    fn node_count(&self) -> usize;
}

/// Why a node may not be dropped onto a target
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum DropRejection {
    #[error("Target node '{id}' does not exist")]
    TargetMissing { id: NodeId },

    #[error("Dragged node '{id}' does not exist")]
    DraggedMissing { id: NodeId },

    #[error("Node '{id}' cannot be dropped onto itself")]
    SelfTarget { id: NodeId },

    #[error("Node '{dragged}' cannot be dropped onto its descendant '{target}'")]
    Cycle { dragged: NodeId, target: NodeId },

    #[error("Target node '{id}' is not a container")]
    NotAContainer { id: NodeId },

    #[error("A {dragged} node cannot be placed inside a {target} container")]
    DimensionMismatch {
        dragged: Dimension,
        target: Dimension,
    },
}

/// Check whether `dragged` may become a child of `target`.
///
/// `target = None` means the document root, which accepts any node.
pub fn validate_drop<T>(
    topology: &T,
    dragged: &NodeId,
    target: Option<&NodeId>,
) -> Result<(), DropRejection>
where
    T: NodeTopology + ?Sized,
{
    let Some(target) = target else {
        return if topology.contains_node(dragged) {
            Ok(())
        } else {
            Err(DropRejection::DraggedMissing {
                id: dragged.clone(),
            })
        };
    };

    let Some(target_placement) = topology.placement(target) else {
        return Err(DropRejection::TargetMissing { id: target.clone() });
    };
    let Some(dragged_placement) = topology.placement(dragged) else {
        return Err(DropRejection::DraggedMissing {
            id: dragged.clone(),
        });
    };

    if target == dragged {
        return Err(DropRejection::SelfTarget {
            id: dragged.clone(),
        });
    }

    if is_descendant(topology, target, dragged) {
        return Err(DropRejection::Cycle {
            dragged: dragged.clone(),
            target: target.clone(),
        });
    }

    if !target_placement.is_container {
        return Err(DropRejection::NotAContainer { id: target.clone() });
    }

    if target_placement.dimension != dragged_placement.dimension {
        return Err(DropRejection::DimensionMismatch {
            dragged: dragged_placement.dimension,
            target: target_placement.dimension,
        });
    }

    Ok(())
}

/// Boolean form of [`validate_drop`] for UI hit-testing
pub fn can_drop_node<T>(topology: &T, dragged: &NodeId, target: Option<&NodeId>) -> bool
where
    T: NodeTopology + ?Sized,
{
    validate_drop(topology, dragged, target).is_ok()
}

/// True when `ancestor` appears on the parent chain of `id`
fn is_descendant<T>(topology: &T, id: &NodeId, ancestor: &NodeId) -> bool
where
    T: NodeTopology + ?Sized,
{
    let mut current = topology.parent_id(id);
    let mut steps = 0;
    while let Some(parent) = current {
        if parent == ancestor {
            return true;
        }
        steps += 1;
        if steps > topology.node_count() {
            tracing::warn!("Parent chain of '{}' does not terminate", id);
            return true;
        }
        current = topology.parent_id(parent);
    }
    false
}
