//! Reversible changes
//!
//! A [`Change`] is the value stored in a commit record: it names the target
//! and carries the before/after values, and a single interpreter applies or
//! reverts it against whatever document holds the gate. No change keeps a
//! reference into the graph, so records stay valid after their nodes are
//! detached and can be serialized for tooling.
//!
//! Renderer notifications are issued from [`Change::apply`] and
//! [`Change::revert`] themselves, which is what keeps perform, undo and redo
//! replaying the same side effects.

use crate::graph::Subtree;
use crate::models::{Node, NodeId, SceneFile};
use crate::operations::{OperationContext, OperationError};
use crate::state::{PlayMode, SelectionState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// A container created implicitly to host a new node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoContainer {
    pub node: Node,
    /// Root-level index the container was created at
    pub index: usize,
}

/// Whole-document state captured for snapshot-level undo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSnapshot {
    pub file: SceneFile,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Change {
    /// Field-level edit through the property schema; `None` means unset
    #[serde(rename_all = "camelCase")]
    SetProperty {
        node_id: NodeId,
        property: String,
        before: Option<Value>,
        after: Option<Value>,
    },

    /// Attach a new subtree. Reverting removes the auto-created container as
    /// well, but only if it is still an empty root at that moment.
    #[serde(rename_all = "camelCase")]
    InsertSubtree {
        parent: Option<NodeId>,
        index: usize,
        subtree: Subtree,
        auto_container: Option<AutoContainer>,
    },

    #[serde(rename_all = "camelCase")]
    RemoveSubtree {
        parent: Option<NodeId>,
        index: usize,
        subtree: Subtree,
    },

    /// `to_index` is the position after the node left `from_parent`
    #[serde(rename_all = "camelCase")]
    Reparent {
        node_id: NodeId,
        from_parent: Option<NodeId>,
        from_index: usize,
        to_parent: Option<NodeId>,
        to_index: usize,
    },

    Select {
        before: SelectionState,
        after: SelectionState,
    },

    ReplaceDocument {
        before: Box<DocumentSnapshot>,
        after: Box<DocumentSnapshot>,
    },

    PlayMode {
        before: PlayMode,
        after: PlayMode,
    },

    #[serde(rename_all = "camelCase")]
    MarkClean {
        was_dirty: bool,
        path_before: Option<PathBuf>,
        path_after: Option<PathBuf>,
    },

    /// Applied in order, reverted in reverse order
    Batch { changes: Vec<Change> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

impl Change {
    pub fn apply(&self, ctx: &mut OperationContext<'_>) -> Result<(), OperationError> {
        self.execute(ctx, Direction::Forward)
    }

    pub fn revert(&self, ctx: &mut OperationContext<'_>) -> Result<(), OperationError> {
        self.execute(ctx, Direction::Backward)
    }

    /// True when applying or reverting edits the document content
    pub fn edits_document(&self) -> bool {
        match self {
            Change::SetProperty { .. }
            | Change::InsertSubtree { .. }
            | Change::RemoveSubtree { .. }
            | Change::Reparent { .. } => true,
            Change::Batch { changes } => changes.iter().any(Change::edits_document),
            _ => false,
        }
    }

    /// True when the document's projection (hierarchy, descriptor) may change
    fn touches_document(&self) -> bool {
        match self {
            Change::Select { .. } | Change::PlayMode { .. } => false,
            Change::Batch { changes } => changes.iter().any(Change::touches_document),
            _ => true,
        }
    }

    fn execute(
        &self,
        ctx: &mut OperationContext<'_>,
        direction: Direction,
    ) -> Result<(), OperationError> {
        let result = self.run(ctx, direction);
        if result.is_ok() && self.edits_document() {
            ctx.document.dirty = true;
        }
        if self.touches_document() {
            ctx.synchronizer().project_document(&*ctx.document);
        }
        result
    }

    fn run(&self, ctx: &mut OperationContext<'_>, direction: Direction) -> Result<(), OperationError> {
        let forward = direction == Direction::Forward;
        match self {
            Change::SetProperty {
                node_id,
                property,
                before,
                after,
            } => {
                let value = if forward { after } else { before };
                set_property(ctx, node_id, property, value.clone())
            }

            Change::InsertSubtree {
                parent,
                index,
                subtree,
                auto_container,
            } => {
                if forward {
                    insert(ctx, parent.as_ref(), *index, subtree, auto_container.as_ref())
                } else {
                    remove(ctx, parent.as_ref(), subtree.root_id(), auto_container.as_ref())
                }
            }

            Change::RemoveSubtree {
                parent,
                index,
                subtree,
            } => {
                if forward {
                    remove(ctx, parent.as_ref(), subtree.root_id(), None)
                } else {
                    insert(ctx, parent.as_ref(), *index, subtree, None)
                }
            }

            Change::Reparent {
                node_id,
                from_parent,
                from_index,
                to_parent,
                to_index,
            } => {
                if forward {
                    move_node(ctx, node_id, from_parent.as_ref(), to_parent.as_ref(), *to_index)
                } else {
                    move_node(ctx, node_id, to_parent.as_ref(), from_parent.as_ref(), *from_index)
                }
            }

            Change::Select { before, after } => {
                let target = if forward { after } else { before };
                ctx.synchronizer().replace_selection(target.clone());
                Ok(())
            }

            Change::ReplaceDocument { before, after } => {
                restore_snapshot(ctx, if forward { after } else { before })
            }

            Change::PlayMode { before, after } => {
                ctx.synchronizer()
                    .set_play_mode(if forward { *after } else { *before });
                Ok(())
            }

            Change::MarkClean {
                was_dirty,
                path_before,
                path_after,
            } => {
                if forward {
                    ctx.document.dirty = false;
                    ctx.document.path = path_after.clone();
                } else {
                    ctx.document.dirty = *was_dirty;
                    ctx.document.path = path_before.clone();
                }
                Ok(())
            }

            Change::Batch { changes } => {
                if forward {
                    run_all(ctx, changes.iter(), Direction::Forward)
                } else {
                    run_all(ctx, changes.iter().rev(), Direction::Backward)
                }
            }
        }
    }
}

/// Run `changes` in order; on failure undo the ones already run so the
/// batch either completes or leaves nothing behind
fn run_all<'c>(
    ctx: &mut OperationContext<'_>,
    changes: impl Iterator<Item = &'c Change>,
    direction: Direction,
) -> Result<(), OperationError> {
    let opposite = match direction {
        Direction::Forward => Direction::Backward,
        Direction::Backward => Direction::Forward,
    };
    let mut done: Vec<&Change> = Vec::new();

    for change in changes {
        if let Err(e) = change.run(ctx, direction) {
            for finished in done.into_iter().rev() {
                if let Err(rollback) = finished.run(ctx, opposite) {
                    tracing::error!("Rolling back partial batch failed: {}", rollback);
                }
            }
            return Err(e);
        }
        done.push(change);
    }

    Ok(())
}

fn set_property(
    ctx: &mut OperationContext<'_>,
    node_id: &NodeId,
    property: &str,
    value: Option<Value>,
) -> Result<(), OperationError> {
    let node = ctx
        .document
        .graph
        .get_mut(node_id)
        .ok_or_else(|| OperationError::node_not_found(node_id))?;
    let descriptor = ctx
        .collaborators
        .schema
        .descriptor(node, property)
        .ok_or_else(|| {
            OperationError::invalid_operation(format!(
                "Node '{}' has no property '{}'",
                node_id, property
            ))
        })?;

    descriptor.set_value(node, value);
    ctx.collaborators.render.notify(descriptor.render_hint, node);
    Ok(())
}

fn insert(
    ctx: &mut OperationContext<'_>,
    parent: Option<&NodeId>,
    index: usize,
    subtree: &Subtree,
    auto_container: Option<&AutoContainer>,
) -> Result<(), OperationError> {
    let graph = &mut ctx.document.graph;
    let render = &ctx.collaborators.render;

    let mut created_container = None;
    if let Some(container) = auto_container {
        if !graph.contains(&container.node.id) {
            let mut node = container.node.clone();
            node.children.clear();
            graph.attach(Subtree::single(node), None, Some(container.index))?;
            created_container = Some(&container.node.id);
        }
    }

    if let Err(e) = graph.attach(subtree.clone(), parent, Some(index)) {
        if let Some(id) = created_container {
            graph.detach(id, None);
        }
        return Err(e.into());
    }

    if let Some(container) = auto_container.filter(|_| created_container.is_some()) {
        render.node_transform(&container.node);
    }
    render.node_transform(subtree.root());
    Ok(())
}

fn remove(
    ctx: &mut OperationContext<'_>,
    parent: Option<&NodeId>,
    id: &NodeId,
    auto_container: Option<&AutoContainer>,
) -> Result<(), OperationError> {
    let graph = &mut ctx.document.graph;
    let render = &ctx.collaborators.render;

    let (removed, _) = graph
        .detach(id, parent)
        .ok_or_else(|| OperationError::node_not_found(id))?;
    render.node_visibility(removed.root());

    if let Some(container) = auto_container {
        let container_id = &container.node.id;
        let still_empty_root = graph
            .get(container_id)
            .is_some_and(|node| node.children.is_empty())
            && graph.parent_of(container_id).is_none();

        if still_empty_root {
            if let Some((detached, _)) = graph.detach(container_id, None) {
                render.node_visibility(detached.root());
            }
        } else {
            tracing::debug!(
                "Keeping auto-created container '{}': no longer an empty root",
                container_id
            );
        }
    }

    Ok(())
}

fn move_node(
    ctx: &mut OperationContext<'_>,
    id: &NodeId,
    from: Option<&NodeId>,
    to: Option<&NodeId>,
    index: usize,
) -> Result<(), OperationError> {
    let graph = &mut ctx.document.graph;
    if let Some(target) = to {
        if !graph.contains(target) {
            return Err(OperationError::node_not_found(target));
        }
    }

    let (subtree, from_index) = graph
        .detach(id, from)
        .ok_or_else(|| OperationError::node_not_found(id))?;
    if let Err(e) = graph.attach(subtree.clone(), to, Some(index)) {
        // restore the original position
        if let Err(restore) = graph.attach(subtree, from, Some(from_index)) {
            tracing::error!("Failed to restore '{}' after a failed move: {}", id, restore);
        }
        return Err(e.into());
    }

    if let Some(node) = graph.get(id) {
        ctx.collaborators.render.node_transform(node);
    }
    Ok(())
}

fn restore_snapshot(
    ctx: &mut OperationContext<'_>,
    snapshot: &DocumentSnapshot,
) -> Result<(), OperationError> {
    let graph = snapshot
        .file
        .clone()
        .into_graph()
        .map_err(|e| OperationError::malformed_document(e.to_string()))?;

    ctx.document.replace_graph(graph);
    ctx.document.name = snapshot.file.name.clone();
    ctx.document.dirty = snapshot.dirty;
    Ok(())
}
