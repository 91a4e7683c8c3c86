//! Structural operations: create, delete, reparent and group nodes.
//!
//! Each one plans its [`Change`] entirely from the current graph before
//! committing, so an early exit never leaves a partial structural edit.

use crate::graph::{validate_drop, SceneGraph, Subtree};
use crate::models::{Dimension, Node, NodeId, NodeKind};
use crate::operations::{
    AutoContainer, Change, Operation, OperationContext, OperationError, OperationOutcome,
};
use crate::state::SelectionState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// What to create: a built-in kind, or a custom type with explicit
/// capabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    pub node_type: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dimension: Option<Dimension>,
    #[serde(default)]
    pub is_container: Option<bool>,
    #[serde(default)]
    pub properties: Option<Value>,
}

impl NodeSpec {
    pub fn new(node_type: impl Into<String>) -> Self {
        Self {
            node_type: node_type.into(),
            name: None,
            dimension: None,
            is_container: None,
            properties: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = Some(properties);
        self
    }

    /// Dimension, container flag and default name, or `None` when the type
    /// is unknown and no dimension was given. Built-in kinds always use their
    /// own capabilities.
    pub fn capabilities(&self) -> Option<(Dimension, bool, String)> {
        match NodeKind::builtin(&self.node_type) {
            Some(kind) => Some((
                kind.dimension,
                kind.is_container,
                kind.default_name.to_string(),
            )),
            None => self.dimension.map(|dimension| {
                (
                    dimension,
                    self.is_container.unwrap_or(false),
                    self.node_type.clone(),
                )
            }),
        }
    }
}

/// Create a node under an explicit or implicitly resolved parent, and
/// select it
#[derive(Debug, Clone)]
pub struct CreateNodeOperation {
    pub spec: NodeSpec,
    pub parent: Option<NodeId>,
}

impl CreateNodeOperation {
    pub fn new(spec: NodeSpec) -> Self {
        Self { spec, parent: None }
    }

    pub fn under(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }
}

#[async_trait]
impl Operation for CreateNodeOperation {
    fn label(&self) -> String {
        format!("Create {}", self.spec.node_type)
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let Some((dimension, is_container, default_name)) = self.spec.capabilities() else {
            tracing::warn!("Unknown node type '{}' without a dimension", self.spec.node_type);
            return Ok(OperationOutcome::Unchanged);
        };
        let state = ctx.state();

        let (parent, auto_container) = match &self.parent {
            Some(explicit) => match ctx.document.graph.get(explicit) {
                Some(node) if node.is_container && node.dimension == dimension => {
                    (Some(explicit.clone()), None)
                }
                Some(_) => {
                    tracing::warn!(
                        "'{}' cannot host a {} {} node",
                        explicit,
                        dimension,
                        self.spec.node_type
                    );
                    return Ok(OperationOutcome::Unchanged);
                }
                None => {
                    tracing::warn!("Parent '{}' no longer exists", explicit);
                    return Ok(OperationOutcome::Unchanged);
                }
            },
            None => resolve_implicit_parent(ctx, &state.selection, dimension)?,
        };

        let index = match (&parent, &auto_container) {
            (_, Some(_)) => 0,
            (parent, None) => ctx.document.graph.children_of(parent.as_ref()).len(),
        };

        let name = self.spec.name.clone().unwrap_or(default_name);
        let node = Node::with_id(
            ctx.document.issue_node_id(),
            self.spec.node_type.clone(),
            name.clone(),
            dimension,
            is_container,
            self.spec
                .properties
                .clone()
                .unwrap_or_else(|| Value::Object(Map::new())),
        );
        let node_id = node.id.clone();

        let change = Change::Batch {
            changes: vec![
                Change::InsertSubtree {
                    parent,
                    index,
                    subtree: Subtree::single(node),
                    auto_container,
                },
                Change::Select {
                    before: (*state.selection).clone(),
                    after: SelectionState::single(node_id),
                },
            ],
        };
        ctx.commit(format!("Create {}", name), change)
    }
}

/// Parent for a node created without an explicit one.
///
/// The primary selection wins when it is a container of the same dimension.
/// Otherwise 3D nodes go to the document root and 2D nodes go to the first
/// root-level 2D container, which is created on demand.
fn resolve_implicit_parent(
    ctx: &mut OperationContext<'_>,
    selection: &SelectionState,
    dimension: Dimension,
) -> Result<(Option<NodeId>, Option<AutoContainer>), OperationError> {
    let graph = &ctx.document.graph;

    if let Some(primary) = &selection.primary_node_id {
        if graph
            .get(primary)
            .is_some_and(|node| node.is_container && node.dimension == dimension)
        {
            return Ok((Some(primary.clone()), None));
        }
    }

    if dimension == Dimension::ThreeD {
        return Ok((None, None));
    }

    if let Some(container) = graph.first_root_container(Dimension::TwoD) {
        return Ok((Some(container.id.clone()), None));
    }

    let kind = NodeKind::builtin(&ctx.config.auto_container_type)
        .filter(|kind| kind.dimension == Dimension::TwoD && kind.is_container)
        .ok_or_else(|| {
            OperationError::invalid_operation(format!(
                "'{}' cannot serve as a 2D container",
                ctx.config.auto_container_type
            ))
        })?;
    let index = graph.roots().len();
    let container = Node::with_id(
        ctx.document.issue_node_id(),
        kind.node_type,
        kind.default_name,
        kind.dimension,
        true,
        Value::Object(Map::new()),
    );

    Ok((
        Some(container.id.clone()),
        Some(AutoContainer {
            node: container,
            index,
        }),
    ))
}

/// Delete nodes with their subtrees, dropping them from the selection
#[derive(Debug, Clone)]
pub struct DeleteNodesOperation {
    pub node_ids: Vec<NodeId>,
}

impl DeleteNodesOperation {
    pub fn new(node_ids: Vec<NodeId>) -> Self {
        Self { node_ids }
    }
}

#[async_trait]
impl Operation for DeleteNodesOperation {
    fn label(&self) -> String {
        "Delete Nodes".to_string()
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let graph = &ctx.document.graph;
        let targets = top_level_targets(graph, &self.node_ids);
        if targets.is_empty() {
            tracing::debug!("Nothing left to delete");
            return Ok(OperationOutcome::Unchanged);
        }

        let mut removals = Vec::with_capacity(targets.len());
        for id in &targets {
            let subtree = graph
                .subtree(id)
                .ok_or_else(|| OperationError::node_not_found(id))?;
            let index = graph
                .index_in_parent(id)
                .ok_or_else(|| OperationError::node_not_found(id))?;
            removals.push((graph.parent_of(id).cloned(), index, subtree));
        }
        // Highest index first so earlier removals never shift later ones
        removals.sort_by(|a, b| b.1.cmp(&a.1));

        let label = match removals.as_slice() {
            [(_, _, subtree)] => format!("Delete {}", subtree.root().name),
            _ => format!("Delete {} Nodes", removals.len()),
        };

        let removed: HashSet<NodeId> = removals
            .iter()
            .flat_map(|(_, _, subtree)| subtree.ids().cloned())
            .collect();
        let state = ctx.state();
        let selection_after = state.selection.retain(|id| !removed.contains(id));

        let mut changes = Vec::with_capacity(removals.len() + 1);
        if selection_after != *state.selection {
            changes.push(Change::Select {
                before: (*state.selection).clone(),
                after: selection_after,
            });
        }
        changes.extend(
            removals
                .into_iter()
                .map(|(parent, index, subtree)| Change::RemoveSubtree {
                    parent,
                    index,
                    subtree,
                }),
        );

        ctx.commit(label, Change::Batch { changes })
    }
}

/// Move a node under a new parent (or to the root) at an optional index
#[derive(Debug, Clone)]
pub struct ReparentNodeOperation {
    pub node_id: NodeId,
    pub target: Option<NodeId>,
    pub index: Option<usize>,
}

impl ReparentNodeOperation {
    pub fn new(node_id: NodeId, target: Option<NodeId>) -> Self {
        Self {
            node_id,
            target,
            index: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }
}

#[async_trait]
impl Operation for ReparentNodeOperation {
    fn label(&self) -> String {
        "Move Node".to_string()
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let graph = &ctx.document.graph;

        // Re-checked here: the graph may have changed since preconditions ran
        if let Err(rejection) = validate_drop(graph, &self.node_id, self.target.as_ref()) {
            tracing::warn!("Drop rejected: {}", rejection);
            return Ok(OperationOutcome::Unchanged);
        }

        let from_parent = graph.parent_of(&self.node_id).cloned();
        let from_index = graph
            .index_in_parent(&self.node_id)
            .ok_or_else(|| OperationError::node_not_found(&self.node_id))?;

        let mut available = graph.children_of(self.target.as_ref()).len();
        if from_parent == self.target {
            available -= 1;
        }
        let to_index = self.index.unwrap_or(available).min(available);

        if from_parent == self.target && from_index == to_index {
            return Ok(OperationOutcome::Unchanged);
        }

        let label = graph
            .get(&self.node_id)
            .map(|node| format!("Move {}", node.name))
            .unwrap_or_else(|| self.label());
        let change = Change::Reparent {
            node_id: self.node_id.clone(),
            from_parent,
            from_index,
            to_parent: self.target.clone(),
            to_index,
        };
        ctx.commit(label, change)
    }
}

/// Wrap nodes in a new container placed where the first of them was
#[derive(Debug, Clone)]
pub struct GroupNodesOperation {
    pub node_ids: Vec<NodeId>,
    pub name: Option<String>,
}

impl GroupNodesOperation {
    pub fn new(node_ids: Vec<NodeId>) -> Self {
        Self {
            node_ids,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[async_trait]
impl Operation for GroupNodesOperation {
    fn label(&self) -> String {
        "Group Nodes".to_string()
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let graph = &ctx.document.graph;
        let members = top_level_targets(graph, &self.node_ids);
        let Some(first) = members.first() else {
            tracing::debug!("Nothing left to group");
            return Ok(OperationOutcome::Unchanged);
        };

        let dimensions: HashSet<Dimension> = members
            .iter()
            .filter_map(|id| graph.get(id).map(|node| node.dimension))
            .collect();
        let dimension = match dimensions.into_iter().collect::<Vec<_>>().as_slice() {
            [dimension] => *dimension,
            _ => {
                tracing::warn!("Cannot group 2D and 3D nodes together");
                return Ok(OperationOutcome::Unchanged);
            }
        };

        let kind = NodeKind::builtin(NodeKind::group_type_for(dimension))
            .ok_or_else(|| OperationError::internal("missing built-in group kind"))?;
        let group_parent = graph.parent_of(first).cloned();
        let group_index = graph
            .index_in_parent(first)
            .ok_or_else(|| OperationError::node_not_found(first))?;
        let mut scratch = graph.clone();

        let group = Node::with_id(
            ctx.document.issue_node_id(),
            kind.node_type,
            self.name.clone().unwrap_or_else(|| kind.default_name.to_string()),
            dimension,
            true,
            Value::Object(Map::new()),
        );
        let group_id = group.id.clone();

        // Plan on a scratch copy so every recorded index is the one the
        // move will see when the batch is applied in order
        scratch.attach(Subtree::single(group.clone()), group_parent.as_ref(), Some(group_index))?;
        let mut changes = vec![Change::InsertSubtree {
            parent: group_parent,
            index: group_index,
            subtree: Subtree::single(group),
            auto_container: None,
        }];
        for id in members {
            let from_parent = scratch.parent_of(&id).cloned();
            let from_index = scratch
                .index_in_parent(&id)
                .ok_or_else(|| OperationError::node_not_found(&id))?;
            let (subtree, _) = scratch
                .detach(&id, from_parent.as_ref())
                .ok_or_else(|| OperationError::node_not_found(&id))?;
            let to_index = scratch.children_of(Some(&group_id)).len();
            scratch.attach(subtree, Some(&group_id), None)?;

            changes.push(Change::Reparent {
                node_id: id,
                from_parent,
                from_index,
                to_parent: Some(group_id.clone()),
                to_index,
            });
        }

        let state = ctx.state();
        changes.push(Change::Select {
            before: (*state.selection).clone(),
            after: SelectionState::single(group_id),
        });

        ctx.commit(self.label(), Change::Batch { changes })
    }
}

/// Existing ids from `ids` that have no selected ancestor, in depth-first
/// graph order
fn top_level_targets(graph: &SceneGraph, ids: &[NodeId]) -> Vec<NodeId> {
    let wanted: HashSet<&NodeId> = ids.iter().filter(|id| graph.contains(id)).collect();
    graph
        .iter_depth_first()
        .into_iter()
        .filter(|node| wanted.contains(&node.id))
        .filter(|node| {
            !graph
                .ancestors(&node.id)
                .iter()
                .any(|ancestor| wanted.contains(ancestor))
        })
        .map(|node| node.id.clone())
        .collect()
}
