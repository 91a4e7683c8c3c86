//! Scene Graph
//!
//! The single source of truth for "what exists and how it is nested" in one
//! open document.
//!
//! # Architecture
//!
//! - **Arena**: Nodes are owned by an id-keyed map (the node map)
//! - **Parent relation**: A separate child→parent map, a pure lookup
//! - **Roots**: Ordered top-level ids; order is sibling/z order
//!
//! Every primitive updates the tree and the node map in the same step, so the
//! node map keys are always exactly the ids reachable from the roots.
//!
//! Cycle checks are *not* performed by [`SceneGraph::attach`]; callers run
//! [`validate_drop`] first.

mod error;
mod subtree;
pub mod validation;

pub use error::GraphError;
pub use subtree::Subtree;
pub use validation::{can_drop_node, validate_drop, DropRejection, NodeTopology, Placement};

use crate::models::{Dimension, Node, NodeId};
use std::collections::{HashMap, HashSet};

/// Node tree plus id index for one document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    parents: HashMap<NodeId, NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Mutable access for property edits.
    ///
    /// Callers must not touch `children`; structural changes go through
    /// [`attach`](Self::attach) and [`detach`](Self::detach).
    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.parents.get(id)
    }

    /// Children of `id`, or the roots when `id` is `None`
    pub fn children_of(&self, id: Option<&NodeId>) -> &[NodeId] {
        match id {
            Some(id) => self
                .nodes
                .get(id)
                .map(|node| node.children.as_slice())
                .unwrap_or(&[]),
            None => &self.roots,
        }
    }

    /// Position of `id` within its parent's children (or the roots)
    pub fn index_in_parent(&self, id: &NodeId) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        self.children_of(self.parent_of(id))
            .iter()
            .position(|sibling| sibling == id)
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parents.get(id);
        while let Some(parent) = current {
            // A corrupted parent map must not spin forever
            if chain.len() > self.nodes.len() {
                break;
            }
            chain.push(parent.clone());
            current = self.parents.get(parent);
        }
        chain
    }

    /// True when `ancestor` is a strict ancestor of `id`
    pub fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        self.ancestors(id).iter().any(|candidate| candidate == ancestor)
    }

    /// Append (or insert at `index`) a subtree under `parent`, or at the root
    /// level when `parent` is `None`, registering every node it carries.
    pub fn attach(
        &mut self,
        subtree: Subtree,
        parent: Option<&NodeId>,
        index: Option<usize>,
    ) -> Result<(), GraphError> {
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(parent_id) {
                return Err(GraphError::parent_not_found(parent_id));
            }
        }

        let carried: HashSet<&NodeId> = subtree.ids().collect();
        for node in subtree.nodes() {
            if self.nodes.contains_key(&node.id) {
                return Err(GraphError::duplicate_id(&node.id));
            }
            for child in &node.children {
                if !carried.contains(child) {
                    return Err(GraphError::DanglingChild {
                        parent: node.id.clone(),
                        child: child.clone(),
                    });
                }
            }
        }

        let root_id = subtree.root_id().clone();
        let siblings = match parent {
            Some(parent_id) => match self.nodes.get_mut(parent_id) {
                Some(node) => &mut node.children,
                None => return Err(GraphError::parent_not_found(parent_id)),
            },
            None => &mut self.roots,
        };
        let position = index.unwrap_or(siblings.len()).min(siblings.len());
        siblings.insert(position, root_id.clone());

        if let Some(parent_id) = parent {
            self.parents.insert(root_id, parent_id.clone());
        }
        for node in subtree.into_nodes() {
            for child in &node.children {
                self.parents.insert(child.clone(), node.id.clone());
            }
            self.nodes.insert(node.id.clone(), node);
        }

        Ok(())
    }

    /// Remove `id` and its subtree from the tree and the node map.
    ///
    /// `parent` must be the parent the node was attached under; a mismatch
    /// (or an unknown id) returns `None` and leaves the graph untouched.
    /// Returns the detached subtree and the index it occupied.
    pub fn detach(&mut self, id: &NodeId, parent: Option<&NodeId>) -> Option<(Subtree, usize)> {
        if !self.nodes.contains_key(id) || self.parents.get(id) != parent {
            return None;
        }

        let siblings = match parent {
            Some(parent_id) => &mut self.nodes.get_mut(parent_id)?.children,
            None => &mut self.roots,
        };
        let index = siblings.iter().position(|sibling| sibling == id)?;
        siblings.remove(index);
        self.parents.remove(id);

        let mut ordered = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                for child in node.children.iter().rev() {
                    self.parents.remove(child);
                    stack.push(child.clone());
                }
                ordered.push(node);
            }
        }

        Some((Subtree::from_nodes_unchecked(ordered), index))
    }

    /// Copy of the subtree rooted at `id` without detaching it
    pub fn subtree(&self, id: &NodeId) -> Option<Subtree> {
        let mut ordered = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.nodes.get(current)?;
            for child in node.children.iter().rev() {
                stack.push(child);
            }
            ordered.push(node.clone());
        }
        Some(Subtree::from_nodes_unchecked(ordered))
    }

    /// Depth-first search starting at `from`; first match or `None`
    pub fn find_by_id(&self, from: &NodeId, id: &NodeId) -> Option<&Node> {
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            let node = self.nodes.get(current)?;
            if &node.id == id {
                return Some(node);
            }
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        None
    }

    /// All nodes in depth-first order from the roots
    pub fn iter_depth_first(&self) -> Vec<&Node> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&NodeId> = self.roots.iter().rev().collect();
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                for child in node.children.iter().rev() {
                    stack.push(child);
                }
                ordered.push(node);
            }
        }
        ordered
    }

    /// First root-level container of the given dimension
    pub fn first_root_container(&self, dimension: Dimension) -> Option<&Node> {
        self.roots
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.is_container && node.dimension == dimension)
    }

    /// Verify the forest and node-map invariants.
    ///
    /// Every node map key must be reachable exactly once from the roots, every
    /// reachable id must have an entry, and the parent map must mirror the
    /// children lists.
    pub fn check_integrity(&self) -> Result<(), GraphError> {
        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut stack: Vec<(&NodeId, Option<&NodeId>)> =
            self.roots.iter().rev().map(|id| (id, None)).collect();

        while let Some((current, expected_parent)) = stack.pop() {
            if !visited.insert(current) {
                return Err(GraphError::ReachableTwice {
                    id: current.clone(),
                });
            }
            let node = self
                .nodes
                .get(current)
                .ok_or_else(|| GraphError::MissingEntry {
                    id: current.clone(),
                })?;
            if self.parents.get(current) != expected_parent {
                return Err(GraphError::parent_mismatch(
                    current,
                    format!(
                        "expected {:?}, recorded {:?}",
                        expected_parent,
                        self.parents.get(current)
                    ),
                ));
            }
            if !node.is_container && !node.children.is_empty() {
                return Err(GraphError::NotAContainer {
                    id: node.id.clone(),
                });
            }
            for child in node.children.iter().rev() {
                stack.push((child, Some(current)));
            }
        }

        if let Some(orphan) = self.nodes.keys().find(|id| !visited.contains(id)) {
            return Err(GraphError::Unreachable { id: orphan.clone() });
        }
        if let Some(stale) = self.parents.keys().find(|id| !self.nodes.contains_key(*id)) {
            return Err(GraphError::parent_mismatch(stale, "parent entry for unknown node"));
        }

        Ok(())
    }
}

impl NodeTopology for SceneGraph {
    fn contains_node(&self, id: &NodeId) -> bool {
        self.contains(id)
    }

    fn parent_id(&self, id: &NodeId) -> Option<&NodeId> {
        self.parent_of(id)
    }

    fn placement(&self, id: &NodeId) -> Option<Placement> {
        self.nodes.get(id).map(|node| Placement {
            dimension: node.dimension,
            is_container: node.is_container,
        })
    }

    fn node_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod scene_graph_test;
