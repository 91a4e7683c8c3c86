//! Detached subtrees
//!
//! A `Subtree` is the owned form of a node and all of its descendants while
//! they are outside the graph. `SceneGraph::detach` produces one,
//! `SceneGraph::attach` consumes one, and structural changes keep one so that
//! undo restores the very same node ids rather than fresh copies.

use crate::graph::GraphError;
use crate::models::{Node, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A node plus its descendants in pre-order (`nodes[0]` is the subtree root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Node>", into = "Vec<Node>")]
pub struct Subtree {
    nodes: Vec<Node>,
}

impl Subtree {
    /// Wrap a single childless node
    pub fn single(node: Node) -> Self {
        Self { nodes: vec![node] }
    }

    /// Build a subtree from pre-ordered nodes, checking that every child
    /// reference is carried by the subtree itself and that every carried
    /// node hangs below `nodes[0]` exactly once
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self, GraphError> {
        if nodes.is_empty() {
            return Err(GraphError::EmptySubtree);
        }
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.id.clone()) {
                return Err(GraphError::duplicate_id(&node.id));
            }
        }
        for node in &nodes {
            for child in &node.children {
                if child == &node.id {
                    return Err(GraphError::parent_mismatch(&node.id, "node lists itself as a child"));
                }
                if !seen.contains(child) {
                    return Err(GraphError::DanglingChild {
                        parent: node.id.clone(),
                        child: child.clone(),
                    });
                }
            }
        }
        check_reachable(&nodes)?;
        Ok(Self { nodes })
    }

    pub(crate) fn from_nodes_unchecked(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn root_id(&self) -> &NodeId {
        &self.nodes[0].id
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|node| &node.id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Depth-first search from the subtree root.
    ///
    /// Used to inspect a detached subtree before it is re-registered in a
    /// node map. Returns `None` for unknown ids.
    pub fn find_by_id(&self, id: &NodeId) -> Option<&Node> {
        let index: HashMap<&NodeId, &Node> = self.nodes.iter().map(|n| (&n.id, n)).collect();
        let mut stack = vec![self.root_id()];

        while let Some(current) = stack.pop() {
            let node = index.get(current)?;
            if &node.id == id {
                return Some(node);
            }
            // Reverse so the first child is visited first
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }

        None
    }
}

/// Every node must be reached from the root exactly once
fn check_reachable(nodes: &[Node]) -> Result<(), GraphError> {
    let index: HashMap<&NodeId, &Node> = nodes.iter().map(|n| (&n.id, n)).collect();
    let mut visited = HashSet::new();
    let mut stack = vec![&nodes[0].id];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            return Err(GraphError::ReachableTwice { id: current.clone() });
        }
        if let Some(node) = index.get(current) {
            stack.extend(node.children.iter());
        }
    }

    match nodes.iter().find(|node| !visited.contains(&node.id)) {
        Some(stray) => Err(GraphError::Unreachable { id: stray.id.clone() }),
        None => Ok(()),
    }
}

impl TryFrom<Vec<Node>> for Subtree {
    type Error = GraphError;

    fn try_from(nodes: Vec<Node>) -> Result<Self, Self::Error> {
        Self::from_nodes(nodes)
    }
}

impl From<Subtree> for Vec<Node> {
    fn from(subtree: Subtree) -> Self {
        subtree.nodes
    }
}
