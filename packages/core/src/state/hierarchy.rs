//! Hierarchy snapshots
//!
//! Flattened, read-only projection of a [`SceneGraph`] published in the
//! reactive state tree. A snapshot is rebuilt and replaced as a whole after
//! every structural change, so observers never see a half-updated child list.

use crate::graph::{NodeTopology, Placement, SceneGraph};
use crate::models::{Dimension, NodeId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEntry {
    pub id: NodeId,
    pub node_type: String,
    pub name: String,
    pub dimension: Dimension,
    pub is_container: bool,
    pub visible: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchySnapshot {
    pub roots: Vec<NodeId>,
    pub entries: BTreeMap<NodeId, HierarchyEntry>,
}

impl HierarchySnapshot {
    pub fn from_graph(graph: &SceneGraph) -> Self {
        let entries = graph
            .iter_depth_first()
            .into_iter()
            .map(|node| {
                let entry = HierarchyEntry {
                    id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    name: node.name.clone(),
                    dimension: node.dimension,
                    is_container: node.is_container,
                    visible: node.is_visible(),
                    parent: graph.parent_of(&node.id).cloned(),
                    children: node.children.clone(),
                };
                (node.id.clone(), entry)
            })
            .collect();

        Self {
            roots: graph.roots().to_vec(),
            entries,
        }
    }

    pub fn get(&self, id: &NodeId) -> Option<&HierarchyEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in depth-first order from the roots
    pub fn iter_depth_first(&self) -> Vec<&HierarchyEntry> {
        let mut ordered = Vec::with_capacity(self.entries.len());
        let mut stack: Vec<&NodeId> = self.roots.iter().rev().collect();
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.entries.get(current) {
                stack.extend(entry.children.iter().rev());
                ordered.push(entry);
            }
        }
        ordered
    }
}

impl NodeTopology for HierarchySnapshot {
    fn contains_node(&self, id: &NodeId) -> bool {
        self.contains(id)
    }

    fn parent_id(&self, id: &NodeId) -> Option<&NodeId> {
        self.entries.get(id).and_then(|entry| entry.parent.as_ref())
    }

    fn placement(&self, id: &NodeId) -> Option<Placement> {
        self.entries.get(id).map(|entry| Placement {
            dimension: entry.dimension,
            is_container: entry.is_container,
        })
    }

    fn node_count(&self) -> usize {
        self.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{validate_drop, DropRejection, Subtree};
    use crate::models::Node;
    use serde_json::json;

    #[test]
    fn test_snapshot_mirrors_graph() {
        let mut graph = SceneGraph::new();
        let world = Node::with_id(
            NodeId::from("world"),
            "group",
            "World",
            Dimension::ThreeD,
            true,
            json!({}),
        );
        let cube = Node::with_id(
            NodeId::from("cube"),
            "mesh",
            "Cube",
            Dimension::ThreeD,
            false,
            json!({ "visible": false }),
        );
        graph.attach(Subtree::single(world), None, None).unwrap();
        graph
            .attach(Subtree::single(cube), Some(&NodeId::from("world")), None)
            .unwrap();

        let snapshot = HierarchySnapshot::from_graph(&graph);
        let cube = snapshot.get(&NodeId::from("cube")).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(cube.parent, Some(NodeId::from("world")));
        assert!(!cube.visible);
        assert_eq!(
            snapshot
                .iter_depth_first()
                .iter()
                .map(|entry| entry.id.as_str())
                .collect::<Vec<_>>(),
            vec!["world", "cube"]
        );

        // Same drop rules as the live graph
        assert_eq!(
            validate_drop(&snapshot, &NodeId::from("world"), Some(&NodeId::from("cube"))),
            validate_drop(&graph, &NodeId::from("world"), Some(&NodeId::from("cube")))
        );
        assert!(matches!(
            validate_drop(&snapshot, &NodeId::from("world"), Some(&NodeId::from("cube"))),
            Err(DropRejection::Cycle { .. })
        ));
    }
}
