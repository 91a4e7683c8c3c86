//! Scene file format
//!
//! On-disk JSON representation of one document. Nodes are nested, so the file
//! is self-describing without a separate parent column:
//!
//! ```json
//! {
//!   "version": 1,
//!   "name": "Level 1",
//!   "nodes": [
//!     { "id": "world", "type": "group", "name": "World", "dimension": "3d",
//!       "container": true, "properties": {}, "children": [] }
//!   ]
//! }
//! ```

use crate::graph::{GraphError, SceneGraph, Subtree};
use crate::models::{Dimension, Node, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const SCENE_FILE_VERSION: u32 = 1;

fn default_version() -> u32 {
    SCENE_FILE_VERSION
}

fn default_properties() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<SceneFileNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneFileNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub name: String,
    pub dimension: Dimension,
    #[serde(default)]
    pub container: bool,
    #[serde(default = "default_properties")]
    pub properties: Value,
    #[serde(default)]
    pub children: Vec<SceneFileNode>,
}

impl SceneFile {
    /// Parse scene JSON text
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serialize the current graph
    pub fn from_graph(name: impl Into<String>, graph: &SceneGraph) -> Self {
        fn convert(graph: &SceneGraph, id: &NodeId) -> Option<SceneFileNode> {
            let node = graph.get(id)?;
            Some(SceneFileNode {
                id: node.id.clone(),
                node_type: node.node_type.clone(),
                name: node.name.clone(),
                dimension: node.dimension,
                container: node.is_container,
                properties: node.properties.clone(),
                children: node
                    .children
                    .iter()
                    .filter_map(|child| convert(graph, child))
                    .collect(),
            })
        }

        Self {
            version: SCENE_FILE_VERSION,
            name: name.into(),
            nodes: graph
                .roots()
                .iter()
                .filter_map(|id| convert(graph, id))
                .collect(),
        }
    }

    /// Build a graph, rejecting duplicate ids and illegal nesting
    pub fn into_graph(self) -> Result<SceneGraph, GraphError> {
        let mut graph = SceneGraph::new();
        let mut seen = HashSet::new();

        for root in self.nodes {
            let mut ordered = Vec::new();
            flatten(root, None, &mut seen, &mut ordered)?;
            let subtree = Subtree::from_nodes(ordered)?;
            graph.attach(subtree, None, None)?;
        }

        Ok(graph)
    }
}

fn flatten(
    file_node: SceneFileNode,
    parent: Option<(&NodeId, Dimension, bool)>,
    seen: &mut HashSet<NodeId>,
    ordered: &mut Vec<Node>,
) -> Result<(), GraphError> {
    if !seen.insert(file_node.id.clone()) {
        return Err(GraphError::duplicate_id(&file_node.id));
    }
    if let Some((parent_id, parent_dimension, parent_is_container)) = parent {
        if !parent_is_container {
            return Err(GraphError::NotAContainer {
                id: parent_id.clone(),
            });
        }
        if parent_dimension != file_node.dimension {
            return Err(GraphError::DimensionMismatch {
                child: file_node.id.clone(),
                child_dimension: file_node.dimension,
                parent: parent_id.clone(),
                parent_dimension,
            });
        }
    }

    let SceneFileNode {
        id,
        node_type,
        name,
        dimension,
        container,
        properties,
        children,
    } = file_node;

    let mut node = Node::with_id(id.clone(), node_type, name, dimension, container, properties);
    node.children = children.iter().map(|child| child.id.clone()).collect();
    ordered.push(node);

    for child in children {
        flatten(child, Some((&id, dimension, container)), seen, ordered)?;
    }

    Ok(())
}
