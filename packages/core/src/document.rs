//! Open documents
//!
//! A [`Document`] is the mutable side of one open scene: its graph, file
//! metadata and the set of node ids it has ever handed out. It is only ever
//! touched by the operation currently holding that document's gate.

use crate::graph::{GraphError, SceneGraph};
use crate::models::{NodeId, SceneFile, SceneId};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Document {
    scene_id: SceneId,
    pub name: String,
    pub path: Option<PathBuf>,
    pub graph: SceneGraph,
    pub dirty: bool,
    issued_ids: HashSet<NodeId>,
}

impl Document {
    /// An empty, unsaved document
    pub fn new(scene_id: SceneId, name: impl Into<String>) -> Self {
        Self {
            scene_id,
            name: name.into(),
            path: None,
            graph: SceneGraph::new(),
            dirty: false,
            issued_ids: HashSet::new(),
        }
    }

    /// Build a document from a parsed scene file
    pub fn from_scene_file(
        scene_id: SceneId,
        path: Option<PathBuf>,
        file: SceneFile,
    ) -> Result<Self, GraphError> {
        let name = file.name.clone();
        let graph = file.into_graph()?;
        let mut document = Self::new(scene_id, name);
        document.path = path;
        document.replace_graph(graph);
        Ok(document)
    }

    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Hand out a node id never seen in this document before
    pub fn issue_node_id(&mut self) -> NodeId {
        loop {
            let id = NodeId::generate();
            if !self.graph.contains(&id) && self.issued_ids.insert(id.clone()) {
                return id;
            }
        }
    }

    /// Swap in a new graph, remembering its ids so they are never reissued
    pub fn replace_graph(&mut self, graph: SceneGraph) -> SceneGraph {
        self.issued_ids
            .extend(graph.iter_depth_first().into_iter().map(|node| node.id.clone()));
        std::mem::replace(&mut self.graph, graph)
    }

    pub fn to_scene_file(&self) -> SceneFile {
        SceneFile::from_graph(self.name.clone(), &self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_ids_skip_loaded_ids() {
        let text = r#"{ "name": "Level", "nodes": [
            { "id": "world", "type": "group", "name": "World", "dimension": "3d", "container": true }
        ] }"#;
        let file = SceneFile::parse(text).unwrap();
        let mut document = Document::from_scene_file(SceneId::from("s"), None, file).unwrap();

        assert_eq!(document.name, "Level");
        assert!(!document.dirty);
        let first = document.issue_node_id();
        let second = document.issue_node_id();
        assert_ne!(first, second);
        assert_ne!(first.as_str(), "world");
    }
}
