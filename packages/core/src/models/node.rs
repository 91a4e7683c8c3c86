//! Node Data Structures
//!
//! This module defines the scene `Node` and the identifier newtypes shared by
//! every layer of the engine.
//!
//! # Architecture
//!
//! - **Arena-owned**: Nodes live in the `SceneGraph` arena, addressed by `NodeId`
//! - **Parent as relation**: A node stores its ordered child ids; the parent
//!   relation is a lookup kept by the graph, never an ownership edge
//! - **Capabilities fixed at construction**: `dimension` and `is_container` are
//!   decided once and never re-derived from the node type
//! - **Opaque properties**: Editor-facing fields live in a JSON object consumed
//!   through the property schema collaborator
//!
//! # Examples
//!
//! ```rust
//! use stagehand_core::models::{Dimension, Node};
//! use serde_json::json;
//!
//! let label = Node::new("label", "Title", Dimension::TwoD, false, json!({ "text": "Hi" }));
//! assert!(!label.is_container);
//!
//! let group = Node::from_kind("group", "World").expect("builtin kind");
//! assert_eq!(group.dimension, Dimension::ThreeD);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for Node construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Properties validation failed: {0}")]
    InvalidProperties(String),
}

/// Globally unique, immutable node identifier.
///
/// Generated ids are `<hex millis>-<8 hex chars>`: timestamp-ordered with a
/// random suffix. Ids loaded from scene files are taken verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id from the current timestamp plus a random suffix
    pub fn generate() -> Self {
        let millis = Utc::now().timestamp_millis();
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{:x}-{}", millis, &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Identifier of one open document (scene)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("scene-{}", Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Structural compatibility tag: 2D nodes nest under 2D containers, 3D under 3D
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "2d")]
    TwoD,
    #[serde(rename = "3d")]
    ThreeD,
}

impl Dimension {
    /// Number of components in a position/scale vector for this dimension
    pub fn axes(self) -> usize {
        match self {
            Dimension::TwoD => 2,
            Dimension::ThreeD => 3,
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::TwoD => f.write_str("2D"),
            Dimension::ThreeD => f.write_str("3D"),
        }
    }
}

/// Static description of a built-in node type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeKind {
    pub node_type: &'static str,
    pub dimension: Dimension,
    pub is_container: bool,
    pub default_name: &'static str,
}

const BUILTIN_KINDS: &[NodeKind] = &[
    NodeKind {
        node_type: "group",
        dimension: Dimension::ThreeD,
        is_container: true,
        default_name: "Group",
    },
    NodeKind {
        node_type: "mesh",
        dimension: Dimension::ThreeD,
        is_container: false,
        default_name: "Mesh",
    },
    NodeKind {
        node_type: "light",
        dimension: Dimension::ThreeD,
        is_container: false,
        default_name: "Light",
    },
    NodeKind {
        node_type: "camera",
        dimension: Dimension::ThreeD,
        is_container: false,
        default_name: "Camera",
    },
    NodeKind {
        node_type: "canvas",
        dimension: Dimension::TwoD,
        is_container: true,
        default_name: "Canvas",
    },
    NodeKind {
        node_type: "layer",
        dimension: Dimension::TwoD,
        is_container: true,
        default_name: "Layer",
    },
    NodeKind {
        node_type: "label",
        dimension: Dimension::TwoD,
        is_container: false,
        default_name: "Label",
    },
    NodeKind {
        node_type: "sprite",
        dimension: Dimension::TwoD,
        is_container: false,
        default_name: "Sprite",
    },
    NodeKind {
        node_type: "button",
        dimension: Dimension::TwoD,
        is_container: false,
        default_name: "Button",
    },
];

impl NodeKind {
    /// Look up a built-in node type
    pub fn builtin(node_type: &str) -> Option<NodeKind> {
        BUILTIN_KINDS
            .iter()
            .find(|kind| kind.node_type == node_type)
            .copied()
    }

    pub fn all() -> &'static [NodeKind] {
        BUILTIN_KINDS
    }

    /// The container type used to group nodes of the given dimension
    pub fn group_type_for(dimension: Dimension) -> &'static str {
        match dimension {
            Dimension::TwoD => "layer",
            Dimension::ThreeD => "group",
        }
    }
}

/// A scene tree element.
///
/// # Fields
///
/// - `id`: Unique identifier, assigned at creation, never reused
/// - `node_type`: Immutable kind tag (drives property schema lookup)
/// - `name`: Display name shown in the hierarchy panel
/// - `dimension` / `is_container`: Placement capabilities fixed at construction
/// - `properties`: JSON object owned by property editors
/// - `children`: Ordered child ids (order is z/hierarchy order)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    pub node_type: String,
    pub name: String,
    pub dimension: Dimension,
    pub is_container: bool,
    pub properties: Value,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl Node {
    /// Create a new node with a freshly generated id
    pub fn new(
        node_type: impl Into<String>,
        name: impl Into<String>,
        dimension: Dimension,
        is_container: bool,
        properties: Value,
    ) -> Self {
        Self::with_id(
            NodeId::generate(),
            node_type,
            name,
            dimension,
            is_container,
            properties,
        )
    }

    /// Create a node with an explicit id (scene file loading, tests)
    pub fn with_id(
        id: NodeId,
        node_type: impl Into<String>,
        name: impl Into<String>,
        dimension: Dimension,
        is_container: bool,
        properties: Value,
    ) -> Self {
        let properties = if properties.is_object() {
            properties
        } else {
            Value::Object(Map::new())
        };

        Self {
            id,
            node_type: node_type.into(),
            name: name.into(),
            dimension,
            is_container,
            properties,
            children: Vec::new(),
        }
    }

    /// Create a node of a built-in kind with empty properties
    pub fn from_kind(node_type: &str, name: impl Into<String>) -> Result<Self, ValidationError> {
        let kind = NodeKind::builtin(node_type)
            .ok_or_else(|| ValidationError::UnknownNodeType(node_type.to_string()))?;
        Ok(Self::new(
            kind.node_type,
            name,
            kind.dimension,
            kind.is_container,
            Value::Object(Map::new()),
        ))
    }

    /// Validate node structure and required fields
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.as_str().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.node_type.is_empty() {
            return Err(ValidationError::MissingField("node_type".to_string()));
        }

        if !self.properties.is_object() {
            return Err(ValidationError::InvalidProperties(
                "properties must be a JSON object".to_string(),
            ));
        }

        if !self.is_container && !self.children.is_empty() {
            return Err(ValidationError::InvalidProperties(format!(
                "node '{}' is not a container but has children",
                self.id
            )));
        }

        Ok(())
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Set a property, returning the previous value
    pub fn set_property(&mut self, key: &str, value: Value) -> Option<Value> {
        if !self.properties.is_object() {
            self.properties = Value::Object(Map::new());
        }
        self.properties
            .as_object_mut()
            .and_then(|map| map.insert(key.to_string(), value))
    }

    pub fn remove_property(&mut self, key: &str) -> Option<Value> {
        self.properties
            .as_object_mut()
            .and_then(|map| map.remove(key))
    }

    /// Visibility flag, defaulting to visible when unset
    pub fn is_visible(&self) -> bool {
        self.properties
            .get("visible")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: std::collections::HashSet<NodeId> = (0..500).map(|_| NodeId::generate()).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_generated_id_shape() {
        let id = NodeId::generate();
        let (millis, suffix) = id.as_str().split_once('-').expect("separator");
        assert!(u64::from_str_radix(millis, 16).is_ok());
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn test_from_kind_uses_builtin_capabilities() {
        let canvas = Node::from_kind("canvas", "Canvas").unwrap();
        assert_eq!(canvas.dimension, Dimension::TwoD);
        assert!(canvas.is_container);

        let mesh = Node::from_kind("mesh", "Cube").unwrap();
        assert_eq!(mesh.dimension, Dimension::ThreeD);
        assert!(!mesh.is_container);

        assert_eq!(
            Node::from_kind("teapot", "x"),
            Err(ValidationError::UnknownNodeType("teapot".to_string()))
        );
    }

    #[test]
    fn test_non_object_properties_are_normalized() {
        let node = Node::new("label", "L", Dimension::TwoD, false, json!(42));
        assert!(node.properties.is_object());
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_leaf_with_children_fails_validation() {
        let mut node = Node::from_kind("sprite", "S").unwrap();
        node.children.push(NodeId::from("child"));
        assert!(matches!(
            node.validate(),
            Err(ValidationError::InvalidProperties(_))
        ));
    }

    #[test]
    fn test_property_helpers() {
        let mut node = Node::from_kind("label", "L").unwrap();
        assert!(node.is_visible());
        assert_eq!(node.set_property("visible", json!(false)), None);
        assert!(!node.is_visible());
        assert_eq!(node.remove_property("visible"), Some(json!(false)));
    }

    #[test]
    fn test_dimension_serialization() {
        assert_eq!(serde_json::to_string(&Dimension::TwoD).unwrap(), "\"2d\"");
        let parsed: Dimension = serde_json::from_str("\"3d\"").unwrap();
        assert_eq!(parsed, Dimension::ThreeD);
    }
}
