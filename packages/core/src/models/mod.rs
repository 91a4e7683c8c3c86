//! Data Models
//!
//! This module contains the core data structures used throughout the engine:
//!
//! - `Node` - Scene tree element with fixed placement capabilities
//! - `NodeId` / `SceneId` - Identifier newtypes
//! - `SceneFile` - On-disk JSON document format

mod node;
pub mod scene_file;

pub use node::{Dimension, Node, NodeId, NodeKind, SceneId, ValidationError};
pub use scene_file::{SceneFile, SceneFileNode, SCENE_FILE_VERSION};
