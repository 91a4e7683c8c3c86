//! Error types for the operation layer
//!
//! Only *hard* failures are errors here. Expected invalid input (a bad
//! property value, a node deleted by a queued edit) is reported as
//! [`OperationOutcome::Unchanged`](super::OperationOutcome) instead.

use crate::collaborators::PersistenceError;
use crate::graph::GraphError;
use crate::models::{NodeId, SceneId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OperationError {
    /// A history record refers to a node that is no longer where it was left
    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("Document not found: {id}")]
    DocumentNotFound { id: SceneId },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Persisted scene text could not be turned into a graph
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OperationError {
    pub fn node_not_found(id: &NodeId) -> Self {
        Self::NodeNotFound { id: id.clone() }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }

    pub fn malformed_document(message: impl Into<String>) -> Self {
        Self::MalformedDocument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<GraphError> for OperationError {
    fn from(err: GraphError) -> Self {
        Self::Internal(format!("graph primitive failed: {}", err))
    }
}

impl From<serde_json::Error> for OperationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
