//! Operations
//!
//! An [`Operation`] is the atomic unit of change. `perform` runs once per
//! invocation while its document's gate is held, does all fallible work
//! first (I/O, parsing, validation) and only then mutates, by handing a
//! [`Change`] to [`OperationContext::commit`]. It returns either
//! [`OperationOutcome::Unchanged`] or the [`CommitRecord`] that history keeps
//! for undo and redo.
//!
//! Two undo strategies coexist:
//!
//! - **Field-level**: the change carries the before/after values it touched
//!   (property edits, structural moves, selection)
//! - **Snapshot-level**: the change carries whole-document snapshots
//!   ([`ReloadDocumentOperation`])

mod change;
mod document;
mod error;
mod play_mode;
mod property;
mod selection;
mod structure;

pub use change::{AutoContainer, Change, DocumentSnapshot};
pub use document::{ReloadDocumentOperation, SaveDocumentOperation};
pub use error::OperationError;
pub use play_mode::SetPlayModeOperation;
pub use property::SetPropertyOperation;
pub use selection::SelectNodesOperation;
pub use structure::{
    CreateNodeOperation, DeleteNodesOperation, GroupNodesOperation, NodeSpec,
    ReparentNodeOperation,
};

use crate::collaborators::Collaborators;
use crate::config::EngineConfig;
use crate::document::Document;
use crate::models::SceneId;
use crate::state::{AppState, StateStore, StateSynchronizer};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A committed, reversible mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub label: String,
    pub change: Change,
    pub committed_at: DateTime<Utc>,
}

impl CommitRecord {
    pub fn new(label: impl Into<String>, change: Change) -> Self {
        Self {
            label: label.into(),
            change,
            committed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    /// Nothing changed; nothing is recorded
    Unchanged,
    Committed(CommitRecord),
}

impl OperationOutcome {
    pub fn did_mutate(&self) -> bool {
        matches!(self, OperationOutcome::Committed(_))
    }

    pub fn into_commit(self) -> Option<CommitRecord> {
        match self {
            OperationOutcome::Committed(record) => Some(record),
            OperationOutcome::Unchanged => None,
        }
    }
}

/// Everything an operation may touch while it holds the gate
pub struct OperationContext<'a> {
    pub document: &'a mut Document,
    pub store: &'a StateStore,
    pub collaborators: &'a Collaborators,
    pub config: &'a EngineConfig,
}

impl<'a> OperationContext<'a> {
    pub fn new(
        document: &'a mut Document,
        store: &'a StateStore,
        collaborators: &'a Collaborators,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            document,
            store,
            collaborators,
            config,
        }
    }

    pub fn scene_id(&self) -> &SceneId {
        self.document.scene_id()
    }

    /// Current reactive state
    pub fn state(&self) -> Arc<AppState> {
        self.store.snapshot()
    }

    pub fn synchronizer(&self) -> StateSynchronizer<'a> {
        StateSynchronizer::new(self.store, &self.collaborators.render)
    }

    /// Apply `change` and wrap it in a commit record.
    ///
    /// This is the last step of a mutating `perform`.
    pub fn commit(
        &mut self,
        label: impl Into<String>,
        change: Change,
    ) -> Result<OperationOutcome, OperationError> {
        change.apply(self)?;
        Ok(OperationOutcome::Committed(CommitRecord::new(label, change)))
    }
}

#[async_trait]
pub trait Operation: Send + Sync {
    /// Short human-readable description used for logging
    fn label(&self) -> String;

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError>;
}
