//! Commands
//!
//! The user-facing façade over operations. A [`Command`] first checks its
//! preconditions against the current state snapshot (pure, no mutation) and
//! only then executes, dispatching one or more operations through the active
//! document's [`OperationService`]. Commands never mutate state directly.
//!
//! Each command's `execute` awaits every dispatch before issuing the next, so
//! commits reach the undo stack in true execution order.

mod document;
mod error;
mod history;
mod registry;
mod scene;

pub use document::{ReloadDocumentCommand, SaveDocumentCommand, SetPlayModeCommand};
pub use error::CommandError;
pub use history::{RedoCommand, UndoCommand};
pub use registry::{CommandFactory, CommandRegistry, CommandRegistryBuilder};
pub use scene::{
    CreateNodeCommand, DeleteSelectionCommand, DropNodeCommand, GroupSelectionCommand,
    RenameNodeCommand, SelectNodesCommand, SetPropertyCommand,
};

use crate::models::{NodeId, SceneId};
use crate::services::{EditorSession, OperationService};
use crate::state::{AppState, HierarchyEntry, HierarchySnapshot, SceneDescriptor, SelectionState};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Why a command cannot run right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PreconditionScope {
    NoActiveDocument,
    EmptySelection,
    InvalidName,
    InvalidTarget,
    NodeMissing,
    NothingToUndo,
    NothingToRedo,
    NoDocumentPath,
    UnknownNodeType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    Ready,
    Blocked {
        reason: String,
        scope: PreconditionScope,
    },
}

impl Precondition {
    pub fn blocked(scope: PreconditionScope, reason: impl Into<String>) -> Self {
        Self::Blocked {
            reason: reason.into(),
            scope,
        }
    }

    pub fn can_execute(&self) -> bool {
        matches!(self, Precondition::Ready)
    }
}

impl From<Result<(), Precondition>> for Precondition {
    fn from(check: Result<(), Precondition>) -> Self {
        match check {
            Ok(()) => Precondition::Ready,
            Err(blocked) => blocked,
        }
    }
}

/// Result of an executed command
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOutcome {
    pub did_mutate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl CommandOutcome {
    pub fn mutated(did_mutate: bool) -> Self {
        Self {
            did_mutate,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

#[async_trait]
pub trait Command: Send + Sync {
    /// Globally unique registry id, e.g. `scene.createNode`
    fn id(&self) -> &'static str;

    /// Pure check against the state snapshot in `ctx`
    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition;

    /// Only called after `preconditions` returned [`Precondition::Ready`]
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError>;
}

/// Session access plus the state snapshot a command is judged against
pub struct CommandContext<'a> {
    session: &'a EditorSession,
    state: Arc<AppState>,
}

impl<'a> CommandContext<'a> {
    pub fn new(session: &'a EditorSession) -> Self {
        Self {
            session,
            state: session.state(),
        }
    }

    pub fn session(&self) -> &'a EditorSession {
        self.session
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn selection(&self) -> &SelectionState {
        &self.state.selection
    }

    pub fn active_scene_id(&self) -> Option<&SceneId> {
        self.state.scenes.active_scene_id.as_ref()
    }

    pub fn active_descriptor(&self) -> Option<&SceneDescriptor> {
        self.state.scenes.active_descriptor()
    }

    pub fn active_hierarchy(&self) -> Option<&HierarchySnapshot> {
        self.state.scenes.active_hierarchy()
    }

    /// Hierarchy of the active document, or a `NoActiveDocument` block
    pub fn require_hierarchy(&self) -> Result<&HierarchySnapshot, Precondition> {
        self.active_hierarchy().ok_or_else(|| {
            Precondition::blocked(PreconditionScope::NoActiveDocument, "No document is open")
        })
    }

    pub fn require_selection(&self) -> Result<&SelectionState, Precondition> {
        self.require_hierarchy()?;
        let selection = self.selection();
        if selection.is_empty() {
            return Err(Precondition::blocked(
                PreconditionScope::EmptySelection,
                "Nothing is selected",
            ));
        }
        Ok(selection)
    }

    pub fn require_node(&self, id: &NodeId) -> Result<&HierarchyEntry, Precondition> {
        self.require_hierarchy()?.get(id).ok_or_else(|| {
            Precondition::blocked(
                PreconditionScope::NodeMissing,
                format!("Node '{}' no longer exists", id),
            )
        })
    }

    /// `explicit` if given, else the primary selection
    pub fn target_or_primary(&self, explicit: Option<&NodeId>) -> Result<NodeId, Precondition> {
        let target = match explicit {
            Some(id) => id.clone(),
            None => self
                .require_selection()?
                .primary_node_id
                .clone()
                .ok_or_else(|| {
                    Precondition::blocked(PreconditionScope::EmptySelection, "Nothing is selected")
                })?,
        };
        self.require_node(&target)?;
        Ok(target)
    }

    /// Service of the document that was active when this context was taken
    pub fn active_document(&self) -> Result<Arc<OperationService>, CommandError> {
        self.active_scene_id()
            .and_then(|id| self.session.document(id))
            .ok_or(CommandError::PreconditionFailed {
                reason: "No document is open".to_string(),
                scope: PreconditionScope::NoActiveDocument,
            })
    }
}
