//! State Events
//!
//! Emitted on the [`StateStore`](super::StateStore) broadcast channel whenever
//! a sub-object of the reactive state tree is replaced. Subscribers (UI
//! bridges, tooling) re-read the affected sub-tree from a fresh snapshot; the
//! event only says *what* changed.

use crate::models::{NodeId, SceneId};
use crate::state::PlayMode;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StateEvent {
    /// The hierarchy snapshot of a document was replaced
    #[serde(rename_all = "camelCase")]
    HierarchyChanged { scene_id: SceneId },

    /// Name, path, dirty flag or history depth of a document changed
    #[serde(rename_all = "camelCase")]
    DescriptorChanged { scene_id: SceneId },

    #[serde(rename_all = "camelCase")]
    ActiveSceneChanged { scene_id: Option<SceneId> },

    #[serde(rename_all = "camelCase")]
    SelectionChanged { node_ids: Vec<NodeId> },

    PlayModeChanged { mode: PlayMode },

    /// Undo or redo stack of a document changed length
    #[serde(rename_all = "camelCase")]
    HistoryChanged {
        scene_id: SceneId,
        undo_len: usize,
        redo_len: usize,
    },

    #[serde(rename_all = "camelCase")]
    DocumentClosed { scene_id: SceneId },
}

impl StateEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            StateEvent::HierarchyChanged { .. } => "hierarchy:changed",
            StateEvent::DescriptorChanged { .. } => "descriptor:changed",
            StateEvent::ActiveSceneChanged { .. } => "scene:activated",
            StateEvent::SelectionChanged { .. } => "selection:changed",
            StateEvent::PlayModeChanged { .. } => "playMode:changed",
            StateEvent::HistoryChanged { .. } => "history:changed",
            StateEvent::DocumentClosed { .. } => "document:closed",
        }
    }
}
