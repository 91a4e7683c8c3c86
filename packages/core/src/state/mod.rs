//! Reactive State Tree
//!
//! The externally observed application state: open scene descriptors, their
//! hierarchy snapshots, the selection and the play mode.
//!
//! # Architecture
//!
//! - **Whole-object replacement**: [`StateStore`] holds an `Arc<AppState>`;
//!   every update builds a new state that shares untouched sub-trees and swaps
//!   the pointer. Readers clone the `Arc` and never see partial writes.
//! - **Change notification**: each replacement broadcasts a [`StateEvent`]
//!   over a tokio broadcast channel.
//! - **Single writer**: only the [`StateSynchronizer`] replaces sub-trees,
//!   and only while an operation holds its document's gate.

mod events;
mod hierarchy;
mod synchronizer;

pub use events::StateEvent;
pub use hierarchy::{HierarchyEntry, HierarchySnapshot};
pub use synchronizer::StateSynchronizer;

use crate::models::{NodeId, SceneId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Editor play mode; session-wide and never recorded in history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Edit,
    Play,
    Pause,
}

/// Undo/redo depth of one document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    pub undo_len: usize,
    pub redo_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneDescriptor {
    pub id: SceneId,
    pub name: String,
    pub path: Option<PathBuf>,
    pub dirty: bool,
    pub history: HistoryStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenesState {
    pub active_scene_id: Option<SceneId>,
    pub descriptors: BTreeMap<SceneId, SceneDescriptor>,
    pub hierarchies: BTreeMap<SceneId, Arc<HierarchySnapshot>>,
}

impl ScenesState {
    pub fn active_descriptor(&self) -> Option<&SceneDescriptor> {
        self.active_scene_id
            .as_ref()
            .and_then(|id| self.descriptors.get(id))
    }

    pub fn active_hierarchy(&self) -> Option<&HierarchySnapshot> {
        self.active_scene_id
            .as_ref()
            .and_then(|id| self.hierarchies.get(id))
            .map(Arc::as_ref)
    }
}

/// Selected node ids in selection order, plus the primary (focused) node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub node_ids: Vec<NodeId>,
    pub primary_node_id: Option<NodeId>,
}

impl SelectionState {
    /// Build a selection; duplicate ids are dropped and a primary id that is
    /// not selected falls back to the last selected node
    pub fn new(node_ids: Vec<NodeId>, primary: Option<NodeId>) -> Self {
        let mut unique: Vec<NodeId> = Vec::with_capacity(node_ids.len());
        for id in node_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        let primary_node_id = match primary {
            Some(primary) if unique.contains(&primary) => Some(primary),
            _ => unique.last().cloned(),
        };
        Self {
            node_ids: unique,
            primary_node_id,
        }
    }

    pub fn single(id: NodeId) -> Self {
        Self {
            node_ids: vec![id.clone()],
            primary_node_id: Some(id),
        }
    }

    pub fn from_ids(node_ids: Vec<NodeId>) -> Self {
        Self::new(node_ids, None)
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.node_ids.contains(id)
    }

    /// Keep only ids accepted by `keep`, re-deriving the primary
    pub fn retain(&self, keep: impl Fn(&NodeId) -> bool) -> Self {
        let node_ids: Vec<NodeId> = self.node_ids.iter().filter(|id| keep(id)).cloned().collect();
        Self::new(node_ids, self.primary_node_id.clone())
    }
}

/// Root of the reactive state tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub scenes: Arc<ScenesState>,
    pub selection: Arc<SelectionState>,
    pub play_mode: PlayMode,
}

/// Owner of the current [`AppState`] and its change channel
#[derive(Debug)]
pub struct StateStore {
    current: RwLock<Arc<AppState>>,
    events: broadcast::Sender<StateEvent>,
}

impl StateStore {
    pub fn new(event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            current: RwLock::new(Arc::new(AppState::default())),
            events,
        }
    }

    /// The current state tree; cheap, lock held only for the pointer copy
    pub fn snapshot(&self) -> Arc<AppState> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.events.subscribe()
    }

    /// Replace the state tree with an edited copy.
    ///
    /// `edit` works on a shallow clone and returns the events describing what
    /// it replaced; an empty list discards the copy.
    pub(crate) fn update(&self, edit: impl FnOnce(&mut AppState) -> Vec<StateEvent>) {
        let events = {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let mut next = AppState::clone(&current);
            let events = edit(&mut next);
            if events.is_empty() {
                return;
            }
            *current = Arc::new(next);
            events
        };

        for event in events {
            tracing::trace!("State event: {}", event.event_type());
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(128)
    }
}
