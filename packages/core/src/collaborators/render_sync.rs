//! Render-sync collaborator
//!
//! Fire-and-forget notifications issued after a structural or property
//! mutation. The state mutation is authoritative on its own: failures from
//! the renderer are logged and dropped by [`RenderNotifier`], never
//! propagated into operation success or failure.

use crate::models::{Node, NodeId};
use crate::state::SelectionState;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Render sync failed: {0}")]
pub struct RenderSyncError(pub String);

/// Which renderer notification a property edit requires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderHint {
    #[default]
    None,
    Transform,
    Visibility,
}

pub trait RenderSync: Send + Sync {
    fn update_node_transform(&self, node: &Node) -> Result<(), RenderSyncError>;
    fn update_node_visibility(&self, node: &Node) -> Result<(), RenderSyncError>;
    fn update_selection(&self, selection: &SelectionState) -> Result<(), RenderSyncError>;
}

/// Renderer that ignores every notification (headless sessions)
#[derive(Debug, Clone, Default)]
pub struct NoopRenderSync;

impl RenderSync for NoopRenderSync {
    fn update_node_transform(&self, _node: &Node) -> Result<(), RenderSyncError> {
        Ok(())
    }

    fn update_node_visibility(&self, _node: &Node) -> Result<(), RenderSyncError> {
        Ok(())
    }

    fn update_selection(&self, _selection: &SelectionState) -> Result<(), RenderSyncError> {
        Ok(())
    }
}

/// One recorded renderer notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderCall {
    Transform(NodeId),
    Visibility(NodeId),
    Selection(Vec<NodeId>),
}

/// Renderer that records notifications, optionally failing every call.
///
/// Used by tooling that replays scripts headlessly and by tests asserting
/// that side effects are replayed on undo/redo.
#[derive(Debug, Default)]
pub struct RecordingRenderSync {
    calls: Mutex<Vec<RenderCall>>,
    fail: bool,
}

impl RecordingRenderSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose every notification reports failure
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.lock().clone()
    }

    pub fn take_calls(&self) -> Vec<RenderCall> {
        std::mem::take(&mut *self.lock())
    }

    fn record(&self, call: RenderCall) -> Result<(), RenderSyncError> {
        self.lock().push(call);
        if self.fail {
            Err(RenderSyncError("renderer unavailable".to_string()))
        } else {
            Ok(())
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<RenderCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RenderSync for RecordingRenderSync {
    fn update_node_transform(&self, node: &Node) -> Result<(), RenderSyncError> {
        self.record(RenderCall::Transform(node.id.clone()))
    }

    fn update_node_visibility(&self, node: &Node) -> Result<(), RenderSyncError> {
        self.record(RenderCall::Visibility(node.id.clone()))
    }

    fn update_selection(&self, selection: &SelectionState) -> Result<(), RenderSyncError> {
        self.record(RenderCall::Selection(selection.node_ids.clone()))
    }
}

/// Swallowing wrapper around the renderer
#[derive(Clone)]
pub struct RenderNotifier {
    sink: Arc<dyn RenderSync>,
}

impl RenderNotifier {
    pub fn new(sink: Arc<dyn RenderSync>) -> Self {
        Self { sink }
    }

    /// Issue the notification a property edit with `hint` requires
    pub fn notify(&self, hint: RenderHint, node: &Node) {
        match hint {
            RenderHint::None => {}
            RenderHint::Transform => self.node_transform(node),
            RenderHint::Visibility => self.node_visibility(node),
        }
    }

    pub fn node_transform(&self, node: &Node) {
        if let Err(e) = self.sink.update_node_transform(node) {
            tracing::warn!("Ignoring transform sync failure for '{}': {}", node.id, e);
        }
    }

    pub fn node_visibility(&self, node: &Node) {
        if let Err(e) = self.sink.update_node_visibility(node) {
            tracing::warn!("Ignoring visibility sync failure for '{}': {}", node.id, e);
        }
    }

    pub fn selection(&self, selection: &SelectionState) {
        if let Err(e) = self.sink.update_selection(selection) {
            tracing::warn!("Ignoring selection sync failure: {}", e);
        }
    }
}

impl std::fmt::Debug for RenderNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderNotifier").finish_non_exhaustive()
    }
}
