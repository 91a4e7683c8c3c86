//! Operation Service
//!
//! Executes operations against one open document and owns its history.
//!
//! # Concurrency
//!
//! The document and its history sit behind a single `tokio::sync::Mutex`,
//! the document's gate. The gate is fair: callers that arrive while an
//! operation is executing are queued and served strictly in arrival order,
//! so commits land on the undo stack in call order even when an operation
//! suspends on I/O. Undo and redo take the same gate.
//!
//! # Failure
//!
//! A `perform` that returns an error records nothing. Operations do their
//! fallible work before committing, so no rollback is attempted here.

use crate::collaborators::Collaborators;
use crate::config::EngineConfig;
use crate::document::Document;
use crate::graph::SceneGraph;
use crate::models::SceneId;
use crate::operations::{Operation, OperationContext, OperationError, OperationOutcome};
use crate::services::history::{History, HistoryLabels};
use crate::state::{StateStore, StateSynchronizer};
use std::sync::Arc;
use tokio::sync::Mutex;

struct DocumentCore {
    document: Document,
    history: History,
}

pub struct OperationService {
    scene_id: SceneId,
    core: Mutex<DocumentCore>,
    store: Arc<StateStore>,
    collaborators: Collaborators,
    config: Arc<EngineConfig>,
}

impl OperationService {
    pub fn new(
        document: Document,
        store: Arc<StateStore>,
        collaborators: Collaborators,
        config: Arc<EngineConfig>,
    ) -> Self {
        let history = History::new(config.max_history);
        Self {
            scene_id: document.scene_id().clone(),
            core: Mutex::new(DocumentCore { document, history }),
            store,
            collaborators,
            config,
        }
    }

    pub fn scene_id(&self) -> &SceneId {
        &self.scene_id
    }

    /// Run `operation` without recording it (transient state such as play
    /// mode or selection). The commit, if any, is returned and dropped from
    /// history.
    pub async fn invoke(&self, operation: &dyn Operation) -> Result<OperationOutcome, OperationError> {
        let mut core = self.core.lock().await;
        self.perform(&mut core.document, operation).await
    }

    /// Run `operation` and record its commit for undo.
    ///
    /// Returns whether anything changed.
    pub async fn invoke_and_push(&self, operation: &dyn Operation) -> Result<bool, OperationError> {
        let mut core = self.core.lock().await;
        let core = &mut *core;

        let Some(commit) = self.perform(&mut core.document, operation).await?.into_commit() else {
            return Ok(false);
        };
        if let Some(evicted) = core.history.record(commit) {
            tracing::warn!(
                "History of {} is full; dropped oldest entry '{}'",
                self.scene_id,
                evicted.label
            );
        }
        self.publish_history(&core.history);
        Ok(true)
    }

    /// Revert the most recent commit; `false` when there is nothing to undo
    pub async fn undo(&self) -> Result<bool, OperationError> {
        let mut core = self.core.lock().await;
        let core = &mut *core;

        let Some(record) = core.history.pop_undo() else {
            return Ok(false);
        };
        let mut ctx = self.context(&mut core.document);
        if let Err(e) = record.change.revert(&mut ctx) {
            tracing::warn!("Undo of '{}' failed: {}", record.label, e);
            core.history.push_undo(record);
            return Err(e);
        }

        tracing::debug!("Undo '{}' on {}", record.label, self.scene_id);
        core.history.push_redo(record);
        self.publish_history(&core.history);
        Ok(true)
    }

    /// Re-apply the most recently undone commit; `false` when there is
    /// nothing to redo
    pub async fn redo(&self) -> Result<bool, OperationError> {
        let mut core = self.core.lock().await;
        let core = &mut *core;

        let Some(record) = core.history.pop_redo() else {
            return Ok(false);
        };
        let mut ctx = self.context(&mut core.document);
        if let Err(e) = record.change.apply(&mut ctx) {
            tracing::warn!("Redo of '{}' failed: {}", record.label, e);
            core.history.push_redo(record);
            return Err(e);
        }

        tracing::debug!("Redo '{}' on {}", record.label, self.scene_id);
        core.history.push_undo(record);
        self.publish_history(&core.history);
        Ok(true)
    }

    pub async fn can_undo(&self) -> bool {
        self.core.lock().await.history.undo_len() > 0
    }

    pub async fn can_redo(&self) -> bool {
        self.core.lock().await.history.redo_len() > 0
    }

    pub async fn history_labels(&self) -> HistoryLabels {
        self.core.lock().await.history.labels()
    }

    pub async fn clear_history(&self) {
        let mut core = self.core.lock().await;
        core.history.clear();
        self.publish_history(&core.history);
    }

    /// Read the document once every queued operation ahead of this call
    /// has finished
    pub async fn read<R>(&self, read: impl FnOnce(&Document) -> R) -> R {
        let core = self.core.lock().await;
        read(&core.document)
    }

    /// Copy of the current graph
    pub async fn graph(&self) -> SceneGraph {
        self.read(|document| document.graph.clone()).await
    }

    async fn perform(
        &self,
        document: &mut Document,
        operation: &dyn Operation,
    ) -> Result<OperationOutcome, OperationError> {
        let mut ctx = self.context(document);
        let result = operation.perform(&mut ctx).await;
        match &result {
            Ok(outcome) => tracing::debug!(
                "{} on {}: did_mutate={}",
                operation.label(),
                self.scene_id,
                outcome.did_mutate()
            ),
            Err(e) => tracing::warn!("{} on {} failed: {}", operation.label(), self.scene_id, e),
        }
        result
    }

    fn context<'a>(&'a self, document: &'a mut Document) -> OperationContext<'a> {
        OperationContext::new(document, &self.store, &self.collaborators, &self.config)
    }

    fn publish_history(&self, history: &History) {
        StateSynchronizer::new(&self.store, &self.collaborators.render)
            .publish_history(&self.scene_id, history.status());
    }
}

impl std::fmt::Debug for OperationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationService")
            .field("scene_id", &self.scene_id)
            .finish_non_exhaustive()
    }
}
