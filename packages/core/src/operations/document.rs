//! Whole-document operations: save and reload.

use crate::models::SceneFile;
use crate::operations::{
    Change, DocumentSnapshot, Operation, OperationContext, OperationError, OperationOutcome,
};
use async_trait::async_trait;
use std::path::PathBuf;

/// Write the document through the persistence collaborator and mark it
/// clean. With a `path` this is "save as" and the document adopts it.
#[derive(Debug, Clone, Default)]
pub struct SaveDocumentOperation {
    pub path: Option<PathBuf>,
}

impl SaveDocumentOperation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

#[async_trait]
impl Operation for SaveDocumentOperation {
    fn label(&self) -> String {
        "Save Document".to_string()
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let path = self
            .path
            .clone()
            .or_else(|| ctx.document.path.clone())
            .ok_or_else(|| OperationError::invalid_operation("document has no path"))?;

        let text = ctx.document.to_scene_file().to_json_string()?;
        ctx.collaborators
            .persistence
            .save_document(&path, &text)
            .await?;
        tracing::info!("Saved {} to {}", ctx.scene_id(), path.display());

        let change = Change::MarkClean {
            was_dirty: ctx.document.dirty,
            path_before: ctx.document.path.clone(),
            path_after: Some(path),
        };
        ctx.commit(self.label(), change)
    }
}

/// Re-read the document from disk, replacing the whole graph.
///
/// Undo restores the previous graph from a snapshot taken before the swap,
/// along with any selection the reload dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReloadDocumentOperation;

impl ReloadDocumentOperation {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Operation for ReloadDocumentOperation {
    fn label(&self) -> String {
        "Reload Document".to_string()
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let path = ctx
            .document
            .path
            .clone()
            .ok_or_else(|| OperationError::invalid_operation("document has no path"))?;

        let text = ctx.collaborators.persistence.read_document(&path).await?;
        let file = SceneFile::parse(&text)
            .map_err(|e| OperationError::malformed_document(e.to_string()))?;
        let graph = file
            .clone()
            .into_graph()
            .map_err(|e| OperationError::malformed_document(e.to_string()))?;

        if graph == ctx.document.graph && file.name == ctx.document.name {
            tracing::debug!("{} is unchanged on disk", path.display());
            return Ok(OperationOutcome::Unchanged);
        }

        let mut changes = Vec::with_capacity(2);
        let state = ctx.state();
        if state.scenes.active_scene_id.as_ref() == Some(ctx.scene_id()) {
            let selection_after = state.selection.retain(|id| graph.contains(id));
            if selection_after != *state.selection {
                changes.push(Change::Select {
                    before: (*state.selection).clone(),
                    after: selection_after,
                });
            }
        }
        changes.push(Change::ReplaceDocument {
            before: Box::new(DocumentSnapshot {
                file: ctx.document.to_scene_file(),
                dirty: ctx.document.dirty,
            }),
            after: Box::new(DocumentSnapshot { file, dirty: false }),
        });
        let change = match changes.len() {
            1 => changes.remove(0),
            _ => Change::Batch { changes },
        };
        tracing::info!("Reloaded {} from {}", ctx.scene_id(), path.display());
        ctx.commit(self.label(), change)
    }
}
