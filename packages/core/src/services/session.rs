//! Editor Session
//!
//! Owns the reactive state store, the collaborators, the command registry
//! and every open document. Each open document gets its own
//! [`OperationService`], so edits to different documents never queue behind
//! each other.

use crate::collaborators::Collaborators;
use crate::commands::{
    Command, CommandContext, CommandError, CommandOutcome, CommandRegistry, Precondition,
};
use crate::config::EngineConfig;
use crate::document::Document;
use crate::models::{SceneFile, SceneId};
use crate::operations::OperationError;
use crate::services::OperationService;
use crate::state::{AppState, StateEvent, StateStore, StateSynchronizer};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

pub struct EditorSession {
    store: Arc<StateStore>,
    collaborators: Collaborators,
    config: Arc<EngineConfig>,
    registry: Arc<CommandRegistry>,
    documents: RwLock<HashMap<SceneId, Arc<OperationService>>>,
}

impl EditorSession {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        Self {
            store: Arc::new(StateStore::new(config.event_channel_capacity)),
            collaborators,
            config: Arc::new(config),
            registry: Arc::new(CommandRegistry::builtin()),
            documents: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the built-in command registry
    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn state(&self) -> Arc<AppState> {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.store.subscribe()
    }

    /// Create an empty, unsaved document and make it active
    pub fn new_document(&self, name: impl Into<String>) -> SceneId {
        let document = Document::new(SceneId::generate(), name);
        tracing::info!("Created document '{}' ({})", document.name, document.scene_id());
        self.register(document)
    }

    /// Open the document at `path` and make it active.
    ///
    /// A path that is already open is re-activated instead of loaded twice.
    pub async fn open_document(&self, path: impl AsRef<Path>) -> Result<SceneId, OperationError> {
        let path = path.as_ref();
        if let Some(scene_id) = self.find_by_path(path) {
            tracing::debug!("{} is already open as {}", path.display(), scene_id);
            self.set_active_document(&scene_id)?;
            return Ok(scene_id);
        }

        let text = self.collaborators.persistence.read_document(path).await?;
        let file = SceneFile::parse(&text)
            .map_err(|e| OperationError::malformed_document(format!("{}: {}", path.display(), e)))?;
        let document = Document::from_scene_file(SceneId::generate(), Some(path.to_path_buf()), file)
            .map_err(|e| OperationError::malformed_document(format!("{}: {}", path.display(), e)))?;

        tracing::info!(
            "Opened '{}' from {} ({} nodes)",
            document.name,
            path.display(),
            document.graph.len()
        );
        Ok(self.register(document))
    }

    /// Close a document, discarding its history. Returns whether it was open.
    pub fn close_document(&self, scene_id: &SceneId) -> bool {
        let removed = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(scene_id);
        if removed.is_none() {
            return false;
        }
        self.synchronizer().unregister_document(scene_id);
        tracing::info!("Closed document {}", scene_id);
        true
    }

    pub fn set_active_document(&self, scene_id: &SceneId) -> Result<(), OperationError> {
        if self.document(scene_id).is_none() {
            return Err(OperationError::DocumentNotFound {
                id: scene_id.clone(),
            });
        }
        self.synchronizer().set_active(Some(scene_id.clone()));
        Ok(())
    }

    pub fn active_document(&self) -> Option<Arc<OperationService>> {
        let state = self.state();
        state
            .scenes
            .active_scene_id
            .as_ref()
            .and_then(|id| self.document(id))
    }

    pub fn document(&self, scene_id: &SceneId) -> Option<Arc<OperationService>> {
        self.documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(scene_id)
            .cloned()
    }

    pub fn document_ids(&self) -> Vec<SceneId> {
        let mut ids: Vec<SceneId> = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Check preconditions, then execute
    pub async fn run_command(&self, command: &dyn Command) -> Result<CommandOutcome, CommandError> {
        let ctx = CommandContext::new(self);
        if let Precondition::Blocked { reason, scope } = command.preconditions(&ctx) {
            tracing::debug!("{} blocked ({:?}): {}", command.id(), scope, reason);
            return Err(CommandError::PreconditionFailed { reason, scope });
        }

        let outcome = command.execute(&ctx).await;
        match &outcome {
            Ok(outcome) => tracing::debug!("{}: did_mutate={}", command.id(), outcome.did_mutate),
            Err(e) => tracing::warn!("{} failed: {}", command.id(), e),
        }
        outcome
    }

    /// Build `id` from the registry and run it
    pub async fn run_registered(&self, id: &str, args: Value) -> Result<CommandOutcome, CommandError> {
        let command = self.registry.create(id, args)?;
        self.run_command(command.as_ref()).await
    }

    fn register(&self, document: Document) -> SceneId {
        let scene_id = document.scene_id().clone();
        let synchronizer = self.synchronizer();
        synchronizer.register_document(&document);

        let service = OperationService::new(
            document,
            Arc::clone(&self.store),
            self.collaborators.clone(),
            Arc::clone(&self.config),
        );
        self.documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(scene_id.clone(), Arc::new(service));

        synchronizer.set_active(Some(scene_id.clone()));
        scene_id
    }

    fn find_by_path(&self, path: &Path) -> Option<SceneId> {
        let state = self.state();
        let wanted: PathBuf = path.to_path_buf();
        state
            .scenes
            .descriptors
            .values()
            .find(|descriptor| descriptor.path.as_ref() == Some(&wanted))
            .map(|descriptor| descriptor.id.clone())
            .filter(|id| self.document(id).is_some())
    }

    fn synchronizer(&self) -> StateSynchronizer<'_> {
        StateSynchronizer::new(&self.store, &self.collaborators.render)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EngineConfig::default(), Collaborators::default())
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("documents", &self.document_ids())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
