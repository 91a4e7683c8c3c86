//! External Collaborators
//!
//! Narrow boundary contracts the engine consumes: persistence, render sync and
//! the property schema. Implementations shipped here cover headless use
//! (filesystem/in-memory stores, no-op or recording renderers, built-in
//! schema); hosts plug their own in through [`Collaborators`].

mod persistence;
mod property_schema;
mod render_sync;

pub use persistence::{DocumentStore, FileDocumentStore, MemoryDocumentStore, PersistenceError};
pub use property_schema::{
    BuiltinPropertySchema, PropertyDescriptor, PropertyGetter, PropertySchema, PropertySetter,
    PropertyValidator,
};
pub use render_sync::{
    NoopRenderSync, RecordingRenderSync, RenderCall, RenderHint, RenderNotifier, RenderSync,
    RenderSyncError,
};

use std::sync::Arc;

/// The collaborator set handed to every operation
#[derive(Clone)]
pub struct Collaborators {
    pub persistence: Arc<dyn DocumentStore>,
    pub render: RenderNotifier,
    pub schema: Arc<dyn PropertySchema>,
}

impl Collaborators {
    pub fn new(
        persistence: Arc<dyn DocumentStore>,
        render: Arc<dyn RenderSync>,
        schema: Arc<dyn PropertySchema>,
    ) -> Self {
        Self {
            persistence,
            render: RenderNotifier::new(render),
            schema,
        }
    }

    pub fn with_persistence(mut self, persistence: Arc<dyn DocumentStore>) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_render_sync(mut self, render: Arc<dyn RenderSync>) -> Self {
        self.render = RenderNotifier::new(render);
        self
    }

    pub fn with_schema(mut self, schema: Arc<dyn PropertySchema>) -> Self {
        self.schema = schema;
        self
    }
}

impl Default for Collaborators {
    /// Filesystem persistence, no renderer, built-in schema
    fn default() -> Self {
        Self::new(
            Arc::new(FileDocumentStore::new()),
            Arc::new(NoopRenderSync),
            Arc::new(BuiltinPropertySchema::new()),
        )
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
