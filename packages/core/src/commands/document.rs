//! Document-level commands: save, reload and play mode.

use crate::commands::{
    Command, CommandContext, CommandError, CommandOutcome, Precondition, PreconditionScope,
};
use crate::operations::{ReloadDocumentOperation, SaveDocumentOperation, SetPlayModeOperation};
use crate::state::{PlayMode, SceneDescriptor};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

fn require_descriptor<'c>(ctx: &'c CommandContext<'_>) -> Result<&'c SceneDescriptor, Precondition> {
    ctx.active_descriptor().ok_or_else(|| {
        Precondition::blocked(PreconditionScope::NoActiveDocument, "No document is open")
    })
}

/// `document.save`. With `path` this is "save as".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveDocumentCommand {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SaveDocumentCommand {
    fn check(&self, ctx: &CommandContext<'_>) -> Result<(), Precondition> {
        let descriptor = require_descriptor(ctx)?;
        if self.path.is_none() && descriptor.path.is_none() {
            return Err(Precondition::blocked(
                PreconditionScope::NoDocumentPath,
                format!("'{}' has never been saved; choose a path", descriptor.name),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Command for SaveDocumentCommand {
    fn id(&self) -> &'static str {
        "document.save"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        self.check(ctx).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let service = ctx.active_document()?;
        let operation = SaveDocumentOperation {
            path: self.path.clone(),
        };
        let outcome = service.invoke(&operation).await?;
        let path = service.read(|document| document.path.clone()).await;
        Ok(CommandOutcome::mutated(outcome.did_mutate()).with_payload(json!({ "path": path })))
    }
}

/// `document.reload`: re-read the file from disk, undoably
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReloadDocumentCommand {}

#[async_trait]
impl Command for ReloadDocumentCommand {
    fn id(&self) -> &'static str {
        "document.reload"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        match require_descriptor(ctx) {
            Ok(descriptor) if descriptor.path.is_none() => Precondition::blocked(
                PreconditionScope::NoDocumentPath,
                format!("'{}' has no file to reload from", descriptor.name),
            ),
            Ok(_) => Precondition::Ready,
            Err(blocked) => blocked,
        }
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let did_mutate = ctx
            .active_document()?
            .invoke_and_push(&ReloadDocumentOperation::new())
            .await?;
        Ok(CommandOutcome::mutated(did_mutate))
    }
}

/// `play.setMode`
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct SetPlayModeCommand {
    pub mode: PlayMode,
}

impl SetPlayModeCommand {
    pub fn new(mode: PlayMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl Command for SetPlayModeCommand {
    fn id(&self) -> &'static str {
        "play.setMode"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        require_descriptor(ctx).map(|_| ()).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let outcome = ctx
            .active_document()?
            .invoke(&SetPlayModeOperation::new(self.mode))
            .await?;
        Ok(CommandOutcome::mutated(outcome.did_mutate()))
    }
}
