use crate::commands::{
    Command, CommandContext, CommandError, CommandOutcome, Precondition, PreconditionScope,
};
use crate::state::HistoryStatus;
use async_trait::async_trait;
use serde::Deserialize;

fn active_history(ctx: &CommandContext<'_>) -> Result<HistoryStatus, Precondition> {
    ctx.active_descriptor()
        .map(|descriptor| descriptor.history)
        .ok_or_else(|| {
            Precondition::blocked(PreconditionScope::NoActiveDocument, "No document is open")
        })
}

/// `history.undo`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UndoCommand {}

#[async_trait]
impl Command for UndoCommand {
    fn id(&self) -> &'static str {
        "history.undo"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        match active_history(ctx) {
            Ok(history) if history.undo_len == 0 => {
                Precondition::blocked(PreconditionScope::NothingToUndo, "Nothing to undo")
            }
            Ok(_) => Precondition::Ready,
            Err(blocked) => blocked,
        }
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let did_mutate = ctx.active_document()?.undo().await?;
        Ok(CommandOutcome::mutated(did_mutate))
    }
}

/// `history.redo`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedoCommand {}

#[async_trait]
impl Command for RedoCommand {
    fn id(&self) -> &'static str {
        "history.redo"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        match active_history(ctx) {
            Ok(history) if history.redo_len == 0 => {
                Precondition::blocked(PreconditionScope::NothingToRedo, "Nothing to redo")
            }
            Ok(_) => Precondition::Ready,
            Err(blocked) => blocked,
        }
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let did_mutate = ctx.active_document()?.redo().await?;
        Ok(CommandOutcome::mutated(did_mutate))
    }
}
