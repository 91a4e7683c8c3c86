use crate::operations::{Change, Operation, OperationContext, OperationError, OperationOutcome};
use crate::state::PlayMode;
use async_trait::async_trait;

/// Switch between edit, play and pause. Dispatched with `invoke`, so it is
/// never part of the undo timeline.
#[derive(Debug, Clone, Copy)]
pub struct SetPlayModeOperation {
    pub mode: PlayMode,
}

impl SetPlayModeOperation {
    pub fn new(mode: PlayMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl Operation for SetPlayModeOperation {
    fn label(&self) -> String {
        format!("Play Mode: {:?}", self.mode)
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let before = ctx.state().play_mode;
        if before == self.mode {
            return Ok(OperationOutcome::Unchanged);
        }
        ctx.commit(
            self.label(),
            Change::PlayMode {
                before,
                after: self.mode,
            },
        )
    }
}
