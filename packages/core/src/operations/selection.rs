use crate::models::NodeId;
use crate::operations::{Change, Operation, OperationContext, OperationError, OperationOutcome};
use crate::state::SelectionState;
use async_trait::async_trait;

/// Replace the selection; unknown ids are ignored
#[derive(Debug, Clone)]
pub struct SelectNodesOperation {
    pub node_ids: Vec<NodeId>,
    pub primary: Option<NodeId>,
}

impl SelectNodesOperation {
    pub fn new(node_ids: Vec<NodeId>) -> Self {
        Self {
            node_ids,
            primary: None,
        }
    }

    pub fn with_primary(mut self, primary: NodeId) -> Self {
        self.primary = Some(primary);
        self
    }
}

#[async_trait]
impl Operation for SelectNodesOperation {
    fn label(&self) -> String {
        "Select".to_string()
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let graph = &ctx.document.graph;
        let after = SelectionState::new(
            self.node_ids
                .iter()
                .filter(|id| graph.contains(id))
                .cloned()
                .collect(),
            self.primary.clone(),
        );

        let before = ctx.state().selection.as_ref().clone();
        if before == after {
            return Ok(OperationOutcome::Unchanged);
        }
        ctx.commit(self.label(), Change::Select { before, after })
    }
}
