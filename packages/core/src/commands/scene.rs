//! Scene editing commands
//!
//! Arguments arrive as camelCase JSON and deserialize straight into the
//! command structs. Omitted node ids default to the primary selection.

use crate::commands::{
    Command, CommandContext, CommandError, CommandOutcome, Precondition, PreconditionScope,
};
use crate::graph::{validate_drop, DropRejection};
use crate::models::{Dimension, NodeId};
use crate::operations::{
    CreateNodeOperation, DeleteNodesOperation, GroupNodesOperation, NodeSpec,
    ReparentNodeOperation, SelectNodesOperation, SetPropertyOperation,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

fn check_name(name: &str) -> Result<(), Precondition> {
    if name.trim().is_empty() {
        return Err(Precondition::blocked(
            PreconditionScope::InvalidName,
            "Name cannot be empty",
        ));
    }
    Ok(())
}

/// Payload naming the primary selection after a dispatch
fn primary_payload(ctx: &CommandContext<'_>) -> Option<Value> {
    ctx.session()
        .state()
        .selection
        .primary_node_id
        .as_ref()
        .map(|id| json!({ "nodeId": id }))
}

/// `scene.createNode`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeCommand {
    #[serde(flatten)]
    pub spec: NodeSpec,
    #[serde(default)]
    pub parent: Option<NodeId>,
}

impl CreateNodeCommand {
    pub fn new(spec: NodeSpec) -> Self {
        Self { spec, parent: None }
    }

    pub fn under(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    fn check(&self, ctx: &CommandContext<'_>) -> Result<(), Precondition> {
        ctx.require_hierarchy()?;
        let Some((dimension, _, _)) = self.spec.capabilities() else {
            return Err(Precondition::blocked(
                PreconditionScope::UnknownNodeType,
                format!("Unknown node type '{}'", self.spec.node_type),
            ));
        };
        if let Some(name) = &self.spec.name {
            check_name(name)?;
        }
        if let Some(parent) = &self.parent {
            let entry = ctx.require_node(parent)?;
            if !entry.is_container || entry.dimension != dimension {
                return Err(Precondition::blocked(
                    PreconditionScope::InvalidTarget,
                    format!("'{}' cannot contain a {} node", entry.name, dimension),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Command for CreateNodeCommand {
    fn id(&self) -> &'static str {
        "scene.createNode"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        self.check(ctx).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let service = ctx.active_document()?;
        let mut operation = CreateNodeOperation::new(self.spec.clone());
        operation.parent = self.parent.clone();

        let did_mutate = service.invoke_and_push(&operation).await?;
        let mut outcome = CommandOutcome::mutated(did_mutate);
        if did_mutate {
            // the operation selects what it created
            outcome.payload = primary_payload(ctx);
        }
        Ok(outcome)
    }
}

/// `scene.deleteSelection`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteSelectionCommand {}

#[async_trait]
impl Command for DeleteSelectionCommand {
    fn id(&self) -> &'static str {
        "scene.deleteSelection"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        ctx.require_selection().map(|_| ()).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let service = ctx.active_document()?;
        let node_ids = ctx.selection().node_ids.clone();
        let did_mutate = service
            .invoke_and_push(&DeleteNodesOperation::new(node_ids))
            .await?;
        Ok(CommandOutcome::mutated(did_mutate))
    }
}

/// `scene.renameNode`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameNodeCommand {
    #[serde(default)]
    pub node_id: Option<NodeId>,
    pub name: String,
}

impl RenameNodeCommand {
    pub fn new(node_id: Option<NodeId>, name: impl Into<String>) -> Self {
        Self {
            node_id,
            name: name.into(),
        }
    }

    fn check(&self, ctx: &CommandContext<'_>) -> Result<NodeId, Precondition> {
        ctx.require_hierarchy()?;
        check_name(&self.name)?;
        ctx.target_or_primary(self.node_id.as_ref())
    }
}

#[async_trait]
impl Command for RenameNodeCommand {
    fn id(&self) -> &'static str {
        "scene.renameNode"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        self.check(ctx).map(|_| ()).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let target = self.check(ctx)?;
        let service = ctx.active_document()?;
        let operation = SetPropertyOperation::new(target, "name", json!(self.name));
        let did_mutate = service.invoke_and_push(&operation).await?;
        Ok(CommandOutcome::mutated(did_mutate))
    }
}

/// `scene.setProperty`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPropertyCommand {
    #[serde(default)]
    pub node_id: Option<NodeId>,
    pub property: String,
    pub value: Value,
}

impl SetPropertyCommand {
    pub fn new(node_id: Option<NodeId>, property: impl Into<String>, value: Value) -> Self {
        Self {
            node_id,
            property: property.into(),
            value,
        }
    }

    fn check(&self, ctx: &CommandContext<'_>) -> Result<NodeId, Precondition> {
        ctx.require_hierarchy()?;
        if self.property == "name" {
            check_name(self.value.as_str().unwrap_or_default())?;
        }
        ctx.target_or_primary(self.node_id.as_ref())
    }
}

#[async_trait]
impl Command for SetPropertyCommand {
    fn id(&self) -> &'static str {
        "scene.setProperty"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        self.check(ctx).map(|_| ()).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let target = self.check(ctx)?;
        let service = ctx.active_document()?;
        let operation = SetPropertyOperation::new(target, self.property.clone(), self.value.clone());
        let did_mutate = service.invoke_and_push(&operation).await?;
        Ok(CommandOutcome::mutated(did_mutate))
    }
}

/// `scene.dropNode`: drag-and-drop reparenting. `target: null` drops onto
/// the document root.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropNodeCommand {
    pub node_id: NodeId,
    #[serde(default)]
    pub target: Option<NodeId>,
    #[serde(default)]
    pub index: Option<usize>,
}

impl DropNodeCommand {
    pub fn new(node_id: NodeId, target: Option<NodeId>) -> Self {
        Self {
            node_id,
            target,
            index: None,
        }
    }

    pub fn at(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    fn check(&self, ctx: &CommandContext<'_>) -> Result<(), Precondition> {
        let hierarchy = ctx.require_hierarchy()?;
        validate_drop(hierarchy, &self.node_id, self.target.as_ref()).map_err(|rejection| {
            let scope = match rejection {
                DropRejection::TargetMissing { .. } | DropRejection::DraggedMissing { .. } => {
                    PreconditionScope::NodeMissing
                }
                _ => PreconditionScope::InvalidTarget,
            };
            Precondition::blocked(scope, rejection.to_string())
        })
    }
}

#[async_trait]
impl Command for DropNodeCommand {
    fn id(&self) -> &'static str {
        "scene.dropNode"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        self.check(ctx).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let service = ctx.active_document()?;
        let mut operation = ReparentNodeOperation::new(self.node_id.clone(), self.target.clone());
        operation.index = self.index;
        let did_mutate = service.invoke_and_push(&operation).await?;
        Ok(CommandOutcome::mutated(did_mutate))
    }
}

/// `scene.groupSelection`: wrap the selected nodes in a new group container
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSelectionCommand {
    #[serde(default)]
    pub name: Option<String>,
}

impl GroupSelectionCommand {
    fn check(&self, ctx: &CommandContext<'_>) -> Result<(), Precondition> {
        let selection = ctx.require_selection()?;
        if let Some(name) = &self.name {
            check_name(name)?;
        }

        let mut dimension: Option<Dimension> = None;
        for id in &selection.node_ids {
            let entry = ctx.require_node(id)?;
            match dimension {
                Some(seen) if seen != entry.dimension => {
                    return Err(Precondition::blocked(
                        PreconditionScope::InvalidTarget,
                        "Cannot group 2D and 3D nodes together",
                    ));
                }
                _ => dimension = Some(entry.dimension),
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Command for GroupSelectionCommand {
    fn id(&self) -> &'static str {
        "scene.groupSelection"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        self.check(ctx).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let service = ctx.active_document()?;
        let mut operation = GroupNodesOperation::new(ctx.selection().node_ids.clone());
        operation.name = self.name.clone();

        let did_mutate = service.invoke_and_push(&operation).await?;
        let mut outcome = CommandOutcome::mutated(did_mutate);
        if did_mutate {
            outcome.payload = primary_payload(ctx);
        }
        Ok(outcome)
    }
}

/// `scene.selectNodes`: replaces the selection. Not recorded for undo.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectNodesCommand {
    #[serde(default)]
    pub node_ids: Vec<NodeId>,
    #[serde(default)]
    pub primary: Option<NodeId>,
}

impl SelectNodesCommand {
    pub fn new(node_ids: Vec<NodeId>) -> Self {
        Self {
            node_ids,
            primary: None,
        }
    }
}

#[async_trait]
impl Command for SelectNodesCommand {
    fn id(&self) -> &'static str {
        "scene.selectNodes"
    }

    fn preconditions(&self, ctx: &CommandContext<'_>) -> Precondition {
        ctx.require_hierarchy().map(|_| ()).into()
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<CommandOutcome, CommandError> {
        let service = ctx.active_document()?;
        let mut operation = SelectNodesOperation::new(self.node_ids.clone());
        operation.primary = self.primary.clone();
        let outcome = service.invoke(&operation).await?;
        Ok(CommandOutcome::mutated(outcome.did_mutate()))
    }
}
