use crate::models::NodeId;
use crate::operations::{Change, Operation, OperationContext, OperationError, OperationOutcome};
use async_trait::async_trait;
use serde_json::Value;

/// Set one schema-described property of a node
#[derive(Debug, Clone)]
pub struct SetPropertyOperation {
    pub node_id: NodeId,
    pub property: String,
    pub value: Value,
}

impl SetPropertyOperation {
    pub fn new(node_id: NodeId, property: impl Into<String>, value: Value) -> Self {
        Self {
            node_id,
            property: property.into(),
            value,
        }
    }
}

#[async_trait]
impl Operation for SetPropertyOperation {
    fn label(&self) -> String {
        if self.property == "name" {
            "Rename Node".to_string()
        } else {
            format!("Set {}", self.property)
        }
    }

    async fn perform(
        &self,
        ctx: &mut OperationContext<'_>,
    ) -> Result<OperationOutcome, OperationError> {
        let Some(node) = ctx.document.graph.get(&self.node_id) else {
            tracing::warn!("Cannot set '{}': node '{}' no longer exists", self.property, self.node_id);
            return Ok(OperationOutcome::Unchanged);
        };
        let Some(descriptor) = ctx.collaborators.schema.descriptor(node, &self.property) else {
            tracing::warn!(
                "Node '{}' of type '{}' has no property '{}'",
                self.node_id,
                node.node_type,
                self.property
            );
            return Ok(OperationOutcome::Unchanged);
        };
        if let Err(reason) = descriptor.validate(&self.value) {
            tracing::warn!(
                "Rejected value for '{}' on '{}': {}",
                self.property,
                self.node_id,
                reason
            );
            return Ok(OperationOutcome::Unchanged);
        }

        if descriptor
            .get_value(node)
            .is_some_and(|current| values_equal(&current, &self.value))
        {
            return Ok(OperationOutcome::Unchanged);
        }
        let before = descriptor.stored_value(node);

        let change = Change::SetProperty {
            node_id: self.node_id.clone(),
            property: self.property.clone(),
            before,
            after: Some(self.value.clone()),
        };
        ctx.commit(self.label(), change)
    }
}

/// JSON equality that treats `1` and `1.0` as the same number
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}
