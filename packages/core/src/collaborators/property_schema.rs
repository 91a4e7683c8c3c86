//! Property-schema collaborator
//!
//! Given a node, a [`PropertySchema`] returns the ordered list of editable
//! properties with their accessors. Generic property operations go through
//! these descriptors instead of hardcoding per-type field names.

use crate::collaborators::RenderHint;
use crate::models::{Dimension, Node};
use serde_json::{json, Value};
use std::sync::Arc;

pub type PropertyGetter = Arc<dyn Fn(&Node) -> Option<Value> + Send + Sync>;
/// Setter receiving `None` clears the property
pub type PropertySetter = Arc<dyn Fn(&mut Node, Option<Value>) + Send + Sync>;
pub type PropertyValidator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// One editable property of a node
#[derive(Clone)]
pub struct PropertyDescriptor {
    pub name: String,
    pub render_hint: RenderHint,
    getter: PropertyGetter,
    /// Reads what is actually stored, ignoring defaults; falls back to `getter`
    stored: Option<PropertyGetter>,
    setter: PropertySetter,
    validator: Option<PropertyValidator>,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, getter: PropertyGetter, setter: PropertySetter) -> Self {
        Self {
            name: name.into(),
            render_hint: RenderHint::None,
            getter,
            stored: None,
            setter,
            validator: None,
        }
    }

    /// Property stored under `key` in the node's JSON properties
    pub fn field(key: &str) -> Self {
        let get_key = key.to_string();
        let set_key = key.to_string();
        Self::new(
            key,
            Arc::new(move |node: &Node| node.property(&get_key).cloned()),
            Arc::new(move |node: &mut Node, value: Option<Value>| match value {
                Some(value) => {
                    node.set_property(&set_key, value);
                }
                None => {
                    node.remove_property(&set_key);
                }
            }),
        )
    }

    /// JSON field that reads as `default` while unset
    pub fn field_with_default(key: &str, default: Value) -> Self {
        let get_key = key.to_string();
        let mut descriptor = Self::field(key);
        descriptor.stored = Some(descriptor.getter.clone());
        descriptor.getter = Arc::new(move |node: &Node| {
            Some(node.property(&get_key).cloned().unwrap_or_else(|| default.clone()))
        });
        descriptor
    }

    pub fn with_validator(
        mut self,
        validator: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_render_hint(mut self, hint: RenderHint) -> Self {
        self.render_hint = hint;
        self
    }

    pub fn get_value(&self, node: &Node) -> Option<Value> {
        (self.getter)(node)
    }

    /// Value as stored on the node, `None` while a defaulted field is unset.
    /// Setting this back restores the node exactly.
    pub fn stored_value(&self, node: &Node) -> Option<Value> {
        match &self.stored {
            Some(stored) => stored(node),
            None => (self.getter)(node),
        }
    }

    pub fn set_value(&self, node: &mut Node, value: Option<Value>) {
        (self.setter)(node, value)
    }

    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match &self.validator {
            Some(validator) => validator(value),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("render_hint", &self.render_hint)
            .field("validated", &self.validator.is_some())
            .finish()
    }
}

pub trait PropertySchema: Send + Sync {
    /// Ordered property descriptors for `node`
    fn descriptors(&self, node: &Node) -> Vec<PropertyDescriptor>;

    fn descriptor(&self, node: &Node, name: &str) -> Option<PropertyDescriptor> {
        self.descriptors(node)
            .into_iter()
            .find(|descriptor| descriptor.name == name)
    }
}

/// Schema for the built-in node kinds
#[derive(Debug, Clone, Default)]
pub struct BuiltinPropertySchema;

impl BuiltinPropertySchema {
    pub fn new() -> Self {
        Self
    }
}

impl PropertySchema for BuiltinPropertySchema {
    fn descriptors(&self, node: &Node) -> Vec<PropertyDescriptor> {
        let axes = node.dimension.axes();
        let mut descriptors = vec![
            name_descriptor(),
            PropertyDescriptor::field_with_default("visible", json!(true))
                .with_validator(expect_bool)
                .with_render_hint(RenderHint::Visibility),
            PropertyDescriptor::field_with_default("position", json!(vec![0.0; axes]))
                .with_validator(move |value| expect_vector(value, axes))
                .with_render_hint(RenderHint::Transform),
            rotation_descriptor(node.dimension),
            PropertyDescriptor::field_with_default("scale", json!(vec![1.0; axes]))
                .with_validator(move |value| expect_vector(value, axes))
                .with_render_hint(RenderHint::Transform),
        ];

        match node.node_type.as_str() {
            "label" | "button" => {
                descriptors.push(PropertyDescriptor::field("text").with_validator(expect_string))
            }
            "sprite" => {
                descriptors.push(PropertyDescriptor::field("texture").with_validator(expect_string))
            }
            "mesh" => {
                descriptors.push(PropertyDescriptor::field("material").with_validator(expect_string))
            }
            "light" => descriptors.push(
                PropertyDescriptor::field_with_default("intensity", json!(1.0))
                    .with_validator(expect_non_negative),
            ),
            "camera" => descriptors.push(
                PropertyDescriptor::field_with_default("fov", json!(60.0))
                    .with_validator(expect_field_of_view),
            ),
            _ => {}
        }

        descriptors
    }
}

fn name_descriptor() -> PropertyDescriptor {
    PropertyDescriptor::new(
        "name",
        Arc::new(|node: &Node| Some(Value::String(node.name.clone()))),
        Arc::new(|node: &mut Node, value: Option<Value>| {
            if let Some(Value::String(name)) = value {
                node.name = name;
            }
        }),
    )
    .with_validator(|value| match value.as_str() {
        Some(name) if !name.trim().is_empty() => Ok(()),
        Some(_) => Err("name cannot be empty".to_string()),
        None => Err("name must be a string".to_string()),
    })
}

fn rotation_descriptor(dimension: Dimension) -> PropertyDescriptor {
    match dimension {
        Dimension::TwoD => PropertyDescriptor::field_with_default("rotation", json!(0.0))
            .with_validator(expect_number)
            .with_render_hint(RenderHint::Transform),
        Dimension::ThreeD => {
            PropertyDescriptor::field_with_default("rotation", json!([0.0, 0.0, 0.0]))
                .with_validator(|value| expect_vector(value, 3))
                .with_render_hint(RenderHint::Transform)
        }
    }
}

fn expect_bool(value: &Value) -> Result<(), String> {
    if value.is_boolean() {
        Ok(())
    } else {
        Err(format!("expected a boolean, got {}", value))
    }
}

fn expect_string(value: &Value) -> Result<(), String> {
    if value.is_string() {
        Ok(())
    } else {
        Err(format!("expected a string, got {}", value))
    }
}

fn expect_number(value: &Value) -> Result<(), String> {
    match value.as_f64() {
        Some(number) if number.is_finite() => Ok(()),
        _ => Err(format!("expected a finite number, got {}", value)),
    }
}

fn expect_non_negative(value: &Value) -> Result<(), String> {
    expect_number(value)?;
    match value.as_f64() {
        Some(number) if number >= 0.0 => Ok(()),
        _ => Err(format!("expected a non-negative number, got {}", value)),
    }
}

fn expect_field_of_view(value: &Value) -> Result<(), String> {
    expect_number(value)?;
    match value.as_f64() {
        Some(fov) if fov > 0.0 && fov < 180.0 => Ok(()),
        _ => Err(format!("field of view must be within (0, 180), got {}", value)),
    }
}

fn expect_vector(value: &Value, axes: usize) -> Result<(), String> {
    let components = value
        .as_array()
        .ok_or_else(|| format!("expected a {}-component vector, got {}", axes, value))?;
    if components.len() != axes {
        return Err(format!(
            "expected {} components, got {}",
            axes,
            components.len()
        ));
    }
    if components
        .iter()
        .all(|component| component.as_f64().is_some_and(f64::is_finite))
    {
        Ok(())
    } else {
        Err(format!("vector components must be finite numbers: {}", value))
    }
}
