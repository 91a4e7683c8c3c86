//! Command registry
//!
//! Maps globally unique command ids to constructors that take JSON
//! arguments. Populated once through [`CommandRegistryBuilder`] and
//! read-only afterwards.

use crate::commands::document::{ReloadDocumentCommand, SaveDocumentCommand, SetPlayModeCommand};
use crate::commands::history::{RedoCommand, UndoCommand};
use crate::commands::scene::{
    CreateNodeCommand, DeleteSelectionCommand, DropNodeCommand, GroupSelectionCommand,
    RenameNodeCommand, SelectNodesCommand, SetPropertyCommand,
};
use crate::commands::{Command, CommandError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type CommandFactory =
    Arc<dyn Fn(Value) -> Result<Box<dyn Command>, CommandError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct CommandRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl CommandRegistry {
    /// Registry holding every built-in command
    pub fn builtin() -> Self {
        let mut factories = HashMap::new();
        let mut insert = |id: &str, factory: CommandFactory| {
            factories.insert(id.to_string(), factory);
        };

        insert("scene.createNode", parsed::<CreateNodeCommand>("scene.createNode"));
        insert(
            "scene.deleteSelection",
            parsed::<DeleteSelectionCommand>("scene.deleteSelection"),
        );
        insert("scene.renameNode", parsed::<RenameNodeCommand>("scene.renameNode"));
        insert("scene.setProperty", parsed::<SetPropertyCommand>("scene.setProperty"));
        insert("scene.dropNode", parsed::<DropNodeCommand>("scene.dropNode"));
        insert(
            "scene.groupSelection",
            parsed::<GroupSelectionCommand>("scene.groupSelection"),
        );
        insert("scene.selectNodes", parsed::<SelectNodesCommand>("scene.selectNodes"));
        insert("history.undo", parsed::<UndoCommand>("history.undo"));
        insert("history.redo", parsed::<RedoCommand>("history.redo"));
        insert("document.save", parsed::<SaveDocumentCommand>("document.save"));
        insert("document.reload", parsed::<ReloadDocumentCommand>("document.reload"));
        insert("play.setMode", parsed::<SetPlayModeCommand>("play.setMode"));

        Self { factories }
    }

    /// Build the command `id` from its JSON arguments
    pub fn create(&self, id: &str, args: Value) -> Result<Box<dyn Command>, CommandError> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| CommandError::UnknownCommand(id.to_string()))?;
        factory(args)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

/// Assembles a registry, rejecting duplicate ids
#[derive(Default)]
pub struct CommandRegistryBuilder {
    factories: HashMap<String, CommandFactory>,
}

impl CommandRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the built-in commands
    pub fn from_builtin() -> Self {
        Self {
            factories: CommandRegistry::builtin().factories,
        }
    }

    pub fn register<F>(mut self, id: impl Into<String>, factory: F) -> Result<Self, CommandError>
    where
        F: Fn(Value) -> Result<Box<dyn Command>, CommandError> + Send + Sync + 'static,
    {
        let id = id.into();
        if self.factories.contains_key(&id) {
            return Err(CommandError::DuplicateCommand(id));
        }
        self.factories.insert(id, Arc::new(factory));
        Ok(self)
    }

    pub fn build(self) -> CommandRegistry {
        CommandRegistry {
            factories: self.factories,
        }
    }
}

/// Factory that deserializes the arguments into `C`. `null` counts as `{}`.
fn parsed<C>(id: &'static str) -> CommandFactory
where
    C: Command + DeserializeOwned + 'static,
{
    Arc::new(move |args: Value| {
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };
        let command: C = serde_json::from_value(args)
            .map_err(|e| CommandError::invalid_arguments(id, e.to_string()))?;
        Ok(Box::new(command) as Box<dyn Command>)
    })
}
