//! Stagehand Core Engine
//!
//! This crate owns the scene graph of every open document and the
//! transactional engine that mutates it: operations with undo/redo, a FIFO
//! operation gate per document, reactive state projection, and the command
//! façade the UI talks to.
//!
//! # Architecture
//!
//! - **Single writer**: Only operations mutate a document, and only while
//!   holding that document's gate
//! - **Value-object history**: Every commit is a serializable [`operations::Change`]
//!   interpreted by `apply`/`revert`, never a captured closure
//! - **Snapshot state**: The UI reads immutable [`state::AppState`] snapshots and
//!   subscribes to [`state::StateEvent`]s
//!
//! # Modules
//!
//! - [`models`] - Nodes, identifiers and the scene file format
//! - [`graph`] - Scene graph ownership, structural primitives and drop validation
//! - [`collaborators`] - Persistence, render sync and property schema boundaries
//! - [`document`] - One open document
//! - [`state`] - Reactive state store and the synchronizer projecting into it
//! - [`operations`] - Reversible operations and the change catalogue
//! - [`services`] - Operation service, history and the editor session
//! - [`commands`] - Precondition-checked commands and their registry
//! - [`config`] - Engine configuration

pub mod collaborators;
pub mod commands;
pub mod config;
pub mod document;
pub mod graph;
pub mod models;
pub mod operations;
pub mod services;
pub mod state;

// Re-export commonly used types
pub use commands::{Command, CommandError, CommandOutcome, CommandRegistry, Precondition};
pub use config::EngineConfig;
pub use graph::SceneGraph;
pub use models::*;
pub use operations::{Operation, OperationError};
pub use services::*;
