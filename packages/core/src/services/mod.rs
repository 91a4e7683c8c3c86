//! Engine Services
//!
//! - `OperationService` - per-document FIFO gate, operation execution and undo/redo
//! - `History` - bounded undo stack plus redo stack
//! - `EditorSession` - open documents, reactive state and command dispatch
//!
//! Services sit between the command façade and the operation layer; they are
//! the only place documents are mutated from.

pub mod history;
pub mod operation_service;
pub mod session;

pub use history::{History, HistoryLabels};
pub use operation_service::OperationService;
pub use session::EditorSession;

#[cfg(test)]
mod operation_service_test;
