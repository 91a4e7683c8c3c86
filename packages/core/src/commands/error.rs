//! Command Layer Error Types

use crate::commands::{Precondition, PreconditionScope};
use crate::operations::OperationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    /// The command is not legal in the current state; nothing was attempted
    #[error("{reason}")]
    PreconditionFailed {
        reason: String,
        scope: PreconditionScope,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments for '{command}': {message}")]
    InvalidArguments { command: String, message: String },

    #[error("Command '{0}' is already registered")]
    DuplicateCommand(String),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl CommandError {
    pub fn invalid_arguments(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Scope of a precondition failure, for UI surfacing
    pub fn scope(&self) -> Option<PreconditionScope> {
        match self {
            CommandError::PreconditionFailed { scope, .. } => Some(*scope),
            _ => None,
        }
    }
}

impl From<Precondition> for CommandError {
    fn from(precondition: Precondition) -> Self {
        match precondition {
            Precondition::Blocked { reason, scope } => Self::PreconditionFailed { reason, scope },
            Precondition::Ready => Self::Operation(OperationError::internal(
                "a ready precondition was reported as a failure",
            )),
        }
    }
}
