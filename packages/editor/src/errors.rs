//! Error types for the editor

use quire_model::{Key, ModelError, Path};
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

/// A single operation's preconditions did not hold against the value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OperationError {
    #[error("No node at path {0}")]
    NodeNotFound(Path),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Cannot merge: {0}")]
    IncompatibleMerge(String),

    #[error("Offset {offset} is out of range for `{key}` (length {len})")]
    OffsetOutOfRange { key: Key, offset: usize, len: usize },

    #[error("Cannot move a node into itself or one of its descendants")]
    CycleDetected,

    #[error(transparent)]
    Model(ModelError),
}

impl OperationError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        OperationError::InvalidOperation(message.into())
    }
}

impl From<ModelError> for OperationError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::PathNotFound(path) => OperationError::NodeNotFound(path),
            ModelError::InvalidOffset { key, offset, len } => {
                OperationError::OffsetOutOfRange { key, offset, len }
            }
            other => OperationError::Model(other),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// An operation failed while a change was being applied.
    #[error("Operation #{index} ({kind}{}) failed: {source}", at_path(.path))]
    Operation {
        index: usize,
        kind: &'static str,
        path: Option<Path>,
        source: OperationError,
    },

    #[error("Invalid command: {0}")]
    InvalidCommand(#[from] OperationError),

    /// Normalization kept firing past its iteration budget.
    #[error("Normalization of `{key}` did not settle after {iterations} iterations")]
    StructuralInvariant { key: Key, iterations: usize },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown query: {0}")]
    UnknownQuery(String),

    #[error("Invalid arguments for `{name}`: {message}")]
    InvalidArguments { name: String, message: String },

    #[error("Editor is read-only")]
    ReadOnly,

    #[error("Config error: {0}")]
    Config(String),
}

impl EditorError {
    pub fn invalid_command(message: impl Into<String>) -> Self {
        EditorError::InvalidCommand(OperationError::invalid(message))
    }

    pub fn invalid_arguments(name: &str, message: impl Into<String>) -> Self {
        EditorError::InvalidArguments {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

fn at_path(path: &Option<Path>) -> String {
    path.as_ref().map(|p| format!(" at {p}")).unwrap_or_default()
}
