use crate::{Key, Path};
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("No node found for key `{0}`")]
    KeyNotFound(Key),

    #[error("No node found at path {0}")]
    PathNotFound(Path),

    #[error("Offset {offset} is out of range for text `{key}` of length {len}")]
    InvalidOffset { key: Key, offset: usize, len: usize },

    #[error("Duplicate key `{0}`")]
    DuplicateKey(Key),

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ModelError {
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }

    pub fn invalid_offset(key: &Key, offset: usize, len: usize) -> Self {
        Self::InvalidOffset {
            key: key.clone(),
            offset,
            len,
        }
    }

    /// True for errors raised by a lookup that did not resolve.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_) | Self::PathNotFound(_))
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Schema(e.to_string())
    }
}
