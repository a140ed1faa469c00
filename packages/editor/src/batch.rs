//! # Operation Batches
//!
//! The log of operations a change produced, in application order.
//!
//! ## Design
//!
//! - A batch records every operation, including normalization repairs
//! - The inverse of a batch is the reversed list of inverted operations,
//!   so applying it undoes the whole batch
//! - History and collaboration live outside the engine; they consume
//!   batches through [`OperationBatch::inverse`] and
//!   [`OperationBatch::apply_to`]
//!
//! ## Example
//!
//! ```rust,ignore
//! let commit = Change::new(value).insert_text("hi")?.commit()?;
//!
//! // Undo
//! let previous = commit.batch.inverse().apply_to(&commit.value)?;
//! ```

use crate::apply::apply_operation;
use crate::errors::{EditorError, EditorResult};
use crate::operation::Operation;
use quire_model::Value;
use serde::{Deserialize, Serialize};

/// A group of operations that should be replayed or undone together
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationBatch {
    /// The operations in this batch (in application order)
    pub operations: Vec<Operation>,

    /// Optional description of this batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl OperationBatch {
    /// Create a single-operation batch
    pub fn single(operation: Operation) -> Self {
        Self::from_operations(vec![operation])
    }

    /// Create a batch from multiple operations
    pub fn from_operations(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            description: None,
        }
    }

    /// Add a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    /// The batch that undoes this one.
    pub fn inverse(&self) -> OperationBatch {
        OperationBatch {
            operations: self.operations.iter().rev().map(Operation::invert).collect(),
            description: self.description.clone(),
        }
    }

    /// Replay every operation against `value`. Normalization is not run;
    /// the log already holds the repairs made when it was recorded.
    #[tracing::instrument(level = "debug", skip_all, fields(operations = self.operations.len()))]
    pub fn apply_to(&self, value: &Value) -> EditorResult<Value> {
        let mut current = value.clone();
        for (index, operation) in self.operations.iter().enumerate() {
            current = apply_operation(&current, operation).map_err(|source| {
                EditorError::Operation {
                    index,
                    kind: operation.kind(),
                    path: operation.path().cloned(),
                    source,
                }
            })?;
        }
        Ok(current)
    }
}

impl IntoIterator for OperationBatch {
    type Item = Operation;
    type IntoIter = std::vec::IntoIter<Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.into_iter()
    }
}

/// Result of a finished change: the new value and the log that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub value: Value,
    pub batch: OperationBatch,
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{MarkSet, Path};
    use serde_json::json;

    fn value() -> Value {
        Value::from_json(&json!({
            "object": "document",
            "nodes": [{
                "object": "block",
                "type": "paragraph",
                "nodes": [{ "object": "text", "text": "word" }]
            }]
        }))
        .unwrap()
    }

    fn insert(offset: usize, text: &str) -> Operation {
        Operation::InsertText {
            path: Path::new(vec![0, 0]),
            offset,
            text: text.into(),
            marks: MarkSet::new(),
        }
    }

    #[test]
    fn test_batch_inverse_restores_value() {
        let value = value();
        let batch = OperationBatch::from_operations(vec![insert(0, "a"), insert(5, "z")])
            .with_description("typing");
        let next = batch.apply_to(&value).unwrap();
        assert_eq!(next.text(), "awordz");

        let inverse = batch.inverse();
        assert_eq!(inverse.description.as_deref(), Some("typing"));
        assert_eq!(inverse.operations[0], insert(5, "z").invert());
        assert_eq!(inverse.apply_to(&next).unwrap().document, value.document);
    }

    #[test]
    fn test_apply_to_reports_failing_index() {
        let value = value();
        let batch = OperationBatch::from_operations(vec![insert(0, "a"), insert(99, "b")]);
        match batch.apply_to(&value) {
            Err(EditorError::Operation { index, kind, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(kind, "insert_text");
            }
            other => panic!("expected an operation error, got {other:?}"),
        }
    }

    #[test]
    fn test_single_batch() {
        let batch = OperationBatch::single(insert(0, "a"));
        assert_eq!(batch.len(), 1);
        assert!(!batch.is_empty());
    }
}
