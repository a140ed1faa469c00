//! # Change
//!
//! The batch builder every edit goes through.
//!
//! ## Design
//!
//! - A change owns a working [`Value`] and the log of operations applied to
//!   it so far
//! - Commands take `&mut self` and return `EditorResult<&mut Self>`, so
//!   calls chain with `?`; the first failure stops the chain and leaves the
//!   working value at its last good state
//! - Each top-level command is a flush point: the normalizer repairs the
//!   nodes the command dirtied before the next command runs
//! - Commands called from inside other commands (or from schema rules)
//!   never flush on their own
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut change = Change::new(value);
//! change.insert_text("Hello")?.split_block(1)?.insert_text("World")?;
//! let commit = change.commit()?;
//! ```

use crate::apply::apply_operation;
use crate::batch::{Commit, OperationBatch};
use crate::errors::{EditorError, EditorResult};
use crate::normalize::{self, Schema};
use crate::operation::Operation;
use quire_model::{Document, Key, KeyGenerator, Node, Selection, Value};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Change {
    value: Value,
    operations: Vec<Operation>,
    dirty: Vec<Key>,
    schema: Arc<Schema>,
    normalize: bool,
    depth: usize,
    normalizing: bool,
}

impl Change {
    /// Start a change on `value` with the core schema.
    pub fn new(value: Value) -> Self {
        Self::with_schema(value, Arc::new(Schema::default()))
    }

    pub fn with_schema(value: Value, schema: Arc<Schema>) -> Self {
        Self {
            value,
            operations: Vec::new(),
            dirty: Vec::new(),
            schema,
            normalize: true,
            depth: 0,
            normalizing: false,
        }
    }

    /// Turn automatic normalization on or off for the whole change.
    pub fn set_normalize(&mut self, normalize: bool) -> &mut Self {
        self.normalize = normalize;
        self
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn document(&self) -> &Document {
        &self.value.document
    }

    pub fn selection(&self) -> &Selection {
        &self.value.selection
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Operations applied so far, normalization repairs included.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Apply a raw operation as a command of its own.
    pub fn apply_operation(&mut self, operation: Operation) -> EditorResult<&mut Self> {
        self.run(|change| change.push(operation))
    }

    /// Run `f` as a single command: normalization waits until it returns.
    pub fn call<F>(&mut self, f: F) -> EditorResult<&mut Self>
    where
        F: FnOnce(&mut Change) -> EditorResult<()>,
    {
        self.run(f)
    }

    /// Run `f` with normalization suspended; dirtied nodes are repaired
    /// once the outermost command finishes.
    pub fn without_normalizing<F>(&mut self, f: F) -> EditorResult<&mut Self>
    where
        F: FnOnce(&mut Change) -> EditorResult<()>,
    {
        let previous = self.normalize;
        self.normalize = false;
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        self.normalize = previous;
        result?;
        self.flush_if_outermost()?;
        Ok(self)
    }

    /// Validate every node of the document.
    pub fn normalize(&mut self) -> EditorResult<&mut Self> {
        let keys = self.value.document.keys();
        self.dirty.extend(keys);
        self.force_flush()?;
        Ok(self)
    }

    /// Validate the node `key` and everything below it.
    pub fn normalize_node_by_key(&mut self, key: &Key) -> EditorResult<&mut Self> {
        let keys = if key == self.value.document.key() {
            self.value.document.keys()
        } else {
            self.value.document.node(key)?.keys()
        };
        self.dirty.extend(keys);
        self.force_flush()?;
        Ok(self)
    }

    /// Build a detached node from its plain-data description, minting
    /// missing keys from the working value's generator.
    pub fn node_from_json(&mut self, json: &serde_json::Value) -> EditorResult<Node> {
        Ok(self.value.node_from_json(json)?)
    }

    /// Finish the change and return the resulting value.
    pub fn apply(self) -> EditorResult<Value> {
        Ok(self.commit()?.value)
    }

    /// Finish the change, returning the value and the operation log.
    #[tracing::instrument(level = "debug", skip_all, fields(operations = self.operations.len()))]
    pub fn commit(mut self) -> EditorResult<Commit> {
        self.flush()?;
        Ok(Commit {
            value: self.value,
            batch: OperationBatch::from_operations(self.operations),
        })
    }

    pub(crate) fn run<F>(&mut self, f: F) -> EditorResult<&mut Self>
    where
        F: FnOnce(&mut Change) -> EditorResult<()>,
    {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result?;
        self.flush_if_outermost()?;
        Ok(self)
    }

    /// Apply `operation` to the working value and record it.
    pub(crate) fn push(&mut self, operation: Operation) -> EditorResult<()> {
        let index = self.operations.len();
        let next = apply_operation(&self.value, &operation).map_err(|source| {
            EditorError::Operation {
                index,
                kind: operation.kind(),
                path: operation.path().cloned(),
                source,
            }
        })?;
        tracing::debug!(
            index,
            kind = operation.kind(),
            path = ?operation.path(),
            "applied operation"
        );
        let dirty = operation.dirty_keys(&self.value.document, &next.document);
        self.dirty.extend(dirty);
        self.value = next;
        self.operations.push(operation);
        Ok(())
    }

    /// Mint a key no node of the working value uses.
    pub(crate) fn new_key(&mut self) -> Key {
        self.value.key_generator_mut().new_key()
    }

    pub(crate) fn key_generator_mut(&mut self) -> &mut KeyGenerator {
        self.value.key_generator_mut()
    }

    pub(crate) fn take_dirty(&mut self) -> Vec<Key> {
        std::mem::take(&mut self.dirty)
    }

    fn flush_if_outermost(&mut self) -> EditorResult<()> {
        if self.depth == 0 {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> EditorResult<()> {
        if !self.normalize {
            return Ok(());
        }
        self.force_flush()
    }

    fn force_flush(&mut self) -> EditorResult<()> {
        if self.normalizing || self.dirty.is_empty() {
            return Ok(());
        }
        self.normalizing = true;
        let schema = Arc::clone(&self.schema);
        let result = normalize::normalize_dirty(self, &schema);
        self.normalizing = false;
        result
    }
}
