//! # Operations
//!
//! The atomic, invertible primitives every edit is made of.
//!
//! ## Design Principles
//!
//! 1. **Self-contained**: an operation carries everything needed to apply
//!    it and to build its inverse, so logs can be replayed elsewhere
//! 2. **Path-addressed**: nodes are located by path against the value the
//!    operation is applied to
//! 3. **Exact inverses**: applying `op` then `op.invert()` restores the
//!    previous tree, selection and value data
//!
//! ## Operation Semantics
//!
//! - `MergeNode` folds the node at `path` into its previous sibling;
//!   `position` is the previous sibling's length before the merge
//! - `SplitNode` carries the properties of the new right-hand node,
//!   including its key, so replaying a split is deterministic
//! - `MoveNode.new_path` is read against the tree after the node has been
//!   taken out of its old place, so the inverse simply swaps the paths

use quire_model::{
    Data, Document, Key, Mark, MarkProperties, MarkSet, Node, NodeProperties, Path,
    SelectionProperties,
};
use serde::{Deserialize, Serialize};

/// Partial update of value-level data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// A single atomic edit of a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Insert `node` so that it ends up at `path`.
    InsertNode { path: Path, node: Node },

    /// Remove the node at `path`. `node` is the removed subtree, kept for
    /// the inverse.
    RemoveNode { path: Path, node: Node },

    /// Merge the node at `path` into its previous sibling.
    MergeNode {
        path: Path,
        position: usize,
        properties: NodeProperties,
    },

    /// Split the node at `path` at `position` (characters for texts,
    /// children for elements).
    SplitNode {
        path: Path,
        position: usize,
        properties: NodeProperties,
    },

    /// Move the node at `path` to `new_path`.
    MoveNode { path: Path, new_path: Path },

    /// Update the key, type, data or void flag of the node at `path`.
    SetNode {
        path: Path,
        properties: NodeProperties,
        old_properties: NodeProperties,
    },

    InsertText {
        path: Path,
        offset: usize,
        text: String,
        #[serde(default)]
        marks: MarkSet,
    },

    /// Remove `text` starting at `offset`. All removed characters share
    /// `marks`.
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
        #[serde(default)]
        marks: MarkSet,
    },

    AddMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
    },

    RemoveMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
    },

    /// Replace `mark` with `mark.merge(properties)` over the range.
    SetMark {
        path: Path,
        offset: usize,
        length: usize,
        mark: Mark,
        properties: MarkProperties,
    },

    SetSelection {
        properties: SelectionProperties,
        old_properties: SelectionProperties,
    },

    SetValue {
        properties: ValueProperties,
        old_properties: ValueProperties,
    },
}

impl Operation {
    /// Serialized name of this operation's type.
    pub fn kind(&self) -> &'static str {
        match self {
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::SetNode { .. } => "set_node",
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::AddMark { .. } => "add_mark",
            Operation::RemoveMark { .. } => "remove_mark",
            Operation::SetMark { .. } => "set_mark",
            Operation::SetSelection { .. } => "set_selection",
            Operation::SetValue { .. } => "set_value",
        }
    }

    /// Path of the node this operation targets, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path, .. }
            | Operation::MergeNode { path, .. }
            | Operation::SplitNode { path, .. }
            | Operation::MoveNode { path, .. }
            | Operation::SetNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. }
            | Operation::AddMark { path, .. }
            | Operation::RemoveMark { path, .. }
            | Operation::SetMark { path, .. } => Some(path),
            Operation::SetSelection { .. } | Operation::SetValue { .. } => None,
        }
    }

    /// Whether this operation changes the shape of the tree. Shape-preserving
    /// operations keep the document's key index.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Operation::InsertNode { .. }
                | Operation::RemoveNode { .. }
                | Operation::MergeNode { .. }
                | Operation::SplitNode { .. }
                | Operation::MoveNode { .. }
        ) || matches!(self, Operation::SetNode { properties, .. } if properties.key.is_some())
    }

    /// The operation that undoes this one.
    pub fn invert(&self) -> Operation {
        match self.clone() {
            Operation::InsertNode { path, node } => Operation::RemoveNode { path, node },
            Operation::RemoveNode { path, node } => Operation::InsertNode { path, node },
            Operation::MergeNode {
                path,
                position,
                properties,
            } => Operation::SplitNode {
                path: path.previous_sibling().unwrap_or_else(|| path.clone()),
                position,
                properties,
            },
            Operation::SplitNode {
                path,
                position,
                properties,
            } => Operation::MergeNode {
                path: path.next_sibling().unwrap_or_else(|| path.clone()),
                position,
                properties,
            },
            Operation::MoveNode { path, new_path } => Operation::MoveNode {
                path: new_path,
                new_path: path,
            },
            Operation::SetNode {
                path,
                properties,
                old_properties,
            } => Operation::SetNode {
                path,
                properties: old_properties,
                old_properties: properties,
            },
            Operation::InsertText {
                path,
                offset,
                text,
                marks,
            } => Operation::RemoveText {
                path,
                offset,
                text,
                marks,
            },
            Operation::RemoveText {
                path,
                offset,
                text,
                marks,
            } => Operation::InsertText {
                path,
                offset,
                text,
                marks,
            },
            Operation::AddMark {
                path,
                offset,
                length,
                mark,
            } => Operation::RemoveMark {
                path,
                offset,
                length,
                mark,
            },
            Operation::RemoveMark {
                path,
                offset,
                length,
                mark,
            } => Operation::AddMark {
                path,
                offset,
                length,
                mark,
            },
            Operation::SetMark {
                path,
                offset,
                length,
                mark,
                properties,
            } => {
                let updated = mark.merge(&properties);
                let properties = mark.diff(&updated);
                Operation::SetMark {
                    path,
                    offset,
                    length,
                    mark: updated,
                    properties,
                }
            }
            Operation::SetSelection {
                properties,
                old_properties,
            } => Operation::SetSelection {
                properties: old_properties,
                old_properties: properties,
            },
            Operation::SetValue {
                properties,
                old_properties,
            } => Operation::SetValue {
                properties: old_properties,
                old_properties: properties,
            },
        }
    }

    /// Keys of the nodes whose invariants this operation may have broken,
    /// given the documents before and after it was applied. Containers come
    /// with all their ancestors; the document key stands for the root.
    pub fn dirty_keys(&self, before: &Document, after: &Document) -> Vec<Key> {
        let mut keys = Vec::new();
        match self {
            Operation::InsertNode { path, .. } => {
                push_ancestors(&mut keys, after, path);
                if let Ok(node) = after.node_at(path) {
                    keys.extend(node.keys());
                }
            }
            Operation::RemoveNode { path, .. } => push_ancestors(&mut keys, before, path),
            Operation::MergeNode { path, .. } => {
                if let Some(previous) = path.previous_sibling() {
                    push_ancestors(&mut keys, after, &previous);
                    push_key(&mut keys, after, &previous);
                }
            }
            Operation::SplitNode { path, .. } => {
                push_ancestors(&mut keys, after, path);
                push_key(&mut keys, after, path);
                if let Some(next) = path.next_sibling() {
                    push_key(&mut keys, after, &next);
                }
            }
            Operation::MoveNode { path, new_path } => {
                push_ancestors(&mut keys, before, path);
                push_ancestors(&mut keys, after, new_path);
                push_key(&mut keys, after, new_path);
            }
            Operation::SetNode { path, .. }
            | Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. }
            | Operation::AddMark { path, .. }
            | Operation::RemoveMark { path, .. }
            | Operation::SetMark { path, .. } => {
                push_ancestors(&mut keys, after, path);
                push_key(&mut keys, after, path);
            }
            Operation::SetSelection { .. } | Operation::SetValue { .. } => {}
        }
        keys
    }
}

fn push_key(keys: &mut Vec<Key>, document: &Document, path: &Path) {
    if let Ok(node) = document.node_at(path) {
        keys.push(node.key().clone());
    }
}

/// Push the document key and the key of every container strictly above
/// `path`.
fn push_ancestors(keys: &mut Vec<Key>, document: &Document, path: &Path) {
    keys.push(document.key().clone());
    let slice = path.as_slice();
    for depth in 1..slice.len() {
        push_key(keys, document, &Path::from(&slice[..depth]));
    }
}
