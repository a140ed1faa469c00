//! Commands addressing nodes by key.

use super::{matches_properties, node_length};
use crate::change::Change;
use crate::errors::{EditorError, EditorResult, OperationError};
use crate::operation::Operation;
use quire_model::{Key, Mark, MarkProperties, MarkSet, Node, NodeProperties, Selection};

impl Change {
    /// Insert `node` as child `index` of `parent`. A node whose keys are
    /// already taken gets fresh ones.
    pub fn insert_node_by_key(&mut self, parent: &Key, index: usize, node: Node) -> EditorResult<&mut Self> {
        self.run(|change| {
            let path = change.document().path_of(parent)?.child(index);
            let node = change.adopt(node);
            change.push(Operation::InsertNode { path, node })
        })
    }

    pub fn remove_node_by_key(&mut self, key: &Key) -> EditorResult<&mut Self> {
        self.run(|change| {
            let path = change.document().path_of(key)?;
            let node = change.document().node_at(&path)?.clone();
            change.push(Operation::RemoveNode { path, node })
        })
    }

    /// Swap the node `key` for `node` in the same place.
    pub fn replace_node_by_key(&mut self, key: &Key, node: Node) -> EditorResult<&mut Self> {
        self.run(|change| {
            let (parent, index) = change.parent_and_index(key)?;
            change.remove_node_by_key(key)?;
            change.insert_node_by_key(&parent, index, node)?;
            Ok(())
        })
    }

    /// Merge the node `key` into its previous sibling.
    pub fn merge_node_by_key(&mut self, key: &Key) -> EditorResult<&mut Self> {
        self.run(|change| {
            let path = change.document().path_of(key)?;
            let previous = path
                .previous_sibling()
                .ok_or_else(|| EditorError::invalid_command(format!("`{key}` has no previous sibling")))?;
            let position = node_length(change.document().node_at(&previous)?);
            let properties = change.document().node_at(&path)?.properties();
            change.push(Operation::MergeNode {
                path,
                position,
                properties,
            })
        })
    }

    /// Split the node `key` at `position`; the right half gets a new key.
    pub fn split_node_by_key(&mut self, key: &Key, position: usize) -> EditorResult<&mut Self> {
        self.run(|change| change.split_node(key, position).map(|_| ()))
    }

    /// Split the text `text_key` at `offset`, then every ancestor up to and
    /// including `key`, so that `key` ends at the offset.
    pub fn split_descendants_by_key(&mut self, key: &Key, text_key: &Key, offset: usize) -> EditorResult<&mut Self> {
        self.run(|change| change.split_descendants(key, text_key, offset).map(|_| ()))
    }

    /// Move the node `key` to child `index` of `parent`, where `index` counts
    /// the parent's children once the node has been taken out.
    pub fn move_node_by_key(&mut self, key: &Key, parent: &Key, index: usize) -> EditorResult<&mut Self> {
        self.run(|change| {
            let document = change.document();
            if key == parent || document.node(key)?.has_key(parent) {
                return Err(OperationError::CycleDetected.into());
            }
            let path = document.path_of(key)?;
            let new_path = document.path_after_move(key, parent, index)?;
            if path == new_path {
                return Ok(());
            }
            change.push(Operation::MoveNode { path, new_path })
        })
    }

    pub fn set_node_by_key(&mut self, key: &Key, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.run(|change| {
            let path = change.document().path_of(key)?;
            let old_properties = properties.previous_of(change.document().node_at(&path)?);
            change.push(Operation::SetNode {
                path,
                properties,
                old_properties,
            })
        })
    }

    /// Insert `text` into the text `key`. Without explicit marks the text
    /// takes the marks found at `offset`.
    pub fn insert_text_by_key(
        &mut self,
        key: &Key,
        offset: usize,
        text: &str,
        marks: Option<MarkSet>,
    ) -> EditorResult<&mut Self> {
        self.run(|change| {
            if text.is_empty() {
                return Ok(());
            }
            let path = change.document().path_of(key)?;
            let marks = match marks {
                Some(marks) => marks,
                None => change.document().text_node(key)?.marks_at(offset),
            };
            change.push(Operation::InsertText {
                path,
                offset,
                text: text.to_string(),
                marks,
            })
        })
    }

    /// Remove `length` characters, one operation per leaf so the inverse
    /// restores the marks exactly.
    pub fn remove_text_by_key(&mut self, key: &Key, offset: usize, length: usize) -> EditorResult<&mut Self> {
        self.run(|change| {
            if length == 0 {
                return Ok(());
            }
            let path = change.document().path_of(key)?;
            let text = change.document().text_node(key)?;
            check_range(key, offset, length, text.len())?;
            let segments = text.segments(offset, length);
            for (start, leaf) in segments.into_iter().rev() {
                change.push(Operation::RemoveText {
                    path: path.clone(),
                    offset: start,
                    text: leaf.text,
                    marks: leaf.marks,
                })?;
            }
            Ok(())
        })
    }

    pub fn add_mark_by_key(&mut self, key: &Key, offset: usize, length: usize, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| {
            for (start, len) in change.mark_segments(key, offset, length, |marks| !marks.contains(&mark))? {
                let path = change.document().path_of(key)?;
                change.push(Operation::AddMark {
                    path,
                    offset: start,
                    length: len,
                    mark: mark.clone(),
                })?;
            }
            Ok(())
        })
    }

    pub fn remove_mark_by_key(&mut self, key: &Key, offset: usize, length: usize, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| {
            for (start, len) in change.mark_segments(key, offset, length, |marks| marks.contains(&mark))? {
                let path = change.document().path_of(key)?;
                change.push(Operation::RemoveMark {
                    path,
                    offset: start,
                    length: len,
                    mark: mark.clone(),
                })?;
            }
            Ok(())
        })
    }

    /// Update `mark` with `properties` wherever it covers the range.
    pub fn set_mark_by_key(
        &mut self,
        key: &Key,
        offset: usize,
        length: usize,
        mark: Mark,
        properties: MarkProperties,
    ) -> EditorResult<&mut Self> {
        self.run(|change| {
            for (start, len) in change.mark_segments(key, offset, length, |marks| marks.contains(&mark))? {
                let path = change.document().path_of(key)?;
                change.push(Operation::SetMark {
                    path,
                    offset: start,
                    length: len,
                    mark: mark.clone(),
                    properties: properties.clone(),
                })?;
            }
            Ok(())
        })
    }

    /// Wrap the node `key` in `block`, inserted where the node was.
    pub fn wrap_block_by_key(&mut self, key: &Key, block: Node) -> EditorResult<&mut Self> {
        if !block.is_block() {
            return Err(EditorError::invalid_command("wrap_block_by_key needs a block"));
        }
        self.wrap_node_by_key(key, block)
    }

    pub fn wrap_inline_by_key(&mut self, key: &Key, inline: Node) -> EditorResult<&mut Self> {
        if !inline.is_inline() {
            return Err(EditorError::invalid_command("wrap_inline_by_key needs an inline"));
        }
        self.wrap_node_by_key(key, inline)
    }

    /// Lift the node `key` out of its parent, splitting the parent when the
    /// node sits in the middle of it.
    pub fn unwrap_node_by_key(&mut self, key: &Key) -> EditorResult<&mut Self> {
        self.run(|change| {
            let (parent, index) = change.parent_and_index(key)?;
            if parent == *change.document().key() {
                return Err(EditorError::invalid_command(format!("`{key}` has no parent to unwrap from")));
            }
            let count = change.document().node(&parent)?.nodes().len();
            let (grandparent, parent_index) = change.parent_and_index(&parent)?;
            if count == 1 {
                change.move_node_by_key(key, &grandparent, parent_index)?;
                change.remove_node_by_key(&parent)?;
            } else if index == 0 {
                change.move_node_by_key(key, &grandparent, parent_index)?;
            } else if index == count - 1 {
                change.move_node_by_key(key, &grandparent, parent_index + 1)?;
            } else {
                change.split_node(&parent, index)?;
                change.move_node_by_key(key, &grandparent, parent_index + 1)?;
            }
            Ok(())
        })
    }

    /// Unwrap blocks matching `properties` around the node `key`.
    pub fn unwrap_block_by_key(&mut self, key: &Key, properties: NodeProperties) -> EditorResult<&mut Self> {
        let range = self.range_of(key)?;
        self.unwrap_block_at_range(&range, properties)
    }

    /// Unwrap inlines matching `properties` around the node `key`.
    pub fn unwrap_inline_by_key(&mut self, key: &Key, properties: NodeProperties) -> EditorResult<&mut Self> {
        let range = self.range_of(key)?;
        self.unwrap_inline_at_range(&range, properties)
    }

    /// Remove every child of `key` whose properties match.
    pub fn remove_children_by_key(&mut self, key: &Key, properties: &NodeProperties) -> EditorResult<&mut Self> {
        self.run(|change| {
            let keys: Vec<Key> = change
                .document()
                .node(key)?
                .nodes()
                .iter()
                .filter(|child| matches_properties(child, properties))
                .map(|child| child.key().clone())
                .collect();
            for child in keys.iter().rev() {
                change.remove_node_by_key(child)?;
            }
            Ok(())
        })
    }

    pub(crate) fn split_node(&mut self, key: &Key, position: usize) -> EditorResult<Key> {
        let path = self.document().path_of(key)?;
        let mut properties = self.document().node_at(&path)?.properties();
        let new_key = self.new_key();
        properties.key = Some(new_key.clone());
        self.push(Operation::SplitNode {
            path,
            position,
            properties,
        })?;
        Ok(new_key)
    }

    /// Returns the key of the new right-hand node at the level of `key`.
    pub(crate) fn split_descendants(&mut self, key: &Key, text_key: &Key, offset: usize) -> EditorResult<Key> {
        let ancestors: Vec<Key> = self
            .document()
            .ancestors(text_key)?
            .into_iter()
            .map(|node| node.key().clone())
            .collect();
        let chain = if key == text_key {
            Vec::new()
        } else {
            let start = ancestors
                .iter()
                .position(|ancestor| ancestor == key)
                .ok_or_else(|| EditorError::invalid_command(format!("`{key}` does not contain `{text_key}`")))?;
            ancestors[start..].to_vec()
        };
        let mut right = self.split_node(text_key, offset)?;
        for ancestor in chain.iter().rev() {
            let index = self
                .document()
                .path_of(&right)?
                .last()
                .unwrap_or_default();
            right = self.split_node(ancestor, index)?;
        }
        Ok(right)
    }

    pub(crate) fn parent_and_index(&self, key: &Key) -> EditorResult<(Key, usize)> {
        let document = self.document();
        let index = document.path_of(key)?.last().unwrap_or_default();
        let parent = document.parent(key)?.key().clone();
        Ok((parent, index))
    }

    /// A range spanning the whole content of the node `key`.
    pub(crate) fn range_of(&self, key: &Key) -> EditorResult<Selection> {
        let node = self.document().node(key)?;
        Ok(Selection::default()
            .move_to_range_of(node)
            .normalize(self.document()))
    }

    /// Give `node` fresh keys when any of its keys is already in use.
    pub(crate) fn adopt(&mut self, node: Node) -> Node {
        let document = self.document();
        if node.keys().iter().any(|key| document.has_key(key)) {
            return node.regenerate_keys(self.key_generator_mut());
        }
        node
    }

    fn wrap_node_by_key(&mut self, key: &Key, wrapper: Node) -> EditorResult<&mut Self> {
        self.run(|change| {
            let (parent, index) = change.parent_and_index(key)?;
            let wrapper = change.adopt(wrapper.with_nodes(Vec::new()));
            let wrapper_key = wrapper.key().clone();
            change.insert_node_by_key(&parent, index, wrapper)?;
            change.move_node_by_key(key, &wrapper_key, 0)?;
            Ok(())
        })
    }

    /// `(offset, length)` runs of the range whose mark sets pass `pred`.
    fn mark_segments<F>(&self, key: &Key, offset: usize, length: usize, pred: F) -> EditorResult<Vec<(usize, usize)>>
    where
        F: Fn(&MarkSet) -> bool,
    {
        let text = self.document().text_node(key)?;
        check_range(key, offset, length, text.len())?;
        Ok(text
            .segments(offset, length)
            .into_iter()
            .filter(|(_, leaf)| pred(&leaf.marks))
            .map(|(start, leaf)| (start, leaf.len()))
            .collect())
    }
}

fn check_range(key: &Key, offset: usize, length: usize, len: usize) -> EditorResult<()> {
    match offset.checked_add(length) {
        Some(end) if end <= len => Ok(()),
        end => Err(OperationError::OffsetOutOfRange {
            key: key.clone(),
            offset: end.unwrap_or(usize::MAX),
            len,
        }
        .into()),
    }
}
