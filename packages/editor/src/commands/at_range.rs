//! Commands over an explicit range.
//!
//! Ranges are resolved against the working document before use, so element
//! keys and out-of-bounds offsets are accepted. Commands that delete first
//! collapse to the start of the range afterwards.

use super::matches_properties;
use crate::change::Change;
use crate::errors::{EditorError, EditorResult};
use crate::normalize::has_void;
use crate::string;
use quire_model::{Document, Key, Mark, MarkSet, Node, NodeProperties, Path, Point, Selection};

impl Change {
    /// Remove everything inside the range, joining the blocks at its edges.
    pub fn delete_at_range(&mut self, range: &Selection) -> EditorResult<&mut Self> {
        self.run(|change| change.delete_range(range))
    }

    /// Delete `n` characters before a collapsed range.
    pub fn delete_backward_at_range(&mut self, range: &Selection, n: usize) -> EditorResult<&mut Self> {
        self.run(|change| change.delete_backward_range(range, n))
    }

    /// Delete `n` characters after a collapsed range.
    pub fn delete_forward_at_range(&mut self, range: &Selection, n: usize) -> EditorResult<&mut Self> {
        self.run(|change| change.delete_forward_range(range, n))
    }

    pub fn delete_char_backward_at_range(&mut self, range: &Selection) -> EditorResult<&mut Self> {
        self.run(|change| {
            let n = change.block_distance(range, |text, offset| string::char_offset_backward(text, offset))?;
            change.delete_backward_range(range, n)
        })
    }

    pub fn delete_char_forward_at_range(&mut self, range: &Selection) -> EditorResult<&mut Self> {
        self.run(|change| {
            let n = change.block_distance(range, |text, offset| string::char_offset_forward(text, offset))?;
            change.delete_forward_range(range, n)
        })
    }

    pub fn delete_word_backward_at_range(&mut self, range: &Selection) -> EditorResult<&mut Self> {
        self.run(|change| {
            let n = change.block_distance(range, |text, offset| string::word_offset_backward(text, offset))?;
            change.delete_backward_range(range, n)
        })
    }

    pub fn delete_word_forward_at_range(&mut self, range: &Selection) -> EditorResult<&mut Self> {
        self.run(|change| {
            let n = change.block_distance(range, |text, offset| string::word_offset_forward(text, offset))?;
            change.delete_forward_range(range, n)
        })
    }

    /// Delete from the start of the closest block up to the range.
    pub fn delete_line_backward_at_range(&mut self, range: &Selection) -> EditorResult<&mut Self> {
        self.run(|change| {
            let n = change.block_distance(range, |_, offset| offset)?;
            change.delete_backward_range(range, n)
        })
    }

    /// Delete from the range to the end of the closest block.
    pub fn delete_line_forward_at_range(&mut self, range: &Selection) -> EditorResult<&mut Self> {
        self.run(|change| {
            let n = change.block_distance(range, |text, offset| text.chars().count() - offset)?;
            change.delete_forward_range(range, n)
        })
    }

    /// Insert `text` at the start of the range, replacing its content.
    /// Without explicit marks the text takes the marks at the insertion
    /// point. Nothing happens inside a void node.
    pub fn insert_text_at_range(
        &mut self,
        range: &Selection,
        text: &str,
        marks: Option<MarkSet>,
    ) -> EditorResult<&mut Self> {
        self.run(|change| change.insert_text_range(range, text, marks))
    }

    /// Insert `block` next to the block at the range, splitting it when the
    /// range sits in the middle of its text.
    pub fn insert_block_at_range(&mut self, range: &Selection, block: Node) -> EditorResult<&mut Self> {
        self.run(|change| change.insert_block_range(range, block).map(|_| ()))
    }

    /// Insert `inline` at the range, splitting the text there.
    pub fn insert_inline_at_range(&mut self, range: &Selection, inline: Node) -> EditorResult<&mut Self> {
        self.run(|change| change.insert_inline_range(range, inline).map(|_| ()))
    }

    /// Split the block at the range, along with `height - 1` of its block
    /// ancestors.
    pub fn split_block_at_range(&mut self, range: &Selection, height: usize) -> EditorResult<&mut Self> {
        self.run(|change| change.split_range(range, height, Node::is_block))
    }

    /// Split up to `height` inlines around the range.
    pub fn split_inline_at_range(&mut self, range: &Selection, height: usize) -> EditorResult<&mut Self> {
        self.run(|change| change.split_range(range, height, Node::is_inline))
    }

    pub fn add_mark_at_range(&mut self, range: &Selection, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| change.mark_range(range, &mark, true))
    }

    pub fn remove_mark_at_range(&mut self, range: &Selection, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| change.mark_range(range, &mark, false))
    }

    /// Remove `mark` when every character in the range carries it, add it
    /// otherwise.
    pub fn toggle_mark_at_range(&mut self, range: &Selection, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| {
            let range = range.normalize(change.document());
            if range.is_collapsed() {
                return Ok(());
            }
            let active = change.document().active_marks_at_range(&range)?;
            change.mark_range(&range, &mark, !active.contains(&mark))
        })
    }

    /// Set `properties` on every leaf block touched by the range.
    pub fn set_blocks_at_range(&mut self, range: &Selection, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.run(|change| {
            let range = range.normalize(change.document());
            let keys = node_keys(change.document().leaf_blocks_at_range(&range)?);
            for key in keys {
                change.set_node_by_key(&key, properties.clone())?;
            }
            Ok(())
        })
    }

    /// Set `properties` on the closest inline of every text in the range.
    pub fn set_inlines_at_range(&mut self, range: &Selection, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.run(|change| {
            let range = range.normalize(change.document());
            let keys = node_keys(change.document().inlines_at_range(&range)?);
            for key in keys {
                change.set_node_by_key(&key, properties.clone())?;
            }
            Ok(())
        })
    }

    /// Wrap the blocks touched by the range in `block`.
    pub fn wrap_block_at_range(&mut self, range: &Selection, block: Node) -> EditorResult<&mut Self> {
        self.run(|change| change.wrap_block_range(range, block))
    }

    /// Lift the blocks touched by the range out of their closest ancestor
    /// block matching `properties`.
    pub fn unwrap_block_at_range(&mut self, range: &Selection, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.run(|change| change.unwrap_block_range(range, &properties))
    }

    /// Wrap the content of the range in `inline`, one copy per leaf block.
    pub fn wrap_inline_at_range(&mut self, range: &Selection, inline: Node) -> EditorResult<&mut Self> {
        self.run(|change| change.wrap_inline_range(range, inline).map(|_| ()))
    }

    /// Replace every inline matching `properties` around the range with its
    /// children.
    pub fn unwrap_inline_at_range(&mut self, range: &Selection, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.run(|change| change.unwrap_inline_range(range, &properties))
    }

    /// Surround the range with `prefix` and `suffix`.
    pub fn wrap_text_at_range(&mut self, range: &Selection, prefix: &str, suffix: &str) -> EditorResult<&mut Self> {
        self.run(|change| {
            let range = range.normalize(change.document());
            let start = range.collapse_to_start();
            let mut end = range.collapse_to_end();
            if start.anchor.key == end.anchor.key {
                end.anchor.offset += prefix.chars().count();
                end.focus = end.anchor.clone();
            }
            change.insert_text_range(&start, prefix, Some(MarkSet::new()))?;
            change.insert_text_range(&end, suffix, Some(MarkSet::new()))
        })
    }

    pub(crate) fn delete_range(&mut self, range: &Selection) -> EditorResult<()> {
        let range = range.normalize(self.document());
        let Some((mut start_key, mut start_offset, mut end_key, mut end_offset)) = bounds(&range) else {
            return Ok(());
        };
        if range.is_collapsed() {
            return Ok(());
        }

        let document = self.document().clone();
        let mut start_void = document.has_void_parent(&start_key)?;
        let mut end_void = document.has_void_parent(&end_key)?;
        let hanging = start_offset == 0
            && end_offset == 0
            && !start_void
            && is_first_text_of_block(&document, &start_key)?
            && is_first_text_of_block(&document, &end_key)?;

        // Voids at either edge go as a whole.
        while start_void {
            let document = self.document().clone();
            let void = void_of(&document, &start_key)?;
            let next = document.next_text(&start_key)?.map(|text| text.key().clone());
            self.remove_node_by_key(&void)?;
            if start_key == end_key {
                return Ok(());
            }
            let Some(next) = next else {
                return Ok(());
            };
            start_key = next;
            start_offset = 0;
            start_void = self.document().has_void_parent(&start_key)?;
        }
        while end_void {
            let document = self.document().clone();
            let void = void_of(&document, &end_key)?;
            let previous = document
                .previous_text(&end_key)?
                .map(|text| (text.key().clone(), text.len()));
            self.remove_node_by_key(&void)?;
            if start_key == end_key {
                return Ok(());
            }
            let Some((previous, len)) = previous else {
                return Ok(());
            };
            end_key = previous;
            end_offset = len;
            end_void = self.document().has_void_parent(&end_key)?;
        }

        if start_key == end_key {
            self.remove_text_by_key(&start_key, start_offset, end_offset.saturating_sub(start_offset))?;
            return Ok(());
        }

        let document = self.document().clone();
        let start_block = block_of(&document, &start_key)?.key().clone();
        let end_block = block_of(&document, &end_key)?.key().clone();
        let start_length = document.text_node(&start_key)?.len().saturating_sub(start_offset);

        let start_path = document.path_of(&start_key)?;
        let end_path = document.path_of(&end_key)?;
        let ancestor = document.common_ancestor(&start_key, &end_key)?;
        let depth = ancestor.len();
        let start_child = start_path.as_slice()[depth];
        let end_child = end_path.as_slice()[depth];

        let mut removals = Vec::new();
        let mut child = start_path.clone();
        while child.len() > depth + 1 {
            let (parent, index) = split_last(&child);
            let siblings = document.children_at(&parent)?;
            removals.extend(siblings[index + 1..].iter().rev().map(|node| node.key().clone()));
            child = parent;
        }
        let siblings = document.children_at(&ancestor)?;
        if end_child > start_child + 1 {
            removals.extend(
                siblings[start_child + 1..end_child]
                    .iter()
                    .rev()
                    .map(|node| node.key().clone()),
            );
        }
        let mut child = end_path.clone();
        while child.len() > depth + 1 {
            let (parent, index) = split_last(&child);
            let siblings = document.children_at(&parent)?;
            removals.extend(siblings[..index].iter().rev().map(|node| node.key().clone()));
            child = parent;
        }
        for key in &removals {
            self.remove_node_by_key(key)?;
        }

        if start_length > 0 {
            self.remove_text_by_key(&start_key, start_offset, start_length)?;
        }
        if end_offset > 0 {
            self.remove_text_by_key(&end_key, 0, end_offset)?;
        }

        if start_block != end_block {
            let (start_parent, start_index) = self.parent_and_index(&start_block)?;
            let (end_parent, end_index) = self.parent_and_index(&end_block)?;
            let lonely = furthest_only_child(self.document(), &end_block)?;
            if end_parent != start_parent || end_index != start_index + 1 {
                self.move_node_by_key(&end_block, &start_parent, start_index + 1)?;
            }
            if hanging {
                self.remove_node_by_key(&start_block)?;
            } else {
                self.merge_node_by_key(&end_block)?;
            }
            if let Some(lonely) = lonely {
                self.remove_node_by_key(&lonely)?;
            }
        }
        Ok(())
    }

    pub(crate) fn delete_backward_range(&mut self, range: &Selection, n: usize) -> EditorResult<()> {
        if n == 0 {
            return Ok(());
        }
        let range = range.normalize(self.document());
        if range.is_expanded() {
            return self.delete_range(&range);
        }
        let Some(key) = range.start().key.clone() else {
            return Ok(());
        };
        let offset = range.start().offset;
        let document = self.document().clone();
        let block = block_of(&document, &key)?;

        if block.is_void() {
            self.remove_node_by_key(block.key())?;
            return Ok(());
        }
        let previous = document.previous_text(&key)?;
        if offset == 0 && previous.is_none() {
            return Ok(());
        }
        if is_empty_block(block) && document.nodes().len() > 1 {
            self.remove_node_by_key(block.key())?;
            return Ok(());
        }
        if let Some(inline) = document.closest_inline(&key)? {
            if inline.is_void() {
                self.remove_node_by_key(inline.key())?;
                return Ok(());
            }
        }

        if offset == 0 {
            if let Some(previous) = previous {
                let previous_block = block_of(&document, previous.key())?;
                if previous_block.is_void() {
                    self.remove_node_by_key(previous_block.key())?;
                    return Ok(());
                }
                if let Some(inline) = document.closest_inline(previous.key())? {
                    if inline.is_void() {
                        self.remove_node_by_key(inline.key())?;
                        return Ok(());
                    }
                }
                if n == 1 && previous_block.key() != block.key() {
                    let range = Selection::new(
                        Point::new(previous.key().clone(), previous.len()),
                        Point::new(key, offset),
                    );
                    return self.delete_range(&range);
                }
            }
        }

        if n <= offset {
            let range = Selection::new(Point::new(key.clone(), offset - n), Point::new(key, offset));
            return self.delete_range(&range);
        }

        let mut node = document.text_node(&key)?;
        let mut traversed = offset;
        let mut target = loop {
            let Some(previous) = document.previous_text(node.key())? else {
                break 0;
            };
            node = previous;
            let reach = traversed + node.len();
            if n <= reach {
                break reach - n;
            }
            traversed = reach;
        };
        let mut target_key = node.key().clone();
        if document.has_void_parent(&target_key)? {
            let void = void_of(&document, &target_key)?;
            match document.next_text(&void)? {
                Some(next) => {
                    target_key = next.key().clone();
                    target = 0;
                }
                None => return Ok(()),
            }
        }
        self.delete_range(&Selection::new(Point::new(target_key, target), Point::new(key, offset)))
    }

    pub(crate) fn delete_forward_range(&mut self, range: &Selection, n: usize) -> EditorResult<()> {
        if n == 0 {
            return Ok(());
        }
        let range = range.normalize(self.document());
        if range.is_expanded() {
            return self.delete_range(&range);
        }
        let Some(key) = range.start().key.clone() else {
            return Ok(());
        };
        let offset = range.start().offset;
        let document = self.document().clone();
        let block = block_of(&document, &key)?;
        let text = document.text_node(&key)?;

        if block.is_void() {
            self.remove_node_by_key(block.key())?;
            return Ok(());
        }
        let next = document.next_text(&key)?;
        if offset == text.len() && next.is_none() {
            return Ok(());
        }
        if is_empty_block(block) && document.nodes().len() > 1 {
            let next_block = document.next_block(block.key())?.map(|node| node.key().clone());
            self.remove_node_by_key(block.key())?;
            if let Some(next_block) = next_block {
                let selection = self.selection().collapse_to_start_of(self.document().node(&next_block)?);
                self.set_selection(selection)?;
            }
            return Ok(());
        }
        if let Some(inline) = document.closest_inline(&key)? {
            if inline.is_void() {
                self.remove_node_by_key(inline.key())?;
                return Ok(());
            }
        }

        if offset == text.len() {
            if let Some(next) = next {
                let next_block = block_of(&document, next.key())?;
                if next_block.is_void() {
                    self.remove_node_by_key(next_block.key())?;
                    return Ok(());
                }
                if let Some(inline) = document.closest_inline(next.key())? {
                    if inline.is_void() {
                        self.remove_node_by_key(inline.key())?;
                        return Ok(());
                    }
                }
                if n == 1 && next_block.key() != block.key() {
                    let range = Selection::new(Point::new(key, offset), Point::new(next.key().clone(), 0));
                    return self.delete_range(&range);
                }
            }
        }

        if n <= text.len() - offset {
            let range = Selection::new(Point::new(key.clone(), offset), Point::new(key, offset + n));
            return self.delete_range(&range);
        }

        let mut node = text;
        let mut traversed = text.len() - offset;
        let mut target = loop {
            let Some(next) = document.next_text(node.key())? else {
                break node.len();
            };
            node = next;
            let reach = traversed + node.len();
            if n <= reach {
                break n - traversed;
            }
            traversed = reach;
        };
        let mut target_key = node.key().clone();
        if document.has_void_parent(&target_key)? {
            let void = void_of(&document, &target_key)?;
            match document.previous_text(&void)? {
                Some(previous) => {
                    target_key = previous.key().clone();
                    target = previous.len();
                }
                None => return Ok(()),
            }
        }
        self.delete_range(&Selection::new(Point::new(key, offset), Point::new(target_key, target)))
    }

    pub(crate) fn insert_text_range(
        &mut self,
        range: &Selection,
        text: &str,
        marks: Option<MarkSet>,
    ) -> EditorResult<()> {
        let range = range.normalize(self.document());
        let Some(mut key) = range.start().key.clone() else {
            return Ok(());
        };
        let mut offset = range.start().offset;
        if self.document().has_void_parent(&key)? {
            return Ok(());
        }
        if range.is_expanded() {
            self.delete_range(&range)?;
            if !self.document().has_key(&key) {
                let start = self.selection().start().clone();
                let Some(start_key) = start.key else {
                    return Ok(());
                };
                key = start_key;
                offset = start.offset;
            }
        }
        self.insert_text_by_key(&key, offset, text, marks)?;
        Ok(())
    }

    /// Returns the key of the inserted block.
    pub(crate) fn insert_block_range(&mut self, range: &Selection, block: Node) -> EditorResult<Option<Key>> {
        if !block.is_block() {
            return Err(EditorError::invalid_command("insert_block needs a block"));
        }
        let Some((key, offset)) = self.collapse_range(range)? else {
            return Ok(None);
        };
        let document = self.document().clone();
        let start_block = block_of(&document, &key)?;
        let (parent, index) = self.parent_and_index(start_block.key())?;
        let cursor = Selection::collapsed(key.clone(), offset);

        let block = self.fill_empty(block);
        let block = self.adopt(block);
        let inserted = block.key().clone();
        if start_block.is_void() {
            let extra = usize::from(cursor.is_at_end_of(start_block));
            self.insert_node_by_key(&parent, index + extra, block)?;
        } else if start_block.text_len() == 0 {
            self.insert_node_by_key(&parent, index + 1, block)?;
        } else if cursor.is_at_start_of(start_block) {
            self.insert_node_by_key(&parent, index, block)?;
        } else if cursor.is_at_end_of(start_block) {
            self.insert_node_by_key(&parent, index + 1, block)?;
        } else {
            self.split_descendants(start_block.key(), &key, offset)?;
            self.insert_node_by_key(&parent, index + 1, block)?;
        }
        Ok(Some(inserted))
    }

    /// Returns the key of the inserted inline.
    pub(crate) fn insert_inline_range(&mut self, range: &Selection, inline: Node) -> EditorResult<Option<Key>> {
        if !inline.is_inline() {
            return Err(EditorError::invalid_command("insert_inline needs an inline"));
        }
        let Some((key, offset)) = self.collapse_range(range)? else {
            return Ok(None);
        };
        if self.document().has_void_parent(&key)? {
            return Ok(None);
        }
        let (parent, index) = self.parent_and_index(&key)?;
        let inline = self.fill_empty(inline);
        let inline = self.adopt(inline);
        let inserted = inline.key().clone();
        self.split_node(&key, offset)?;
        self.insert_node_by_key(&parent, index + 1, inline)?;
        Ok(Some(inserted))
    }

    fn split_range<F>(&mut self, range: &Selection, height: usize, kind: F) -> EditorResult<()>
    where
        F: Fn(&Node) -> bool,
    {
        let Some((key, offset)) = self.collapse_range(range)? else {
            return Ok(());
        };
        let document = self.document().clone();
        let mut node = key.clone();
        for _ in 0..height {
            match document.closest(&node, &kind)? {
                Some(parent) => node = parent.key().clone(),
                None => break,
            }
        }
        self.split_descendants(&node, &key, offset)?;
        Ok(())
    }

    fn mark_range(&mut self, range: &Selection, mark: &Mark, add: bool) -> EditorResult<()> {
        let range = range.normalize(self.document());
        let Some((start_key, start_offset, end_key, end_offset)) = bounds(&range) else {
            return Ok(());
        };
        if range.is_collapsed() {
            return Ok(());
        }
        let texts: Vec<(Key, usize)> = self
            .document()
            .texts_at_range(&range)?
            .into_iter()
            .map(|text| (text.key().clone(), text.len()))
            .collect();
        for (key, len) in texts {
            let from = if key == start_key { start_offset } else { 0 };
            let to = if key == end_key { end_offset } else { len };
            if to <= from {
                continue;
            }
            if add {
                self.add_mark_by_key(&key, from, to - from, mark.clone())?;
            } else {
                self.remove_mark_by_key(&key, from, to - from, mark.clone())?;
            }
        }
        Ok(())
    }

    fn wrap_block_range(&mut self, range: &Selection, block: Node) -> EditorResult<()> {
        if !block.is_block() {
            return Err(EditorError::invalid_command("wrap_block needs a block"));
        }
        let range = range.normalize(self.document());
        let document = self.document().clone();
        let blocks = document.leaf_blocks_at_range(&range)?;
        let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
            return Ok(());
        };

        let (parent, siblings) = if blocks.len() == 1 {
            let (parent, _) = self.parent_and_index(first.key())?;
            (parent, vec![first.key().clone()])
        } else {
            let ancestor = document.common_ancestor(first.key(), last.key())?;
            let depth = ancestor.len();
            let from = document.path_of(first.key())?.as_slice()[depth];
            let to = document.path_of(last.key())?.as_slice()[depth];
            let parent = if ancestor.is_root() {
                document.key().clone()
            } else {
                document.node_at(&ancestor)?.key().clone()
            };
            let siblings = node_keys(document.children_at(&ancestor)?[from..=to].iter().map(|n| n.as_ref()));
            (parent, siblings)
        };
        let Some(first_sibling) = siblings.first() else {
            return Ok(());
        };
        let (_, index) = self.parent_and_index(first_sibling)?;

        let wrapper = self.adopt(block.with_nodes(Vec::new()));
        let wrapper_key = wrapper.key().clone();
        self.insert_node_by_key(&parent, index, wrapper)?;
        for (i, sibling) in siblings.iter().enumerate() {
            self.move_node_by_key(sibling, &wrapper_key, i)?;
        }
        Ok(())
    }

    fn unwrap_block_range(&mut self, range: &Selection, properties: &NodeProperties) -> EditorResult<()> {
        let range = range.normalize(self.document());
        let document = self.document().clone();
        let blocks = node_keys(document.leaf_blocks_at_range(&range)?);
        let mut wrappers: Vec<Key> = Vec::new();
        for block in &blocks {
            let wrapper = document.closest(block, |node| node.is_block() && matches_properties(node, properties))?;
            if let Some(wrapper) = wrapper {
                if !wrappers.contains(wrapper.key()) {
                    wrappers.push(wrapper.key().clone());
                }
            }
        }

        for wrapper in wrappers {
            let document = self.document().clone();
            let node = document.node(&wrapper)?;
            let children = node_keys(node.nodes().iter().map(|n| n.as_ref()));
            let matched: Vec<usize> = node
                .nodes()
                .iter()
                .enumerate()
                .filter(|(_, child)| blocks.iter().any(|b| child.key() == b || child.has_key(b)))
                .map(|(i, _)| i)
                .collect();
            let (Some(&first_match), Some(&last_match)) = (matched.first(), matched.last()) else {
                continue;
            };
            let (parent, index) = self.parent_and_index(&wrapper)?;
            let last = children.len() - 1;

            if first_match == 0 && last_match == last {
                for (i, child) in children.iter().enumerate() {
                    self.move_node_by_key(child, &parent, index + i)?;
                }
                self.remove_node_by_key(&wrapper)?;
            } else if last_match == last {
                for (i, child) in children[first_match..].iter().enumerate() {
                    self.move_node_by_key(child, &parent, index + 1 + i)?;
                }
            } else if first_match == 0 {
                for (i, child) in children[..=last_match].iter().enumerate() {
                    self.move_node_by_key(child, &parent, index + i)?;
                }
            } else {
                self.split_node(&wrapper, first_match)?;
                for (i, child) in children[first_match..=last_match].iter().enumerate() {
                    self.move_node_by_key(child, &parent, index + 1 + i)?;
                }
            }
        }
        Ok(())
    }

    /// Returns the keys of the inserted wrappers.
    pub(crate) fn wrap_inline_range(&mut self, range: &Selection, inline: Node) -> EditorResult<Vec<Key>> {
        if !inline.is_inline() {
            return Err(EditorError::invalid_command("wrap_inline needs an inline"));
        }
        let range = range.normalize(self.document());
        let Some((start_key, start_offset, end_key, end_offset)) = bounds(&range) else {
            return Ok(Vec::new());
        };
        if range.is_collapsed() {
            let void = self
                .document()
                .closest_inline(&start_key)?
                .filter(|node| node.is_void())
                .map(|node| node.key().clone());
            if let Some(void) = void {
                let wrapper = self.adopt(inline);
                let key = wrapper.key().clone();
                self.wrap_inline_by_key(&void, wrapper)?;
                return Ok(vec![key]);
            }
            return Ok(Vec::new());
        }

        let blocks = node_keys(self.document().leaf_blocks_at_range(&range)?);
        let mut wrappers = Vec::new();
        for block in blocks {
            let document = self.document().clone();
            let node = document.node(&block)?;
            let (Some(first_text), Some(last_text)) = (node.first_text(), node.last_text()) else {
                continue;
            };
            let (from_key, from) = if node.has_key(&start_key) {
                (start_key.clone(), start_offset)
            } else {
                (first_text.key().clone(), 0)
            };
            let (to_key, to) = if node.has_key(&end_key) {
                (end_key.clone(), end_offset)
            } else {
                (last_text.key().clone(), last_text.len())
            };

            let end_child = child_containing(&document, &block, &to_key)?;
            self.split_descendants(&end_child, &to_key, to)?;
            let mut last = end_child.clone();

            let start_child = child_containing(self.document(), &block, &from_key)?;
            let first = self.split_descendants(&start_child, &from_key, from)?;
            if start_child == last {
                last = first.clone();
            }

            let (_, first_index) = self.parent_and_index(&first)?;
            let (_, last_index) = self.parent_and_index(&last)?;
            let children = node_keys(
                self.document().node(&block)?.nodes()[first_index..=last_index]
                    .iter()
                    .map(|n| n.as_ref()),
            );

            let wrapper = inline.with_nodes(Vec::new());
            let wrapper = if wrappers.is_empty() {
                self.adopt(wrapper)
            } else {
                wrapper.regenerate_keys(self.key_generator_mut())
            };
            let wrapper_key = wrapper.key().clone();
            self.insert_node_by_key(&block, first_index, wrapper)?;
            for (i, child) in children.iter().enumerate() {
                self.move_node_by_key(child, &wrapper_key, i)?;
            }
            wrappers.push(wrapper_key);
        }
        Ok(wrappers)
    }

    fn unwrap_inline_range(&mut self, range: &Selection, properties: &NodeProperties) -> EditorResult<()> {
        let range = range.normalize(self.document());
        let document = self.document().clone();
        let mut inlines: Vec<Key> = Vec::new();
        for text in document.texts_at_range(&range)? {
            let inline = document.closest(text.key(), |node| node.is_inline() && matches_properties(node, properties))?;
            if let Some(inline) = inline {
                if !inlines.contains(inline.key()) {
                    inlines.push(inline.key().clone());
                }
            }
        }
        for inline in inlines {
            let (parent, index) = self.parent_and_index(&inline)?;
            let children = node_keys(self.document().node(&inline)?.nodes().iter().map(|n| n.as_ref()));
            for (i, child) in children.iter().enumerate() {
                self.move_node_by_key(child, &parent, index + i)?;
            }
            self.remove_node_by_key(&inline)?;
        }
        Ok(())
    }

    /// Delete an expanded range and return the point where it started.
    fn collapse_range(&mut self, range: &Selection) -> EditorResult<Option<(Key, usize)>> {
        let range = range.normalize(self.document());
        let Some(key) = range.start().key.clone() else {
            return Ok(None);
        };
        let offset = range.start().offset;
        if range.is_collapsed() {
            return Ok(Some((key, offset)));
        }
        self.delete_range(&range)?;
        if self.document().has_key(&key) {
            return Ok(Some((key, offset)));
        }
        let start = self.selection().start().clone();
        Ok(start.key.map(|key| (key, start.offset)))
    }

    /// Distance computed by `measure` over the closest block's text, from
    /// the start of the range. At a block edge the distance is one, so the
    /// block joins its neighbour.
    fn block_distance<F>(&self, range: &Selection, measure: F) -> EditorResult<usize>
    where
        F: Fn(&str, usize) -> usize,
    {
        let range = range.normalize(self.document());
        let Some(key) = &range.start().key else {
            return Ok(0);
        };
        let document = self.document();
        let block = block_of(document, key)?;
        let block_path = document.path_of(block.key())?;
        let offset = document.offset_of(key, &block_path)? + range.start().offset;
        Ok(measure(&block.text_content(), offset).max(1))
    }
}

fn bounds(range: &Selection) -> Option<(Key, usize, Key, usize)> {
    let start = range.start();
    let end = range.end();
    Some((start.key.clone()?, start.offset, end.key.clone()?, end.offset))
}

fn node_keys<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Vec<Key> {
    nodes.into_iter().map(|node| node.key().clone()).collect()
}

fn block_of<'a>(document: &'a Document, key: &Key) -> EditorResult<&'a Node> {
    document
        .closest_block(key)?
        .ok_or_else(|| EditorError::invalid_command(format!("`{key}` is not inside a block")))
}

fn void_of(document: &Document, key: &Key) -> EditorResult<Key> {
    document
        .closest_void(key)?
        .map(|node| node.key().clone())
        .ok_or_else(|| EditorError::invalid_command(format!("`{key}` is not inside a void")))
}

/// No text and no void inline left to delete.
fn is_empty_block(block: &Node) -> bool {
    block.text_len() == 0 && !has_void(block)
}

fn is_first_text_of_block(document: &Document, key: &Key) -> EditorResult<bool> {
    Ok(block_of(document, key)?
        .first_text()
        .is_some_and(|text| text.key() == key))
}

/// The direct child of `ancestor` holding `key`.
fn child_containing(document: &Document, ancestor: &Key, key: &Key) -> EditorResult<Key> {
    let depth = document.path_of(ancestor)?.len();
    let path = document.path_of(key)?;
    let child = Path::new(path.as_slice()[..=depth].to_vec());
    Ok(document.node_at(&child)?.key().clone())
}

/// Highest ancestor of `key` reached through a chain of only children.
fn furthest_only_child(document: &Document, key: &Key) -> EditorResult<Option<Key>> {
    Ok(document
        .ancestors(key)?
        .into_iter()
        .rev()
        .take_while(|node| node.nodes().len() == 1)
        .last()
        .map(|node| node.key().clone()))
}

fn split_last(path: &Path) -> (Path, usize) {
    (path.parent().unwrap_or_default(), path.last().unwrap_or_default())
}
