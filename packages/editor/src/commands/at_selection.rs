//! Commands at the current selection. Each delegates to its range
//! counterpart and then puts the cursor where an editor user expects it.

use crate::change::Change;
use crate::errors::EditorResult;
use quire_model::{Mark, MarkSet, Node, NodeProperties, Point, Selection, SelectionProperties};

impl Change {
    /// Delete the selected content and collapse to its start.
    pub fn delete(&mut self) -> EditorResult<&mut Self> {
        self.run(|change| change.delete_selection())
    }

    pub fn delete_backward(&mut self, n: usize) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_backward_at_range(selection, n)?;
            Ok(())
        })
    }

    pub fn delete_forward(&mut self, n: usize) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_forward_at_range(selection, n)?;
            Ok(())
        })
    }

    pub fn delete_char_backward(&mut self) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_char_backward_at_range(selection)?;
            Ok(())
        })
    }

    pub fn delete_char_forward(&mut self) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_char_forward_at_range(selection)?;
            Ok(())
        })
    }

    pub fn delete_word_backward(&mut self) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_word_backward_at_range(selection)?;
            Ok(())
        })
    }

    pub fn delete_word_forward(&mut self) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_word_forward_at_range(selection)?;
            Ok(())
        })
    }

    pub fn delete_line_backward(&mut self) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_line_backward_at_range(selection)?;
            Ok(())
        })
    }

    pub fn delete_line_forward(&mut self) -> EditorResult<&mut Self> {
        self.at_selection(|change, selection| {
            change.delete_line_forward_at_range(selection)?;
            Ok(())
        })
    }

    /// Type `text` at the cursor, replacing any selected content.
    ///
    /// Marks come from `marks`, then from the selection's pending marks,
    /// then from the characters around the cursor. Pending marks are
    /// cleared once they have been used.
    pub fn insert_text(&mut self, text: &str, marks: Option<MarkSet>) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            if selection.is_unset() {
                return Ok(());
            }
            let marks = match marks.or_else(|| selection.marks.clone()) {
                Some(marks) => marks,
                None => change.document().insert_marks_at_range(&selection)?,
            };
            let before = change.document().clone();
            change.insert_text_range(&selection, text, Some(marks))?;
            if selection.marks.is_some() && *change.document() != before {
                let next = change.selection().merge(&SelectionProperties::with_marks(None));
                change.set_selection(next)?;
            }
            Ok(())
        })
    }

    /// Insert `block` at the cursor and move into it.
    pub fn insert_block(&mut self, block: Node) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            if let Some(key) = change.insert_block_range(&selection, block)? {
                change.collapse_to_end_of(&key)?;
            }
            Ok(())
        })
    }

    /// Insert `inline` at the cursor and move to its end.
    pub fn insert_inline(&mut self, inline: Node) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            if let Some(key) = change.insert_inline_range(&selection, inline)? {
                change.collapse_to_end_of(&key)?;
            }
            Ok(())
        })
    }

    /// Split the block at the cursor, `depth` levels deep, and leave the
    /// cursor at the start of the new block.
    pub fn split_block(&mut self, depth: usize) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            change.split_block_at_range(&selection, depth)?;
            change.collapse_to_end()?;
            Ok(())
        })
    }

    pub fn split_inline(&mut self, height: usize) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            change.split_inline_at_range(&selection, height)?;
            Ok(())
        })
    }

    /// Add `mark` to the selection. With a collapsed selection the mark is
    /// queued for the next inserted text instead.
    pub fn add_mark(&mut self, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            if selection.is_expanded() {
                change.add_mark_at_range(&selection, mark)?;
                return Ok(());
            }
            let marks = change.pending_marks()?.with(&mark);
            change.set_pending_marks(marks)
        })
    }

    pub fn remove_mark(&mut self, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            if selection.is_expanded() {
                change.remove_mark_at_range(&selection, mark)?;
                return Ok(());
            }
            let marks = change.pending_marks()?.without(&mark);
            change.set_pending_marks(marks)
        })
    }

    pub fn toggle_mark(&mut self, mark: Mark) -> EditorResult<&mut Self> {
        self.run(|change| {
            if change.pending_marks()?.contains(&mark) {
                change.remove_mark(mark)?;
            } else {
                change.add_mark(mark)?;
            }
            Ok(())
        })
    }

    pub fn set_blocks(&mut self, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.with_selection(|change, selection| {
            change.set_blocks_at_range(selection, properties)?;
            Ok(())
        })
    }

    pub fn set_inlines(&mut self, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.with_selection(|change, selection| {
            change.set_inlines_at_range(selection, properties)?;
            Ok(())
        })
    }

    pub fn wrap_block(&mut self, block: Node) -> EditorResult<&mut Self> {
        self.with_selection(|change, selection| {
            change.wrap_block_at_range(selection, block)?;
            Ok(())
        })
    }

    pub fn unwrap_block(&mut self, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.with_selection(|change, selection| {
            change.unwrap_block_at_range(selection, properties)?;
            Ok(())
        })
    }

    /// Wrap the selected content in `inline` and select the wrapped content.
    pub fn wrap_inline(&mut self, inline: Node) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            let wrappers = change.wrap_inline_range(&selection, inline)?;
            if selection.is_collapsed() {
                return Ok(());
            }
            let (Some(first), Some(last)) = (wrappers.first(), wrappers.last()) else {
                return Ok(());
            };
            let document = change.document();
            let start = document.node(first)?.first_text().map(|t| Point::new(t.key().clone(), 0));
            let end = document.node(last)?.last_text().map(|t| Point::new(t.key().clone(), t.len()));
            if let (Some(start), Some(end)) = (start, end) {
                let next = Selection {
                    anchor: start,
                    focus: end,
                    ..change.selection().clone()
                };
                change.set_selection(next)?;
            }
            Ok(())
        })
    }

    pub fn unwrap_inline(&mut self, properties: NodeProperties) -> EditorResult<&mut Self> {
        self.with_selection(|change, selection| {
            change.unwrap_inline_at_range(selection, properties)?;
            Ok(())
        })
    }

    /// Surround the selection with `prefix` and `suffix`, keeping the
    /// original content selected.
    pub fn wrap_text(&mut self, prefix: &str, suffix: &str) -> EditorResult<&mut Self> {
        self.run(|change| {
            let selection = change.selection().clone();
            let (Some(start_key), Some(end_key)) = (selection.start().key.clone(), selection.end().key.clone())
            else {
                return Ok(());
            };
            let shift = prefix.chars().count();
            let start = Point::new(start_key.clone(), selection.start().offset + shift);
            let end_shift = if start_key == end_key { shift } else { 0 };
            let end = Point::new(end_key, selection.end().offset + end_shift);

            change.wrap_text_at_range(&selection, prefix, suffix)?;
            let (anchor, focus) = if selection.is_backward { (end, start) } else { (start, end) };
            let next = Selection {
                anchor,
                focus,
                ..change.selection().clone()
            };
            change.set_selection(next)
        })
    }

    /// Marks the next inserted text would carry.
    fn pending_marks(&self) -> EditorResult<MarkSet> {
        match &self.selection().marks {
            Some(marks) => Ok(marks.clone()),
            None => Ok(self.document().active_marks_at_range(self.selection())?),
        }
    }

    fn set_pending_marks(&mut self, marks: MarkSet) -> EditorResult<()> {
        let next = self.selection().merge(&SelectionProperties::with_marks(Some(marks)));
        self.set_selection(next)
    }

    fn delete_selection(&mut self) -> EditorResult<()> {
        let selection = self.selection().clone();
        if selection.is_collapsed() {
            return Ok(());
        }
        self.delete_range(&selection)?;
        let next = self.selection().collapse_to_start();
        self.set_selection(next)
    }

    /// Run `f` on a collapsed selection; an expanded one is deleted instead.
    fn at_selection<F>(&mut self, f: F) -> EditorResult<&mut Self>
    where
        F: FnOnce(&mut Change, &Selection) -> EditorResult<()>,
    {
        self.run(|change| {
            let selection = change.selection().clone();
            if selection.is_expanded() {
                return change.delete_selection();
            }
            f(change, &selection)
        })
    }

    fn with_selection<F>(&mut self, f: F) -> EditorResult<&mut Self>
    where
        F: FnOnce(&mut Change, &Selection) -> EditorResult<()>,
    {
        self.run(|change| {
            let selection = change.selection().clone();
            f(change, &selection)
        })
    }
}
