//! Commands that move the selection or touch value-level state. Each one
//! records a `set_selection` or `set_value` operation, or nothing when the
//! state is already as requested.

use crate::change::Change;
use crate::errors::EditorResult;
use crate::operation::{Operation, ValueProperties};
use quire_model::{Data, Key, Selection};

impl Change {
    /// Replace the selection.
    pub fn select(&mut self, selection: Selection) -> EditorResult<&mut Self> {
        self.run(|change| change.set_selection(selection))
    }

    pub fn collapse_to_start(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| Ok(change.selection().collapse_to_start()))
    }

    pub fn collapse_to_end(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| Ok(change.selection().collapse_to_end()))
    }

    pub fn collapse_to_anchor(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| Ok(change.selection().collapse_to_anchor()))
    }

    pub fn collapse_to_focus(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| Ok(change.selection().collapse_to_focus()))
    }

    /// Collapse onto `offset` in the node `key`. Element keys resolve to the
    /// text holding that character offset.
    pub fn collapse_to(&mut self, key: &Key, offset: usize) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            change.document().node(key)?;
            Ok(change.selection().collapse_to(key.clone(), offset))
        })
    }

    pub fn collapse_to_start_of(&mut self, key: &Key) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            let node = change.document().node(key)?;
            Ok(change.selection().collapse_to_start_of(node))
        })
    }

    pub fn collapse_to_end_of(&mut self, key: &Key) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            let node = change.document().node(key)?;
            Ok(change.selection().collapse_to_end_of(node))
        })
    }

    /// Collapse onto the start of the text after the focus.
    pub fn move_to_start_of_next_text(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| Ok(change.selection().move_to_start_of_next_text(change.document())?))
    }

    /// Select the whole content of the node `key`.
    pub fn move_to_range_of(&mut self, key: &Key) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            let node = change.document().node(key)?;
            Ok(change.selection().move_to_range_of(node))
        })
    }

    pub fn select_all(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            let document = change.document();
            let (Some(first), Some(last)) = (document.first_text(), document.last_text()) else {
                return Ok(change.selection().clone());
            };
            let mut selection = change.selection().collapse_to(first.key().clone(), 0);
            selection.focus.key = Some(last.key().clone());
            selection.focus.offset = last.len();
            Ok(selection)
        })
    }

    /// Unset both points.
    pub fn deselect(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            let current = change.selection();
            Ok(Selection {
                is_focused: false,
                marks: current.marks.clone(),
                ..Selection::default()
            })
        })
    }

    pub fn focus(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            let mut selection = change.selection().clone();
            selection.is_focused = true;
            Ok(selection)
        })
    }

    pub fn blur(&mut self) -> EditorResult<&mut Self> {
        self.update_selection(|change| {
            let mut selection = change.selection().clone();
            selection.is_focused = false;
            Ok(selection)
        })
    }

    /// Move both points `n` characters forward.
    pub fn move_forward(&mut self, n: usize) -> EditorResult<&mut Self> {
        self.update_selection(|change| Ok(change.selection().move_forward(change.document(), n)?))
    }

    pub fn move_backward(&mut self, n: usize) -> EditorResult<&mut Self> {
        self.update_selection(|change| Ok(change.selection().move_backward(change.document(), n)?))
    }

    /// Replace the value's free-form data.
    pub fn set_data(&mut self, data: Data) -> EditorResult<&mut Self> {
        self.run(|change| {
            let current = change.value().data.clone();
            if current == data {
                return Ok(());
            }
            change.push(Operation::SetValue {
                properties: ValueProperties { data: Some(data) },
                old_properties: ValueProperties { data: Some(current) },
            })
        })
    }

    /// Record a `set_selection` moving to `next`, resolved against the
    /// working document. Nothing is recorded when nothing changes.
    pub(crate) fn set_selection(&mut self, next: Selection) -> EditorResult<()> {
        let next = next.normalize(self.document());
        let current = self.selection().clone();
        let properties = current.diff(&next);
        if properties.is_empty() {
            return Ok(());
        }
        let old_properties = next.diff(&current);
        self.push(Operation::SetSelection {
            properties,
            old_properties,
        })
    }

    fn update_selection<F>(&mut self, f: F) -> EditorResult<&mut Self>
    where
        F: FnOnce(&Change) -> EditorResult<Selection>,
    {
        self.run(|change| {
            let next = f(change)?;
            change.set_selection(next)
        })
    }
}
