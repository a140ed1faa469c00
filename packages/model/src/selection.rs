use crate::{Document, Key, MarkSet, ModelResult, Node};
use serde::{Deserialize, Deserializer, Serialize};

/// A character position inside a text node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    #[serde(default)]
    pub key: Option<Key>,

    #[serde(default)]
    pub offset: usize,
}

impl Point {
    pub fn new(key: Key, offset: usize) -> Self {
        Self {
            key: Some(key),
            offset,
        }
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.key.is_some()
    }

    pub fn is_at(&self, key: &Key, offset: usize) -> bool {
        self.key.as_ref() == Some(key) && self.offset == offset
    }
}

/// Anchor and focus points plus focus state and pending marks.
///
/// `is_backward` is derived from the document and recomputed by
/// [`Selection::normalize`]; operations keep it current.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,

    #[serde(default)]
    pub is_backward: bool,

    #[serde(default)]
    pub is_focused: bool,

    /// Marks the next inserted text will carry, overriding the marks found
    /// at the cursor.
    #[serde(default)]
    pub marks: Option<MarkSet>,
}

fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Partial selection update. `marks: Some(None)` clears pending marks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Point>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<Point>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_focused: Option<bool>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_some"
    )]
    pub marks: Option<Option<MarkSet>>,
}

impl SelectionProperties {
    pub fn is_empty(&self) -> bool {
        self.anchor.is_none() && self.focus.is_none() && self.is_focused.is_none() && self.marks.is_none()
    }

    pub fn with_marks(marks: Option<MarkSet>) -> Self {
        Self {
            marks: Some(marks),
            ..Self::default()
        }
    }
}

impl Selection {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self {
            anchor,
            focus,
            ..Self::default()
        }
    }

    pub fn collapsed(key: Key, offset: usize) -> Self {
        let point = Point::new(key, offset);
        Self::new(point.clone(), point)
    }

    pub fn is_set(&self) -> bool {
        self.anchor.is_set() && self.focus.is_set()
    }

    pub fn is_unset(&self) -> bool {
        !self.is_set()
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_forward(&self) -> bool {
        !self.is_backward
    }

    pub fn start(&self) -> &Point {
        if self.is_backward {
            &self.focus
        } else {
            &self.anchor
        }
    }

    pub fn end(&self) -> &Point {
        if self.is_backward {
            &self.anchor
        } else {
            &self.focus
        }
    }

    /// Copy with the given fields overridden. Call [`Selection::normalize`]
    /// afterwards to refresh `is_backward`.
    pub fn merge(&self, properties: &SelectionProperties) -> Selection {
        Selection {
            anchor: properties.anchor.clone().unwrap_or_else(|| self.anchor.clone()),
            focus: properties.focus.clone().unwrap_or_else(|| self.focus.clone()),
            is_backward: self.is_backward,
            is_focused: properties.is_focused.unwrap_or(self.is_focused),
            marks: properties.marks.clone().unwrap_or_else(|| self.marks.clone()),
        }
    }

    /// The fields of `next` that differ from this selection.
    pub fn diff(&self, next: &Selection) -> SelectionProperties {
        SelectionProperties {
            anchor: (self.anchor != next.anchor).then(|| next.anchor.clone()),
            focus: (self.focus != next.focus).then(|| next.focus.clone()),
            is_focused: (self.is_focused != next.is_focused).then_some(next.is_focused),
            marks: (self.marks != next.marks).then(|| next.marks.clone()),
        }
    }

    fn with_points(&self, anchor: Point, focus: Point) -> Selection {
        Selection {
            anchor,
            focus,
            is_backward: false,
            is_focused: self.is_focused,
            marks: self.marks.clone(),
        }
    }

    pub fn collapse_to_anchor(&self) -> Selection {
        self.with_points(self.anchor.clone(), self.anchor.clone())
    }

    pub fn collapse_to_focus(&self) -> Selection {
        self.with_points(self.focus.clone(), self.focus.clone())
    }

    pub fn collapse_to_start(&self) -> Selection {
        self.with_points(self.start().clone(), self.start().clone())
    }

    pub fn collapse_to_end(&self) -> Selection {
        self.with_points(self.end().clone(), self.end().clone())
    }

    pub fn collapse_to_start_of(&self, node: &Node) -> Selection {
        match node.first_text() {
            Some(text) => self.collapse_to(text.key().clone(), 0),
            None => self.clone(),
        }
    }

    pub fn collapse_to_end_of(&self, node: &Node) -> Selection {
        match node.last_text() {
            Some(text) => self.collapse_to(text.key().clone(), text.len()),
            None => self.clone(),
        }
    }

    pub fn collapse_to(&self, key: Key, offset: usize) -> Selection {
        let point = Point::new(key, offset);
        self.with_points(point.clone(), point)
    }

    /// Select the whole content of `node`.
    pub fn move_to_range_of(&self, node: &Node) -> Selection {
        match (node.first_text(), node.last_text()) {
            (Some(first), Some(last)) => self.with_points(
                Point::new(first.key().clone(), 0),
                Point::new(last.key().clone(), last.len()),
            ),
            _ => self.clone(),
        }
    }

    /// Collapse onto offset 0 of the text after the focus. Unchanged when
    /// the focus is in the last text.
    pub fn move_to_start_of_next_text(&self, document: &Document) -> ModelResult<Selection> {
        let Some(key) = &self.focus.key else {
            return Ok(self.clone());
        };
        Ok(match document.next_text(key)? {
            Some(next) => self.collapse_to(next.key().clone(), 0),
            None => self.clone(),
        })
    }

    /// Move both points `n` characters forward, crossing text boundaries.
    pub fn move_forward(&self, document: &Document, n: usize) -> ModelResult<Selection> {
        Ok(self.with_points(
            move_point(document, &self.anchor, n, true)?,
            move_point(document, &self.focus, n, true)?,
        ))
    }

    pub fn move_backward(&self, document: &Document, n: usize) -> ModelResult<Selection> {
        Ok(self.with_points(
            move_point(document, &self.anchor, n, false)?,
            move_point(document, &self.focus, n, false)?,
        ))
    }

    pub fn is_at_start_of(&self, node: &Node) -> bool {
        match node.first_text() {
            Some(text) => self.is_collapsed() && self.start().is_at(text.key(), 0),
            None => false,
        }
    }

    pub fn is_at_end_of(&self, node: &Node) -> bool {
        match node.last_text() {
            Some(text) => self.is_collapsed() && self.end().is_at(text.key(), text.len()),
            None => false,
        }
    }

    /// Resolve both points against `document`: element keys map onto the
    /// text holding that character offset, offsets are clamped, and a point
    /// whose key is gone falls back to the start of the document. Refreshes
    /// `is_backward`.
    pub fn normalize(&self, document: &Document) -> Selection {
        if self.is_unset() {
            return Selection {
                anchor: Point::unset(),
                focus: Point::unset(),
                is_backward: false,
                is_focused: self.is_focused,
                marks: self.marks.clone(),
            };
        }
        let fallback = document
            .first_text()
            .map(|t| Point::new(t.key().clone(), 0))
            .unwrap_or_default();
        let anchor = document
            .resolve_point(&self.anchor)
            .unwrap_or_else(|| fallback.clone());
        let focus = document.resolve_point(&self.focus).unwrap_or(fallback);
        let is_backward = is_backward(document, &anchor, &focus);
        Selection {
            anchor,
            focus,
            is_backward,
            is_focused: self.is_focused,
            marks: self.marks.clone(),
        }
    }
}

fn is_backward(document: &Document, anchor: &Point, focus: &Point) -> bool {
    match (&anchor.key, &focus.key) {
        (Some(a), Some(f)) if a == f => anchor.offset > focus.offset,
        (Some(a), Some(f)) => match (document.path_of(a), document.path_of(f)) {
            (Ok(pa), Ok(pf)) => pa > pf,
            _ => false,
        },
        _ => false,
    }
}

fn move_point(document: &Document, point: &Point, n: usize, forward: bool) -> ModelResult<Point> {
    let Some(key) = &point.key else {
        return Ok(point.clone());
    };
    let mut text = document.text_node(key)?;
    let mut offset = point.offset;
    let mut remaining = n;
    loop {
        if forward {
            let room = text.len() - offset.min(text.len());
            if remaining <= room {
                return Ok(Point::new(text.key().clone(), offset + remaining));
            }
            remaining -= room;
            match document.next_text(text.key())? {
                Some(next) => {
                    text = next;
                    offset = 0;
                }
                None => return Ok(Point::new(text.key().clone(), text.len())),
            }
        } else {
            if remaining <= offset {
                return Ok(Point::new(text.key().clone(), offset - remaining));
            }
            remaining -= offset;
            match document.previous_text(text.key())? {
                Some(previous) => {
                    text = previous;
                    offset = text.len();
                }
                None => return Ok(Point::new(text.key().clone(), 0)),
            }
        }
    }
}
