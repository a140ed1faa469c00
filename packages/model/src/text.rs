use crate::{Key, Mark, MarkSet, ModelError, ModelResult};

/// A run of characters sharing one mark set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leaf {
    pub text: String,
    pub marks: MarkSet,
}

impl Leaf {
    pub fn new(text: impl Into<String>, marks: MarkSet) -> Self {
        Self {
            text: text.into(),
            marks,
        }
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Byte index of the `offset`-th character, or the string length when the
/// offset is at or past the end.
pub(crate) fn byte_offset(s: &str, offset: usize) -> usize {
    s.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// A text node: an ordered run of leaves.
///
/// Leaves are kept canonical at all times. Empty leaves are dropped,
/// neighbours with equal mark sets are merged, and an empty text holds
/// exactly one empty, unmarked leaf. All offsets count characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    key: Key,
    leaves: Vec<Leaf>,
}

impl Text {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            leaves: vec![Leaf::default()],
        }
    }

    pub fn with_text(key: Key, text: impl Into<String>, marks: MarkSet) -> Self {
        Self::from_leaves(key, vec![Leaf::new(text, marks)])
    }

    pub fn from_leaves(key: Key, leaves: Vec<Leaf>) -> Self {
        Self {
            key,
            leaves: normalize_leaves(leaves),
        }
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn with_key(&self, key: Key) -> Text {
        Text {
            key,
            leaves: self.leaves.clone(),
        }
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn text(&self) -> String {
        self.leaves.iter().map(|l| l.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.leaves.iter().map(Leaf::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.iter().all(Leaf::is_empty)
    }

    /// Union of the marks of every leaf.
    pub fn marks(&self) -> MarkSet {
        self.leaves
            .iter()
            .fold(MarkSet::new(), |acc, leaf| acc.union(&leaf.marks))
    }

    /// Marks a character typed at `offset` would inherit: those of the
    /// character before the offset, or of the first character at offset 0.
    pub fn marks_at(&self, offset: usize) -> MarkSet {
        let mut start = 0;
        for leaf in &self.leaves {
            let end = start + leaf.len();
            if offset == 0 || (offset > start && offset <= end) {
                return leaf.marks.clone();
            }
            start = end;
        }
        MarkSet::new()
    }

    /// Leaves clipped to `[offset, offset + length)`, each paired with its
    /// starting character offset.
    pub fn segments(&self, offset: usize, length: usize) -> Vec<(usize, Leaf)> {
        let end = offset.saturating_add(length);
        let mut segments = Vec::new();
        let mut start = 0;
        for leaf in &self.leaves {
            let leaf_end = start + leaf.len();
            let from = start.max(offset);
            let to = leaf_end.min(end);
            if from < to {
                let text: String = leaf
                    .text
                    .chars()
                    .skip(from - start)
                    .take(to - from)
                    .collect();
                segments.push((from, Leaf::new(text, leaf.marks.clone())));
            }
            start = leaf_end;
        }
        segments
    }

    pub fn text_in_range(&self, offset: usize, length: usize) -> String {
        self.text().chars().skip(offset).take(length).collect()
    }

    pub fn insert_text(&self, offset: usize, text: &str, marks: &MarkSet) -> ModelResult<Text> {
        self.check_range(offset, 0)?;
        let (mut left, right) = self.split_leaves(offset);
        left.push(Leaf::new(text, marks.clone()));
        left.extend(right);
        Ok(Text::from_leaves(self.key.clone(), left))
    }

    pub fn remove_text(&self, offset: usize, length: usize) -> ModelResult<Text> {
        self.check_range(offset, length)?;
        let (mut left, rest) = self.split_leaves(offset);
        let (_, right) = split_leaf_vec(&rest, length);
        left.extend(right);
        Ok(Text::from_leaves(self.key.clone(), left))
    }

    pub fn add_mark(&self, offset: usize, length: usize, mark: &Mark) -> ModelResult<Text> {
        self.map_marks(offset, length, |marks| marks.with(mark))
    }

    pub fn remove_mark(&self, offset: usize, length: usize, mark: &Mark) -> ModelResult<Text> {
        self.map_marks(offset, length, |marks| marks.without(mark))
    }

    pub fn set_mark(
        &self,
        offset: usize,
        length: usize,
        mark: &Mark,
        updated: &Mark,
    ) -> ModelResult<Text> {
        self.map_marks(offset, length, |marks| marks.replace(mark, updated))
    }

    /// Split into two texts at `offset`. The left half keeps this key.
    pub fn split(&self, offset: usize, new_key: Key) -> ModelResult<(Text, Text)> {
        self.check_range(offset, 0)?;
        let (left, right) = self.split_leaves(offset);
        Ok((
            Text::from_leaves(self.key.clone(), left),
            Text::from_leaves(new_key, right),
        ))
    }

    /// Append `other`'s leaves, keeping this key.
    pub fn merge(&self, other: &Text) -> Text {
        let mut leaves = self.leaves.clone();
        leaves.extend(other.leaves.iter().cloned());
        Text::from_leaves(self.key.clone(), leaves)
    }

    /// The characters in `[start, end)`, keeping this key. Bounds are clamped.
    pub fn slice(&self, start: usize, end: usize) -> Text {
        let len = self.len();
        let end = end.min(len);
        let start = start.min(end);
        let leaves = self
            .segments(start, end - start)
            .into_iter()
            .map(|(_, leaf)| leaf)
            .collect();
        Text::from_leaves(self.key.clone(), leaves)
    }

    fn map_marks(
        &self,
        offset: usize,
        length: usize,
        f: impl Fn(&MarkSet) -> MarkSet,
    ) -> ModelResult<Text> {
        self.check_range(offset, length)?;
        let (mut left, rest) = self.split_leaves(offset);
        let (middle, right) = split_leaf_vec(&rest, length);
        left.extend(middle.into_iter().map(|leaf| Leaf {
            marks: f(&leaf.marks),
            text: leaf.text,
        }));
        left.extend(right);
        Ok(Text::from_leaves(self.key.clone(), left))
    }

    fn split_leaves(&self, offset: usize) -> (Vec<Leaf>, Vec<Leaf>) {
        split_leaf_vec(&self.leaves, offset)
    }

    fn check_range(&self, offset: usize, length: usize) -> ModelResult<()> {
        let len = self.len();
        match offset.checked_add(length) {
            Some(end) if end <= len => Ok(()),
            end => Err(ModelError::invalid_offset(&self.key, end.unwrap_or(usize::MAX), len)),
        }
    }
}

fn split_leaf_vec(leaves: &[Leaf], offset: usize) -> (Vec<Leaf>, Vec<Leaf>) {
    let mut left = Vec::new();
    let mut right = Vec::new();
    let mut start = 0;
    for leaf in leaves {
        let end = start + leaf.len();
        if end <= offset {
            left.push(leaf.clone());
        } else if start >= offset {
            right.push(leaf.clone());
        } else {
            let at = byte_offset(&leaf.text, offset - start);
            left.push(Leaf::new(&leaf.text[..at], leaf.marks.clone()));
            right.push(Leaf::new(&leaf.text[at..], leaf.marks.clone()));
        }
        start = end;
    }
    (left, right)
}

fn normalize_leaves(leaves: Vec<Leaf>) -> Vec<Leaf> {
    let mut result: Vec<Leaf> = Vec::with_capacity(leaves.len());
    for leaf in leaves.into_iter().filter(|l| !l.is_empty()) {
        match result.last_mut() {
            Some(prev) if prev.marks == leaf.marks => prev.text.push_str(&leaf.text),
            _ => result.push(leaf),
        }
    }
    if result.is_empty() {
        result.push(Leaf::default());
    }
    result
}
