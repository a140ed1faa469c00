use crate::index::KeyIndex;
use crate::node::Texts;
use crate::{Data, Key, MarkSet, ModelError, ModelResult, Node, Path, Point, Selection, Text};
use std::sync::{Arc, OnceLock};

/// The root container. Holds blocks only once normalized.
#[derive(Debug, Clone)]
pub struct Document {
    key: Key,
    data: Data,
    nodes: Vec<Arc<Node>>,
    index: OnceLock<Arc<KeyIndex>>,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.data == other.data && self.nodes == other.nodes
    }
}

impl Eq for Document {}

/// The parent of a node: either the document itself or an element.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'a> {
    Document(&'a Document),
    Node(&'a Node),
}

impl<'a> Parent<'a> {
    pub fn key(&self) -> &'a Key {
        match self {
            Parent::Document(d) => &d.key,
            Parent::Node(n) => n.key(),
        }
    }

    pub fn nodes(&self) -> &'a [Arc<Node>] {
        match self {
            Parent::Document(d) => &d.nodes,
            Parent::Node(n) => n.nodes(),
        }
    }

    pub fn as_node(&self) -> Option<&'a Node> {
        match self {
            Parent::Document(_) => None,
            Parent::Node(n) => Some(n),
        }
    }
}

impl Document {
    pub fn new(key: Key, nodes: Vec<Node>) -> Self {
        Self::from_parts(key, Data::new(), nodes.into_iter().map(Arc::new).collect())
    }

    pub(crate) fn from_parts(key: Key, data: Data, nodes: Vec<Arc<Node>>) -> Self {
        Self {
            key,
            data,
            nodes,
            index: OnceLock::new(),
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    pub fn text(&self) -> String {
        self.texts().map(|t| t.text()).collect()
    }

    fn index(&self) -> &KeyIndex {
        self.index
            .get_or_init(|| Arc::new(KeyIndex::build(&self.key, &self.nodes)))
    }

    /// Reuse `previous`'s key index. Only valid when this document has the
    /// same shape and keys as `previous`.
    pub(crate) fn with_index_of(self, previous: &Document) -> Document {
        if let Some(index) = previous.index.get() {
            let _ = self.index.set(Arc::clone(index));
        }
        self
    }

    /// Whether the key index has been built for this version.
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    pub fn has_key(&self, key: &Key) -> bool {
        self.index().contains(key)
    }

    /// Every key in the tree, the document's own included.
    pub fn keys(&self) -> Vec<Key> {
        let mut keys = vec![self.key.clone()];
        for node in &self.nodes {
            keys.extend(node.keys());
        }
        keys
    }

    pub fn path_of(&self, key: &Key) -> ModelResult<Path> {
        self.index()
            .get(key)
            .cloned()
            .ok_or_else(|| ModelError::KeyNotFound(key.clone()))
    }

    pub(crate) fn arc_at(&self, path: &Path) -> ModelResult<&Arc<Node>> {
        let not_found = || ModelError::PathNotFound(path.clone());
        let (&first, rest) = path.as_slice().split_first().ok_or_else(not_found)?;
        let mut node = self.nodes.get(first).ok_or_else(not_found)?;
        for &index in rest {
            node = node.nodes().get(index).ok_or_else(not_found)?;
        }
        Ok(node)
    }

    /// Node at `path`. The root path names the document, which is not a
    /// node, so it does not resolve.
    pub fn node_at(&self, path: &Path) -> ModelResult<&Node> {
        self.arc_at(path).map(|node| node.as_ref())
    }

    pub fn node(&self, key: &Key) -> ModelResult<&Node> {
        let path = self.path_of(key)?;
        if path.is_root() {
            return Err(ModelError::KeyNotFound(key.clone()));
        }
        self.node_at(&path)
    }

    /// Shared handle to the node `key`, for callers that keep a snapshot
    /// while editing the document.
    pub fn node_arc(&self, key: &Key) -> ModelResult<Arc<Node>> {
        let path = self.path_of(key)?;
        if path.is_root() {
            return Err(ModelError::KeyNotFound(key.clone()));
        }
        self.arc_at(&path).cloned()
    }

    pub fn text_node(&self, key: &Key) -> ModelResult<&Text> {
        self.node(key)?.as_text().ok_or_else(|| {
            ModelError::invalid_structure(format!("node `{key}` is not a text"))
        })
    }

    /// Children of the container at `path`; the root path gives the
    /// document's blocks.
    pub fn children_at(&self, path: &Path) -> ModelResult<&[Arc<Node>]> {
        if path.is_root() {
            return Ok(&self.nodes);
        }
        Ok(self.node_at(path)?.nodes())
    }

    pub fn parent(&self, key: &Key) -> ModelResult<Parent<'_>> {
        let path = self.path_of(key)?;
        match path.parent() {
            None => Err(ModelError::invalid_structure("the document has no parent")),
            Some(parent) if parent.is_root() => Ok(Parent::Document(self)),
            Some(parent) => Ok(Parent::Node(self.node_at(&parent)?)),
        }
    }

    /// Ancestors of `key` from the outermost block down to the direct
    /// parent. Neither the document nor the node itself is included.
    pub fn ancestors(&self, key: &Key) -> ModelResult<Vec<&Node>> {
        let path = self.path_of(key)?;
        let mut ancestors = Vec::with_capacity(path.len());
        let mut nodes = &self.nodes;
        for &index in path.as_slice().iter().take(path.len().saturating_sub(1)) {
            let node = nodes
                .get(index)
                .ok_or_else(|| ModelError::PathNotFound(path.clone()))?;
            ancestors.push(node.as_ref());
            nodes = match node.as_ref() {
                Node::Block(e) | Node::Inline(e) => &e.nodes,
                Node::Text(_) => return Err(ModelError::PathNotFound(path.clone())),
            };
        }
        Ok(ancestors)
    }

    /// Nearest ancestor of `key` matching `pred`.
    pub fn closest(&self, key: &Key, pred: impl Fn(&Node) -> bool) -> ModelResult<Option<&Node>> {
        Ok(self.ancestors(key)?.into_iter().rev().find(|n| pred(n)))
    }

    pub fn closest_block(&self, key: &Key) -> ModelResult<Option<&Node>> {
        self.closest(key, Node::is_block)
    }

    pub fn closest_inline(&self, key: &Key) -> ModelResult<Option<&Node>> {
        self.closest(key, Node::is_inline)
    }

    /// The void node containing `key`, or the node itself when it is void.
    pub fn closest_void(&self, key: &Key) -> ModelResult<Option<&Node>> {
        let node = self.node(key)?;
        if node.is_void() {
            return Ok(Some(node));
        }
        self.closest(key, Node::is_void)
    }

    pub fn has_void_parent(&self, key: &Key) -> ModelResult<bool> {
        Ok(self.closest(key, Node::is_void)?.is_some())
    }

    /// Outermost inline containing `key`.
    pub fn furthest_inline(&self, key: &Key) -> ModelResult<Option<&Node>> {
        Ok(self.ancestors(key)?.into_iter().find(|n| n.is_inline()))
    }

    /// Text nodes in document order, lazily.
    pub fn texts(&self) -> Texts<'_> {
        Texts::new(&self.nodes)
    }

    pub fn first_text(&self) -> Option<&Text> {
        self.texts().next()
    }

    pub fn last_text(&self) -> Option<&Text> {
        self.nodes.iter().rev().find_map(|n| n.last_text())
    }

    /// Text nodes below the container at `path`.
    pub fn texts_at(&self, path: &Path) -> ModelResult<Texts<'_>> {
        if path.is_root() {
            return Ok(self.texts());
        }
        Ok(self.node_at(path)?.texts())
    }

    /// First text after the subtree of `key` in document order.
    pub fn next_text(&self, key: &Key) -> ModelResult<Option<&Text>> {
        let mut current = self.path_of(key)?;
        while let (Some(parent), Some(index)) = (current.parent(), current.last()) {
            let siblings = self.children_at(&parent)?;
            if let Some(text) = siblings.iter().skip(index + 1).find_map(|n| n.first_text()) {
                return Ok(Some(text));
            }
            current = parent;
        }
        Ok(None)
    }

    /// Last text before the subtree of `key` in document order.
    pub fn previous_text(&self, key: &Key) -> ModelResult<Option<&Text>> {
        let mut current = self.path_of(key)?;
        while let (Some(parent), Some(index)) = (current.parent(), current.last()) {
            let siblings = self.children_at(&parent)?;
            if let Some(text) = siblings[..index].iter().rev().find_map(|n| n.last_text()) {
                return Ok(Some(text));
            }
            current = parent;
        }
        Ok(None)
    }

    /// Leaf block after the one holding `key`.
    pub fn next_block(&self, key: &Key) -> ModelResult<Option<&Node>> {
        let node = self.node(key)?;
        let last = match node.last_text() {
            Some(text) => text.key().clone(),
            None => return Ok(None),
        };
        match self.next_text(&last)? {
            Some(next) => self.closest_block(next.key()),
            None => Ok(None),
        }
    }

    /// Leaf block before the one holding `key`.
    pub fn previous_block(&self, key: &Key) -> ModelResult<Option<&Node>> {
        let node = self.node(key)?;
        let first = match node.first_text() {
            Some(text) => text.key().clone(),
            None => return Ok(None),
        };
        match self.previous_text(&first)? {
            Some(previous) => self.closest_block(previous.key()),
            None => Ok(None),
        }
    }

    /// Texts from the range's start text through its end text inclusive.
    pub fn texts_at_range(&self, range: &Selection) -> ModelResult<Vec<&Text>> {
        let (Some(start), Some(end)) = (&range.start().key, &range.end().key) else {
            return Ok(Vec::new());
        };
        self.text_node(start)?;
        self.text_node(end)?;
        let mut texts = Vec::new();
        let mut inside = false;
        for text in self.texts() {
            if text.key() == start {
                inside = true;
            }
            if inside {
                texts.push(text);
            }
            if text.key() == end {
                break;
            }
        }
        Ok(texts)
    }

    /// Leaf blocks touched by the range, in document order.
    pub fn leaf_blocks_at_range(&self, range: &Selection) -> ModelResult<Vec<&Node>> {
        let mut blocks: Vec<&Node> = Vec::new();
        for text in self.texts_at_range(range)? {
            if let Some(block) = self.closest_block(text.key())? {
                if !blocks.iter().any(|b| b.key() == block.key()) {
                    blocks.push(block);
                }
            }
        }
        Ok(blocks)
    }

    /// Closest inlines of the texts touched by the range.
    pub fn inlines_at_range(&self, range: &Selection) -> ModelResult<Vec<&Node>> {
        let mut inlines: Vec<&Node> = Vec::new();
        for text in self.texts_at_range(range)? {
            if let Some(inline) = self.closest_inline(text.key())? {
                if !inlines.iter().any(|i| i.key() == inline.key()) {
                    inlines.push(inline);
                }
            }
        }
        Ok(inlines)
    }

    /// Path of the closest container holding both keys. A node never counts
    /// as its own ancestor, so the result is strictly above both.
    pub fn common_ancestor(&self, one: &Key, two: &Key) -> ModelResult<Path> {
        let a = self.path_of(one)?;
        let b = self.path_of(two)?;
        let common = a.common(&b);
        if (common == a || common == b) && !common.is_root() {
            return Ok(common.parent().unwrap_or_default());
        }
        Ok(common)
    }

    /// Character offset at which text `key` starts inside the container at
    /// `ancestor`.
    pub fn offset_of(&self, key: &Key, ancestor: &Path) -> ModelResult<usize> {
        let mut offset = 0;
        for text in self.texts_at(ancestor)? {
            if text.key() == key {
                return Ok(offset);
            }
            offset += text.len();
        }
        Err(ModelError::KeyNotFound(key.clone()))
    }

    /// The text and local offset found `offset` characters into the node
    /// `key`. Texts resolve to themselves with the offset clamped.
    pub fn text_at_offset(&self, key: &Key, offset: usize) -> ModelResult<Option<(Key, usize)>> {
        let path = self.path_of(key)?;
        if let Ok(Node::Text(text)) = self.node_at(&path) {
            return Ok(Some((text.key().clone(), offset.min(text.len()))));
        }
        let mut start = 0;
        let mut last = None;
        for text in self.texts_at(&path)? {
            let len = text.len();
            if offset <= start + len {
                return Ok(Some((text.key().clone(), offset - start)));
            }
            start += len;
            last = Some((text.key().clone(), len));
        }
        Ok(last)
    }

    /// Resolve a point onto an existing text, or `None` when its key is
    /// gone from this document.
    pub fn resolve_point(&self, point: &Point) -> Option<Point> {
        let key = point.key.as_ref()?;
        match self.text_at_offset(key, point.offset) {
            Ok(Some((key, offset))) => Some(Point::new(key, offset)),
            _ => None,
        }
    }

    /// Union of the marks on every character in the range.
    pub fn marks_at_range(&self, range: &Selection) -> ModelResult<MarkSet> {
        if range.is_collapsed() {
            return self.insert_marks_at_range(range);
        }
        Ok(self
            .segments_at_range(range)?
            .into_iter()
            .fold(MarkSet::new(), |acc, marks| acc.union(&marks)))
    }

    /// Marks shared by every character in the range.
    pub fn active_marks_at_range(&self, range: &Selection) -> ModelResult<MarkSet> {
        if range.is_collapsed() {
            return self.insert_marks_at_range(range);
        }
        let mut segments = self.segments_at_range(range)?.into_iter();
        let Some(first) = segments.next() else {
            return Ok(MarkSet::new());
        };
        Ok(segments.fold(first, |acc, marks| acc.intersection(&marks)))
    }

    /// Marks a character typed at the range would carry.
    ///
    /// At the start of a text the previous text of the same block wins, so
    /// typing after a bold run stays bold.
    pub fn insert_marks_at_range(&self, range: &Selection) -> ModelResult<MarkSet> {
        let start = range.start();
        let Some(key) = &start.key else {
            return Ok(MarkSet::new());
        };
        let text = self.text_node(key)?;
        if range.is_expanded() && start.offset < text.len() {
            return Ok(text.marks_at(start.offset + 1));
        }
        if start.offset == 0 {
            if let Some(previous) = self.previous_text(key)? {
                let same_block = self.closest_block(key)?.map(Node::key)
                    == self.closest_block(previous.key())?.map(Node::key);
                if same_block && !previous.is_empty() {
                    return Ok(previous.marks_at(previous.len()));
                }
            }
        }
        Ok(text.marks_at(start.offset))
    }

    /// Mark sets of each leaf run that has characters inside the range.
    fn segments_at_range(&self, range: &Selection) -> ModelResult<Vec<MarkSet>> {
        let start = range.start();
        let end = range.end();
        let mut segments = Vec::new();
        for text in self.texts_at_range(range)? {
            let from = if Some(text.key()) == start.key.as_ref() {
                start.offset
            } else {
                0
            };
            let to = if Some(text.key()) == end.key.as_ref() {
                end.offset
            } else {
                text.len()
            };
            if from < to {
                segments.extend(
                    text.segments(from, to - from)
                        .into_iter()
                        .map(|(_, leaf)| leaf.marks),
                );
            }
        }
        Ok(segments)
    }

    /// A sub-document holding exactly the content inside the range. Nodes
    /// keep their keys; partially covered texts and elements are trimmed.
    pub fn fragment_at_range(&self, range: &Selection) -> ModelResult<Document> {
        let (Some(start_key), Some(end_key)) = (&range.start().key, &range.end().key) else {
            return Ok(Document::from_parts(self.key.clone(), Data::new(), Vec::new()));
        };
        let start_path = self.path_of(start_key)?;
        let end_path = self.path_of(end_key)?;
        let nodes = slice_nodes(
            &self.nodes,
            Some((start_path.as_slice(), range.start().offset)),
            Some((end_path.as_slice(), range.end().offset)),
        );
        Ok(Document::from_parts(self.key.clone(), self.data.clone(), nodes))
    }
}

type Bound<'a> = Option<(&'a [usize], usize)>;

fn child_bound<'a>(bound: Bound<'a>, index: usize) -> Bound<'a> {
    bound
        .filter(|(path, _)| path.first() == Some(&index))
        .map(|(path, offset)| (&path[1..], offset))
}

fn slice_nodes(nodes: &[Arc<Node>], start: Bound<'_>, end: Bound<'_>) -> Vec<Arc<Node>> {
    let Some(last) = nodes.len().checked_sub(1) else {
        return Vec::new();
    };
    let from = start.and_then(|(p, _)| p.first().copied()).unwrap_or(0);
    let to = end
        .and_then(|(p, _)| p.first().copied())
        .unwrap_or(last)
        .min(last);
    if from > to {
        return Vec::new();
    }
    (from..=to)
        .map(|i| {
            let child = &nodes[i];
            let child_start = child_bound(start, i);
            let child_end = child_bound(end, i);
            if child_start.is_none() && child_end.is_none() {
                return Arc::clone(child);
            }
            match child.as_ref() {
                Node::Text(text) => {
                    let from = child_start.map(|(_, o)| o).unwrap_or(0);
                    let to = child_end.map(|(_, o)| o).unwrap_or(text.len());
                    Arc::new(Node::Text(text.slice(from, to)))
                }
                _ => Arc::new(child.with_nodes(slice_nodes(child.nodes(), child_start, child_end))),
            }
        })
        .collect()
}
