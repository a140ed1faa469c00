use crate::json::NodeJson;
use crate::{Data, Key, KeyGenerator, Text};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The kind of an entity, as named by its `object` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Document,
    Block,
    Inline,
    Text,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Document => "document",
            ObjectKind::Block => "block",
            ObjectKind::Inline => "inline",
            ObjectKind::Text => "text",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block or inline container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub key: Key,
    pub node_type: String,
    pub data: Data,
    pub is_void: bool,
    pub nodes: Vec<Arc<Node>>,
}

impl Element {
    pub fn new(key: Key, node_type: impl Into<String>) -> Self {
        Self {
            key,
            node_type: node_type.into(),
            data: Data::new(),
            is_void: false,
            nodes: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn with_void(mut self, is_void: bool) -> Self {
        self.is_void = is_void;
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes.into_iter().map(Arc::new).collect();
        self
    }

    /// Same element, different children.
    pub fn replace_nodes(&self, nodes: Vec<Arc<Node>>) -> Element {
        Element {
            key: self.key.clone(),
            node_type: self.node_type.clone(),
            data: self.data.clone(),
            is_void: self.is_void,
            nodes,
        }
    }
}

/// A node of the document tree. Children are reference-counted so that
/// successive document values share every subtree an edit did not touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NodeJson", into = "NodeJson")]
pub enum Node {
    Block(Element),
    Inline(Element),
    Text(Text),
}

impl Node {
    pub fn block(element: Element) -> Self {
        Node::Block(element)
    }

    pub fn inline(element: Element) -> Self {
        Node::Inline(element)
    }

    pub fn text(text: Text) -> Self {
        Node::Text(text)
    }

    pub fn key(&self) -> &Key {
        match self {
            Node::Block(e) | Node::Inline(e) => &e.key,
            Node::Text(t) => t.key(),
        }
    }

    pub fn object(&self) -> ObjectKind {
        match self {
            Node::Block(_) => ObjectKind::Block,
            Node::Inline(_) => ObjectKind::Inline,
            Node::Text(_) => ObjectKind::Text,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Block(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Node::Inline(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn is_void(&self) -> bool {
        self.as_element().map(|e| e.is_void).unwrap_or(false)
    }

    /// A block whose children are not blocks.
    pub fn is_leaf_block(&self) -> bool {
        match self {
            Node::Block(e) => !e.nodes.iter().any(|n| n.is_block()),
            _ => false,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Block(e) | Node::Inline(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn node_type(&self) -> Option<&str> {
        self.as_element().map(|e| e.node_type.as_str())
    }

    pub fn data(&self) -> Option<&Data> {
        self.as_element().map(|e| &e.data)
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        match self {
            Node::Block(e) | Node::Inline(e) => &e.nodes,
            Node::Text(_) => &[],
        }
    }

    /// Concatenated text content
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.text(),
            _ => self.texts().map(|t| t.text()).collect(),
        }
    }

    /// Length of the text content in characters.
    pub fn text_len(&self) -> usize {
        match self {
            Node::Text(t) => t.len(),
            _ => self.texts().map(Text::len).sum(),
        }
    }

    /// Text descendants in document order; a text node yields itself.
    pub fn texts(&self) -> Texts<'_> {
        match self {
            Node::Text(t) => Texts::single(t),
            _ => Texts::new(self.nodes()),
        }
    }

    pub fn first_text(&self) -> Option<&Text> {
        self.texts().next()
    }

    pub fn last_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            _ => self.nodes().iter().rev().find_map(|n| n.last_text()),
        }
    }

    /// Every key in this subtree, the node's own first.
    pub fn keys(&self) -> Vec<Key> {
        let mut keys = vec![self.key().clone()];
        for child in self.nodes() {
            keys.extend(child.keys());
        }
        keys
    }

    /// True when `key` names this node or one of its descendants.
    pub fn has_key(&self, key: &Key) -> bool {
        self.key() == key || self.nodes().iter().any(|n| n.has_key(key))
    }

    pub fn properties(&self) -> NodeProperties {
        match self {
            Node::Block(e) | Node::Inline(e) => NodeProperties {
                key: Some(e.key.clone()),
                node_type: Some(e.node_type.clone()),
                data: Some(e.data.clone()),
                is_void: Some(e.is_void),
            },
            Node::Text(t) => NodeProperties {
                key: Some(t.key().clone()),
                ..NodeProperties::default()
            },
        }
    }

    /// Copy with `properties` applied. Type, data and void flags are ignored
    /// on texts.
    pub fn with_properties(&self, properties: &NodeProperties) -> Node {
        match self {
            Node::Block(e) => Node::Block(apply_properties(e, properties)),
            Node::Inline(e) => Node::Inline(apply_properties(e, properties)),
            Node::Text(t) => match &properties.key {
                Some(key) => Node::Text(t.with_key(key.clone())),
                None => self.clone(),
            },
        }
    }

    pub fn with_nodes(&self, nodes: Vec<Arc<Node>>) -> Node {
        match self {
            Node::Block(e) => Node::Block(e.replace_nodes(nodes)),
            Node::Inline(e) => Node::Inline(e.replace_nodes(nodes)),
            Node::Text(_) => self.clone(),
        }
    }

    /// Deep copy with every key replaced by a freshly minted one.
    pub fn regenerate_keys(&self, keys: &mut KeyGenerator) -> Node {
        match self {
            Node::Text(t) => Node::Text(t.with_key(keys.new_key())),
            _ => {
                let nodes = self
                    .nodes()
                    .iter()
                    .map(|n| Arc::new(n.regenerate_keys(keys)))
                    .collect();
                let key = keys.new_key();
                self.with_nodes(nodes).with_properties(&NodeProperties {
                    key: Some(key),
                    ..NodeProperties::default()
                })
            }
        }
    }
}

fn apply_properties(element: &Element, properties: &NodeProperties) -> Element {
    Element {
        key: properties.key.clone().unwrap_or_else(|| element.key.clone()),
        node_type: properties
            .node_type
            .clone()
            .unwrap_or_else(|| element.node_type.clone()),
        data: properties.data.clone().unwrap_or_else(|| element.data.clone()),
        is_void: properties.is_void.unwrap_or(element.is_void),
        nodes: element.nodes.clone(),
    }
}

/// Partial node update. `None` leaves a property unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_void: Option<bool>,
}

impl NodeProperties {
    pub fn with_type(node_type: impl Into<String>) -> Self {
        Self {
            node_type: Some(node_type.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_none() && self.node_type.is_none() && self.data.is_none() && self.is_void.is_none()
    }

    /// The subset of `node`'s current properties that this update would
    /// overwrite.
    pub fn previous_of(&self, node: &Node) -> NodeProperties {
        let current = node.properties();
        NodeProperties {
            key: self.key.as_ref().and(current.key),
            node_type: self.node_type.as_ref().and(current.node_type),
            data: self.data.as_ref().and(current.data),
            is_void: self.is_void.and(current.is_void),
        }
    }
}

/// Lazy pre-order walk over the text nodes below a list of children.
/// Calling `texts()` again restarts the walk.
pub struct Texts<'a> {
    first: Option<&'a Text>,
    stack: Vec<std::slice::Iter<'a, Arc<Node>>>,
}

impl<'a> Texts<'a> {
    pub(crate) fn new(nodes: &'a [Arc<Node>]) -> Self {
        Self {
            first: None,
            stack: vec![nodes.iter()],
        }
    }

    fn single(text: &'a Text) -> Self {
        Self {
            first: Some(text),
            stack: Vec::new(),
        }
    }
}

impl<'a> Iterator for Texts<'a> {
    type Item = &'a Text;

    fn next(&mut self) -> Option<&'a Text> {
        if let Some(text) = self.first.take() {
            return Some(text);
        }
        while let Some(iter) = self.stack.last_mut() {
            match iter.next().map(|n| n.as_ref()) {
                Some(Node::Text(text)) => return Some(text),
                Some(Node::Block(e)) | Some(Node::Inline(e)) => self.stack.push(e.nodes.iter()),
                None => {
                    self.stack.pop();
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MarkSet;

    fn text(key: &str, s: &str) -> Node {
        Node::Text(Text::with_text(Key::from(key), s, MarkSet::new()))
    }

    fn sample() -> Node {
        Node::Block(Element::new(Key::from("b"), "paragraph").with_nodes(vec![
            text("t1", "one"),
            Node::Inline(Element::new(Key::from("i"), "link").with_nodes(vec![text("t2", "two")])),
            text("t3", "three"),
        ]))
    }

    #[test]
    fn test_texts_walk_in_document_order() {
        let node = sample();
        let keys: Vec<&str> = node.texts().map(|t| t.key().as_str()).collect();
        assert_eq!(keys, vec!["t1", "t2", "t3"]);
        // Restartable
        assert_eq!(node.texts().count(), 3);
        assert_eq!(node.text_content(), "onetwothree");
        assert_eq!(node.last_text().map(|t| t.key().as_str()), Some("t3"));
    }

    #[test]
    fn test_keys_and_lookup() {
        let node = sample();
        assert_eq!(node.keys().len(), 5);
        assert!(node.has_key(&Key::from("t2")));
        assert!(!node.has_key(&Key::from("missing")));
    }

    #[test]
    fn test_properties_round_trip() {
        let node = sample();
        let update = NodeProperties::with_type("heading");
        let previous = update.previous_of(&node);
        assert_eq!(previous.node_type.as_deref(), Some("paragraph"));
        assert!(previous.data.is_none());
        let changed = node.with_properties(&update);
        assert_eq!(changed.node_type(), Some("heading"));
        assert_eq!(changed.with_properties(&previous), node);
    }

    #[test]
    fn test_regenerate_keys_is_post_order() {
        let mut keys = KeyGenerator::with_prefix("n");
        let copy = sample().regenerate_keys(&mut keys);
        let all: Vec<String> = copy.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(all, vec!["n4", "n0", "n2", "n1", "n3"]);
    }
}
