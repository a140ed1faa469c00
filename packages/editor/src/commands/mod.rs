//! Commands on [`Change`](crate::Change), grouped by how they address the
//! document: by node key, by an explicit range, at the current selection,
//! and on the selection itself.

mod at_range;
mod at_selection;
mod by_key;
mod on_selection;

use crate::change::Change;
use quire_model::{Node, NodeProperties, Text};
use std::sync::Arc;

/// Whether `node` has every property `properties` sets. Data matches when
/// the node's data is a superset.
pub(crate) fn matches_properties(node: &Node, properties: &NodeProperties) -> bool {
    if let Some(key) = &properties.key {
        if key != node.key() {
            return false;
        }
    }
    if let Some(node_type) = &properties.node_type {
        if node.node_type() != Some(node_type.as_str()) {
            return false;
        }
    }
    if let Some(is_void) = properties.is_void {
        if node.is_void() != is_void {
            return false;
        }
    }
    match (&properties.data, node.data()) {
        (Some(wanted), Some(data)) => wanted.iter().all(|(k, v)| data.get(k) == Some(v)),
        (Some(wanted), None) => wanted.is_empty(),
        (None, _) => true,
    }
}

/// Character length of a text, child count of an element.
pub(crate) fn node_length(node: &Node) -> usize {
    match node {
        Node::Text(text) => text.len(),
        _ => node.nodes().len(),
    }
}

impl Change {
    /// Give a childless element an empty text so the cursor has somewhere
    /// to go before normalization runs.
    pub(crate) fn fill_empty(&mut self, node: Node) -> Node {
        if node.is_text() || !node.nodes().is_empty() {
            return node;
        }
        let text = Text::new(self.new_key());
        node.with_nodes(vec![Arc::new(Node::text(text))])
    }
}
