//! Copy-on-write tree edits.
//!
//! Each edit rebuilds only the spine from the root to the touched container;
//! every other subtree is shared with the previous document by reference.

use crate::{Document, Key, ModelError, ModelResult, Node, NodeProperties, Path, Text};
use std::sync::Arc;

fn update_in<F>(nodes: &[Arc<Node>], rest: &[usize], full: &Path, f: F) -> ModelResult<Vec<Arc<Node>>>
where
    F: FnOnce(&mut Vec<Arc<Node>>) -> ModelResult<()>,
{
    let mut nodes = nodes.to_vec();
    match rest.split_first() {
        None => f(&mut nodes)?,
        Some((&index, tail)) => {
            let child = nodes
                .get(index)
                .ok_or_else(|| ModelError::PathNotFound(full.clone()))?;
            if child.is_text() {
                return Err(ModelError::PathNotFound(full.clone()));
            }
            let replacement = Arc::new(child.with_nodes(update_in(child.nodes(), tail, full, f)?));
            nodes[index] = replacement;
        }
    }
    Ok(nodes)
}

fn split_path(path: &Path) -> ModelResult<(Path, usize)> {
    match (path.parent(), path.last()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(ModelError::invalid_structure("the document itself cannot be edited as a node")),
    }
}

impl Document {
    /// Rewrite the child list of the container at `parent`.
    pub fn update_children<F>(&self, parent: &Path, f: F) -> ModelResult<Document>
    where
        F: FnOnce(&mut Vec<Arc<Node>>) -> ModelResult<()>,
    {
        let nodes = update_in(self.nodes(), parent.as_slice(), parent, f)?;
        Ok(Document::from_parts(self.key().clone(), self.data().clone(), nodes))
    }

    /// Replace the node at `path` with `f` applied to it.
    pub fn update_node<F>(&self, path: &Path, f: F) -> ModelResult<Document>
    where
        F: FnOnce(&Node) -> ModelResult<Node>,
    {
        let (parent, index) = split_path(path)?;
        self.update_children(&parent, |nodes| {
            let node = nodes
                .get(index)
                .ok_or_else(|| ModelError::PathNotFound(path.clone()))?;
            let replacement = Arc::new(f(node)?);
            nodes[index] = replacement;
            Ok(())
        })
    }

    pub fn insert_node(&self, path: &Path, node: Node) -> ModelResult<Document> {
        for key in node.keys() {
            if self.has_key(&key) {
                return Err(ModelError::DuplicateKey(key));
            }
        }
        self.insert_arc(path, Arc::new(node))
    }

    fn insert_arc(&self, path: &Path, node: Arc<Node>) -> ModelResult<Document> {
        let (parent, index) = split_path(path)?;
        self.update_children(&parent, |nodes| {
            if index > nodes.len() {
                return Err(ModelError::PathNotFound(path.clone()));
            }
            nodes.insert(index, node);
            Ok(())
        })
    }

    /// Remove the node at `path`, returning it alongside the new document.
    pub fn remove_node(&self, path: &Path) -> ModelResult<(Document, Arc<Node>)> {
        let removed = Arc::clone(self.arc_at(path)?);
        let (parent, index) = split_path(path)?;
        let document = self.update_children(&parent, |nodes| {
            nodes.remove(index);
            Ok(())
        })?;
        Ok((document, removed))
    }

    pub fn replace_node(&self, path: &Path, node: Node) -> ModelResult<Document> {
        self.update_node(path, |_| Ok(node))
    }

    /// Merge the node at `path` into its previous sibling, which keeps its
    /// key and properties.
    pub fn merge_node(&self, path: &Path) -> ModelResult<Document> {
        let (parent, index) = split_path(path)?;
        if index == 0 {
            return Err(ModelError::invalid_structure(format!(
                "node at {path} has no previous sibling to merge into"
            )));
        }
        let one = self.node_at(&parent.child(index - 1))?;
        let two = self.node_at(path)?;
        let merged = match (one, two) {
            (Node::Text(a), Node::Text(b)) => Node::Text(a.merge(b)),
            (Node::Block(_), Node::Block(_)) | (Node::Inline(_), Node::Inline(_)) => {
                let mut nodes = one.nodes().to_vec();
                nodes.extend(two.nodes().iter().cloned());
                one.with_nodes(nodes)
            }
            _ => {
                return Err(ModelError::invalid_structure(format!(
                    "cannot merge a {} into a {}",
                    two.object(),
                    one.object()
                )))
            }
        };
        self.update_children(&parent, |nodes| {
            nodes[index - 1] = Arc::new(merged);
            nodes.remove(index);
            Ok(())
        })
    }

    /// Split the node at `path` at `position` (a character offset for texts,
    /// a child index for elements). The right half becomes a new next
    /// sibling built from `properties`, which must carry its key.
    pub fn split_node(
        &self,
        path: &Path,
        position: usize,
        properties: &NodeProperties,
    ) -> ModelResult<Document> {
        let (parent, index) = split_path(path)?;
        let key = properties
            .key
            .clone()
            .ok_or_else(|| ModelError::invalid_structure("split needs a key for the new node"))?;
        if self.has_key(&key) {
            return Err(ModelError::DuplicateKey(key));
        }
        let node = self.node_at(path)?;
        let (left, right) = match node {
            Node::Text(text) => {
                let (left, right) = text.split(position, key)?;
                (Node::Text(left), Node::Text(right))
            }
            _ => {
                let children = node.nodes();
                if position > children.len() {
                    return Err(ModelError::invalid_offset(node.key(), position, children.len()));
                }
                (
                    node.with_nodes(children[..position].to_vec()),
                    node.with_nodes(children[position..].to_vec())
                        .with_properties(properties),
                )
            }
        };
        self.update_children(&parent, |nodes| {
            nodes[index] = Arc::new(left);
            nodes.insert(index + 1, Arc::new(right));
            Ok(())
        })
    }

    /// Move the node at `path` so that it ends up at `new_path`, which is
    /// read against the tree after the node has been taken out.
    pub fn move_node(&self, path: &Path, new_path: &Path) -> ModelResult<Document> {
        let (document, node) = self.remove_node(path)?;
        document.insert_arc(new_path, node)
    }

    pub fn set_node(&self, path: &Path, properties: &NodeProperties) -> ModelResult<Document> {
        let document = self.update_node(path, |node| Ok(node.with_properties(properties)))?;
        if properties.key.is_none() {
            return Ok(document.with_index_of(self));
        }
        Ok(document)
    }

    /// Rewrite the text at `path`. The tree shape is unchanged, so the key
    /// index carries over.
    pub fn update_text<F>(&self, path: &Path, f: F) -> ModelResult<Document>
    where
        F: FnOnce(&Text) -> ModelResult<Text>,
    {
        let document = self.update_node(path, |node| match node {
            Node::Text(text) => Ok(Node::Text(f(text)?)),
            _ => Err(ModelError::invalid_structure(format!(
                "node `{}` at {path} is not a text",
                node.key()
            ))),
        })?;
        Ok(document.with_index_of(self))
    }

    /// Path of `key` if it were moved under `parent` at `index`, read against
    /// the tree after removal. Fails when `parent` lies inside the node.
    pub fn path_after_move(&self, key: &Key, parent: &Key, index: usize) -> ModelResult<Path> {
        let path = self.path_of(key)?;
        let parent_path = self.path_of(parent)?;
        let parent_after = parent_path.transform_after_removal(&path).ok_or_else(|| {
            ModelError::invalid_structure(format!("cannot move `{key}` into itself"))
        })?;
        Ok(parent_after.child(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Element;
    use crate::MarkSet;

    fn text(key: &str, s: &str) -> Node {
        Node::Text(Text::with_text(Key::from(key), s, MarkSet::new()))
    }

    fn para(key: &str, children: Vec<Node>) -> Node {
        Node::Block(Element::new(Key::from(key), "paragraph").with_nodes(children))
    }

    fn doc() -> Document {
        Document::new(
            Key::from("d"),
            vec![
                para("a", vec![text("a1", "one")]),
                para("b", vec![text("b1", "two")]),
            ],
        )
    }

    fn p(indices: &[usize]) -> Path {
        Path::from(indices)
    }

    #[test]
    fn test_untouched_subtrees_are_shared() {
        let before = doc();
        let after = before
            .update_text(&p(&[1, 0]), |t| t.insert_text(0, "x", &MarkSet::new()))
            .unwrap();
        assert!(Arc::ptr_eq(&before.nodes()[0], &after.nodes()[0]));
        assert!(!Arc::ptr_eq(&before.nodes()[1], &after.nodes()[1]));
        assert_eq!(before.text(), "onetwo");
        assert_eq!(after.text(), "onextwo");
    }

    #[test]
    fn test_text_edits_keep_the_index() {
        let before = doc();
        before.path_of(&Key::from("b1")).unwrap();
        let after = before
            .update_text(&p(&[0, 0]), |t| t.remove_text(0, 1))
            .unwrap();
        assert!(after.is_indexed());
        let moved = after.move_node(&p(&[1]), &p(&[0])).unwrap();
        assert!(!moved.is_indexed());
    }

    #[test]
    fn test_split_then_merge_restores_document() {
        let before = doc();
        let props = NodeProperties {
            key: Some(Key::from("n")),
            ..NodeProperties::default()
        };
        let split = before.split_node(&p(&[0, 0]), 1, &props).unwrap();
        assert_eq!(split.node_at(&p(&[0, 1])).unwrap().text_content(), "ne");
        let merged = split.merge_node(&p(&[0, 1])).unwrap();
        assert_eq!(merged, before);
    }

    #[test]
    fn test_merge_rejects_mixed_kinds() {
        let d = Document::new(
            Key::from("d"),
            vec![para("a", vec![
                text("t", "x"),
                Node::Inline(Element::new(Key::from("i"), "link").with_nodes(vec![text("u", "y")])),
            ])],
        );
        assert!(d.merge_node(&p(&[0, 1])).is_err());
    }

    #[test]
    fn test_move_node_uses_final_path() {
        let before = doc();
        let moved = before.move_node(&p(&[0]), &p(&[1])).unwrap();
        assert_eq!(moved.text(), "twoone");
        let back = moved.move_node(&p(&[1]), &p(&[0])).unwrap();
        assert_eq!(back, before);
    }

    #[test]
    fn test_insert_rejects_duplicate_keys() {
        let err = doc().insert_node(&p(&[0, 0]), text("a1", "dup")).unwrap_err();
        assert_eq!(err, ModelError::DuplicateKey(Key::from("a1")));
    }

    #[test]
    fn test_path_after_move_detects_cycles() {
        let d = doc();
        assert!(d.path_after_move(&Key::from("a"), &Key::from("a1"), 0).is_err());
        assert_eq!(
            d.path_after_move(&Key::from("a1"), &Key::from("b"), 1).unwrap(),
            p(&[1, 1])
        );
    }
}
