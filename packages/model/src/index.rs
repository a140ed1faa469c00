use crate::{Key, Node, Path};
use std::collections::HashMap;
use std::sync::Arc;

/// Key to path lookup for one document version.
///
/// Built lazily on first lookup and carried over to the next document
/// version only when an edit leaves the tree shape and keys untouched.
#[derive(Debug, Clone, Default)]
pub struct KeyIndex {
    paths: HashMap<Key, Path>,
}

impl KeyIndex {
    pub fn build(document_key: &Key, nodes: &[Arc<Node>]) -> Self {
        let mut paths = HashMap::new();
        paths.insert(document_key.clone(), Path::root());
        let mut stack: Vec<(Path, &Node)> = nodes
            .iter()
            .enumerate()
            .rev()
            .map(|(i, n)| (Path::new(vec![i]), n.as_ref()))
            .collect();
        while let Some((path, node)) = stack.pop() {
            for (i, child) in node.nodes().iter().enumerate().rev() {
                stack.push((path.child(i), child.as_ref()));
            }
            paths.entry(node.key().clone()).or_insert(path);
        }
        tracing::trace!(entries = paths.len(), "built key index");
        Self { paths }
    }

    pub fn get(&self, key: &Key) -> Option<&Path> {
        self.paths.get(key)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.paths.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}
