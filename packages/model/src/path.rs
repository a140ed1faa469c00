use serde::{Deserialize, Serialize};
use std::fmt;

/// Child indices from the document root to a node.
///
/// Ordering is lexicographic, which is exactly document (pre-order) order:
/// an ancestor sorts before its descendants, and earlier siblings sort before
/// later ones. A path is only meaningful against the tree it was computed
/// from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<usize>);

impl Path {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<usize> {
        self.0.last().copied()
    }

    pub fn parent(&self) -> Option<Path> {
        if self.0.is_empty() {
            return None;
        }
        Some(Path(self.0[..self.0.len() - 1].to_vec()))
    }

    pub fn child(&self, index: usize) -> Path {
        let mut indices = self.0.clone();
        indices.push(index);
        Path(indices)
    }

    pub fn next_sibling(&self) -> Option<Path> {
        let last = self.last()?;
        let mut indices = self.0.clone();
        *indices.last_mut()? = last + 1;
        Some(Path(indices))
    }

    pub fn previous_sibling(&self) -> Option<Path> {
        let last = self.last()?.checked_sub(1)?;
        let mut indices = self.0.clone();
        *indices.last_mut()? = last;
        Some(Path(indices))
    }

    /// Strict ancestry: a path is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        self.0.len() < other.0.len() && other.0.starts_with(&self.0)
    }

    /// Ancestry or equality.
    pub fn contains(&self, other: &Path) -> bool {
        other.0.starts_with(&self.0)
    }

    pub fn is_sibling_of(&self, other: &Path) -> bool {
        self.0.len() == other.0.len() && self.parent() == other.parent() && self != other
    }

    /// Longest shared prefix of two paths.
    pub fn common(&self, other: &Path) -> Path {
        let shared = self
            .0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count();
        Path(self.0[..shared].to_vec())
    }

    /// Where this path points once the node at `removed` is taken out of the
    /// tree. Returns `None` when this path lies inside the removed subtree.
    pub fn transform_after_removal(&self, removed: &Path) -> Option<Path> {
        if removed.contains(self) {
            return None;
        }
        let depth = removed.len() - 1;
        let mut indices = self.0.clone();
        if indices.len() > depth
            && indices[..depth] == removed.0[..depth]
            && indices[depth] > removed.0[depth]
        {
            indices[depth] -= 1;
        }
        Some(Path(indices))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<usize>> for Path {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl From<&[usize]> for Path {
    fn from(indices: &[usize]) -> Self {
        Self(indices.to_vec())
    }
}
