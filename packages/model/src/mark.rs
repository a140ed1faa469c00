use crate::json::MarkJson;
use serde::{Deserialize, Serialize};

/// Free-form data mapping attached to marks, elements and values.
pub type Data = serde_json::Map<String, serde_json::Value>;

/// A formatting annotation such as bold. Equality is structural over the
/// type and the data mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MarkJson", into = "MarkJson")]
pub struct Mark {
    pub mark_type: String,
    pub data: Data,
}

impl Mark {
    pub fn new(mark_type: impl Into<String>) -> Self {
        Self {
            mark_type: mark_type.into(),
            data: Data::new(),
        }
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    /// Copy of this mark with the given properties overridden.
    pub fn merge(&self, properties: &MarkProperties) -> Mark {
        Mark {
            mark_type: properties
                .mark_type
                .clone()
                .unwrap_or_else(|| self.mark_type.clone()),
            data: properties.data.clone().unwrap_or_else(|| self.data.clone()),
        }
    }

    /// The properties that turn `updated` back into this mark.
    pub fn diff(&self, updated: &Mark) -> MarkProperties {
        MarkProperties {
            mark_type: (self.mark_type != updated.mark_type).then(|| self.mark_type.clone()),
            data: (self.data != updated.data).then(|| self.data.clone()),
        }
    }
}

/// Partial update for a mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkProperties {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub mark_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Data>,
}

/// Unordered set of marks. Insertion order is kept for output only; equality
/// ignores it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Mark>", into = "Vec<Mark>")]
pub struct MarkSet(Vec<Mark>);

impl MarkSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, mark: &Mark) -> bool {
        self.0.contains(mark)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mark> {
        self.0.iter()
    }

    /// Returns `false` when the mark was already present.
    pub fn insert(&mut self, mark: Mark) -> bool {
        if self.contains(&mark) {
            return false;
        }
        self.0.push(mark);
        true
    }

    /// Returns `false` when the mark was absent.
    pub fn remove(&mut self, mark: &Mark) -> bool {
        let before = self.0.len();
        self.0.retain(|m| m != mark);
        self.0.len() != before
    }

    pub fn with(&self, mark: &Mark) -> MarkSet {
        let mut set = self.clone();
        set.insert(mark.clone());
        set
    }

    pub fn without(&self, mark: &Mark) -> MarkSet {
        let mut set = self.clone();
        set.remove(mark);
        set
    }

    /// Swap `old` for `new`, leaving the set untouched when `old` is absent.
    pub fn replace(&self, old: &Mark, new: &Mark) -> MarkSet {
        if !self.contains(old) {
            return self.clone();
        }
        let mut set = self.without(old);
        set.insert(new.clone());
        set
    }

    pub fn union(&self, other: &MarkSet) -> MarkSet {
        let mut set = self.clone();
        for mark in other.iter() {
            set.insert(mark.clone());
        }
        set
    }

    pub fn intersection(&self, other: &MarkSet) -> MarkSet {
        MarkSet(self.0.iter().filter(|m| other.contains(m)).cloned().collect())
    }

    pub fn to_vec(&self) -> Vec<Mark> {
        self.0.clone()
    }
}

impl PartialEq for MarkSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|m| other.contains(m))
    }
}

impl Eq for MarkSet {}

impl FromIterator<Mark> for MarkSet {
    fn from_iter<I: IntoIterator<Item = Mark>>(iter: I) -> Self {
        let mut set = MarkSet::new();
        for mark in iter {
            set.insert(mark);
        }
        set
    }
}

impl From<Vec<Mark>> for MarkSet {
    fn from(marks: Vec<Mark>) -> Self {
        marks.into_iter().collect()
    }
}

impl From<MarkSet> for Vec<Mark> {
    fn from(set: MarkSet) -> Self {
        set.0
    }
}

impl<'a> IntoIterator for &'a MarkSet {
    type Item = &'a Mark;
    type IntoIter = std::slice::Iter<'a, Mark>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
