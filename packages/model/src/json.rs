//! Plain-data schema for construction and snapshots.
//!
//! Every entity serializes as a JSON object tagged with `object`. Node keys
//! are optional on input (missing keys are minted post-order) and are only
//! written out when requested.

use crate::{Data, Key, Leaf, Mark, MarkSet, ModelError, ModelResult, Node, Path, Text};
use crate::node::Element;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Snapshot options for [`crate::Value::to_json`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    pub preserve_keys: bool,
    pub preserve_selection: bool,
}

impl JsonOptions {
    pub fn preserve_all() -> Self {
        Self {
            preserve_keys: true,
            preserve_selection: true,
        }
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn expect_object(found: &Option<String>, expected: &str) -> ModelResult<()> {
    match found.as_deref() {
        None => Ok(()),
        Some(tag) if tag == expected => Ok(()),
        Some(tag) => Err(ModelError::schema(format!(
            "expected object `{expected}`, found `{tag}`"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkJson {
    #[serde(default)]
    pub object: Option<String>,

    #[serde(rename = "type")]
    pub mark_type: String,

    #[serde(default)]
    pub data: Data,
}

impl From<Mark> for MarkJson {
    fn from(mark: Mark) -> Self {
        Self {
            object: Some("mark".to_string()),
            mark_type: mark.mark_type,
            data: mark.data,
        }
    }
}

impl TryFrom<MarkJson> for Mark {
    type Error = ModelError;

    fn try_from(json: MarkJson) -> ModelResult<Self> {
        expect_object(&json.object, "mark")?;
        Ok(Mark {
            mark_type: json.mark_type,
            data: json.data,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeafJson {
    #[serde(default)]
    pub object: Option<String>,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub marks: Vec<MarkJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<MarkJson>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaves: Option<Vec<LeafJson>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    #[serde(rename = "type")]
    pub node_type: String,

    #[serde(default)]
    pub data: Data,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_void: bool,

    #[serde(default)]
    pub nodes: Vec<NodeJson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "object", rename_all = "lowercase")]
pub enum NodeJson {
    Block(ElementJson),
    Inline(ElementJson),
    Text(TextJson),
}

impl NodeJson {
    pub fn key(&self) -> Option<&Key> {
        match self {
            NodeJson::Block(e) | NodeJson::Inline(e) => e.key.as_ref(),
            NodeJson::Text(t) => t.key.as_ref(),
        }
    }

    pub fn strip_keys(&mut self) {
        match self {
            NodeJson::Block(e) | NodeJson::Inline(e) => {
                e.key = None;
                e.nodes.iter_mut().for_each(NodeJson::strip_keys);
            }
            NodeJson::Text(t) => t.key = None,
        }
    }

    /// Explicit keys in this subtree
    pub fn collect_keys(&self, keys: &mut Vec<Key>) {
        if let Some(key) = self.key() {
            keys.push(key.clone());
        }
        if let NodeJson::Block(e) | NodeJson::Inline(e) = self {
            for child in &e.nodes {
                child.collect_keys(keys);
            }
        }
    }
}

impl From<Node> for NodeJson {
    fn from(node: Node) -> Self {
        match node {
            Node::Block(e) => NodeJson::Block(element_to_json(e)),
            Node::Inline(e) => NodeJson::Inline(element_to_json(e)),
            Node::Text(t) => NodeJson::Text(text_to_json(&t)),
        }
    }
}

impl TryFrom<NodeJson> for Node {
    type Error = ModelError;

    fn try_from(json: NodeJson) -> ModelResult<Self> {
        build_node(json, &mut || Err(ModelError::schema("node is missing its key")), false)
    }
}

fn element_to_json(element: Element) -> ElementJson {
    ElementJson {
        key: Some(element.key),
        node_type: element.node_type,
        data: element.data,
        is_void: element.is_void,
        nodes: element
            .nodes
            .into_iter()
            .map(|n| NodeJson::from(Arc::unwrap_or_clone(n)))
            .collect(),
    }
}

fn text_to_json(text: &Text) -> TextJson {
    let leaves = text.leaves();
    match leaves {
        [leaf] => TextJson {
            key: Some(text.key().clone()),
            text: Some(leaf.text.clone()),
            marks: Some(marks_to_json(&leaf.marks)),
            leaves: None,
        },
        _ => TextJson {
            key: Some(text.key().clone()),
            text: None,
            marks: None,
            leaves: Some(
                leaves
                    .iter()
                    .map(|leaf| LeafJson {
                        object: Some("leaf".to_string()),
                        text: leaf.text.clone(),
                        marks: marks_to_json(&leaf.marks),
                    })
                    .collect(),
            ),
        },
    }
}

pub(crate) fn marks_to_json(marks: &MarkSet) -> Vec<MarkJson> {
    marks.iter().cloned().map(MarkJson::from).collect()
}

pub(crate) fn marks_from_json(marks: Vec<MarkJson>) -> ModelResult<MarkSet> {
    marks.into_iter().map(Mark::try_from).collect()
}

/// Build a node bottom-up, asking `mint` for a key wherever none is given.
pub(crate) fn build_node(
    json: NodeJson,
    mint: &mut dyn FnMut() -> ModelResult<Key>,
    in_inline: bool,
) -> ModelResult<Node> {
    match json {
        NodeJson::Text(t) => {
            let leaves = match t.leaves {
                Some(leaves) => leaves
                    .into_iter()
                    .map(|leaf| {
                        expect_object(&leaf.object, "leaf")?;
                        Ok(Leaf::new(leaf.text, marks_from_json(leaf.marks)?))
                    })
                    .collect::<ModelResult<Vec<_>>>()?,
                None => vec![Leaf::new(
                    t.text.unwrap_or_default(),
                    marks_from_json(t.marks.unwrap_or_default())?,
                )],
            };
            let key = match t.key {
                Some(key) => key,
                None => mint()?,
            };
            Ok(Node::Text(Text::from_leaves(key, leaves)))
        }
        NodeJson::Block(e) => {
            if in_inline {
                return Err(ModelError::schema(format!(
                    "block `{}` cannot be nested inside an inline",
                    e.node_type
                )));
            }
            Ok(Node::Block(build_element(e, mint, false)?))
        }
        NodeJson::Inline(e) => Ok(Node::Inline(build_element(e, mint, true)?)),
    }
}

fn build_element(
    json: ElementJson,
    mint: &mut dyn FnMut() -> ModelResult<Key>,
    in_inline: bool,
) -> ModelResult<Element> {
    let nodes = json
        .nodes
        .into_iter()
        .map(|child| build_node(child, mint, in_inline).map(Arc::new))
        .collect::<ModelResult<Vec<_>>>()?;
    let key = match json.key {
        Some(key) => key,
        None => mint()?,
    };
    Ok(Element {
        key,
        node_type: json.node_type,
        data: json.data,
        is_void: json.is_void,
        nodes,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentJson {
    #[serde(default)]
    pub object: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    #[serde(default)]
    pub data: Data,

    #[serde(default)]
    pub nodes: Vec<NodeJson>,
}

impl DocumentJson {
    pub(crate) fn check(&self) -> ModelResult<()> {
        expect_object(&self.object, "document")?;
        for node in &self.nodes {
            if !matches!(node, NodeJson::Block(_)) {
                return Err(ModelError::schema("a document may only contain blocks"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointJson {
    #[serde(default)]
    pub object: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Path>,

    #[serde(default)]
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionJson {
    #[serde(default)]
    pub object: Option<String>,

    pub anchor: PointJson,

    pub focus: PointJson,

    #[serde(default)]
    pub is_focused: bool,

    #[serde(default)]
    pub marks: Option<Vec<MarkJson>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueJson {
    #[serde(default)]
    pub object: Option<String>,

    pub document: DocumentJson,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionJson>,

    #[serde(default, skip_serializing_if = "Data::is_empty")]
    pub data: Data,
}

pub(crate) fn check_point(point: &PointJson) -> ModelResult<()> {
    expect_object(&point.object, "point")
}

pub(crate) fn check_selection(selection: &SelectionJson) -> ModelResult<()> {
    expect_object(&selection.object, "selection")?;
    check_point(&selection.anchor)?;
    check_point(&selection.focus)
}

pub(crate) fn check_value(value: &ValueJson) -> ModelResult<()> {
    expect_object(&value.object, "value")?;
    value.document.check()
}
