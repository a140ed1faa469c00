use crate::json::{
    build_node, check_selection, check_value, marks_from_json, marks_to_json, DocumentJson,
    JsonOptions, NodeJson, PointJson, SelectionJson, ValueJson,
};
use crate::{Data, Document, Key, KeyGenerator, ModelError, ModelResult, Node, Point, Selection};
use std::collections::HashSet;
use std::sync::Arc;

/// An immutable snapshot: a document, a selection into it, and free-form
/// data. Cloning is cheap; the node tree is shared.
#[derive(Debug, Clone)]
pub struct Value {
    pub document: Document,
    pub selection: Selection,
    pub data: Data,
    keys: KeyGenerator,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
            && self.selection == other.selection
            && self.data == other.data
    }
}

impl Eq for Value {}

impl Value {
    /// Wrap a document. The key generator is advanced past every key in it
    /// and the selection is resolved against it.
    pub fn new(document: Document, selection: Selection) -> Self {
        let mut keys = KeyGenerator::new();
        for key in document.keys() {
            keys.observe(&key);
        }
        let selection = selection.normalize(&document);
        Self {
            document,
            selection,
            data: Data::new(),
            keys,
        }
    }

    pub fn from_document(document: Document) -> Self {
        Self::new(document, Selection::default())
    }

    pub fn with_data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    pub fn with_key_generator(mut self, keys: KeyGenerator) -> Self {
        self.keys = keys;
        self
    }

    pub fn key_generator(&self) -> &KeyGenerator {
        &self.keys
    }

    pub fn key_generator_mut(&mut self) -> &mut KeyGenerator {
        &mut self.keys
    }

    pub fn text(&self) -> String {
        self.document.text()
    }

    /// Build a value from its plain-data description. Accepts either a
    /// `value` object or a bare `document`. Missing keys are minted in
    /// post-order, after every explicitly supplied key.
    pub fn from_json(json: &serde_json::Value) -> ModelResult<Value> {
        let parsed: ValueJson = match json.get("object").and_then(|o| o.as_str()) {
            Some("document") => ValueJson {
                object: None,
                document: serde_json::from_value(json.clone())?,
                selection: None,
                data: Data::new(),
            },
            _ => serde_json::from_value(json.clone())?,
        };
        check_value(&parsed)?;

        let mut keys = KeyGenerator::new();
        let mut explicit = Vec::new();
        for node in &parsed.document.nodes {
            node.collect_keys(&mut explicit);
        }
        explicit.extend(parsed.document.key.iter().cloned());
        for key in &explicit {
            keys.observe(key);
        }

        let nodes = parsed
            .document
            .nodes
            .into_iter()
            .map(|node| build_node(node, &mut || Ok(keys.new_key()), false).map(Arc::new))
            .collect::<ModelResult<Vec<_>>>()?;
        let document_key = match parsed.document.key {
            Some(key) => key,
            None => keys.new_key(),
        };
        let document = Document::from_parts(document_key, parsed.document.data, nodes);
        check_unique_keys(&document)?;

        let selection = match parsed.selection {
            Some(selection) => selection_from_json(&document, selection)?,
            None => Selection::default(),
        };
        let selection = selection.normalize(&document);

        tracing::debug!(nodes = document.nodes().len(), "constructed value");
        Ok(Value {
            document,
            selection,
            data: parsed.data,
            keys,
        })
    }

    /// Build a detached node from its plain-data description, minting any
    /// missing keys from this value's generator.
    pub fn node_from_json(&mut self, json: &serde_json::Value) -> ModelResult<Node> {
        let parsed: NodeJson = serde_json::from_value(json.clone())?;
        let mut explicit = Vec::new();
        parsed.collect_keys(&mut explicit);
        for key in &explicit {
            self.keys.observe(key);
        }
        let keys = &mut self.keys;
        build_node(parsed, &mut || Ok(keys.new_key()), false)
    }

    pub fn from_json_str(source: &str) -> ModelResult<Value> {
        let json: serde_json::Value = serde_json::from_str(source)?;
        Self::from_json(&json)
    }

    /// Plain-data snapshot. Keys and the selection are left out unless
    /// requested.
    pub fn to_json(&self, options: &JsonOptions) -> ModelResult<serde_json::Value> {
        let snapshot = ValueJson {
            object: Some("value".to_string()),
            document: document_to_json(&self.document, options),
            selection: options
                .preserve_selection
                .then(|| self.selection_to_json(options)),
            data: self.data.clone(),
        };
        serde_json::to_value(snapshot).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    fn selection_to_json(&self, options: &JsonOptions) -> SelectionJson {
        SelectionJson {
            object: Some("selection".to_string()),
            anchor: point_to_json(&self.document, &self.selection.anchor, options),
            focus: point_to_json(&self.document, &self.selection.focus, options),
            is_focused: self.selection.is_focused,
            marks: self.selection.marks.as_ref().map(marks_to_json),
        }
    }
}

/// Plain-data snapshot of a document
pub fn document_to_json(document: &Document, options: &JsonOptions) -> DocumentJson {
    let nodes = document
        .nodes()
        .iter()
        .map(|node| {
            let mut json = NodeJson::from(node.as_ref().clone());
            if !options.preserve_keys {
                json.strip_keys();
            }
            json
        })
        .collect();
    DocumentJson {
        object: Some("document".to_string()),
        key: options.preserve_keys.then(|| document.key().clone()),
        data: document.data().clone(),
        nodes,
    }
}

fn point_to_json(document: &Document, point: &Point, options: &JsonOptions) -> PointJson {
    PointJson {
        object: Some("point".to_string()),
        key: point.key.clone().filter(|_| options.preserve_keys),
        path: point.key.as_ref().and_then(|k| document.path_of(k).ok()),
        offset: point.offset,
    }
}

fn point_from_json(document: &Document, point: PointJson) -> ModelResult<Point> {
    let key = match (point.key, point.path) {
        (Some(key), _) => Some(key),
        (None, Some(path)) => Some(document.node_at(&path)?.key().clone()),
        (None, None) => None,
    };
    Ok(Point {
        key,
        offset: point.offset,
    })
}

fn selection_from_json(document: &Document, json: SelectionJson) -> ModelResult<Selection> {
    check_selection(&json)?;
    Ok(Selection {
        anchor: point_from_json(document, json.anchor)?,
        focus: point_from_json(document, json.focus)?,
        is_backward: false,
        is_focused: json.is_focused,
        marks: json.marks.map(marks_from_json).transpose()?,
    })
}

fn check_unique_keys(document: &Document) -> ModelResult<()> {
    let mut seen: HashSet<Key> = HashSet::new();
    for key in document.keys() {
        if !seen.insert(key.clone()) {
            return Err(ModelError::schema(format!("duplicate key `{key}`")));
        }
    }
    Ok(())
}
