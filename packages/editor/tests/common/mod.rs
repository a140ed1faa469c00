//! Fixture helpers shared by the integration tests

#![allow(dead_code)]

use quire_model::{Key, Selection, Value};
use serde_json::{json, Value as Json};

/// A text node description with an explicit key.
pub fn text(key: &str, content: &str) -> Json {
    json!({ "object": "text", "key": key, "text": content })
}

pub fn block(node_type: &str, nodes: Vec<Json>) -> Json {
    json!({ "object": "block", "type": node_type, "nodes": nodes })
}

pub fn paragraph(key: &str, content: &str) -> Json {
    block("paragraph", vec![text(key, content)])
}

pub fn inline(node_type: &str, nodes: Vec<Json>) -> Json {
    json!({ "object": "inline", "type": node_type, "nodes": nodes })
}

pub fn void_block(node_type: &str, key: &str) -> Json {
    json!({ "object": "block", "type": node_type, "isVoid": true, "nodes": [text(key, "")] })
}

pub fn void_inline(node_type: &str, key: &str) -> Json {
    json!({ "object": "inline", "type": node_type, "isVoid": true, "nodes": [text(key, "")] })
}

/// A value holding `blocks` with the cursor at `key`/`offset`.
pub fn value_at(blocks: Vec<Json>, key: &str, offset: usize) -> Value {
    value_between(blocks, (key, offset), (key, offset))
}

pub fn value_between(blocks: Vec<Json>, anchor: (&str, usize), focus: (&str, usize)) -> Value {
    Value::from_json(&json!({
        "object": "value",
        "document": { "object": "document", "nodes": blocks },
        "selection": {
            "object": "selection",
            "anchor": { "object": "point", "key": anchor.0, "offset": anchor.1 },
            "focus": { "object": "point", "key": focus.0, "offset": focus.1 },
            "isFocused": true
        }
    }))
    .unwrap()
}

/// Text of each top-level block.
pub fn block_texts(value: &Value) -> Vec<String> {
    value
        .document
        .nodes()
        .iter()
        .map(|node| node.text_content())
        .collect()
}

pub fn block_types(value: &Value) -> Vec<String> {
    value
        .document
        .nodes()
        .iter()
        .filter_map(|node| node.node_type().map(str::to_string))
        .collect()
}

pub fn collapsed(key: &str, offset: usize) -> Selection {
    Selection::collapsed(Key::from(key), offset)
}

pub fn range(anchor: (&str, usize), focus: (&str, usize)) -> Selection {
    Selection::new(
        quire_model::Point::new(Key::from(anchor.0), anchor.1),
        quire_model::Point::new(Key::from(focus.0), focus.1),
    )
}
