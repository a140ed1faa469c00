//! Construction from plain data and JSON snapshots

use quire_model::{JsonOptions, Key, Mark, ModelError, Node, Value};
use serde_json::json;

fn paragraph_value() -> serde_json::Value {
    json!({
        "object": "value",
        "document": {
            "object": "document",
            "nodes": [{
                "object": "block",
                "type": "paragraph",
                "nodes": [{ "object": "text", "text": "one" }]
            }]
        },
        "selection": {
            "object": "selection",
            "anchor": { "object": "point", "path": [0, 0], "offset": 0 },
            "focus": { "object": "point", "path": [0, 0], "offset": 0 },
            "isFocused": false
        }
    })
}

#[test]
fn test_keys_are_assigned_post_order() {
    let value = Value::from_json(&paragraph_value()).unwrap();
    let block = &value.document.nodes()[0];
    assert_eq!(block.nodes()[0].key(), &Key::from("0"));
    assert_eq!(block.key(), &Key::from("1"));
    assert_eq!(value.document.key(), &Key::from("2"));
}

#[test]
fn test_snapshot_with_keys_and_selection() {
    let value = Value::from_json(&paragraph_value()).unwrap();
    let out = value.to_json(&JsonOptions::preserve_all()).unwrap();
    assert_eq!(
        out,
        json!({
            "object": "value",
            "document": {
                "object": "document",
                "key": "2",
                "data": {},
                "nodes": [{
                    "object": "block",
                    "key": "1",
                    "type": "paragraph",
                    "data": {},
                    "nodes": [{ "object": "text", "key": "0", "text": "one", "marks": [] }]
                }]
            },
            "selection": {
                "object": "selection",
                "anchor": { "object": "point", "key": "0", "path": [0, 0], "offset": 0 },
                "focus": { "object": "point", "key": "0", "path": [0, 0], "offset": 0 },
                "isFocused": false,
                "marks": null
            }
        })
    );
}

#[test]
fn test_snapshot_without_keys_round_trips() {
    let value = Value::from_json(&paragraph_value()).unwrap();
    let out = value.to_json(&JsonOptions::default()).unwrap();
    assert!(out.get("selection").is_none());
    assert!(out["document"].get("key").is_none());

    let rebuilt = Value::from_json(&out).unwrap();
    assert_eq!(rebuilt.document, value.document);
}

#[test]
fn test_explicit_keys_are_kept_and_skipped_by_the_generator() {
    let value = Value::from_json(&json!({
        "object": "document",
        "nodes": [{
            "object": "block",
            "key": "5",
            "type": "paragraph",
            "nodes": [{ "object": "text", "text": "a" }]
        }]
    }))
    .unwrap();
    let block = &value.document.nodes()[0];
    assert_eq!(block.key(), &Key::from("5"));
    assert_eq!(block.nodes()[0].key(), &Key::from("6"));
    assert_eq!(value.key_generator().count(), 8);
}

#[test]
fn test_leaves_form_is_accepted() {
    let value = Value::from_json(&json!({
        "object": "document",
        "nodes": [{
            "object": "block",
            "type": "paragraph",
            "nodes": [{
                "object": "text",
                "leaves": [
                    { "object": "leaf", "text": "wo", "marks": [] },
                    { "object": "leaf", "text": "rd", "marks": [{ "object": "mark", "type": "bold" }] }
                ]
            }]
        }]
    }))
    .unwrap();
    let text = value.document.first_text().unwrap();
    assert_eq!(text.text(), "word");
    assert_eq!(text.leaves().len(), 2);
    assert!(text.marks_at(4).contains(&Mark::new("bold")));
}

#[test]
fn test_unknown_object_tag_fails() {
    let err = Value::from_json(&json!({
        "object": "document",
        "nodes": [{ "object": "widget", "type": "x" }]
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::Schema(_)));
}

#[test]
fn test_missing_required_field_fails() {
    let err = Value::from_json(&json!({
        "object": "document",
        "nodes": [{ "object": "block", "nodes": [] }]
    }))
    .unwrap_err();
    match err {
        ModelError::Schema(message) => assert!(message.contains("type")),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_document_holds_blocks_only() {
    let err = Value::from_json(&json!({
        "object": "document",
        "nodes": [{ "object": "text", "text": "loose" }]
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::Schema(_)));
}

#[test]
fn test_duplicate_keys_fail() {
    let err = Value::from_json(&json!({
        "object": "document",
        "nodes": [
            { "object": "block", "key": "a", "type": "p", "nodes": [{ "object": "text", "key": "t" }] },
            { "object": "block", "key": "b", "type": "p", "nodes": [{ "object": "text", "key": "t" }] }
        ]
    }))
    .unwrap_err();
    assert!(matches!(err, ModelError::Schema(_)));
}

#[test]
fn test_void_flag_is_written_only_when_set() {
    let value = Value::from_json(&json!({
        "object": "document",
        "nodes": [
            { "object": "block", "type": "image", "isVoid": true, "nodes": [{ "object": "text" }] },
            { "object": "block", "type": "paragraph", "nodes": [{ "object": "text", "text": "x" }] }
        ]
    }))
    .unwrap();
    assert!(value.document.nodes()[0].is_void());
    let out = value.to_json(&JsonOptions::default()).unwrap();
    assert_eq!(out["document"]["nodes"][0]["isVoid"], json!(true));
    assert!(out["document"]["nodes"][1].get("isVoid").is_none());
}

#[test]
fn test_nodes_serialize_for_operation_logs() {
    let value = Value::from_json(&paragraph_value()).unwrap();
    let block: &Node = &value.document.nodes()[0];
    let json = serde_json::to_string(block).unwrap();
    let back: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(&back, block);
}
