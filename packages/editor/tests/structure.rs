//! Splitting, inserting, wrapping and moving nodes

mod common;

use common::*;
use quire_editor::{Change, EditorError, OperationError};
use quire_model::{Key, NodeProperties};
use serde_json::json;

#[test]
fn test_split_block_moves_cursor_into_new_block() {
    let value = value_at(vec![paragraph("t", "onetwo")], "t", 3);
    let mut change = Change::new(value);
    change.split_block(1).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_texts(&value), vec!["one", "two"]);
    let second = value.document.nodes()[1].first_text().unwrap();
    assert_eq!(value.selection.anchor.key.as_ref(), Some(second.key()));
    assert_eq!(value.selection.anchor.offset, 0);
}

#[test]
fn test_split_block_in_middle_of_word() {
    let value = value_at(vec![paragraph("t", "word")], "t", 2);
    let mut change = Change::new(value);
    change.split_block(1).unwrap();
    assert_eq!(block_texts(&change.apply().unwrap()), vec!["wo", "rd"]);
}

#[test]
fn test_split_block_inside_quote() {
    let value = value_at(
        vec![block("quote", vec![paragraph("t", "onetwo")])],
        "t",
        3,
    );
    let mut change = Change::new(value.clone());
    change.split_block(1).unwrap();
    let inner = change.apply().unwrap();
    assert_eq!(block_types(&inner), vec!["quote"]);
    assert_eq!(inner.document.nodes()[0].nodes().len(), 2);

    let mut change = Change::new(value);
    change.split_block(2).unwrap();
    let outer = change.apply().unwrap();
    assert_eq!(block_types(&outer), vec!["quote", "quote"]);
    assert_eq!(block_texts(&outer), vec!["one", "two"]);
}

#[test]
fn test_insert_block_in_middle_of_text() {
    let value = value_at(vec![paragraph("t", "onetwo")], "t", 3);
    let mut change = Change::new(value);
    let heading = change
        .node_from_json(&json!({ "object": "block", "type": "heading" }))
        .unwrap();
    change.insert_block(heading).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_texts(&value), vec!["one", "", "two"]);
    assert_eq!(block_types(&value), vec!["paragraph", "heading", "paragraph"]);
    let heading_text = value.document.nodes()[1].first_text().unwrap();
    assert_eq!(value.selection.anchor.key.as_ref(), Some(heading_text.key()));
}

#[test]
fn test_insert_void_inline() {
    let value = value_at(vec![paragraph("t", "onetwo")], "t", 3);
    let mut change = Change::new(value);
    let mention = change
        .node_from_json(&json!({ "object": "inline", "type": "mention", "isVoid": true }))
        .unwrap();
    change.insert_inline(mention).unwrap();
    let value = change.apply().unwrap();

    let paragraph = &value.document.nodes()[0];
    assert_eq!(paragraph.nodes().len(), 3);
    assert_eq!(paragraph.nodes()[1].node_type(), Some("mention"));
    assert!(paragraph.nodes()[1].is_void());
    assert_eq!(value.text(), "onetwo");
}

#[test]
fn test_insert_block_rejects_inline() {
    let value = value_at(vec![paragraph("t", "one")], "t", 1);
    let mut change = Change::new(value);
    let link = change
        .node_from_json(&json!({ "object": "inline", "type": "link" }))
        .unwrap();
    assert!(matches!(
        change.insert_block(link),
        Err(EditorError::InvalidCommand(_))
    ));
}

#[test]
fn test_set_blocks_across_selection() {
    let value = value_between(
        vec![paragraph("t1", "one"), paragraph("t2", "two"), paragraph("t3", "three")],
        ("t1", 1),
        ("t2", 1),
    );
    let mut change = Change::new(value);
    change.set_blocks(NodeProperties::with_type("heading")).unwrap();
    let value = change.apply().unwrap();
    assert_eq!(block_types(&value), vec!["heading", "heading", "paragraph"]);
}

#[test]
fn test_wrap_and_unwrap_block() {
    let value = value_between(vec![paragraph("t1", "one"), paragraph("t2", "two")], ("t1", 0), ("t2", 1));

    let mut change = Change::new(value);
    let wrapper = change
        .node_from_json(&json!({ "object": "block", "type": "quote" }))
        .unwrap();
    change.wrap_block(wrapper).unwrap();
    assert_eq!(block_types(change.value()), vec!["quote"]);
    assert_eq!(change.document().nodes()[0].nodes().len(), 2);

    change.unwrap_block(NodeProperties::with_type("quote")).unwrap();
    let value = change.apply().unwrap();
    assert_eq!(block_types(&value), vec!["paragraph", "paragraph"]);
    assert_eq!(block_texts(&value), vec!["one", "two"]);
}

#[test]
fn test_unwrap_block_in_middle_splits_wrapper() {
    let value = value_at(
        vec![block(
            "list",
            vec![paragraph("a", "a"), paragraph("b", "b"), paragraph("c", "c")],
        )],
        "b",
        0,
    );
    let mut change = Change::new(value);
    change.unwrap_block(NodeProperties::with_type("list")).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_types(&value), vec!["list", "paragraph", "list"]);
    assert_eq!(block_texts(&value), vec!["a", "b", "c"]);
}

#[test]
fn test_wrap_and_unwrap_inline() {
    let value = value_between(vec![paragraph("t", "one two three")], ("t", 4), ("t", 7));
    let mut change = Change::new(value);
    let link = change
        .node_from_json(&json!({ "object": "inline", "type": "link" }))
        .unwrap();
    change.wrap_inline(link).unwrap();

    let paragraph = &change.document().nodes()[0];
    assert_eq!(paragraph.nodes().len(), 3);
    assert_eq!(paragraph.nodes()[1].node_type(), Some("link"));
    assert_eq!(paragraph.nodes()[1].text_content(), "two");

    let selection = change.selection().clone();
    let selected = change.document().text_node(selection.anchor.key.as_ref().unwrap()).unwrap();
    assert_eq!(selected.text(), "two");
    assert_eq!((selection.anchor.offset, selection.focus.offset), (0, 3));

    change.unwrap_inline(NodeProperties::with_type("link")).unwrap();
    let value = change.apply().unwrap();
    assert_eq!(value.document.nodes()[0].nodes().len(), 1);
    assert_eq!(value.text(), "one two three");
}

#[test]
fn test_wrap_text_keeps_content_selected() {
    let value = value_between(vec![paragraph("t", "one two")], ("t", 4), ("t", 7));
    let mut change = Change::new(value);
    change.wrap_text("**", "**").unwrap();
    let value = change.apply().unwrap();

    assert_eq!(value.text(), "one **two**");
    assert_eq!(value.selection.anchor.offset, 6);
    assert_eq!(value.selection.focus.offset, 9);
}

#[test]
fn test_wrap_text_inside_word() {
    let value = value_between(vec![paragraph("t", "word")], ("t", 1), ("t", 3));
    let mut change = Change::new(value);
    change.wrap_text("[[", "]]").unwrap();
    let value = change.apply().unwrap();

    assert_eq!(value.text(), "w[[or]]d");
    assert_eq!(value.selection.start().offset, 3);
    assert_eq!(value.selection.end().offset, 5);
}

#[test]
fn test_move_node_reorders_blocks() {
    let value = value_at(vec![paragraph("t1", "one"), paragraph("t2", "two")], "t1", 0);
    let document_key = value.document.key().clone();
    let second = value.document.nodes()[1].key().clone();

    let mut change = Change::new(value);
    change.move_node_by_key(&second, &document_key, 0).unwrap();
    assert_eq!(block_texts(&change.apply().unwrap()), vec!["two", "one"]);
}

#[test]
fn test_move_node_into_itself_is_rejected() {
    let value = value_at(vec![block("quote", vec![paragraph("t", "one")])], "t", 0);
    let quote = value.document.nodes()[0].key().clone();
    let inner = value.document.nodes()[0].nodes()[0].key().clone();

    let mut change = Change::new(value);
    assert!(matches!(
        change.move_node_by_key(&quote, &inner, 0),
        Err(EditorError::InvalidCommand(OperationError::CycleDetected))
    ));
    assert!(matches!(
        change.move_node_by_key(&quote, &quote, 0),
        Err(EditorError::InvalidCommand(OperationError::CycleDetected))
    ));
    assert!(change.operations().is_empty());
}

#[test]
fn test_merge_and_split_by_key() {
    let value = value_at(vec![paragraph("t1", "one"), paragraph("t2", "two")], "t1", 0);
    let second = value.document.nodes()[1].key().clone();

    let mut change = Change::new(value);
    change.merge_node_by_key(&second).unwrap();
    assert_eq!(block_texts(change.value()), vec!["onetwo"]);

    let first = change.document().nodes()[0].key().clone();
    change.split_descendants_by_key(&first, &Key::from("t1"), 3).unwrap();
    assert_eq!(block_texts(change.value()), vec!["one", "two"]);
    assert_eq!(change.document().text_node(&Key::from("t1")).unwrap().text(), "one");
}
