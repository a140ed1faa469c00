//! Deleting at the cursor and across ranges

mod common;

use common::*;
use quire_editor::{Change, Editor};
use quire_model::{Key, ObjectKind, Point};
use serde_json::json;

#[test]
fn test_delete_char_backward_removes_whole_emoji() {
    let value = value_at(vec![paragraph("t", "tw\u{1F4DB}o")], "t", 3);
    let mut change = Change::new(value);
    change.delete_char_backward().unwrap();
    let value = change.apply().unwrap();

    assert_eq!(value.text(), "two");
    assert_eq!(value.selection.anchor, Point::new(Key::from("t"), 2));
}

#[test]
fn test_delete_char_forward_keeps_combining_marks_together() {
    let value = value_at(vec![paragraph("t", "cafe\u{0301}s")], "t", 3);
    let mut change = Change::new(value);
    change.delete_char_forward().unwrap();
    assert_eq!(change.apply().unwrap().text(), "cafs");
}

#[test]
fn test_delete_backward_at_start_of_block_joins_blocks() {
    let value = value_at(vec![paragraph("t1", "one"), paragraph("t2", "two")], "t2", 0);
    let mut change = Change::new(value);
    change.delete_backward(1).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_texts(&value), vec!["onetwo"]);
    assert_eq!(value.selection.anchor, Point::new(Key::from("t1"), 3));
}

#[test]
fn test_delete_forward_at_end_of_block_joins_blocks() {
    let value = value_at(vec![paragraph("t1", "one"), paragraph("t2", "two")], "t1", 3);
    let mut change = Change::new(value);
    change.delete_forward(1).unwrap();
    assert_eq!(block_texts(&change.apply().unwrap()), vec!["onetwo"]);
}

#[test]
fn test_delete_forward_joins_block_holding_inline() {
    let value = value_at(
        vec![
            paragraph("t1", "one"),
            block(
                "paragraph",
                vec![text("t2", "two"), inline("link", vec![text("t3", "three")]), text("t4", "four")],
            ),
        ],
        "t1",
        3,
    );
    let mut change = Change::new(value);
    change.delete_forward(1).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(value.document.nodes().len(), 1);
    let children = value.document.nodes()[0].nodes();
    let kinds: Vec<_> = children.iter().map(|node| node.object()).collect();
    assert_eq!(kinds, vec![ObjectKind::Text, ObjectKind::Inline, ObjectKind::Text]);
    assert_eq!(children[0].text_content(), "onetwo");
    assert_eq!(children[1].text_content(), "three");
    assert_eq!(children[2].text_content(), "four");
}

#[test]
fn test_delete_backward_at_start_of_document_does_nothing() {
    let value = value_at(vec![paragraph("t", "one")], "t", 0);
    let mut change = Change::new(value);
    change.delete_backward(1).unwrap();
    let commit = change.commit().unwrap();
    assert!(commit.batch.is_empty());
    assert_eq!(commit.value.text(), "one");
}

#[test]
fn test_delete_backward_removes_previous_void_block() {
    let value = value_at(
        vec![paragraph("a", "a"), void_block("image", "v"), paragraph("b", "b")],
        "b",
        0,
    );
    let mut change = Change::new(value);
    change.delete_backward(1).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_texts(&value), vec!["a", "b"]);
    assert_eq!(block_types(&value), vec!["paragraph", "paragraph"]);
}

#[test]
fn test_delete_inside_void_block_removes_it() {
    let value = value_at(
        vec![paragraph("a", "a"), void_block("image", "v"), paragraph("b", "b")],
        "v",
        0,
    );
    let mut change = Change::new(value);
    change.delete_forward(1).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_types(&value), vec!["paragraph", "paragraph"]);
    assert_eq!(value.selection.anchor, Point::new(Key::from("a"), 1));
}

#[test]
fn test_delete_backward_after_lone_void_inline_leaves_empty_text() {
    let value = value_at(
        vec![
            paragraph("x", "x"),
            block(
                "paragraph",
                vec![text("a", ""), void_inline("emoji", "v"), text("b", "")],
            ),
        ],
        "b",
        0,
    );
    let mut change = Change::new(value);
    change.delete_backward(1).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_texts(&value), vec!["x", ""]);
    let paragraph = &value.document.nodes()[1];
    assert_eq!(paragraph.nodes().len(), 1);
    assert!(paragraph.nodes()[0].is_text());
}

#[test]
fn test_delete_backward_from_start_of_inline_reaches_previous_text() {
    let value = value_at(
        vec![block(
            "paragraph",
            vec![text("a", "one"), inline("link", vec![text("l", "two")]), text("b", "")],
        )],
        "l",
        0,
    );
    let mut change = Change::new(value);
    change.delete_backward(1).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(value.text(), "ontwo");
    let paragraph = &value.document.nodes()[0];
    assert_eq!(paragraph.nodes()[1].node_type(), Some("link"));
    assert_eq!(paragraph.nodes()[1].text_content(), "two");
}

#[test]
fn test_delete_word_backward() {
    let value = value_at(vec![paragraph("t", "one two three")], "t", 13);
    let mut change = Change::new(value);
    change.delete_word_backward().unwrap();
    assert_eq!(change.apply().unwrap().text(), "one two ");
}

#[test]
fn test_delete_word_forward_skips_leading_space() {
    let value = value_at(vec![paragraph("t", "one two three")], "t", 3);
    let mut change = Change::new(value);
    change.delete_word_forward().unwrap();
    assert_eq!(change.apply().unwrap().text(), "one three");
}

#[test]
fn test_delete_line_backward_and_forward() {
    let value = value_at(vec![paragraph("t", "one two")], "t", 4);
    let mut change = Change::new(value.clone());
    change.delete_line_backward().unwrap();
    assert_eq!(change.apply().unwrap().text(), "two");

    let mut change = Change::new(value);
    change.delete_line_forward().unwrap();
    assert_eq!(change.apply().unwrap().text(), "one ");
}

#[test]
fn test_delete_word_backward_at_block_start_joins() {
    let value = value_at(vec![paragraph("t1", "one"), paragraph("t2", "two")], "t2", 0);
    let mut change = Change::new(value);
    change.delete_word_backward().unwrap();
    assert_eq!(block_texts(&change.apply().unwrap()), vec!["onetwo"]);
}

#[test]
fn test_delete_across_blocks() {
    let value = value_between(
        vec![paragraph("t1", "one"), paragraph("t2", "two"), paragraph("t3", "three")],
        ("t1", 1),
        ("t3", 2),
    );
    let mut change = Change::new(value);
    change.delete().unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_texts(&value), vec!["oree"]);
    assert!(value.selection.is_collapsed());
    assert_eq!(value.selection.anchor, Point::new(Key::from("t1"), 1));
}

#[test]
fn test_delete_hanging_range_removes_start_block() {
    let value = value_between(vec![paragraph("t1", "one"), paragraph("t2", "two")], ("t1", 0), ("t2", 0));
    let mut change = Change::new(value);
    change.delete().unwrap();
    let value = change.apply().unwrap();

    assert_eq!(block_texts(&value), vec!["two"]);
    assert_eq!(value.selection.anchor, Point::new(Key::from("t2"), 0));
}

#[test]
fn test_typing_over_selection_replaces_it() {
    let value = value_between(vec![paragraph("t", "one two")], ("t", 4), ("t", 7));
    let mut change = Change::new(value);
    change.insert_text("three", None).unwrap();
    let value = change.apply().unwrap();

    assert_eq!(value.text(), "one three");
    assert_eq!(value.selection.anchor, Point::new(Key::from("t"), 9));
}

#[test]
fn test_editor_delete_commands() {
    let value = value_at(vec![paragraph("t", "tw\u{1F4DB}o")], "t", 3);
    let mut editor = Editor::new(value).unwrap();
    editor.command("deleteCharBackward", &[]).unwrap();
    assert_eq!(editor.value().text(), "two");

    editor.command("deleteBackward", &[json!(2)]).unwrap();
    assert_eq!(editor.value().text(), "o");
}
