//! Tree queries over a small document

use quire_model::{Key, Mark, MarkSet, Node, Path, Point, Selection, Value};
use serde_json::json;

/// <paragraph key=p1>one<link key=l>two</link>three</paragraph>
/// <quote key=q><paragraph key=p2>four</paragraph></quote>
fn value() -> Value {
    Value::from_json(&json!({
        "object": "document",
        "key": "doc",
        "nodes": [
            {
                "object": "block", "key": "p1", "type": "paragraph",
                "nodes": [
                    { "object": "text", "key": "t1", "text": "one" },
                    {
                        "object": "inline", "key": "l", "type": "link",
                        "nodes": [{ "object": "text", "key": "t2", "text": "two", "marks": [{ "type": "bold" }] }]
                    },
                    { "object": "text", "key": "t3", "text": "three" }
                ]
            },
            {
                "object": "block", "key": "q", "type": "quote",
                "nodes": [{
                    "object": "block", "key": "p2", "type": "paragraph",
                    "nodes": [{ "object": "text", "key": "t4", "text": "four" }]
                }]
            }
        ]
    }))
    .unwrap()
}

fn k(key: &str) -> Key {
    Key::from(key)
}

fn range(anchor: (&str, usize), focus: (&str, usize), value: &Value) -> Selection {
    Selection::new(Point::new(k(anchor.0), anchor.1), Point::new(k(focus.0), focus.1))
        .normalize(&value.document)
}

#[test]
fn test_paths_and_lookup() {
    let v = value();
    let doc = &v.document;
    assert_eq!(doc.path_of(&k("t2")).unwrap(), Path::from(vec![0, 1, 0]));
    assert_eq!(doc.path_of(&k("doc")).unwrap(), Path::root());
    assert_eq!(doc.node(&k("t4")).unwrap().text_content(), "four");
    assert!(doc.node(&k("missing")).unwrap_err().is_not_found());
}

#[test]
fn test_parent_and_closest() {
    let v = value();
    let doc = &v.document;
    assert_eq!(doc.parent(&k("t2")).unwrap().key(), &k("l"));
    assert_eq!(doc.parent(&k("p1")).unwrap().key(), &k("doc"));
    assert_eq!(doc.closest_block(&k("t2")).unwrap().map(Node::key), Some(&k("p1")));
    assert_eq!(doc.closest_inline(&k("t2")).unwrap().map(Node::key), Some(&k("l")));
    assert_eq!(doc.closest_block(&k("t4")).unwrap().map(Node::key), Some(&k("p2")));
    let outer = doc
        .closest(&k("t4"), |n| n.node_type() == Some("quote"))
        .unwrap();
    assert_eq!(outer.map(Node::key), Some(&k("q")));
    assert!(doc.closest(&k("p1"), |_| true).unwrap().is_none());
}

#[test]
fn test_text_navigation() {
    let v = value();
    let doc = &v.document;
    let keys: Vec<String> = doc.texts().map(|t| t.key().to_string()).collect();
    assert_eq!(keys, vec!["t1", "t2", "t3", "t4"]);
    assert_eq!(doc.next_text(&k("t2")).unwrap().map(|t| t.key().clone()), Some(k("t3")));
    assert_eq!(doc.next_text(&k("t3")).unwrap().map(|t| t.key().clone()), Some(k("t4")));
    assert!(doc.next_text(&k("t4")).unwrap().is_none());
    assert_eq!(doc.previous_text(&k("t3")).unwrap().map(|t| t.key().clone()), Some(k("t2")));
    assert!(doc.previous_text(&k("t1")).unwrap().is_none());
    assert_eq!(doc.next_block(&k("p1")).unwrap().map(Node::key), Some(&k("p2")));
    assert_eq!(doc.previous_block(&k("t4")).unwrap().map(Node::key), Some(&k("p1")));
}

#[test]
fn test_common_ancestor_and_offsets() {
    let v = value();
    let doc = &v.document;
    assert_eq!(doc.common_ancestor(&k("t1"), &k("t2")).unwrap(), Path::from(vec![0]));
    assert_eq!(doc.common_ancestor(&k("t1"), &k("t4")).unwrap(), Path::root());
    assert_eq!(doc.common_ancestor(&k("t2"), &k("t2")).unwrap(), Path::from(vec![0, 1]));
    assert_eq!(doc.offset_of(&k("t3"), &Path::from(vec![0])).unwrap(), 6);
}

#[test]
fn test_range_queries() {
    let v = value();
    let doc = &v.document;
    let r = range(("t1", 1), ("t4", 2), &v);
    let texts: Vec<String> = doc.texts_at_range(&r).unwrap().iter().map(|t| t.key().to_string()).collect();
    assert_eq!(texts, vec!["t1", "t2", "t3", "t4"]);
    let blocks: Vec<String> = doc
        .leaf_blocks_at_range(&r)
        .unwrap()
        .iter()
        .map(|b| b.key().to_string())
        .collect();
    assert_eq!(blocks, vec!["p1", "p2"]);
    assert_eq!(doc.inlines_at_range(&r).unwrap().len(), 1);
}

#[test]
fn test_marks_at_range() {
    let v = value();
    let doc = &v.document;
    let bold: MarkSet = vec![Mark::new("bold")].into();

    let inside = range(("t2", 0), ("t2", 3), &v);
    assert_eq!(doc.active_marks_at_range(&inside).unwrap(), bold);

    let across = range(("t1", 0), ("t3", 2), &v);
    assert!(doc.active_marks_at_range(&across).unwrap().is_empty());
    assert_eq!(doc.marks_at_range(&across).unwrap(), bold);

    // Typing at the start of the text after the link inherits the link's marks.
    let after_link = range(("t3", 0), ("t3", 0), &v);
    assert_eq!(doc.insert_marks_at_range(&after_link).unwrap(), bold);
}

#[test]
fn test_backward_selection_is_detected() {
    let v = value();
    let r = range(("t3", 2), ("t1", 1), &v);
    assert!(r.is_backward);
    assert_eq!(r.start(), &Point::new(k("t1"), 1));
    assert_eq!(r.end(), &Point::new(k("t3"), 2));
}

#[test]
fn test_selection_normalize_resolves_elements_and_clamps() {
    let v = value();
    let on_block = Selection::collapsed(k("p1"), 4).normalize(&v.document);
    assert_eq!(on_block.anchor, Point::new(k("t2"), 1));

    let clamped = Selection::collapsed(k("t1"), 99).normalize(&v.document);
    assert_eq!(clamped.anchor.offset, 3);

    let gone = Selection::collapsed(k("nope"), 1).normalize(&v.document);
    assert_eq!(gone.anchor, Point::new(k("t1"), 0));
}

#[test]
fn test_move_to_start_of_next_text() {
    let v = value();
    let at_one = Selection::collapsed(k("t1"), 2);
    let moved = at_one.move_to_start_of_next_text(&v.document).unwrap();
    assert_eq!(moved.anchor, Point::new(k("t2"), 0));
    assert!(moved.is_collapsed());

    let last = Selection::collapsed(k("t4"), 1);
    assert_eq!(last.move_to_start_of_next_text(&v.document).unwrap(), last);
}

#[test]
fn test_move_forward_crosses_texts() {
    let v = value();
    let start = Selection::collapsed(k("t1"), 2);
    let moved = start.move_forward(&v.document, 3).unwrap();
    assert_eq!(moved.focus, Point::new(k("t2"), 2));
    let back = moved.move_backward(&v.document, 3).unwrap();
    assert_eq!(back.focus, Point::new(k("t1"), 2));
}

#[test]
fn test_fragment_at_range_trims_edges() {
    let v = value();
    let r = range(("t1", 1), ("t3", 2), &v);
    let fragment = v.document.fragment_at_range(&r).unwrap();
    assert_eq!(fragment.text(), "netwoth");
    assert_eq!(fragment.nodes().len(), 1);
    assert_eq!(fragment.nodes()[0].key(), &k("p1"));
    // The source is untouched.
    assert_eq!(v.document.text(), "onetwothreefour");
}
