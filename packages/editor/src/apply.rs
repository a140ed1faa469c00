//! Applying a single operation to a value.
//!
//! Application is atomic: the input value is never touched, and either a
//! complete new value comes back or an [`OperationError`] does. The
//! selection is carried along in lockstep so it keeps pointing at the same
//! characters.

use crate::errors::OperationError;
use crate::operation::Operation;
use quire_model::{Document, Key, Node, NodeProperties, Path, Point, Selection, Value};

/// Apply `operation` to `value`, returning the resulting value.
pub fn apply_operation(value: &Value, operation: &Operation) -> Result<Value, OperationError> {
    let mut next = value.clone();
    match operation {
        Operation::InsertNode { path, node } => {
            check_new_keys(&value.document, node)?;
            next.document = value.document.insert_node(path, node.clone())?;
            for key in node.keys() {
                next.key_generator_mut().observe(&key);
            }
        }
        Operation::RemoveNode { path, node } => {
            let current = value.document.node_at(path)?;
            if current.key() != node.key() {
                return Err(OperationError::invalid(format!(
                    "expected `{}` at {path}, found `{}`",
                    node.key(),
                    current.key()
                )));
            }
            let (document, removed) = value.document.remove_node(path)?;
            next.selection = relocate_removed(&value.document, &removed, &value.selection)?;
            next.document = document;
        }
        Operation::MergeNode { path, position, .. } => {
            let previous_path = path
                .previous_sibling()
                .ok_or_else(|| OperationError::invalid(format!("node at {path} has no previous sibling")))?;
            let one = value.document.node_at(&previous_path)?;
            let two = value.document.node_at(path)?;
            if one.object() != two.object() {
                return Err(OperationError::IncompatibleMerge(format!(
                    "a {} cannot be merged into a {}",
                    two.object(),
                    one.object()
                )));
            }
            let length = node_length(one);
            if *position != length {
                return Err(OperationError::invalid(format!(
                    "merge position {position} does not match length {length} of `{}`",
                    one.key()
                )));
            }
            if let (Node::Text(one), Node::Text(two)) = (one, two) {
                let target = one.key().clone();
                let source = two.key().clone();
                next.selection = map_points(&value.selection, |point| {
                    (point.key.as_ref() == Some(&source))
                        .then(|| Point::new(target.clone(), point.offset + position))
                });
            }
            next.document = value.document.merge_node(path)?;
        }
        Operation::SplitNode {
            path,
            position,
            properties,
        } => {
            let node = value.document.node_at(path)?;
            let length = node_length(node);
            if *position > length {
                return Err(OperationError::OffsetOutOfRange {
                    key: node.key().clone(),
                    offset: *position,
                    len: length,
                });
            }
            let new_key = split_key(properties)?;
            if let Node::Text(text) = node {
                let source = text.key().clone();
                next.selection = map_points(&value.selection, |point| {
                    (point.key.as_ref() == Some(&source) && point.offset >= *position)
                        .then(|| Point::new(new_key.clone(), point.offset - position))
                });
            }
            next.document = value.document.split_node(path, *position, properties)?;
            next.key_generator_mut().observe(&new_key);
        }
        // `new_path` is read after removal, so it cannot address the moved
        // subtree. A raw op is not checked for intent; `move_node_by_key`
        // rejects moves into the node's own descendants.
        Operation::MoveNode { path, new_path } => {
            next.document = value.document.move_node(path, new_path)?;
        }
        Operation::SetNode {
            path, properties, ..
        } => {
            let node = value.document.node_at(path)?;
            if let Some(key) = &properties.key {
                if key != node.key() && value.document.has_key(key) {
                    return Err(OperationError::invalid(format!("key `{key}` is already in use")));
                }
                let old = node.key().clone();
                next.selection = map_points(&value.selection, |point| {
                    (point.key.as_ref() == Some(&old)).then(|| Point::new(key.clone(), point.offset))
                });
                next.key_generator_mut().observe(key);
            }
            next.document = value.document.set_node(path, properties)?;
        }
        Operation::InsertText {
            path,
            offset,
            text,
            marks,
        } => {
            let key = text_key(&value.document, path)?;
            let length = text.chars().count();
            next.document = value
                .document
                .update_text(path, |node| node.insert_text(*offset, text, marks))?;
            next.selection = map_points(&value.selection, |point| {
                (point.key.as_ref() == Some(&key) && point.offset >= *offset)
                    .then(|| Point::new(key.clone(), point.offset + length))
            });
        }
        Operation::RemoveText {
            path, offset, text, ..
        } => {
            let key = text_key(&value.document, path)?;
            let length = text.chars().count();
            let current = value.document.text_node(&key)?;
            let end = match offset.checked_add(length) {
                Some(end) if end <= current.len() => end,
                end => {
                    return Err(OperationError::OffsetOutOfRange {
                        key,
                        offset: end.unwrap_or(usize::MAX),
                        len: current.len(),
                    })
                }
            };
            let found = current.text_in_range(*offset, length);
            if &found != text {
                return Err(OperationError::invalid(format!(
                    "expected to remove {text:?} from `{key}`, found {found:?}"
                )));
            }
            next.document = value
                .document
                .update_text(path, |node| node.remove_text(*offset, length))?;
            next.selection = map_points(&value.selection, |point| {
                if point.key.as_ref() != Some(&key) || point.offset <= *offset {
                    return None;
                }
                let moved = if point.offset >= end {
                    point.offset - length
                } else {
                    *offset
                };
                Some(Point::new(key.clone(), moved))
            });
        }
        Operation::AddMark {
            path,
            offset,
            length,
            mark,
        } => {
            next.document = value
                .document
                .update_text(path, |node| node.add_mark(*offset, *length, mark))?;
        }
        Operation::RemoveMark {
            path,
            offset,
            length,
            mark,
        } => {
            next.document = value
                .document
                .update_text(path, |node| node.remove_mark(*offset, *length, mark))?;
        }
        Operation::SetMark {
            path,
            offset,
            length,
            mark,
            properties,
        } => {
            let updated = mark.merge(properties);
            next.document = value
                .document
                .update_text(path, |node| node.set_mark(*offset, *length, mark, &updated))?;
        }
        Operation::SetSelection { properties, .. } => {
            for point in [&properties.anchor, &properties.focus].into_iter().flatten() {
                if let Some(key) = &point.key {
                    value.document.node(key)?;
                }
            }
            next.selection = value.selection.merge(properties);
        }
        Operation::SetValue { properties, .. } => {
            if let Some(data) = &properties.data {
                next.data = data.clone();
            }
        }
    }
    next.selection = next.selection.normalize(&next.document);
    Ok(next)
}

fn node_length(node: &Node) -> usize {
    match node {
        Node::Text(text) => text.len(),
        _ => node.nodes().len(),
    }
}

fn text_key(document: &Document, path: &Path) -> Result<Key, OperationError> {
    match document.node_at(path)? {
        Node::Text(text) => Ok(text.key().clone()),
        node => Err(OperationError::invalid(format!(
            "node `{}` at {path} is not a text",
            node.key()
        ))),
    }
}

fn split_key(properties: &NodeProperties) -> Result<Key, OperationError> {
    properties
        .key
        .clone()
        .ok_or_else(|| OperationError::invalid("split_node needs a key for the new node"))
}

fn check_new_keys(document: &Document, node: &Node) -> Result<(), OperationError> {
    match node.keys().into_iter().find(|key| document.has_key(key)) {
        Some(key) => Err(OperationError::invalid(format!("key `{key}` is already in use"))),
        None => Ok(()),
    }
}

/// Rewrite each point `f` returns a replacement for.
fn map_points<F>(selection: &Selection, f: F) -> Selection
where
    F: Fn(&Point) -> Option<Point>,
{
    let mut next = selection.clone();
    if let Some(anchor) = f(&selection.anchor) {
        next.anchor = anchor;
    }
    if let Some(focus) = f(&selection.focus) {
        next.focus = focus;
    }
    next
}

/// Points inside a removed subtree move to the end of the previous text
/// outside it, else to the start of the next one, else become unset.
fn relocate_removed(
    before: &Document,
    removed: &Node,
    selection: &Selection,
) -> Result<Selection, OperationError> {
    let inside = |point: &Point| point.key.as_ref().is_some_and(|key| removed.has_key(key));
    if !inside(&selection.anchor) && !inside(&selection.focus) {
        return Ok(selection.clone());
    }
    let first = removed.first_text().map(|t| t.key().clone());
    let last = removed.last_text().map(|t| t.key().clone());
    let previous = match &first {
        Some(key) => before.previous_text(key)?,
        None => None,
    };
    let next = match &last {
        Some(key) => before.next_text(key)?,
        None => None,
    };
    let replacement = match (previous, next) {
        (Some(text), _) => Point::new(text.key().clone(), text.len()),
        (None, Some(text)) => Point::new(text.key().clone(), 0),
        (None, None) => Point::unset(),
    };
    Ok(map_points(selection, |point| inside(point).then(|| replacement.clone())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{Mark, MarkSet};
    use serde_json::json;

    fn value() -> Value {
        Value::from_json(&json!({
            "object": "value",
            "document": {
                "object": "document",
                "nodes": [
                    { "object": "block", "key": "a", "type": "paragraph", "nodes": [
                        { "object": "text", "key": "t1", "text": "one" }
                    ]},
                    { "object": "block", "key": "b", "type": "paragraph", "nodes": [
                        { "object": "text", "key": "t2", "text": "two" }
                    ]}
                ]
            },
            "selection": {
                "anchor": { "key": "t1", "offset": 1 },
                "focus": { "key": "t1", "offset": 3 }
            }
        }))
        .unwrap()
    }

    fn roundtrip(value: &Value, op: Operation) -> Value {
        let next = apply_operation(value, &op).unwrap();
        let back = apply_operation(&next, &op.invert()).unwrap();
        assert_eq!(back.document, value.document, "inverse of {}", op.kind());
        next
    }

    #[test]
    fn test_insert_text_shifts_points_at_or_after_offset() {
        let value = value();
        let next = roundtrip(
            &value,
            Operation::InsertText {
                path: Path::new(vec![0, 0]),
                offset: 1,
                text: "xx".into(),
                marks: MarkSet::new(),
            },
        );
        assert_eq!(next.text(), "oxxnetwo");
        assert_eq!(next.selection.anchor.offset, 3);
        assert_eq!(next.selection.focus.offset, 5);
    }

    #[test]
    fn test_remove_text_checks_content() {
        let value = value();
        let result = apply_operation(
            &value,
            &Operation::RemoveText {
                path: Path::new(vec![0, 0]),
                offset: 0,
                text: "xy".into(),
                marks: MarkSet::new(),
            },
        );
        assert!(matches!(result, Err(OperationError::InvalidOperation(_))));
    }

    #[test]
    fn test_remove_text_clamps_points() {
        let value = value();
        let next = roundtrip(
            &value,
            Operation::RemoveText {
                path: Path::new(vec![0, 0]),
                offset: 0,
                text: "on".into(),
                marks: MarkSet::new(),
            },
        );
        assert_eq!(next.selection.anchor.offset, 0);
        assert_eq!(next.selection.focus.offset, 1);
    }

    #[test]
    fn test_split_and_merge_text_move_points() {
        let value = value();
        let split = Operation::SplitNode {
            path: Path::new(vec![0, 0]),
            position: 2,
            properties: NodeProperties {
                key: Some(Key::new("new")),
                ..NodeProperties::default()
            },
        };
        let next = roundtrip(&value, split.clone());
        assert_eq!(next.selection.anchor, Point::new(Key::new("t1"), 1));
        assert_eq!(next.selection.focus, Point::new(Key::new("new"), 1));

        let merged = apply_operation(&next, &split.invert()).unwrap();
        assert_eq!(merged.selection.focus, Point::new(Key::new("t1"), 3));
    }

    #[test]
    fn test_merge_rejects_mismatched_kinds() {
        let value = value();
        let inline = Node::inline(quire_model::Element::new(Key::new("i"), "link"));
        let value = apply_operation(
            &value,
            &Operation::InsertNode {
                path: Path::new(vec![0, 1]),
                node: inline,
            },
        )
        .unwrap();
        let result = apply_operation(
            &value,
            &Operation::MergeNode {
                path: Path::new(vec![0, 1]),
                position: 3,
                properties: NodeProperties::default(),
            },
        );
        assert!(matches!(result, Err(OperationError::IncompatibleMerge(_))));
    }

    #[test]
    fn test_remove_node_relocates_selection() {
        let value = value();
        let removed = value.document.node(&Key::new("a")).unwrap().clone();
        let next = roundtrip(
            &value,
            Operation::RemoveNode {
                path: Path::new(vec![0]),
                node: removed,
            },
        );
        assert_eq!(next.selection.anchor, Point::new(Key::new("t2"), 0));
        assert!(next.selection.is_collapsed());
    }

    #[test]
    fn test_move_node_reads_new_path_after_removal() {
        let value = value();
        let next = roundtrip(
            &value,
            Operation::MoveNode {
                path: Path::new(vec![0]),
                new_path: Path::new(vec![0, 1]),
            },
        );
        let b = next.document.node(&Key::new("b")).unwrap();
        assert_eq!(b.nodes()[1].key(), &Key::new("a"));
    }

    #[test]
    fn test_move_node_inverse() {
        let value = value();
        let next = roundtrip(
            &value,
            Operation::MoveNode {
                path: Path::new(vec![1]),
                new_path: Path::new(vec![0]),
            },
        );
        assert_eq!(next.text(), "twoone");
    }

    #[test]
    fn test_marks_and_set_node_roundtrip() {
        let value = value();
        roundtrip(
            &value,
            Operation::AddMark {
                path: Path::new(vec![1, 0]),
                offset: 0,
                length: 2,
                mark: Mark::new("bold"),
            },
        );
        let node = value.document.node(&Key::new("b")).unwrap();
        let properties = NodeProperties::with_type("quote");
        roundtrip(
            &value,
            Operation::SetNode {
                path: Path::new(vec![1]),
                old_properties: properties.previous_of(node),
                properties,
            },
        );
    }

    #[test]
    fn test_failed_operation_leaves_input_untouched() {
        let value = value();
        let before = value.clone();
        let result = apply_operation(
            &value,
            &Operation::InsertText {
                path: Path::new(vec![5, 0]),
                offset: 0,
                text: "x".into(),
                marks: MarkSet::new(),
            },
        );
        assert!(matches!(result, Err(OperationError::NodeNotFound(_))));
        assert_eq!(value, before);
    }

    #[test]
    fn test_mark_range_past_usize_max_is_rejected() {
        let value = value();
        let result = apply_operation(
            &value,
            &Operation::AddMark {
                path: Path::new(vec![0, 0]),
                offset: 2,
                length: usize::MAX,
                mark: Mark::new("bold"),
            },
        );
        assert!(matches!(
            result,
            Err(OperationError::OffsetOutOfRange { offset: usize::MAX, len: 3, .. })
        ));
    }

    #[test]
    fn test_remove_text_at_huge_offset_from_log_is_rejected() {
        let op: Operation = serde_json::from_value(json!({
            "type": "remove_text",
            "path": [0, 0],
            "offset": usize::MAX,
            "text": "on",
            "marks": []
        }))
        .unwrap();
        let result = apply_operation(&value(), &op);
        assert!(matches!(result, Err(OperationError::OffsetOutOfRange { .. })));
    }
}
