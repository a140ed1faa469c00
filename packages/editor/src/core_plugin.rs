//! The plugin every editor starts with: camelCase names for the commands at
//! the current selection plus a few queries.
//!
//! Arguments follow the plain-data schema. Wherever a node, mark or set of
//! node properties is expected, a bare string is read as its type.

use crate::change::Change;
use crate::errors::{EditorError, EditorResult};
use crate::registry::Plugin;
use quire_model::{Key, Mark, MarkSet, ModelError, Node, NodeProperties, Selection};
use serde::de::DeserializeOwned;
use serde_json::{json, Value as Json};

pub const NAME: &str = "core";

pub fn plugin() -> Plugin {
    Plugin::new(NAME)
        .command("insertText", |change, args, _| {
            let text = str_arg(args, 0, "insertText")?;
            let marks = optional_arg::<MarkSet>(args, 1, "insertText")?;
            change.insert_text(&text, marks)?;
            Ok(())
        })
        .command("delete", |change, _, _| unit(change.delete()))
        .command("deleteBackward", |change, args, _| {
            let n = count_arg(args, 0, "deleteBackward")?;
            unit(change.delete_backward(n))
        })
        .command("deleteForward", |change, args, _| {
            let n = count_arg(args, 0, "deleteForward")?;
            unit(change.delete_forward(n))
        })
        .command("deleteCharBackward", |change, _, _| unit(change.delete_char_backward()))
        .command("deleteCharForward", |change, _, _| unit(change.delete_char_forward()))
        .command("deleteWordBackward", |change, _, _| unit(change.delete_word_backward()))
        .command("deleteWordForward", |change, _, _| unit(change.delete_word_forward()))
        .command("deleteLineBackward", |change, _, _| unit(change.delete_line_backward()))
        .command("deleteLineForward", |change, _, _| unit(change.delete_line_forward()))
        .command("insertBlock", |change, args, _| {
            let block = node_arg(change, args, 0, "block", "insertBlock")?;
            unit(change.insert_block(block))
        })
        .command("insertInline", |change, args, _| {
            let inline = node_arg(change, args, 0, "inline", "insertInline")?;
            unit(change.insert_inline(inline))
        })
        .command("splitBlock", |change, args, _| {
            let depth = count_arg(args, 0, "splitBlock")?;
            unit(change.split_block(depth))
        })
        .command("splitInline", |change, args, _| {
            let height = count_arg(args, 0, "splitInline")?;
            unit(change.split_inline(height))
        })
        .command("addMark", |change, args, _| {
            let mark = mark_arg(args, 0, "addMark")?;
            unit(change.add_mark(mark))
        })
        .command("removeMark", |change, args, _| {
            let mark = mark_arg(args, 0, "removeMark")?;
            unit(change.remove_mark(mark))
        })
        .command("toggleMark", |change, args, _| {
            let mark = mark_arg(args, 0, "toggleMark")?;
            unit(change.toggle_mark(mark))
        })
        .command("setBlocks", |change, args, _| {
            let properties = properties_arg(args, 0, "setBlocks")?;
            unit(change.set_blocks(properties))
        })
        .command("setInlines", |change, args, _| {
            let properties = properties_arg(args, 0, "setInlines")?;
            unit(change.set_inlines(properties))
        })
        .command("wrapBlock", |change, args, _| {
            let block = node_arg(change, args, 0, "block", "wrapBlock")?;
            unit(change.wrap_block(block))
        })
        .command("unwrapBlock", |change, args, _| {
            let properties = properties_arg(args, 0, "unwrapBlock")?;
            unit(change.unwrap_block(properties))
        })
        .command("wrapInline", |change, args, _| {
            let inline = node_arg(change, args, 0, "inline", "wrapInline")?;
            unit(change.wrap_inline(inline))
        })
        .command("unwrapInline", |change, args, _| {
            let properties = properties_arg(args, 0, "unwrapInline")?;
            unit(change.unwrap_inline(properties))
        })
        .command("wrapText", |change, args, _| {
            let prefix = str_arg(args, 0, "wrapText")?;
            let suffix = match optional_arg::<String>(args, 1, "wrapText")? {
                Some(suffix) => suffix,
                None => prefix.clone(),
            };
            unit(change.wrap_text(&prefix, &suffix))
        })
        .command("select", |change, args, _| {
            let selection: Selection = required_arg(args, 0, "select")?;
            unit(change.select(selection))
        })
        .command("collapseToStart", |change, _, _| unit(change.collapse_to_start()))
        .command("collapseToEnd", |change, _, _| unit(change.collapse_to_end()))
        .command("collapseToAnchor", |change, _, _| unit(change.collapse_to_anchor()))
        .command("collapseToFocus", |change, _, _| unit(change.collapse_to_focus()))
        .command("collapseToStartOf", |change, args, _| {
            let key = key_arg(args, 0, "collapseToStartOf")?;
            unit(change.collapse_to_start_of(&key))
        })
        .command("collapseToEndOf", |change, args, _| {
            let key = key_arg(args, 0, "collapseToEndOf")?;
            unit(change.collapse_to_end_of(&key))
        })
        .command("moveToStartOfNextText", |change, _, _| unit(change.move_to_start_of_next_text()))
        .command("moveToRangeOf", |change, args, _| {
            let key = key_arg(args, 0, "moveToRangeOf")?;
            unit(change.move_to_range_of(&key))
        })
        .command("selectAll", |change, _, _| unit(change.select_all()))
        .command("deselect", |change, _, _| unit(change.deselect()))
        .command("focus", |change, _, _| unit(change.focus()))
        .command("blur", |change, _, _| unit(change.blur()))
        .command("moveForward", |change, args, _| {
            let n = count_arg(args, 0, "moveForward")?;
            unit(change.move_forward(n))
        })
        .command("moveBackward", |change, args, _| {
            let n = count_arg(args, 0, "moveBackward")?;
            unit(change.move_backward(n))
        })
        .command("setData", |change, args, _| {
            let data = required_arg(args, 0, "setData")?;
            unit(change.set_data(data))
        })
        .command("normalize", |change, _, _| unit(change.normalize()))
        .query("isVoid", |value, args, _| {
            let key = key_arg(args, 0, "isVoid")?;
            Ok(Some(json!(value.document.node(&key)?.is_void())))
        })
        .query("text", |value, _, _| Ok(Some(json!(value.text()))))
        .query("activeMarks", |value, _, _| {
            let marks = match &value.selection.marks {
                Some(marks) => marks.clone(),
                None if value.selection.is_unset() => MarkSet::new(),
                None => value.document.active_marks_at_range(&value.selection)?,
            };
            let marks = serde_json::to_value(marks).map_err(|e| ModelError::Serialization(e.to_string()))?;
            Ok(Some(marks))
        })
}

fn unit<T>(result: EditorResult<T>) -> EditorResult<()> {
    result.map(|_| ())
}

fn optional_arg<T: DeserializeOwned>(args: &[Json], index: usize, command: &str) -> EditorResult<Option<T>> {
    match args.get(index) {
        None | Some(Json::Null) => Ok(None),
        Some(arg) => serde_json::from_value(arg.clone())
            .map(Some)
            .map_err(|e| EditorError::invalid_arguments(command, format!("argument {index}: {e}"))),
    }
}

fn required_arg<T: DeserializeOwned>(args: &[Json], index: usize, command: &str) -> EditorResult<T> {
    optional_arg(args, index, command)?
        .ok_or_else(|| EditorError::invalid_arguments(command, format!("missing argument {index}")))
}

fn str_arg(args: &[Json], index: usize, command: &str) -> EditorResult<String> {
    required_arg(args, index, command)
}

fn key_arg(args: &[Json], index: usize, command: &str) -> EditorResult<Key> {
    str_arg(args, index, command).map(Key::new)
}

/// A count defaulting to one.
fn count_arg(args: &[Json], index: usize, command: &str) -> EditorResult<usize> {
    Ok(optional_arg(args, index, command)?.unwrap_or(1))
}

fn mark_arg(args: &[Json], index: usize, command: &str) -> EditorResult<Mark> {
    match args.get(index) {
        Some(Json::String(mark_type)) => Ok(Mark::new(mark_type.as_str())),
        _ => required_arg(args, index, command),
    }
}

fn properties_arg(args: &[Json], index: usize, command: &str) -> EditorResult<NodeProperties> {
    match args.get(index) {
        Some(Json::String(node_type)) => Ok(NodeProperties::with_type(node_type.as_str())),
        _ => required_arg(args, index, command),
    }
}

/// A node description; a bare string becomes an empty element of that
/// type and `object`.
fn node_arg(change: &mut Change, args: &[Json], index: usize, object: &str, command: &str) -> EditorResult<Node> {
    let description = match args.get(index) {
        Some(Json::String(node_type)) => json!({ "object": object, "type": node_type }),
        Some(arg) => arg.clone(),
        None => return Err(EditorError::invalid_arguments(command, format!("missing argument {index}"))),
    };
    change
        .node_from_json(&description)
        .map_err(|e| EditorError::invalid_arguments(command, e.to_string()))
}
