pub mod invert;
pub mod normalize;
pub mod replay;

pub use invert::{invert, InvertArgs};
pub use normalize::{normalize, NormalizeArgs};
pub use replay::{replay, ReplayArgs};

use anyhow::{Context, Result};
use quire_editor::{Operation, OperationBatch};
use quire_model::Value;
use std::fs;
use std::path::Path;

/// Read a value description from `path`.
pub(crate) fn read_value(path: &Path) -> Result<Value> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    Value::from_json_str(&source).with_context(|| format!("Invalid value in {}", path.display()))
}

/// Read an operation log from `path`: either a batch object or a bare list
/// of operations.
pub(crate) fn read_batch(path: &Path) -> Result<OperationBatch> {
    let source = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&source).with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let batch = if json.is_array() {
        let operations: Vec<Operation> = serde_json::from_value(json)?;
        OperationBatch::from_operations(operations)
    } else {
        serde_json::from_value(json)?
    };
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALUE: &str = r#"{
        "object": "value",
        "document": {
            "object": "document",
            "nodes": [{
                "object": "block",
                "type": "paragraph",
                "nodes": [{ "object": "text", "text": "one" }]
            }]
        }
    }"#;

    const INSERT: &str = r#"{ "type": "insert_text", "path": [0, 0], "offset": 3, "text": "!" }"#;

    #[test]
    fn test_read_batch_accepts_bare_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.json");
        fs::write(&path, format!("[{INSERT}]")).unwrap();

        let batch = read_batch(&path).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_read_batch_accepts_batch_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ops.json");
        fs::write(
            &path,
            format!(r#"{{ "operations": [{INSERT}], "description": "typing" }}"#),
        )
        .unwrap();

        let batch = read_batch(&path).unwrap();
        assert_eq!(batch.description.as_deref(), Some("typing"));

        let value_path = dir.path().join("value.json");
        fs::write(&value_path, VALUE).unwrap();
        let value = read_value(&value_path).unwrap();
        assert_eq!(batch.apply_to(&value).unwrap().text(), "one!");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_value(Path::new("does-not-exist.json")).unwrap_err();
        assert!(err.to_string().contains("does-not-exist.json"));
    }
}
