use crate::errors::{EditorError, EditorResult};
use crate::normalize::DEFAULT_MAX_ITERATIONS;
use quire_model::JsonOptions;
use serde::{Deserialize, Serialize};

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Run the normalizer after every command
    #[serde(default = "default_true")]
    pub normalize: bool,

    /// Rule applications allowed per node before normalization gives up
    #[serde(default = "default_max_normalize_iterations")]
    pub max_normalize_iterations: usize,

    /// Reject every change
    #[serde(default)]
    pub read_only: bool,

    /// Keep node keys in JSON output
    #[serde(default)]
    pub preserve_keys: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_normalize_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl EditorConfig {
    pub fn from_json_str(source: &str) -> EditorResult<Self> {
        serde_json::from_str(source).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// JSON export options implied by this configuration.
    pub fn json_options(&self) -> JsonOptions {
        JsonOptions {
            preserve_keys: self.preserve_keys,
            preserve_selection: self.preserve_keys,
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            normalize: true,
            max_normalize_iterations: DEFAULT_MAX_ITERATIONS,
            read_only: false,
            preserve_keys: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "normalize": false,
            "maxNormalizeIterations": 50,
            "readOnly": true
        }"#;

        let config = EditorConfig::from_json_str(json).unwrap();
        assert!(!config.normalize);
        assert_eq!(config.max_normalize_iterations, 50);
        assert!(config.read_only);
        assert!(!config.preserve_keys);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert!(config.normalize);
        assert_eq!(config.max_normalize_iterations, 1000);
    }

    #[test]
    fn test_invalid_config() {
        let result = EditorConfig::from_json_str(r#"{ "normalize": "yes" }"#);
        assert!(matches!(result, Err(EditorError::Config(_))));
    }
}
