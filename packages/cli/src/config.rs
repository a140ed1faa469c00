use quire_editor::EditorConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Quire configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Engine settings shared with library users
    #[serde(flatten)]
    pub editor: EditorConfig,

    /// Indent JSON output
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Serialize `value` the way this config asks for.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        Ok(json)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            editor: EditorConfig::default(),
            pretty: default_pretty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "maxNormalizeIterations": 50,
            "preserveKeys": true,
            "pretty": false
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.editor.max_normalize_iterations, 50);
        assert!(config.editor.preserve_keys);
        assert!(config.editor.normalize);
        assert!(!config.pretty);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.pretty);
        assert_eq!(config.editor, EditorConfig::default());
    }

    #[test]
    fn test_load_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert!(config.pretty);
        assert!(!config.editor.preserve_keys);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), r#"{ "readOnly": true }"#).unwrap();
        let config = Config::load(&dir.path().display().to_string()).unwrap();
        assert!(config.editor.read_only);
    }
}
