//! # Editor
//!
//! Owns the current value and runs named commands against it.
//!
//! ## Lifecycle
//!
//! ```text
//! Value → normalize → command/change → Commit → new Value
//!                          ↓
//!                   OperationBatch (for history and sync)
//! ```
//!
//! A command either commits completely or leaves the editor untouched.

use crate::batch::Commit;
use crate::change::Change;
use crate::config::EditorConfig;
use crate::core_plugin;
use crate::errors::{EditorError, EditorResult};
use crate::normalize::Schema;
use crate::registry::{CommandFn, Plugin, QueryFn, Registry};
use quire_model::Value;
use serde_json::Value as Json;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Editor {
    value: Value,
    registry: Arc<Registry>,
    schema: Arc<Schema>,
    config: EditorConfig,
}

impl Editor {
    /// Create an editor with the default configuration.
    pub fn new(value: Value) -> EditorResult<Self> {
        Self::with_config(value, EditorConfig::default())
    }

    /// Create an editor with the core plugin registered. The initial value
    /// is normalized unless the configuration turns normalization off.
    pub fn with_config(value: Value, config: EditorConfig) -> EditorResult<Self> {
        let mut registry = Registry::new();
        registry.register_plugin(&core_plugin::plugin());
        let schema = Schema::new().with_max_iterations(config.max_normalize_iterations);
        let mut editor = Self {
            value,
            registry: Arc::new(registry),
            schema: Arc::new(schema),
            config,
        };
        editor.renormalize()?;
        Ok(editor)
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.registry.has_command(name)
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.registry.has_query(name)
    }

    pub fn register_command(&mut self, name: impl Into<String>, handler: CommandFn) {
        Arc::make_mut(&mut self.registry).register_command(name, handler);
    }

    pub fn register_query(&mut self, name: impl Into<String>, handler: QueryFn) {
        Arc::make_mut(&mut self.registry).register_query(name, handler);
    }

    /// Register a plugin's commands, queries and rules. New rules apply to
    /// the current value straight away.
    pub fn register_plugin(&mut self, plugin: Plugin) -> EditorResult<()> {
        tracing::debug!(plugin = %plugin.name, "registering plugin");
        Arc::make_mut(&mut self.registry).register_plugin(&plugin);
        if plugin.rules().is_empty() {
            return Ok(());
        }
        let schema = Arc::make_mut(&mut self.schema);
        for rule in plugin.rules() {
            schema.add_rule(Arc::clone(rule));
        }
        self.renormalize()
    }

    /// Run the command `name` as a change of its own.
    #[tracing::instrument(level = "debug", skip(self, args))]
    pub fn command(&mut self, name: &str, args: &[Json]) -> EditorResult<Commit> {
        if !self.registry.has_command(name) {
            return Err(EditorError::UnknownCommand(name.to_string()));
        }
        let registry = Arc::clone(&self.registry);
        self.change(|change| registry.run_command(change, name, args))
    }

    pub fn query(&self, name: &str, args: &[Json]) -> EditorResult<Option<Json>> {
        self.registry.run_query(&self.value, name, args)
    }

    /// Run `f` against a change of the current value and commit it. On
    /// failure the editor keeps its previous value.
    pub fn change<F>(&mut self, f: F) -> EditorResult<Commit>
    where
        F: FnOnce(&mut Change) -> EditorResult<()>,
    {
        if self.config.read_only {
            return Err(EditorError::ReadOnly);
        }
        let mut change = Change::with_schema(self.value.clone(), Arc::clone(&self.schema));
        change.set_normalize(self.config.normalize);
        change.call(f)?;
        let commit = change.commit()?;
        self.value = commit.value.clone();
        Ok(commit)
    }

    fn renormalize(&mut self) -> EditorResult<()> {
        if !self.config.normalize {
            return Ok(());
        }
        let mut change = Change::with_schema(self.value.clone(), Arc::clone(&self.schema));
        change.normalize()?;
        self.value = change.apply()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::FnRule;
    use serde_json::json;

    fn value() -> Value {
        Value::from_json(&json!({
            "object": "value",
            "document": {
                "object": "document",
                "nodes": [{
                    "object": "block",
                    "type": "paragraph",
                    "nodes": [{ "object": "text", "key": "t", "text": "word" }]
                }]
            },
            "selection": {
                "object": "selection",
                "anchor": { "object": "point", "key": "t", "offset": 4 },
                "focus": { "object": "point", "key": "t", "offset": 4 }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_command_commits() {
        let mut editor = Editor::new(value()).unwrap();
        let commit = editor.command("insertText", &[json!("s")]).unwrap();
        assert_eq!(editor.value().text(), "words");
        assert_eq!(commit.batch.len(), 1);
    }

    #[test]
    fn test_failed_command_keeps_value() {
        let mut editor = Editor::new(value()).unwrap();
        let before = editor.value().clone();
        let result = editor.change(|change| {
            change.insert_text("!", None)?;
            Err(EditorError::invalid_command("stop"))
        });
        assert!(result.is_err());
        assert_eq!(editor.value(), &before);
    }

    #[test]
    fn test_read_only_rejects_changes() {
        let config = EditorConfig {
            read_only: true,
            ..EditorConfig::default()
        };
        let mut editor = Editor::with_config(value(), config).unwrap();
        assert!(matches!(
            editor.command("insertText", &[json!("x")]),
            Err(EditorError::ReadOnly)
        ));
    }

    #[test]
    fn test_unknown_command() {
        let mut editor = Editor::new(value()).unwrap();
        assert!(!editor.has_command("fly"));
        assert!(matches!(editor.command("fly", &[]), Err(EditorError::UnknownCommand(_))));
    }

    #[test]
    fn test_plugin_overrides_and_delegates() {
        let mut editor = Editor::new(value()).unwrap();
        let plugin = Plugin::new("shout").command("insertText", |change, args, next| {
            let upper = args
                .first()
                .and_then(|a| a.as_str())
                .unwrap_or_default()
                .to_uppercase();
            next.run(change, &[json!(upper)])
        });
        editor.register_plugin(plugin).unwrap();
        editor.command("insertText", &[json!("s")]).unwrap();
        assert_eq!(editor.value().text(), "wordS");
    }

    #[test]
    fn test_plugin_rules_apply_to_current_value() {
        let mut editor = Editor::new(value()).unwrap();
        let plugin = Plugin::new("titles").rule(FnRule::new("headings", |change, target| {
            let Some(node) = target.as_node() else {
                return Ok(false);
            };
            if node.node_type() != Some("paragraph") {
                return Ok(false);
            }
            change.set_node_by_key(
                node.key(),
                quire_model::NodeProperties::with_type("heading"),
            )?;
            Ok(true)
        }));
        editor.register_plugin(plugin).unwrap();
        assert_eq!(editor.value().document.nodes()[0].node_type(), Some("heading"));
    }
}
