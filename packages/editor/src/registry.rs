//! # Plugin Registry
//!
//! Named commands and queries contributed by plugins.
//!
//! ## Design
//!
//! - Handlers registered under the same name form a stack; the most recent
//!   registration runs first
//! - A handler receives a `next` continuation and may delegate to the
//!   handler registered before it, or replace it entirely by not calling it
//! - Arguments are plain JSON values so commands can be driven from a log,
//!   a CLI or a host application alike
//!
//! ## Example
//!
//! ```rust,ignore
//! let plugin = Plugin::new("shout").command("insertText", |change, args, next| {
//!     let upper = args[0].as_str().unwrap_or_default().to_uppercase();
//!     next.run(change, &[serde_json::json!(upper)])
//! });
//! editor.register_plugin(plugin)?;
//! ```

use crate::change::Change;
use crate::errors::{EditorError, EditorResult};
use crate::normalize::SchemaRule;
use quire_model::Value;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Command handler: mutates the change it is given.
pub type CommandFn = Arc<dyn Fn(&mut Change, &[Json], Next<'_>) -> EditorResult<()> + Send + Sync>;

/// Query handler: reads the value and may answer.
pub type QueryFn = Arc<dyn Fn(&Value, &[Json], QueryNext<'_>) -> EditorResult<Option<Json>> + Send + Sync>;

/// The handlers registered before the running command handler.
pub struct Next<'a> {
    name: &'a str,
    rest: &'a [CommandFn],
}

impl Next<'_> {
    /// Run the previously registered handler.
    pub fn run(self, change: &mut Change, args: &[Json]) -> EditorResult<()> {
        match self.rest.split_last() {
            Some((handler, rest)) => handler(change, args, Next { name: self.name, rest }),
            None => Err(EditorError::UnknownCommand(self.name.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }
}

/// The handlers registered before the running query handler. Running out
/// of handlers answers `None`.
pub struct QueryNext<'a> {
    rest: &'a [QueryFn],
}

impl QueryNext<'_> {
    pub fn run(self, value: &Value, args: &[Json]) -> EditorResult<Option<Json>> {
        match self.rest.split_last() {
            Some((handler, rest)) => handler(value, args, QueryNext { rest }),
            None => Ok(None),
        }
    }
}

/// A bundle of commands, queries and schema rules
#[derive(Clone, Default)]
pub struct Plugin {
    pub name: String,
    commands: Vec<(String, CommandFn)>,
    queries: Vec<(String, QueryFn)>,
    rules: Vec<Arc<dyn SchemaRule>>,
}

impl Plugin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Add a command handler
    pub fn command<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Change, &[Json], Next<'_>) -> EditorResult<()> + Send + Sync + 'static,
    {
        self.commands.push((name.into(), Arc::new(handler)));
        self
    }

    /// Add a query handler
    pub fn query<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Value, &[Json], QueryNext<'_>) -> EditorResult<Option<Json>> + Send + Sync + 'static,
    {
        self.queries.push((name.into(), Arc::new(handler)));
        self
    }

    /// Add a schema rule
    pub fn rule(mut self, rule: impl SchemaRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rules(&self) -> &[Arc<dyn SchemaRule>] {
        &self.rules
    }
}

impl fmt::Debug for Plugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name)
            .field("commands", &self.commands.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("queries", &self.queries.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("rules", &self.rules)
            .finish()
    }
}

/// Command and query stacks by name
#[derive(Clone, Default)]
pub struct Registry {
    commands: HashMap<String, Vec<CommandFn>>,
    queries: HashMap<String, Vec<QueryFn>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_command(&mut self, name: impl Into<String>, handler: CommandFn) {
        self.commands.entry(name.into()).or_default().push(handler);
    }

    pub fn register_query(&mut self, name: impl Into<String>, handler: QueryFn) {
        self.queries.entry(name.into()).or_default().push(handler);
    }

    /// Register every command and query of `plugin`. Rules are the
    /// schema's concern and are left to the caller.
    pub fn register_plugin(&mut self, plugin: &Plugin) {
        for (name, handler) in &plugin.commands {
            self.register_command(name.clone(), Arc::clone(handler));
        }
        for (name, handler) in &plugin.queries {
            self.register_query(name.clone(), Arc::clone(handler));
        }
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    pub fn has_query(&self, name: &str) -> bool {
        self.queries.contains_key(name)
    }

    pub fn run_command(&self, change: &mut Change, name: &str, args: &[Json]) -> EditorResult<()> {
        let handlers = self
            .commands
            .get(name)
            .ok_or_else(|| EditorError::UnknownCommand(name.to_string()))?;
        Next { name, rest: handlers }.run(change, args)
    }

    pub fn run_query(&self, value: &Value, name: &str, args: &[Json]) -> EditorResult<Option<Json>> {
        let handlers = self
            .queries
            .get(name)
            .ok_or_else(|| EditorError::UnknownQuery(name.to_string()))?;
        QueryNext { rest: handlers }.run(value, args)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut commands: Vec<_> = self.commands.keys().collect();
        let mut queries: Vec<_> = self.queries.keys().collect();
        commands.sort();
        queries.sort();
        f.debug_struct("Registry")
            .field("commands", &commands)
            .field("queries", &queries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn value() -> Value {
        Value::from_json(&json!({
            "object": "document",
            "nodes": [{ "object": "block", "type": "paragraph", "nodes": [{ "object": "text", "text": "" }] }]
        }))
        .unwrap()
    }

    fn query<F>(f: F) -> QueryFn
    where
        F: Fn(&Value, &[Json], QueryNext<'_>) -> EditorResult<Option<Json>> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    fn command<F>(f: F) -> CommandFn
    where
        F: Fn(&mut Change, &[Json], Next<'_>) -> EditorResult<()> + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    #[test]
    fn test_latest_query_runs_first_and_delegates() {
        let mut registry = Registry::new();
        registry.register_query("answer", query(|_, _, _| Ok(Some(json!(1)))));
        registry.register_query(
            "answer",
            query(|value, args, next| {
                let previous = next.run(value, args)?;
                Ok(previous.map(|v| json!(v.as_i64().unwrap_or_default() + 1)))
            }),
        );
        assert_eq!(registry.run_query(&value(), "answer", &[]).unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_unknown_names() {
        let registry = Registry::new();
        assert!(!registry.has_command("nothing"));
        assert!(matches!(
            registry.run_query(&value(), "nothing", &[]),
            Err(EditorError::UnknownQuery(_))
        ));
        let mut change = Change::new(value());
        assert!(matches!(
            registry.run_command(&mut change, "nothing", &[]),
            Err(EditorError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_next_past_the_bottom_is_unknown() {
        let mut registry = Registry::new();
        registry.register_command("pass", command(|change, args, next| next.run(change, args)));
        let mut change = Change::new(value());
        assert!(matches!(
            registry.run_command(&mut change, "pass", &[]),
            Err(EditorError::UnknownCommand(name)) if name == "pass"
        ));
    }
}
