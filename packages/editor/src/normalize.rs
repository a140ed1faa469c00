//! # Normalization
//!
//! Mutations can leave the tree in shapes the rest of the engine does not
//! expect. After each command the normalizer walks the dirtied nodes and
//! repairs them with ordinary operations.
//!
//! ## Design
//!
//! Normalization is:
//! - **Bottom-up**: dirty nodes are visited deepest first, so a container
//!   sees its children already repaired
//! - **Recorded**: every repair is an operation in the change's log, so the
//!   inverse of a batch undoes its repairs too
//! - **Bounded**: a node that keeps changing past the iteration budget is a
//!   [`EditorError::StructuralInvariant`]
//! - **Extensible**: custom [`SchemaRule`]s run before the core rules; when
//!   one fires, the core rules wait for the next pass over that node

use crate::change::Change;
use crate::errors::{EditorError, EditorResult};
use quire_model::{Document, Key, Node, Path, Text};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Snapshot of the node a rule validates.
#[derive(Debug, Clone)]
pub enum Target {
    Document(Document),
    Node(Arc<Node>),
}

impl Target {
    pub fn key(&self) -> &Key {
        match self {
            Target::Document(document) => document.key(),
            Target::Node(node) => node.key(),
        }
    }

    pub fn nodes(&self) -> &[Arc<Node>] {
        match self {
            Target::Document(document) => document.nodes(),
            Target::Node(node) => node.nodes(),
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Target::Document(_) => None,
            Target::Node(node) => Some(node.as_ref()),
        }
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Target::Document(_))
    }
}

/// A structural invariant and its repair.
pub trait SchemaRule: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Repair `target` through `change`. Returns whether anything changed.
    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool>;
}

/// A rule backed by a closure.
pub struct FnRule<F> {
    name: String,
    f: F,
}

impl<F> FnRule<F>
where
    F: Fn(&mut Change, &Target) -> EditorResult<bool> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

impl<F> SchemaRule for FnRule<F>
where
    F: Fn(&mut Change, &Target) -> EditorResult<bool> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        (self.f)(change, target)
    }
}

/// Custom rules plus the core rules, in the order they run.
#[derive(Debug, Clone)]
pub struct Schema {
    rules: Vec<Arc<dyn SchemaRule>>,
    core: Vec<Arc<dyn SchemaRule>>,
    max_iterations: usize,
}

impl Schema {
    /// Create a schema with the core rules only
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            core: vec![
                Arc::new(OnlyBlocksInDocument),
                Arc::new(OnlyInlinesInInline),
                Arc::new(ConsistentBlockChildren),
                Arc::new(VoidContent),
                Arc::new(NonEmptyContainer),
                Arc::new(RemoveEmptyInlines),
                Arc::new(SurroundInlinesWithText),
                Arc::new(MergeAdjacentTexts),
                Arc::new(RemoveExtraEmptyTexts),
            ],
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_rule(mut self, rule: impl SchemaRule + 'static) -> Self {
        self.add_rule(Arc::new(rule));
        self
    }

    pub fn add_rule(&mut self, rule: Arc<dyn SchemaRule>) {
        self.rules.push(rule);
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Names of all rules in run order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules
            .iter()
            .chain(&self.core)
            .map(|rule| rule.name())
            .collect()
    }

    /// Run rules against `target` until one fires. Custom rules go first.
    fn run(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        for rule in self.rules.iter().chain(&self.core) {
            if rule.normalize(change, target)? {
                tracing::trace!(rule = rule.name(), key = %target.key(), "normalization rule fired");
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

/// Repair every node the change has dirtied, and whatever those repairs
/// dirty in turn.
pub(crate) fn normalize_dirty(change: &mut Change, schema: &Schema) -> EditorResult<()> {
    let mut rounds = 0;
    loop {
        let dirty = change.take_dirty();
        if dirty.is_empty() {
            return Ok(());
        }
        rounds += 1;
        if rounds > schema.max_iterations() {
            let key = change.document().key().clone();
            tracing::warn!(%key, rounds, "normalization did not settle");
            return Err(EditorError::StructuralInvariant {
                key,
                iterations: rounds,
            });
        }

        let mut seen = HashSet::new();
        let mut targets: Vec<(Path, Key)> = dirty
            .into_iter()
            .filter(|key| seen.insert(key.clone()))
            .filter_map(|key| Some((change.document().path_of(&key).ok()?, key)))
            .collect();
        targets.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, key) in targets {
            normalize_key(change, schema, &key)?;
        }
    }
}

fn normalize_key(change: &mut Change, schema: &Schema, key: &Key) -> EditorResult<()> {
    let mut iterations = 0;
    while let Some(target) = snapshot(change.document(), key) {
        if !schema.run(change, &target)? {
            return Ok(());
        }
        iterations += 1;
        if iterations >= schema.max_iterations() {
            tracing::warn!(%key, iterations, "normalization did not settle");
            return Err(EditorError::StructuralInvariant {
                key: key.clone(),
                iterations,
            });
        }
    }
    Ok(())
}

fn snapshot(document: &Document, key: &Key) -> Option<Target> {
    if document.key() == key {
        return Some(Target::Document(document.clone()));
    }
    document.node_arc(key).ok().map(Target::Node)
}

fn element(target: &Target) -> Option<&Node> {
    target.as_node().filter(|node| !node.is_text())
}

/// Remove the given children, last first so earlier paths stay valid.
fn remove_all<'a>(change: &mut Change, nodes: impl Iterator<Item = &'a Arc<Node>>) -> EditorResult<bool> {
    let keys: Vec<Key> = nodes.map(|node| node.key().clone()).collect();
    for key in keys.iter().rev() {
        change.remove_node_by_key(key)?;
    }
    Ok(!keys.is_empty())
}

fn empty_text(change: &mut Change) -> Node {
    Node::text(Text::new(change.new_key()))
}

#[derive(Debug)]
pub struct OnlyBlocksInDocument;

impl SchemaRule for OnlyBlocksInDocument {
    fn name(&self) -> &str {
        "only_blocks_in_document"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        if !target.is_document() {
            return Ok(false);
        }
        remove_all(change, target.nodes().iter().filter(|node| !node.is_block()))
    }
}

#[derive(Debug)]
pub struct OnlyInlinesInInline;

impl SchemaRule for OnlyInlinesInInline {
    fn name(&self) -> &str {
        "only_inlines_and_texts_in_inline"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        match target.as_node() {
            Some(node) if node.is_inline() => {
                remove_all(change, node.nodes().iter().filter(|child| child.is_block()))
            }
            _ => Ok(false),
        }
    }
}

/// A block holds either blocks or inline content, decided by its first child.
#[derive(Debug)]
pub struct ConsistentBlockChildren;

impl SchemaRule for ConsistentBlockChildren {
    fn name(&self) -> &str {
        "consistent_block_children"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        let Some(node) = target.as_node().filter(|node| node.is_block()) else {
            return Ok(false);
        };
        let Some(first) = node.nodes().first() else {
            return Ok(false);
        };
        let wants_blocks = first.is_block();
        remove_all(
            change,
            node.nodes().iter().filter(|child| child.is_block() != wants_blocks),
        )
    }
}

/// Voids hold exactly one empty text.
#[derive(Debug)]
pub struct VoidContent;

impl SchemaRule for VoidContent {
    fn name(&self) -> &str {
        "void_content"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        let Some(node) = element(target).filter(|node| node.is_void()) else {
            return Ok(false);
        };
        let nodes = node.nodes();
        match nodes.first().map(|first| first.as_ref()) {
            Some(Node::Text(text)) if nodes.len() == 1 && text.is_empty() => Ok(false),
            Some(Node::Text(text)) => {
                remove_all(change, nodes[1..].iter())?;
                if !text.is_empty() {
                    change.remove_text_by_key(text.key(), 0, text.len())?;
                }
                Ok(true)
            }
            _ => {
                remove_all(change, nodes.iter())?;
                let text = empty_text(change);
                change.insert_node_by_key(node.key(), 0, text)?;
                Ok(true)
            }
        }
    }
}

/// Blocks and inlines always have at least one child.
#[derive(Debug)]
pub struct NonEmptyContainer;

impl SchemaRule for NonEmptyContainer {
    fn name(&self) -> &str {
        "non_empty_container"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        let Some(node) = element(target).filter(|node| node.nodes().is_empty()) else {
            return Ok(false);
        };
        let text = empty_text(change);
        change.insert_node_by_key(node.key(), 0, text)?;
        Ok(true)
    }
}

pub(crate) fn has_void(node: &Node) -> bool {
    node.is_void() || node.nodes().iter().any(|child| has_void(child))
}

/// Inlines without any text and without voids inside are dropped.
#[derive(Debug)]
pub struct RemoveEmptyInlines;

impl SchemaRule for RemoveEmptyInlines {
    fn name(&self) -> &str {
        "remove_empty_inlines"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        let Some(node) = element(target) else {
            return Ok(false);
        };
        remove_all(
            change,
            node.nodes()
                .iter()
                .filter(|child| child.is_inline() && child.text_len() == 0 && !has_void(child)),
        )
    }
}

/// Every inline has a text on each side.
#[derive(Debug)]
pub struct SurroundInlinesWithText;

impl SchemaRule for SurroundInlinesWithText {
    fn name(&self) -> &str {
        "surround_inlines_with_text"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        let Some(node) = element(target) else {
            return Ok(false);
        };
        let nodes = node.nodes();
        let mut indices = Vec::new();
        for (index, child) in nodes.iter().enumerate() {
            let after_inline = index == 0 || nodes[index - 1].is_inline();
            if child.is_inline() && after_inline {
                indices.push(index);
            }
        }
        if nodes.last().is_some_and(|last| last.is_inline()) {
            indices.push(nodes.len());
        }
        for &index in indices.iter().rev() {
            let text = empty_text(change);
            change.insert_node_by_key(node.key(), index, text)?;
        }
        Ok(!indices.is_empty())
    }
}

/// Neighbouring texts become one; the earlier key survives.
#[derive(Debug)]
pub struct MergeAdjacentTexts;

impl SchemaRule for MergeAdjacentTexts {
    fn name(&self) -> &str {
        "merge_adjacent_texts"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        let Some(node) = element(target) else {
            return Ok(false);
        };
        let nodes = node.nodes();
        let keys: Vec<Key> = nodes
            .windows(2)
            .filter(|pair| pair[0].is_text() && pair[1].is_text())
            .map(|pair| pair[1].key().clone())
            .collect();
        for key in keys.iter().rev() {
            change.merge_node_by_key(key)?;
        }
        Ok(!keys.is_empty())
    }
}

/// Empty texts survive only as the sole child or as padding next to inlines.
#[derive(Debug)]
pub struct RemoveExtraEmptyTexts;

impl SchemaRule for RemoveExtraEmptyTexts {
    fn name(&self) -> &str {
        "remove_extra_empty_texts"
    }

    fn normalize(&self, change: &mut Change, target: &Target) -> EditorResult<bool> {
        let Some(node) = element(target) else {
            return Ok(false);
        };
        let nodes = node.nodes();
        if nodes.len() <= 1 {
            return Ok(false);
        }
        let is_inline = |index: Option<usize>| {
            index
                .and_then(|i| nodes.get(i))
                .is_some_and(|node| node.is_inline())
        };
        let extra = nodes.iter().enumerate().filter(|(index, child)| {
            let empty = child.as_text().is_some_and(Text::is_empty);
            let previous = index.checked_sub(1);
            let next = Some(index + 1);
            let padding = match (previous, nodes.get(index + 1)) {
                (None, Some(_)) => is_inline(next),
                (Some(_), None) => is_inline(previous),
                (Some(_), Some(_)) => is_inline(previous) && is_inline(next),
                (None, None) => true,
            };
            empty && !padding
        });
        remove_all(change, extra.map(|(_, child)| child))
    }
}
