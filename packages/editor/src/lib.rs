//! # Quire Editor
//!
//! Document mutation engine for quire rich-text values.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Value, Document, Node, Selection     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: commands → operations → normalize   │
//! │  - Commands by key, at a range, at the      │
//! │    selection and on the selection           │
//! │  - Invertible, serializable operations      │
//! │  - Schema rules repair what commands dirty  │
//! │  - Plugins register commands and queries    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Commit: new Value + OperationBatch          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Values are immutable**: every edit produces a new value and the old
//!    one stays valid
//! 2. **Operations are the only writers**: commands compile down to a small
//!    set of operations that can be logged, replayed and inverted
//! 3. **Normalization is just more operations**: repairs land in the same
//!    batch, so undoing a batch undoes its repairs
//! 4. **Keys are stable**: nodes are addressed by key, paths are derived
//!
//! ## Usage
//!
//! ### Direct changes
//!
//! ```rust,ignore
//! use quire_editor::Change;
//! use quire_model::Value;
//!
//! let value = Value::from_json_str(source)?;
//! let mut change = Change::new(value);
//! change.insert_text("Hello", None)?.split_block(1)?;
//! let commit = change.commit()?;
//!
//! // Undo
//! let previous = commit.batch.inverse().apply_to(&commit.value)?;
//! ```
//!
//! ### Through an editor
//!
//! ```rust,ignore
//! use quire_editor::Editor;
//! use serde_json::json;
//!
//! let mut editor = Editor::new(value)?;
//! editor.command("toggleMark", &[json!("bold")])?;
//! let marks = editor.query("activeMarks", &[])?;
//! ```

mod apply;
mod batch;
mod change;
mod commands;
mod config;
pub mod core_plugin;
mod editor;
mod errors;
mod normalize;
mod operation;
mod registry;
pub mod string;

pub use apply::apply_operation;
pub use batch::{Commit, OperationBatch};
pub use change::Change;
pub use config::EditorConfig;
pub use editor::Editor;
pub use errors::{EditorError, EditorResult, OperationError};
pub use normalize::{FnRule, Schema, SchemaRule, Target, DEFAULT_MAX_ITERATIONS};
pub use operation::{Operation, ValueProperties};
pub use registry::{CommandFn, Next, Plugin, QueryFn, QueryNext, Registry};

// Re-export the model for convenience
pub use quire_model;
