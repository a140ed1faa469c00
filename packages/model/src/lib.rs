//! # Quire Model
//!
//! Immutable document tree for rich text.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Value: document + selection + data          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Document → Block → (Block | Inline | Text)  │
//! │            Inline → (Inline | Text)         │
//! │            Text → Leaf (string + marks)     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ KeyIndex: key → path, built lazily          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Keys are identity**: paths shift with every structural edit, keys do not
//! 2. **Persistent tree**: edits rebuild the root-to-node spine and share the rest
//! 3. **Canonical texts**: leaves are always merged and never empty
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_model::{JsonOptions, Value};
//!
//! let value = Value::from_json(&serde_json::json!({
//!     "object": "value",
//!     "document": {
//!         "nodes": [{
//!             "object": "block",
//!             "type": "paragraph",
//!             "nodes": [{ "object": "text", "text": "one" }]
//!         }]
//!     }
//! }))?;
//!
//! let first = value.document.first_text().unwrap();
//! assert_eq!(first.text(), "one");
//!
//! let json = value.to_json(&JsonOptions::default())?;
//! ```

mod document;
mod error;
mod index;
pub mod json;
mod key;
mod mark;
mod node;
mod path;
mod selection;
mod text;
mod tree;
mod value;

pub use document::{Document, Parent};
pub use error::{ModelError, ModelResult};
pub use index::KeyIndex;
pub use json::JsonOptions;
pub use key::{Key, KeyGenerator};
pub use mark::{Data, Mark, MarkProperties, MarkSet};
pub use node::{Element, Node, NodeProperties, ObjectKind, Texts};
pub use path::Path;
pub use selection::{Point, Selection, SelectionProperties};
pub use text::{Leaf, Text};
pub use value::{document_to_json, Value};
