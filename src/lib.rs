//! Structural editing for rich-text block documents.
//!
//! A [`document::Document`] is an arena tree of blocks, inline formatting
//! and text. The [`editor`] module implements the operations a rich-text
//! host delegates on key presses: deleting backward and forward across
//! block boundaries, splitting blocks, inserting line breaks and the list
//! commands (toggle, indent, outdent, checklist state).

pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod notation;

pub use config::EditorConfig;
pub use document::{Document, ListType, NodeId, NodeKind, Position};
pub use editor::{Alignment, Command, DocumentEditor, EditContext, Outcome, Refusal, Selection, apply};
pub use error::{Error, Result};
