//! Pipeline stages for HTML-to-Markdown conversion and splitting.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ sanitize ──▶ translate ──▶ serialize ──▶ split
//! (bytes)   (rcdom)      (md tree)     (String)      (sections)
//! ```
//!
//! 1. [`input`]: read the document through the store and parse it with the
//!    HTML5 tree builder
//! 2. [`sanitize`]: drop comments, flatten table cells to one line of text
//! 3. [`translate`]: map the HTML tree onto a Markdown tree
//! 4. serialize: [`crate::markdown::to_markdown`] writes the tree out
//! 5. [`split`]: cut the Markdown at `## ` lines into numbered sections

pub mod input;
pub mod sanitize;
pub mod split;
pub mod translate;
