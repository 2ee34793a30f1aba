//! Markdown syntax tree and its serializer.
//!
//! The translator in [`crate::pipeline::translate`] builds a [`Block`] tree
//! from sanitized HTML; [`to_markdown`] writes it out in the house style
//! selected by [`crate::config::MarkdownStyle`].

pub mod ast;
pub mod escape;
pub mod serialize;

pub use ast::{Align, Block, Inline, List, ListItem, Table};
pub use serialize::to_markdown;
