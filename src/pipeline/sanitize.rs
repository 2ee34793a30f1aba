//! Sanitize stage: structural clean-up of the parsed tree before translation.
//!
//! Two independent passes, both idempotent:
//!
//! 1. [`remove_comments`] drops every comment node. Each child list is rebuilt
//!    without its comments rather than edited in place, so no sibling is
//!    skipped when one is removed.
//! 2. [`flatten_table_cells`] replaces the content of every `td`/`th` with
//!    its rendered text on a single line. GFM table rows cannot hold line
//!    breaks or block markup, so cells are reduced to plain text up front.

use html5ever::tendril::StrTendril;
use markup5ever_rcdom::{Handle, Node, NodeData};
use std::cell::RefCell;
use std::rc::Rc;

/// Elements that start a new line in rendered text.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "caption", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hgroup", "hr", "li", "main", "nav", "ol", "p", "pre", "section",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Elements whose content is never rendered as text.
const HIDDEN_ELEMENTS: &[&str] = &[
    "head", "noscript", "script", "style", "template", "title",
];

/// Remove every comment node below `node`. Returns how many were removed.
pub fn remove_comments(node: &Handle) -> usize {
    let mut removed = 0;
    let kept: Vec<Handle> = {
        let children = node.children.borrow();
        children
            .iter()
            .filter(|child| {
                let is_comment = matches!(child.data, NodeData::Comment { .. });
                removed += usize::from(is_comment);
                !is_comment
            })
            .cloned()
            .collect()
    };
    if removed > 0 {
        *node.children.borrow_mut() = kept.clone();
    }
    for child in &kept {
        removed += remove_comments(child);
    }
    removed
}

/// Flatten every table cell below `node` to a single text child.
/// Returns how many cells were visited.
pub fn flatten_table_cells(node: &Handle) -> usize {
    if is_table_cell(node) {
        let text = cell_text(node);
        let replacement = if text.is_empty() {
            Vec::new()
        } else {
            vec![text_node(&text, node)]
        };
        *node.children.borrow_mut() = replacement;
        return 1;
    }

    let children: Vec<Handle> = node.children.borrow().clone();
    children.iter().map(flatten_table_cells).sum()
}

/// Rendered text of a cell: block boundaries and `<br>` become spaces,
/// whitespace runs collapse to one space, and the result is trimmed.
pub fn cell_text(node: &Handle) -> String {
    let mut raw = String::new();
    for child in node.children.borrow().iter() {
        push_rendered_text(child, &mut raw);
    }
    raw.split(|c: char| c.is_ascii_whitespace())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

fn push_rendered_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { name, .. } => {
            let tag = name.local.as_ref();
            if HIDDEN_ELEMENTS.contains(&tag) {
                return;
            }
            if tag == "br" {
                out.push('\n');
                return;
            }
            let block = BLOCK_ELEMENTS.contains(&tag);
            if block {
                out.push('\n');
            }
            for child in node.children.borrow().iter() {
                push_rendered_text(child, out);
            }
            if block {
                out.push('\n');
            }
        }
        _ => {}
    }
}

fn is_table_cell(node: &Handle) -> bool {
    matches!(&node.data, NodeData::Element { name, .. } if matches!(name.local.as_ref(), "td" | "th"))
}

fn text_node(text: &str, parent: &Handle) -> Handle {
    let node = Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(text)),
    });
    node.parent.set(Some(Rc::downgrade(parent)));
    node
}
