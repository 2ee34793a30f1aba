//! Translate stage: sanitized HTML tree → Markdown syntax tree.
//!
//! Elements are mapped by tag name onto flow (block) or phrasing (inline)
//! nodes. Unknown elements are transparent: their children are translated in
//! place, so content inside `<div>`, `<section>`, `<span>` and friends is kept
//! without adding structure. Runs of phrasing content that sit between block
//! elements become paragraphs.
//!
//! A phrasing element that holds block content (`<a href><h2>..</h2></a>`,
//! `<span><p>..</p></span>`) is read as flow, so headings and paragraph
//! breaks survive. Links, emphasis and strikethrough are then applied to the
//! text of each block they contain.
//!
//! Whitespace outside `<pre>` is collapsed the way a browser would lay it
//! out: runs become one space, a space directly after another (even across
//! element boundaries) is dropped, and paragraph edges are trimmed.

use crate::markdown::ast::{is_blank, Align, Block, Inline, List, ListItem, Table};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::trace;

/// Elements that never contribute content.
const SKIPPED: &[&str] = &[
    "audio", "base", "canvas", "embed", "head", "iframe", "input", "link", "meta", "noscript",
    "object", "script", "select", "style", "svg", "template", "title", "video",
];

/// Flow containers whose children are translated in place.
const TRANSPARENT_FLOW: &[&str] = &[
    "address", "article", "aside", "body", "caption", "center", "dd", "details", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "header", "hgroup", "html",
    "legend", "li", "main", "menu", "nav", "section", "summary", "tbody", "tfoot", "thead", "tr",
];

/// Translate a whole parsed document.
pub fn translate(dom: &RcDom) -> Vec<Block> {
    let children: Vec<Handle> = dom.document.children.borrow().clone();
    flow(&children)
}

fn tag_of(node: &Handle) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

fn attr(node: &Handle, key: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == key)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

fn children_of(node: &Handle) -> Vec<Handle> {
    node.children.borrow().clone()
}

fn is_flow_element(tag: &str) -> bool {
    TRANSPARENT_FLOW.contains(&tag)
        || matches!(
            tag,
            "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hr" | "pre" | "blockquote" | "ul"
                | "ol" | "table"
        )
}

// ── Flow content ─────────────────────────────────────────────────────────

fn flow(children: &[Handle]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending: Vec<Inline> = Vec::new();

    for child in children {
        match tag_of(child) {
            Some(tag) if SKIPPED.contains(&tag) => {}
            Some(tag) if is_flow_element(tag) => {
                flush_paragraph(&mut pending, &mut blocks);
                blocks.extend(flow_element(child, tag));
            }
            Some(tag) if has_flow_descendant(child) => {
                flush_paragraph(&mut pending, &mut blocks);
                blocks.extend(phrasing_container(child, tag));
            }
            _ => pending.extend(phrasing_node(child)),
        }
    }
    flush_paragraph(&mut pending, &mut blocks);
    blocks
}

fn has_flow_descendant(node: &Handle) -> bool {
    node.children.borrow().iter().any(|child| match tag_of(child) {
        Some(tag) if SKIPPED.contains(&tag) => false,
        Some(tag) => is_flow_element(tag) || has_flow_descendant(child),
        None => false,
    })
}

/// Flow translation of a phrasing element that wraps blocks.
fn phrasing_container(node: &Handle, tag: &str) -> Vec<Block> {
    let inner = flow(&children_of(node));
    let wrapper: Box<dyn Fn(Vec<Inline>) -> Inline> = match tag {
        "a" => match attr(node, "href") {
            Some(url) => {
                let url = url.trim().to_string();
                let title = attr(node, "title");
                Box::new(move |children: Vec<Inline>| Inline::Link {
                    url: url.clone(),
                    title: title.clone(),
                    children,
                })
            }
            None => return inner,
        },
        "strong" | "b" => Box::new(Inline::Strong),
        "em" | "i" => Box::new(Inline::Emphasis),
        "del" | "s" | "strike" => Box::new(Inline::Delete),
        _ => return inner,
    };
    trace!("<{}> wraps {} blocks", tag, inner.len());
    inner
        .into_iter()
        .map(|block| wrap_block(block, wrapper.as_ref()))
        .collect()
}

/// Apply `wrap` to the phrasing content of `block` and of the blocks it holds.
fn wrap_block(block: Block, wrap: &dyn Fn(Vec<Inline>) -> Inline) -> Block {
    match block {
        Block::Heading { depth, children } if !children.is_empty() => Block::Heading {
            depth,
            children: vec![wrap(children)],
        },
        Block::Paragraph(children) => Block::Paragraph(vec![wrap(children)]),
        Block::BlockQuote(inner) => {
            Block::BlockQuote(inner.into_iter().map(|b| wrap_block(b, wrap)).collect())
        }
        Block::List(mut list) => {
            for item in &mut list.items {
                let children = std::mem::take(&mut item.children);
                item.children = children.into_iter().map(|b| wrap_block(b, wrap)).collect();
            }
            Block::List(list)
        }
        other => other,
    }
}

fn flush_paragraph(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let inlines = normalize_phrasing(std::mem::take(pending));
    if !is_blank(&inlines) {
        blocks.push(Block::Paragraph(inlines));
    }
}

fn flow_element(node: &Handle, tag: &str) -> Vec<Block> {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let depth = tag[1..].parse::<u8>().unwrap_or(1);
            let children = normalize_phrasing(phrasing_children(node));
            vec![Block::Heading { depth, children }]
        }
        "p" => flow(&children_of(node)),
        "hr" => vec![Block::ThematicBreak],
        "pre" => vec![code_block(node)],
        "blockquote" => {
            let inner = flow(&children_of(node));
            if inner.is_empty() {
                Vec::new()
            } else {
                vec![Block::BlockQuote(inner)]
            }
        }
        "ul" | "ol" => list(node, tag == "ol").into_iter().collect(),
        "table" => table(node).into_iter().collect(),
        _ => flow(&children_of(node)),
    }
}

fn code_block(node: &Handle) -> Block {
    let lang = children_of(node)
        .iter()
        .find(|c| tag_of(c) == Some("code"))
        .and_then(|code| attr(code, "class"))
        .and_then(|class| {
            class.split_whitespace().find_map(|token| {
                token
                    .strip_prefix("language-")
                    .or_else(|| token.strip_prefix("lang-"))
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
            })
        });

    let mut value = String::new();
    push_raw_text(node, &mut value);
    let value = value.trim_end_matches(['\n', '\r']).to_string();
    trace!("code block: lang={:?}, {} bytes", lang, value.len());
    Block::Code { lang, value }
}

/// Text content with whitespace preserved; `<br>` becomes a newline.
fn push_raw_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { name, .. } => match name.local.as_ref() {
                "br" => out.push('\n'),
                tag if SKIPPED.contains(&tag) => {}
                _ => push_raw_text(child, out),
            },
            _ => {}
        }
    }
}

fn list(node: &Handle, ordered: bool) -> Option<Block> {
    let start = if ordered {
        attr(node, "start")
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(1)
    } else {
        1
    };

    let mut items = Vec::new();
    let mut spread = false;
    for child in children_of(node) {
        match tag_of(&child) {
            Some(tag) if SKIPPED.contains(&tag) => {}
            Some(_) => {
                spread |= spreadout(&child);
                items.push(ListItem {
                    checked: task_state(&child),
                    children: flow(&children_of(&child)),
                });
            }
            // Whitespace between items; stray text forms its own item.
            None => {
                let inlines = normalize_phrasing(phrasing_node(&child));
                if !is_blank(&inlines) {
                    items.push(ListItem {
                        checked: None,
                        children: vec![Block::Paragraph(inlines)],
                    });
                }
            }
        }
    }

    if items.is_empty() {
        return None;
    }
    Some(Block::List(List {
        ordered,
        start,
        spread,
        items,
    }))
}

/// An item is loose when it holds a `<p>` or more than one flow child.
fn spreadout(node: &Handle) -> bool {
    let mut seen_flow = false;
    for child in node.children.borrow().iter() {
        let Some(tag) = tag_of(child) else {
            continue;
        };
        if !is_flow_element(tag) {
            continue;
        }
        if tag == "p" || seen_flow || spreadout(child) {
            return true;
        }
        seen_flow = true;
    }
    false
}

/// `Some(checked)` when the item opens with a checkbox, possibly inside a
/// leading `<p>`.
fn task_state(item: &Handle) -> Option<bool> {
    let first = first_significant_child(item)?;
    let first = if tag_of(&first) == Some("p") {
        first_significant_child(&first)?
    } else {
        first
    };
    let is_checkbox = tag_of(&first) == Some("input")
        && attr(&first, "type").is_some_and(|t| t.eq_ignore_ascii_case("checkbox"));
    is_checkbox.then(|| attr(&first, "checked").is_some())
}

fn first_significant_child(node: &Handle) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|c| match &c.data {
            NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
            NodeData::Element { .. } => true,
            _ => false,
        })
        .cloned()
}

fn table(node: &Handle) -> Option<Block> {
    let mut rows: Vec<Handle> = Vec::new();
    collect_rows(node, &mut rows);

    let mut align: Vec<Align> = Vec::new();
    let mut cells: Vec<Vec<Vec<Inline>>> = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        let row_cells: Vec<Handle> = children_of(row)
            .into_iter()
            .filter(|c| matches!(tag_of(c), Some("td") | Some("th")))
            .collect();
        if index == 0 {
            align = row_cells.iter().map(cell_align).collect();
        }
        cells.push(
            row_cells
                .iter()
                .map(|cell| normalize_phrasing(phrasing_children(cell)))
                .collect(),
        );
    }

    if cells.iter().all(Vec::is_empty) {
        return None;
    }
    Some(Block::Table(Table { align, rows: cells }))
}

/// Rows in document order, looking through `thead`/`tbody`/`tfoot` but not
/// into nested tables.
fn collect_rows(node: &Handle, rows: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        match tag_of(child) {
            Some("tr") => rows.push(child.clone()),
            Some("thead") | Some("tbody") | Some("tfoot") => collect_rows(child, rows),
            _ => {}
        }
    }
}

fn cell_align(cell: &Handle) -> Align {
    let from_style = attr(cell, "style").and_then(|style| {
        style.split(';').find_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            (prop.trim().eq_ignore_ascii_case("text-align")).then(|| value.trim().to_ascii_lowercase())
        })
    });
    match attr(cell, "align")
        .map(|a| a.trim().to_ascii_lowercase())
        .or(from_style)
        .as_deref()
    {
        Some("left") => Align::Left,
        Some("center") => Align::Center,
        Some("right") => Align::Right,
        _ => Align::None,
    }
}

// ── Phrasing content ─────────────────────────────────────────────────────

fn phrasing_children(node: &Handle) -> Vec<Inline> {
    node.children
        .borrow()
        .iter()
        .flat_map(phrasing_node)
        .collect()
}

fn phrasing_node(node: &Handle) -> Vec<Inline> {
    match &node.data {
        NodeData::Text { contents } => vec![Inline::Text(contents.borrow().to_string())],
        NodeData::Element { name, .. } => phrasing_element(node, name.local.as_ref()),
        _ => Vec::new(),
    }
}

fn phrasing_element(node: &Handle, tag: &str) -> Vec<Inline> {
    match tag {
        t if SKIPPED.contains(&t) => Vec::new(),
        "br" => vec![Inline::Break],
        "strong" | "b" => vec![Inline::Strong(phrasing_children(node))],
        "em" | "i" => vec![Inline::Emphasis(phrasing_children(node))],
        "del" | "s" | "strike" => vec![Inline::Delete(phrasing_children(node))],
        "code" | "kbd" | "samp" | "tt" => {
            let mut raw = String::new();
            push_raw_text(node, &mut raw);
            let code = collapse_whitespace(&raw);
            if code.trim().is_empty() {
                Vec::new()
            } else {
                vec![Inline::InlineCode(code)]
            }
        }
        "a" => match attr(node, "href") {
            Some(url) => vec![Inline::Link {
                url: url.trim().to_string(),
                title: attr(node, "title"),
                children: phrasing_children(node),
            }],
            None => phrasing_children(node),
        },
        "img" => {
            let url = attr(node, "src").unwrap_or_default();
            let alt = attr(node, "alt").unwrap_or_default();
            if url.is_empty() && alt.is_empty() {
                Vec::new()
            } else {
                vec![Inline::Image {
                    url,
                    alt: collapse_whitespace(&alt).trim().to_string(),
                    title: attr(node, "title"),
                }]
            }
        }
        _ => phrasing_children(node),
    }
}

// ── Whitespace normalisation ─────────────────────────────────────────────

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Collapse whitespace across a phrasing run and trim its edges.
fn normalize_phrasing(mut inlines: Vec<Inline>) -> Vec<Inline> {
    let mut after_space = true;
    collapse_run(&mut inlines, &mut after_space);
    trim_start(&mut inlines);
    trim_end(&mut inlines);
    prune_empty(&mut inlines);
    inlines
}

fn collapse_run(inlines: &mut [Inline], after_space: &mut bool) {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Text(text) => {
                let mut collapsed = collapse_whitespace(text);
                if *after_space && collapsed.starts_with(' ') {
                    collapsed.remove(0);
                }
                if !collapsed.is_empty() {
                    *after_space = collapsed.ends_with(' ');
                }
                *text = collapsed;
            }
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => {
                collapse_run(c, after_space)
            }
            Inline::Link { children, .. } => collapse_run(children, after_space),
            Inline::Break => *after_space = true,
            Inline::InlineCode(_) | Inline::Image { .. } => *after_space = false,
        }
    }
}

/// Trim leading whitespace; returns true once visible content was reached.
fn trim_start(inlines: &mut [Inline]) -> bool {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Text(text) => {
                let trimmed = text.trim_start_matches(' ');
                if !trimmed.is_empty() {
                    *text = trimmed.to_string();
                    return true;
                }
                text.clear();
            }
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => {
                if trim_start(c) {
                    return true;
                }
            }
            Inline::Link { children, .. } => {
                if trim_start(children) {
                    return true;
                }
            }
            Inline::Break => {}
            Inline::InlineCode(_) | Inline::Image { .. } => return true,
        }
    }
    false
}

/// Trim trailing whitespace; returns true once visible content was reached.
fn trim_end(inlines: &mut [Inline]) -> bool {
    for inline in inlines.iter_mut().rev() {
        match inline {
            Inline::Text(text) => {
                let trimmed = text.trim_end_matches(' ');
                if !trimmed.is_empty() {
                    *text = trimmed.to_string();
                    return true;
                }
                text.clear();
            }
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => {
                if trim_end(c) {
                    return true;
                }
            }
            Inline::Link { children, .. } => {
                if trim_end(children) {
                    return true;
                }
            }
            Inline::Break => {}
            Inline::InlineCode(_) | Inline::Image { .. } => return true,
        }
    }
    false
}

fn prune_empty(inlines: &mut Vec<Inline>) {
    for inline in inlines.iter_mut() {
        match inline {
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => prune_empty(c),
            Inline::Link { children, .. } => prune_empty(children),
            _ => {}
        }
    }
    inlines.retain(|inline| match inline {
        Inline::Text(t) => !t.is_empty(),
        Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => !c.is_empty(),
        _ => true,
    });
}
