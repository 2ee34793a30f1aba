//! Markdown tree → Markdown text.
//!
//! Output follows a fixed house style so that two runs over the same HTML are
//! byte-identical and so the splitter can work on plain lines:
//!
//! - ATX headings (`## Title`), never setext
//! - fenced code blocks, never indented ones
//! - list-item content indented one space past the marker
//! - GFM tables with padded, aligned columns
//! - blocks separated by exactly one blank line, one trailing newline

use super::ast::{Align, Block, Inline, List, Table};
use super::escape::{
    escape_destination, escape_text, escape_title, fence_length, inline_code, TextContext,
};
use crate::config::MarkdownStyle;

/// Serialise a document to Markdown text.
///
/// Returns an empty string for a document without content; otherwise the
/// result ends with exactly one newline.
pub fn to_markdown(blocks: &[Block], style: &MarkdownStyle) -> String {
    let body = Serializer { style }.flow(blocks, false);
    if body.is_empty() {
        body
    } else {
        format!("{body}\n")
    }
}

struct Serializer<'a> {
    style: &'a MarkdownStyle,
}

impl Serializer<'_> {
    /// Render a sequence of blocks. `tight` joins them with a single newline
    /// (blocks inside items of a tight list).
    fn flow(&self, blocks: &[Block], tight: bool) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(blocks.len());
        let mut prev: Option<&Block> = None;
        let mut prev_alternated = false;

        for block in blocks {
            // Two adjacent lists of the same kind would read back as one list;
            // switch the marker on every other one.
            let alternate = !prev_alternated
                && matches!(
                    (prev, block),
                    (Some(Block::List(a)), Block::List(b)) if a.ordered == b.ordered
                );

            let rendered = self.block(block, alternate);
            if !rendered.is_empty() {
                parts.push(rendered);
                prev = Some(block);
                prev_alternated = alternate;
            }
        }

        parts.join(if tight { "\n" } else { "\n\n" })
    }

    fn block(&self, block: &Block, alternate_marker: bool) -> String {
        match block {
            Block::Heading { depth, children } => {
                let hashes = "#".repeat(usize::from((*depth).clamp(1, 6)));
                let text = self.phrasing(children, TextContext::Flow, false, true);
                if text.is_empty() {
                    hashes
                } else {
                    format!("{hashes} {text}")
                }
            }
            Block::Paragraph(children) => self.phrasing(children, TextContext::Flow, true, false),
            Block::ThematicBreak => self.style.rule.to_string().repeat(3),
            Block::BlockQuote(children) => {
                let inner = self.flow(children, false);
                if inner.is_empty() {
                    return ">".to_string();
                }
                inner
                    .split('\n')
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {line}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            Block::List(list) => self.list(list, alternate_marker),
            Block::Code { lang, value } => {
                let fence = "`".repeat(fence_length(value));
                let info = lang.as_deref().unwrap_or("");
                if value.is_empty() {
                    format!("{fence}{info}\n{fence}")
                } else {
                    format!("{fence}{info}\n{value}\n{fence}")
                }
            }
            Block::Table(table) => self.table(table),
        }
    }

    fn list(&self, list: &List, alternate_marker: bool) -> String {
        let bullet = if alternate_marker {
            bullet_other(self.style)
        } else {
            self.style.bullet
        };
        let delimiter = if alternate_marker { ')' } else { '.' };

        let items: Vec<String> = list
            .items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let marker = if list.ordered {
                    format!("{}{delimiter}", list.start as usize + i)
                } else {
                    bullet.to_string()
                };
                let mut content = self.flow(&item.children, !list.spread);
                if let Some(checked) = item.checked {
                    let check = if checked { "[x]" } else { "[ ]" };
                    content = if content.is_empty() {
                        check.to_string()
                    } else {
                        format!("{check} {content}")
                    };
                }
                indent_item(&marker, &content)
            })
            .collect();

        items.join(if list.spread { "\n\n" } else { "\n" })
    }

    fn table(&self, table: &Table) -> String {
        let columns = table
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(table.align.len());
        if table.rows.is_empty() || columns == 0 {
            return String::new();
        }

        let cells: Vec<Vec<String>> = table
            .rows
            .iter()
            .map(|row| {
                (0..columns)
                    .map(|c| {
                        row.get(c)
                            .map(|cell| self.phrasing(cell, TextContext::TableCell, false, true))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        let align = |c: usize| table.align.get(c).copied().unwrap_or_default();
        let widths: Vec<usize> = (0..columns)
            .map(|c| {
                cells
                    .iter()
                    .map(|row| row[c].chars().count())
                    .max()
                    .unwrap_or(0)
                    .max(3)
            })
            .collect();

        let render_row = |row: &[String]| {
            let padded: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(c, text)| pad_cell(text, widths[c], align(c)))
                .collect();
            format!("| {} |", padded.join(" | "))
        };

        let delimiter: Vec<String> = (0..columns)
            .map(|c| {
                let w = widths[c];
                match align(c) {
                    Align::None => "-".repeat(w),
                    Align::Left => format!(":{}", "-".repeat(w - 1)),
                    Align::Right => format!("{}:", "-".repeat(w - 1)),
                    Align::Center => format!(":{}:", "-".repeat(w - 2)),
                }
            })
            .collect();

        let mut lines = Vec::with_capacity(cells.len() + 1);
        lines.push(render_row(&cells[0]));
        lines.push(format!("| {} |", delimiter.join(" | ")));
        lines.extend(cells[1..].iter().map(|row| render_row(row)));
        lines.join("\n")
    }

    /// Render phrasing content.
    ///
    /// `line_start` is true when the output begins a physical line; `single_line`
    /// turns hard breaks into spaces (headings and table cells cannot span
    /// lines).
    fn phrasing(
        &self,
        inlines: &[Inline],
        ctx: TextContext,
        line_start: bool,
        single_line: bool,
    ) -> String {
        let hoisted = hoist_edge_breaks(inlines);
        let inlines = hoisted.as_slice();
        // Breaks at either edge have nothing to separate.
        let start = inlines
            .iter()
            .position(|i| *i != Inline::Break)
            .unwrap_or(inlines.len());
        let end = inlines
            .iter()
            .rposition(|i| *i != Inline::Break)
            .map_or(start, |e| e + 1);

        let mut out = String::new();
        let mut at_line_start = line_start;
        for inline in &inlines[start..end] {
            let piece = self.inline(inline, ctx, at_line_start, single_line);
            if piece.is_empty() {
                continue;
            }
            if *inline == Inline::Break {
                let kept = out.trim_end_matches(' ').len();
                out.truncate(kept);
            }
            at_line_start = piece.ends_with('\n');
            out.push_str(&piece);
        }
        if single_line {
            out.trim().to_string()
        } else {
            out.trim_end_matches(' ').to_string()
        }
    }

    fn inline(
        &self,
        inline: &Inline,
        ctx: TextContext,
        at_line_start: bool,
        single_line: bool,
    ) -> String {
        match inline {
            Inline::Text(text) => escape_text(text, at_line_start, ctx),
            Inline::Emphasis(children) => {
                let marker = self.style.emphasis.to_string();
                self.wrap(children, &marker, ctx, single_line)
            }
            Inline::Strong(children) => {
                let marker = self.style.strong.to_string().repeat(2);
                self.wrap(children, &marker, ctx, single_line)
            }
            Inline::Delete(children) => self.wrap(children, "~~", ctx, single_line),
            Inline::InlineCode(code) => inline_code(code),
            Inline::Link {
                url,
                title,
                children,
            } => {
                if title.is_none() && is_autolink(url, children) {
                    return format!("<{url}>");
                }
                let text = self.phrasing(children, ctx, false, single_line);
                format!("[{text}]({}{})", escape_destination(url), render_title(title))
            }
            Inline::Image { url, alt, title } => format!(
                "![{}]({}{})",
                escape_text(alt, false, ctx),
                escape_destination(url),
                render_title(title)
            ),
            Inline::Break => {
                if single_line {
                    " ".to_string()
                } else {
                    "\\\n".to_string()
                }
            }
        }
    }

    /// Wrap phrasing in a delimiter pair, moving edge whitespace outside
    /// (`* a *` would not parse as emphasis).
    fn wrap(&self, children: &[Inline], marker: &str, ctx: TextContext, single_line: bool) -> String {
        let inner = self.phrasing_raw(children, ctx, single_line);
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            return inner;
        }
        let lead = if inner.starts_with(char::is_whitespace) { " " } else { "" };
        let trail = if inner.ends_with(char::is_whitespace) { " " } else { "" };
        format!("{lead}{marker}{trimmed}{marker}{trail}")
    }

    /// Like [`Self::phrasing`] but without trimming the result.
    fn phrasing_raw(&self, inlines: &[Inline], ctx: TextContext, single_line: bool) -> String {
        let mut out = String::new();
        let mut at_line_start = false;
        for inline in inlines {
            let piece = self.inline(inline, ctx, at_line_start, single_line);
            at_line_start = piece.ends_with('\n');
            out.push_str(&piece);
        }
        out
    }
}

/// Move hard breaks at the edges of emphasis, strong, strikethrough and link
/// text out to the enclosing run. A trailing `\` inside `**a\**` would escape
/// the closing marker.
fn hoist_edge_breaks(inlines: &[Inline]) -> Vec<Inline> {
    let mut out = Vec::with_capacity(inlines.len());
    for inline in inlines {
        let children = match inline {
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => c,
            Inline::Link { children, .. } => children,
            _ => {
                out.push(inline.clone());
                continue;
            }
        };
        let inner = hoist_edge_breaks(children);
        let start = inner
            .iter()
            .position(|i| *i != Inline::Break)
            .unwrap_or(inner.len());
        let end = inner
            .iter()
            .rposition(|i| *i != Inline::Break)
            .map_or(start, |e| e + 1);

        out.extend(std::iter::repeat(Inline::Break).take(start));
        if start < end {
            out.push(with_children(inline, inner[start..end].to_vec()));
        }
        out.extend(std::iter::repeat(Inline::Break).take(inner.len() - end));
    }
    out
}

fn with_children(inline: &Inline, children: Vec<Inline>) -> Inline {
    match inline {
        Inline::Emphasis(_) => Inline::Emphasis(children),
        Inline::Strong(_) => Inline::Strong(children),
        Inline::Delete(_) => Inline::Delete(children),
        Inline::Link { url, title, .. } => Inline::Link {
            url: url.clone(),
            title: title.clone(),
            children,
        },
        other => other.clone(),
    }
}

fn bullet_other(style: &MarkdownStyle) -> char {
    if style.bullet == '*' {
        '-'
    } else {
        '*'
    }
}

/// Prefix the first line of `content` with the marker and indent the rest one
/// space past it.
fn indent_item(marker: &str, content: &str) -> String {
    if content.is_empty() {
        return marker.to_string();
    }
    let indent = " ".repeat(marker.chars().count() + 1);
    content
        .split('\n')
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{marker} {line}")
            } else if line.is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pad_cell(text: &str, width: usize, align: Align) -> String {
    let gap = width.saturating_sub(text.chars().count());
    match align {
        Align::Right => format!("{}{text}", " ".repeat(gap)),
        Align::Center => {
            let left = gap / 2;
            format!("{}{text}{}", " ".repeat(left), " ".repeat(gap - left))
        }
        Align::None | Align::Left => format!("{text}{}", " ".repeat(gap)),
    }
}

fn render_title(title: &Option<String>) -> String {
    match title {
        Some(t) => format!(" \"{}\"", escape_title(t)),
        None => String::new(),
    }
}

/// GFM autolink: the visible text is exactly an absolute URL.
fn is_autolink(url: &str, children: &[Inline]) -> bool {
    let text: String = children.iter().map(Inline::plain_text).collect();
    let absolute = ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| url.starts_with(scheme));
    absolute
        && !url.chars().any(|c| c.is_whitespace() || c == '<' || c == '>')
        && (text == url || format!("mailto:{text}") == url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::ast::ListItem;

    fn md(blocks: &[Block]) -> String {
        to_markdown(blocks, &MarkdownStyle::default())
    }

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    fn para(s: &str) -> Block {
        Block::Paragraph(vec![text(s)])
    }

    #[test]
    fn empty_document_is_empty() {
        assert_eq!(md(&[]), "");
    }

    #[test]
    fn headings_and_paragraphs() {
        let doc = vec![
            Block::Heading {
                depth: 2,
                children: vec![text("Alpha")],
            },
            para("body A"),
        ];
        assert_eq!(md(&doc), "## Alpha\n\nbody A\n");
    }

    #[test]
    fn emphasis_uses_star_markers() {
        let doc = vec![Block::Paragraph(vec![
            text("a "),
            Inline::Strong(vec![text("b")]),
            text(" "),
            Inline::Emphasis(vec![text("c ")]),
            text("d"),
        ])];
        assert_eq!(md(&doc), "a **b** *c* d\n");
    }

    #[test]
    fn strikethrough() {
        let doc = vec![Block::Paragraph(vec![Inline::Delete(vec![text("old")])])];
        assert_eq!(md(&doc), "~~old~~\n");
    }

    #[test]
    fn tight_bullet_list_with_one_space_indent() {
        let item = |s: &str| ListItem {
            checked: None,
            children: vec![para(s)],
        };
        let doc = vec![Block::List(List {
            ordered: false,
            start: 1,
            spread: false,
            items: vec![item("one"), item("two")],
        })];
        assert_eq!(md(&doc), "- one\n- two\n");
    }

    #[test]
    fn nested_list_content_is_indented() {
        let inner = Block::List(List {
            ordered: false,
            start: 1,
            spread: false,
            items: vec![ListItem {
                checked: None,
                children: vec![para("child")],
            }],
        });
        let doc = vec![Block::List(List {
            ordered: true,
            start: 3,
            spread: false,
            items: vec![ListItem {
                checked: Some(true),
                children: vec![para("parent"), inner],
            }],
        })];
        assert_eq!(md(&doc), "3. [x] parent\n   - child\n");
    }

    #[test]
    fn adjacent_lists_alternate_marker() {
        let list = Block::List(List {
            ordered: false,
            start: 1,
            spread: false,
            items: vec![ListItem {
                checked: None,
                children: vec![para("x")],
            }],
        });
        assert_eq!(md(&[list.clone(), list.clone(), list]), "- x\n\n* x\n\n- x\n");
    }

    #[test]
    fn fenced_code_with_language() {
        let doc = vec![Block::Code {
            lang: Some("rust".into()),
            value: "fn main() {}\n## not a heading".into(),
        }];
        assert_eq!(md(&doc), "```rust\nfn main() {}\n## not a heading\n```\n");
    }

    #[test]
    fn code_containing_fence_gets_longer_fence() {
        let doc = vec![Block::Code {
            lang: None,
            value: "```\nx\n```".into(),
        }];
        assert!(md(&doc).starts_with("````\n"));
    }

    #[test]
    fn table_is_padded_and_aligned() {
        let doc = vec![Block::Table(Table {
            align: vec![Align::None, Align::Right],
            rows: vec![
                vec![vec![text("Name")], vec![text("Qty")]],
                vec![vec![text("apple")], vec![text("3")]],
            ],
        })];
        assert_eq!(
            md(&doc),
            "| Name  | Qty |\n| ----- | --: |\n| apple |   3 |\n"
        );
    }

    #[test]
    fn short_rows_are_padded() {
        let doc = vec![Block::Table(Table {
            align: vec![],
            rows: vec![
                vec![vec![text("a")], vec![text("b")]],
                vec![vec![text("c")]],
            ],
        })];
        assert_eq!(md(&doc), "| a   | b   |\n| --- | --- |\n| c   |     |\n");
    }

    #[test]
    fn autolink_and_link() {
        let doc = vec![Block::Paragraph(vec![
            Inline::Link {
                url: "https://example.org".into(),
                title: None,
                children: vec![text("https://example.org")],
            },
            text(" and "),
            Inline::Link {
                url: "/docs".into(),
                title: Some("Docs".into()),
                children: vec![text("docs")],
            },
        ])];
        assert_eq!(
            md(&doc),
            "<https://example.org> and [docs](/docs \"Docs\")\n"
        );
    }

    #[test]
    fn hard_break_and_blockquote() {
        let doc = vec![Block::BlockQuote(vec![Block::Paragraph(vec![
            text("line one"),
            Inline::Break,
            text("line two"),
        ])])];
        assert_eq!(md(&doc), "> line one\\\n> line two\n");
    }

    #[test]
    fn break_at_end_of_strong_moves_outside_markers() {
        let doc = vec![Block::Paragraph(vec![
            Inline::Strong(vec![text("a"), Inline::Break]),
            text("c"),
        ])];
        assert_eq!(md(&doc), "**a**\\\nc\n");
    }

    #[test]
    fn edge_breaks_in_nested_markup_are_dropped_at_paragraph_edges() {
        let doc = vec![Block::Paragraph(vec![Inline::Emphasis(vec![
            Inline::Break,
            Inline::Delete(vec![text("x"), Inline::Break]),
        ])])];
        assert_eq!(md(&doc), "*~~x~~*\n");
    }

    #[test]
    fn break_only_emphasis_leaves_a_plain_break() {
        let doc = vec![Block::Paragraph(vec![
            text("a"),
            Inline::Emphasis(vec![Inline::Break]),
            text("b"),
        ])];
        assert_eq!(md(&doc), "a\\\nb\n");
    }

    #[test]
    fn thematic_break_uses_rule_marker() {
        assert_eq!(md(&[para("a"), Block::ThematicBreak, para("b")]), "a\n\n***\n\nb\n");
    }
}
