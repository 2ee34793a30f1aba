//! Markdown syntax tree produced by HTML translation.
//!
//! A small subset of mdast: exactly the constructs the
//! translator can produce and the serializer can write back out.

/// Block-level (flow) content.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// ATX heading, `depth` in 1..=6.
    Heading { depth: u8, children: Vec<Inline> },
    Paragraph(Vec<Inline>),
    ThematicBreak,
    BlockQuote(Vec<Block>),
    List(List),
    /// Fenced code block.
    Code { lang: Option<String>, value: String },
    /// GFM table. The first row is the header row.
    Table(Table),
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    /// First number of an ordered list.
    pub start: u32,
    /// Loose lists separate items (and the blocks inside them) with blank lines.
    pub spread: bool,
    pub items: Vec<ListItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    /// `Some` for GFM task-list items.
    pub checked: Option<bool>,
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    None,
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub align: Vec<Align>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

/// Inline (phrasing) content.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    /// GFM strikethrough.
    Delete(Vec<Inline>),
    InlineCode(String),
    Link {
        url: String,
        title: Option<String>,
        children: Vec<Inline>,
    },
    Image {
        url: String,
        alt: String,
        title: Option<String>,
    },
    Break,
}

impl Inline {
    /// Plain text of this node, ignoring markup.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(t) | Inline::InlineCode(t) => out.push_str(t),
            Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => {
                c.iter().for_each(|i| i.push_plain_text(out))
            }
            Inline::Link { children, .. } => children.iter().for_each(|i| i.push_plain_text(out)),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::Break => out.push('\n'),
        }
    }
}

/// `true` when the phrasing run carries no visible content.
pub fn is_blank(inlines: &[Inline]) -> bool {
    inlines.iter().all(|i| match i {
        Inline::Text(t) => t.trim().is_empty(),
        Inline::Break => true,
        Inline::Emphasis(c) | Inline::Strong(c) | Inline::Delete(c) => is_blank(c),
        Inline::Link { children, .. } => is_blank(children),
        Inline::InlineCode(_) | Inline::Image { .. } => false,
    })
}
