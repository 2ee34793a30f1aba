//! Markdown escaping and fence sizing.
//!
//! Text coming out of HTML is literal: any character that Markdown would
//! read as syntax must be backslash-escaped so the document re-reads as the
//! same content. The one that matters most downstream is a line starting with
//! `#`: an unescaped `## ` at the start of a paragraph line would be taken
//! for a section boundary by the splitter.

/// Where a run of text is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextContext {
    /// Paragraphs, headings, list items, block quotes.
    Flow,
    /// GFM table cells, where `|` is also syntax.
    TableCell,
}

/// Escape literal text for output.
///
/// `at_line_start` says whether the first character of `text` will be the
/// first character of a physical line.
pub fn escape_text(text: &str, at_line_start: bool, ctx: TextContext) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut rest = text;
    let mut prev = None;

    if at_line_start && needs_line_start_escape(text) {
        // For `1. item` / `1) item` the delimiter is escaped, not the digits.
        let digits = text.bytes().take_while(u8::is_ascii_digit).count();
        let mut tail = text[digits..].chars();
        if let Some(marker) = tail.next() {
            out.push_str(&text[..digits]);
            out.push('\\');
            out.push(marker);
            rest = tail.as_str();
            prev = Some(marker);
        }
    }

    let chars: Vec<char> = rest.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        match c {
            '\\' | '*' | '`' | '[' | ']' | '<' | '~' => {
                out.push('\\');
                out.push(c);
            }
            '_' => {
                // Intraword underscores cannot open emphasis.
                let intraword = prev.is_some_and(char::is_alphanumeric)
                    && next.is_some_and(char::is_alphanumeric);
                if !intraword {
                    out.push('\\');
                }
                out.push(c);
            }
            '&' if next.is_some_and(|n| n.is_ascii_alphabetic() || n == '#') => {
                out.push('\\');
                out.push(c);
            }
            '|' if ctx == TextContext::TableCell => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
        prev = Some(c);
    }
    out
}

/// Does `text`, starting a line, open a block construct?
fn needs_line_start_escape(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let space_or_end = |c: Option<char>| c.is_none_or(|c| c == ' ' || c == '\t');
    match first {
        '#' | '>' | '=' => true,
        '-' | '+' => space_or_end(chars.next()) || text.chars().all(|c| c == first),
        '0'..='9' => {
            let digits = text.bytes().take_while(u8::is_ascii_digit).count();
            let mut tail = text[digits..].chars();
            digits <= 9
                && matches!(tail.next(), Some('.') | Some(')'))
                && space_or_end(tail.next())
        }
        _ => false,
    }
}

/// Escape a link destination or image source.
///
/// Destinations containing whitespace or control characters are wrapped in
/// `<…>`; otherwise only parentheses are escaped.
pub fn escape_destination(url: &str) -> String {
    if url.is_empty() {
        return "<>".to_string();
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let inner = url.replace('<', "\\<").replace('>', "\\>");
        return format!("<{inner}>");
    }
    url.replace('(', "\\(").replace(')', "\\)")
}

/// Escape a link/image title for use inside double quotes.
pub fn escape_title(title: &str) -> String {
    title.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Minimum backtick fence for a code block: at least three, and longer than
/// any backtick run inside the content.
pub fn fence_length(content: &str) -> usize {
    (longest_backtick_run(content) + 1).max(3)
}

/// Render inline code with the shortest backtick string that does not occur
/// inside it, padding with spaces where CommonMark would strip them.
pub fn inline_code(content: &str) -> String {
    let mut ticks = 1;
    while has_backtick_run(content, ticks) {
        ticks += 1;
    }
    let fence = "`".repeat(ticks);
    let needs_pad = content.starts_with('`')
        || content.ends_with('`')
        || (content.starts_with(' ') && content.ends_with(' ') && !content.trim().is_empty());
    if needs_pad {
        format!("{fence} {content} {fence}")
    } else {
        format!("{fence}{content}{fence}")
    }
}

fn longest_backtick_run(content: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in content.chars() {
        if c == '`' {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn has_backtick_run(content: &str, len: usize) -> bool {
    let mut current = 0;
    for c in content.chars().chain(std::iter::once('\0')) {
        if c == '`' {
            current += 1;
        } else {
            if current == len {
                return true;
            }
            current = 0;
        }
    }
    false
}
