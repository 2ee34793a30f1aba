//! Split stage: partition the full Markdown along `## ` headings.
//!
//! The splitter is a two-state accumulator over physical lines:
//!
//! ```text
//!            "## " line                "## " line
//! Preamble ─────────────▶ Section ─────────────▶ Section ...
//! ```
//!
//! Every `"## "` line closes the open record and starts a new one whose first
//! line is the heading itself. Nothing else changes state. The splitter does
//! not track code fences: the serializer only ever emits a `## ` line for a
//! real heading, except inside fenced code.
//!
//! Each emitted record gets a two-digit ordinal prefix, so file names are
//! unique and sort in document order even when titles collide.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Line prefix that opens a new section.
pub const SECTION_MARKER: &str = "## ";

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static RE_NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-\x{4e00}-\x{9fff}]").unwrap());
static RE_DASH_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// One persisted section file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionEntry {
    /// `NN-<slug>.md`
    pub file_name: String,
    pub title: String,
    /// Record lines joined by `\n`, trimmed, plus one trailing `\n`.
    pub content: String,
}

/// The open record while scanning.
enum Record<'a> {
    Preamble(Vec<&'a str>),
    Section { title: &'a str, lines: Vec<&'a str> },
}

/// A finished record before it is numbered.
struct Closed<'a> {
    /// `None` for the preamble, whose title depends on its ordinal.
    title: Option<&'a str>,
    lines: Vec<&'a str>,
}

impl<'a> Record<'a> {
    fn push(&mut self, line: &'a str) {
        match self {
            Record::Preamble(lines) | Record::Section { lines, .. } => lines.push(line),
        }
    }

    /// Close the record. One without lines is dropped.
    fn close(self) -> Option<Closed<'a>> {
        let (title, lines) = match self {
            Record::Preamble(lines) => (None, lines),
            Record::Section { title, lines } => (Some(title), lines),
        };
        (!lines.is_empty()).then_some(Closed { title, lines })
    }
}

/// Partition `markdown` into ordered section entries.
///
/// `preamble_label` names the content before the first heading; its title
/// becomes `NN-<label>`.
pub fn split_sections(markdown: &str, preamble_label: &str) -> Vec<SectionEntry> {
    let mut closed: Vec<Closed<'_>> = Vec::new();
    let mut open = Record::Preamble(Vec::new());

    for line in markdown.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if let Some(rest) = line.strip_prefix(SECTION_MARKER) {
            let finished = std::mem::replace(
                &mut open,
                Record::Section {
                    title: rest.trim(),
                    lines: vec![line],
                },
            );
            closed.extend(finished.close());
        } else {
            open.push(line);
        }
    }
    closed.extend(open.close());

    closed
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let prefix = format!("{index:02}");
            let (title, slug_source) = match record.title {
                Some(title) => (title.to_string(), title),
                None => (format!("{prefix}-{preamble_label}"), preamble_label),
            };
            let slug = match slugify(slug_source) {
                s if s.is_empty() => format!("section-{prefix}"),
                s => s,
            };
            let entry = SectionEntry {
                file_name: format!("{prefix}-{slug}.md"),
                title,
                content: format!("{}\n", record.lines.join("\n").trim()),
            };
            debug!(
                "Section {} '{}' ({} lines)",
                entry.file_name,
                entry.title,
                record.lines.len()
            );
            entry
        })
        .collect()
}

/// Turn a heading title into a file-name-safe slug.
///
/// Lower-cases, trims, joins words with `-`, keeps only ASCII word
/// characters, `-` and CJK ideographs (U+4E00–U+9FFF), and collapses dash
/// runs. May return an empty string.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let dashed = RE_WHITESPACE.replace_all(lowered.trim(), "-");
    let kept = RE_NON_SLUG.replace_all(&dashed, "");
    RE_DASH_RUNS.replace_all(&kept, "-").into_owned()
}

/// Render the manifest: one `- <file>: <title>` line per section, joined by
/// newlines and terminated by one newline.
pub fn render_manifest(sections: &[SectionEntry]) -> String {
    let lines: Vec<String> = sections
        .iter()
        .map(|s| format!("- {}: {}", s.file_name, s.title))
        .collect();
    format!("{}\n", lines.join("\n"))
}
