//! Build entry points: HTML in, Markdown artifacts out.
//!
//! [`html_to_markdown`] is the pure conversion. [`build`] runs the whole
//! pipeline against an [`ArtifactStore`] and persists the full document, the
//! section files and the manifest. Nothing is written until the input has been
//! read and converted, so input and parse failures leave no output behind.

use crate::config::{ConversionConfig, MarkdownStyle};
use crate::error::Html2MdError;
use crate::markdown::to_markdown;
use crate::output::{BuildOutput, BuildStats};
use crate::pipeline::{input, sanitize, split, translate};
use crate::store::{ArtifactStore, FsStore};
use markup5ever_rcdom::RcDom;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Convert an HTML document to Markdown.
///
/// # Example
/// ```rust
/// use edgequake_html2md::{html_to_markdown, MarkdownStyle};
///
/// let md = html_to_markdown(
///     "<h2>Intro</h2><!-- draft --><p>Hello <b>world</b></p>",
///     &MarkdownStyle::default(),
/// );
/// assert_eq!(md, "## Intro\n\nHello **world**\n");
/// ```
pub fn html_to_markdown(html: &str, style: &MarkdownStyle) -> String {
    let dom = input::parse_html_str(html);
    convert_dom(&dom, style).0
}

/// Counts reported by the sanitize stage.
struct SanitizeCounts {
    comments_removed: usize,
    cells_flattened: usize,
}

fn convert_dom(dom: &RcDom, style: &MarkdownStyle) -> (String, SanitizeCounts) {
    let counts = SanitizeCounts {
        comments_removed: sanitize::remove_comments(&dom.document),
        cells_flattened: sanitize::flatten_table_cells(&dom.document),
    };
    debug!(
        "Sanitized: {} comments removed, {} table cells flattened",
        counts.comments_removed, counts.cells_flattened
    );

    let blocks = translate::translate(dom);
    debug!("Translated into {} top-level blocks", blocks.len());

    (to_markdown(&blocks, style), counts)
}

/// Convert the configured input and persist every artifact.
///
/// Writes, in order: the full Markdown document, one file per section, and
/// the manifest. Directories are created as needed.
///
/// # Errors
/// - [`Html2MdError::InputNotFound`] / [`Html2MdError::PermissionDenied`] /
///   [`Html2MdError::InputReadFailed`] when the input cannot be read
/// - [`Html2MdError::ParseFailed`] when it is not a UTF-8 document
/// - [`Html2MdError::OutputWriteFailed`] when a directory or file cannot be
///   written; artifacts written before the failure are left in place
pub async fn build<S: ArtifactStore>(
    config: &ConversionConfig,
    store: &S,
) -> Result<BuildOutput, Html2MdError> {
    let total_start = Instant::now();
    info!("Starting build: {}", config.input_path.display());

    // ── Step 1: Read input ───────────────────────────────────────────────
    let bytes = input::read_document(store, &config.input_path).await?;

    // ── Step 2: Convert ──────────────────────────────────────────────────
    let convert_start = Instant::now();
    let dom = input::parse_html(&bytes, &config.input_path)?;
    let (markdown, counts) = convert_dom(&dom, &config.style);
    let convert_duration_ms = convert_start.elapsed().as_millis() as u64;
    info!(
        "Converted {} bytes of HTML into {} bytes of Markdown in {}ms",
        bytes.len(),
        markdown.len(),
        convert_duration_ms
    );

    // ── Step 3: Split ────────────────────────────────────────────────────
    let sections = split::split_sections(&markdown, &config.preamble_label);
    let manifest = split::render_manifest(&sections);

    // ── Step 4: Persist ──────────────────────────────────────────────────
    let write_start = Instant::now();
    let sections_dir = config.sections_dir();
    create_dir(store, &config.output_dir).await?;
    create_dir(store, &sections_dir).await?;

    write_artifact(store, &config.full_document_path(), &markdown).await?;
    for section in &sections {
        write_artifact(store, &sections_dir.join(&section.file_name), &section.content).await?;
    }
    write_artifact(store, &config.manifest_path(), &manifest).await?;
    let write_duration_ms = write_start.elapsed().as_millis() as u64;

    let stats = BuildStats {
        input_bytes: bytes.len(),
        markdown_bytes: markdown.len(),
        section_count: sections.len(),
        comments_removed: counts.comments_removed,
        cells_flattened: counts.cells_flattened,
        convert_duration_ms,
        write_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Build complete: {} sections written to {}, {}ms total",
        stats.section_count,
        sections_dir.display(),
        stats.total_duration_ms
    );

    Ok(BuildOutput {
        markdown,
        sections,
        manifest,
        stats,
    })
}

/// Synchronous wrapper around [`build`] on the filesystem under `root`.
///
/// Creates a temporary tokio runtime internally.
pub fn build_sync(
    config: &ConversionConfig,
    root: impl AsRef<Path>,
) -> Result<BuildOutput, Html2MdError> {
    let store = FsStore::new(root.as_ref());
    tokio::runtime::Runtime::new()
        .map_err(|e| Html2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(build(config, &store))
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn create_dir<S: ArtifactStore>(store: &S, path: &Path) -> Result<(), Html2MdError> {
    store
        .create_dir_all(path)
        .await
        .map_err(|e| Html2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

async fn write_artifact<S: ArtifactStore>(
    store: &S,
    path: &Path,
    contents: &str,
) -> Result<(), Html2MdError> {
    store
        .write(path, contents.as_bytes())
        .await
        .map_err(|e| Html2MdError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("Wrote {} ({} bytes)", path.display(), contents.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn md(html: &str) -> String {
        html_to_markdown(html, &MarkdownStyle::default())
    }

    #[test]
    fn comments_never_reach_output() {
        let out = md("<p>keep<!-- secret --> this</p><!-- trailer -->");
        assert_eq!(out, "keep this\n");
        assert!(!out.contains("secret"));
    }

    #[test]
    fn table_cell_is_single_line() {
        let out = md("<table><tr><th>H</th></tr><tr><td>foo\n  bar</td></tr></table>");
        assert_eq!(out, "| H       |\n| ------- |\n| foo bar |\n");
    }

    #[test]
    fn bullet_list_style() {
        assert_eq!(md("<ul><li>one</li><li>two</li></ul>"), "- one\n- two\n");
    }

    #[test]
    fn paragraph_text_cannot_become_a_heading() {
        let out = md("<p>## not a heading</p>");
        assert!(!out.starts_with("## "), "got: {out:?}");
    }

    #[test]
    fn empty_input_gives_empty_markdown() {
        assert_eq!(md(""), "");
        assert_eq!(md("<html><head><title>x</title></head><body> </body></html>"), "");
    }

    #[test]
    fn heading_inside_link_still_opens_a_section() {
        let out = md("<p>intro</p><a href=\"/a\"><h2>Alpha</h2></a><p>body</p>");
        assert_eq!(out, "intro\n\n## [Alpha](/a)\n\nbody\n");

        let sections = split::split_sections(&out, "前言");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "[Alpha](/a)");
        assert_eq!(sections[1].content, "## [Alpha](/a)\n\nbody\n");
    }

    #[test]
    fn blocks_inside_span_keep_their_breaks() {
        assert_eq!(
            md("<span><h2>Alpha</h2><p>one</p><p>two</p></span>"),
            "## Alpha\n\none\n\ntwo\n"
        );
    }

    #[test]
    fn line_break_closing_bold_lands_after_the_marker() {
        assert_eq!(md("<p><b>a<br></b>c</p>"), "**a**\\\nc\n");
        assert_eq!(md("<p><i>a<br></i></p>"), "*a*\n");
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        assert_eq!(md("\u{FEFF}<p>x</p>"), "x\n");
    }

    #[test]
    fn build_writes_all_artifacts() {
        let store = MemoryStore::new().with_file(
            "HTML/index.html",
            "<p>intro text</p><h2>Alpha</h2><p>body A</p><h2>Beta</h2><p>body B</p>",
        );
        let config = ConversionConfig::default();
        let out = tokio_test::block_on(build(&config, &store)).unwrap();

        assert_eq!(out.stats.section_count, 3);
        assert_eq!(
            store.get("markdown/index.full.md").as_deref(),
            Some("intro text\n\n## Alpha\n\nbody A\n\n## Beta\n\nbody B\n")
        );
        assert_eq!(
            store.get("markdown/sections/01-alpha.md").as_deref(),
            Some("## Alpha\n\nbody A\n")
        );
        assert_eq!(
            store.get("markdown/sections.manifest.md").as_deref(),
            Some("- 00-前言.md: 00-前言\n- 01-alpha.md: Alpha\n- 02-beta.md: Beta\n")
        );
    }

    #[test]
    fn missing_input_writes_nothing() {
        let store = MemoryStore::new();
        let err = tokio_test::block_on(build(&ConversionConfig::default(), &store)).unwrap_err();
        assert!(matches!(err, Html2MdError::InputNotFound { .. }));
        assert!(store.get("markdown/index.full.md").is_none());
    }

    #[test]
    fn parse_failure_writes_nothing() {
        let store = MemoryStore::new().with_file("HTML/index.html", vec![0xc3, 0x28]);
        let err = tokio_test::block_on(build(&ConversionConfig::default(), &store)).unwrap_err();
        assert!(matches!(err, Html2MdError::ParseFailed { .. }));
        assert!(store.get("markdown/index.full.md").is_none());
    }
}
