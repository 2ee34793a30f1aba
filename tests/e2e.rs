//! End-to-end integration tests for edgequake-html2md.
//!
//! Each test builds into its own temporary directory through [`FsStore`], so
//! they exercise real directory creation, file writes and read-back.
//!
//! Run with:
//!   RUST_LOG=edgequake_html2md=debug cargo test --test e2e -- --nocapture

use edgequake_html2md::{
    build, normalize, verify, ConversionConfig, FsStore, Html2MdError, MarkdownStyle,
};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

const HANDBOOK: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Handbook</title>
  <style>body { font-family: serif; }</style>
  <script>console.log("not content");</script>
</head>
<body>
  <!-- generated by the site builder -->
  <h1>Team Handbook</h1>
  <p>Welcome to the <em>handbook</em>. Read this first.</p>

  <h2>Getting Started</h2>
  <p>Install the tools:</p>
  <ol>
    <li>Clone the repo</li>
    <li>Run <code>make setup</code></li>
  </ol>
  <pre><code class="language-sh">make setup
# not a section
make test
</code></pre>

  <h2>Reference Table</h2>
  <table>
    <thead><tr><th>Key</th><th align="right">Value</th></tr></thead>
    <tbody>
      <tr><td>timeout</td><td>30
          seconds</td></tr>
      <tr><td><p>retries</p><p>(max)</p></td><td>3</td></tr>
    </tbody>
  </table>

  <h2>第一章 概述</h2>
  <p>中文内容。<!-- inline note --></p>
  <blockquote><p>Quoted <strong>wisdom</strong>.</p></blockquote>

  <h2>Getting Started</h2>
  <ul>
    <li><input type="checkbox" checked> done</li>
    <li><input type="checkbox"> pending</li>
  </ul>

  <h2>!!!</h2>
  <p>Symbols only heading.</p>
</body>
</html>
"#;

/// Route library logs through the test harness; `RUST_LOG` picks the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn workspace(html: &[u8]) -> TempDir {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("HTML")).unwrap();
    fs::write(dir.path().join("HTML/index.html"), html).unwrap();
    dir
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap_or_else(|e| panic!("read {rel}: {e}"))
}

fn section_files(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("markdown/sections"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Build ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn build_writes_layout() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let out = build(&ConversionConfig::default(), &store).await.unwrap();

    assert_eq!(
        section_files(dir.path()),
        vec![
            "00-前言.md",
            "01-getting-started.md",
            "02-reference-table.md",
            "03-第一章-概述.md",
            "04-getting-started.md",
            "05-section-05.md",
        ]
    );
    assert_eq!(out.stats.section_count, 6);
    assert_eq!(read(dir.path(), "markdown/index.full.md"), out.markdown);
    assert_eq!(
        read(dir.path(), "markdown/sections.manifest.md"),
        "- 00-前言.md: 00-前言\n\
         - 01-getting-started.md: Getting Started\n\
         - 02-reference-table.md: Reference Table\n\
         - 03-第一章-概述.md: 第一章 概述\n\
         - 04-getting-started.md: Getting Started\n\
         - 05-section-05.md: !!!\n"
    );
}

#[tokio::test]
async fn markdown_follows_house_style() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let md = build(&ConversionConfig::default(), &store)
        .await
        .unwrap()
        .markdown;

    assert!(md.starts_with("# Team Handbook\n\nWelcome to the *handbook*. Read this first.\n"));
    assert!(md.contains("1. Clone the repo\n2. Run `make setup`\n"));
    assert!(md.contains("```sh\nmake setup\n# not a section\nmake test\n```"));
    assert!(md.contains("> Quoted **wisdom**."));
    assert!(md.contains("- [x] done\n- [ ] pending\n"));
    assert!(md.ends_with("Symbols only heading.\n"));
    assert!(!md.ends_with("\n\n"));
}

#[tokio::test]
async fn comments_and_head_never_reach_output() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let md = build(&ConversionConfig::default(), &store)
        .await
        .unwrap()
        .markdown;

    for absent in ["site builder", "inline note", "<!--", "console.log", "font-family"] {
        assert!(!md.contains(absent), "found {absent:?} in output");
    }
}

#[tokio::test]
async fn table_cells_are_flattened() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    build(&ConversionConfig::default(), &store).await.unwrap();

    let table = read(dir.path(), "markdown/sections/02-reference-table.md");
    assert!(table.contains("| timeout       | 30 seconds |"), "got:\n{table}");
    assert!(table.contains("| retries (max) |"), "got:\n{table}");
    assert!(table.contains("| ------------- | ---------: |"), "got:\n{table}");
}

#[tokio::test]
async fn heading_line_inside_code_still_splits() {
    // The splitter works on lines and does not track fences.
    let dir = workspace(b"<h2>A</h2><pre>x\n## inside\ny</pre>");
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::default();
    let out = build(&config, &store).await.unwrap();

    let titles: Vec<&str> = out.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["A", "inside"]);
    assert_eq!(verify(&config, &store).await.unwrap().files_verified, 2);
}

#[tokio::test]
async fn blocks_inside_inline_elements_keep_sections() {
    let dir = workspace(
        br#"<p>intro</p>
<a href="/alpha"><h2>Alpha</h2></a><p>body</p>
<span><h2>Beta</h2><p>one</p><p>two</p></span>"#,
    );
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::default();
    let out = build(&config, &store).await.unwrap();

    let titles: Vec<&str> = out.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["00-前言", "[Alpha](/alpha)", "Beta"]);
    assert_eq!(
        read(dir.path(), "markdown/sections/02-beta.md"),
        "## Beta\n\none\n\ntwo\n"
    );
    assert_eq!(verify(&config, &store).await.unwrap().files_verified, 3);
}

#[tokio::test]
async fn build_is_deterministic() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::default();
    let first = build(&config, &store).await.unwrap();
    let second = build(&config, &store).await.unwrap();
    assert_eq!(first.markdown, second.markdown);
    assert_eq!(first.sections, second.sections);
    assert_eq!(first.manifest, second.manifest);
}

#[tokio::test]
async fn custom_layout_and_label() {
    let dir = workspace(b"<p>lead</p><h2>One</h2><p>x</p>");
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::builder()
        .output_dir("out")
        .sections_dir_name("parts")
        .manifest_name("index.md")
        .full_document_name("all.md")
        .preamble_label("Preface")
        .build()
        .unwrap();

    build(&config, &store).await.unwrap();
    assert_eq!(read(dir.path(), "out/parts/00-preface.md"), "lead\n");
    assert_eq!(
        read(dir.path(), "out/index.md"),
        "- 00-preface.md: 00-Preface\n- 01-one.md: One\n"
    );
    assert_eq!(verify(&config, &store).await.unwrap().files_verified, 2);
}

#[tokio::test]
async fn style_markers_are_configurable() {
    let dir = workspace(b"<ul><li><i>a</i> <b>b</b></li></ul><hr>");
    let store = FsStore::new(dir.path());
    let style = MarkdownStyle {
        bullet: '*',
        emphasis: '_',
        strong: '_',
        rule: '-',
    };
    let config = ConversionConfig::builder().style(style).build().unwrap();
    let md = build(&config, &store).await.unwrap().markdown;
    assert_eq!(md, "* _a_ __b__\n\n---\n");
}

// ── Verify ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn build_then_verify_succeeds() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::default();
    build(&config, &store).await.unwrap();

    let report = verify(&config, &store).await.unwrap();
    assert_eq!(report.files_verified, 6);
}

#[tokio::test]
async fn split_loses_no_text() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let out = build(&ConversionConfig::default(), &store).await.unwrap();

    let merged: String = out
        .sections
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    assert_eq!(normalize(&merged), normalize(&out.markdown));

    let unique: HashSet<&str> = out.sections.iter().map(|s| s.file_name.as_str()).collect();
    assert_eq!(unique.len(), out.sections.len());
}

#[tokio::test]
async fn tampered_section_fails_verification() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::default();
    build(&config, &store).await.unwrap();

    fs::write(
        dir.path().join("markdown/sections/02-reference-table.md"),
        "## Reference Table\n",
    )
    .unwrap();
    let err = verify(&config, &store).await.unwrap_err();
    assert!(matches!(err, Html2MdError::VerificationFailed { .. }));
    assert!(err.to_string().contains("text mismatch"));
}

#[tokio::test]
async fn extra_non_markdown_files_are_ignored() {
    let dir = workspace(HANDBOOK.as_bytes());
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::default();
    build(&config, &store).await.unwrap();
    fs::write(dir.path().join("markdown/sections/README.txt"), "junk").unwrap();

    assert_eq!(verify(&config, &store).await.unwrap().files_verified, 6);
}

#[tokio::test]
async fn verify_without_build_fails() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let err = verify(&ConversionConfig::default(), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, Html2MdError::ArtifactReadFailed { .. }));
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_input_is_reported() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = FsStore::new(dir.path());
    let err = build(&ConversionConfig::default(), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, Html2MdError::InputNotFound { .. }));
    assert!(!dir.path().join("markdown").exists());
}

#[tokio::test]
async fn invalid_utf8_aborts_before_writing() {
    let dir = workspace(&[b'<', b'p', b'>', 0xff, 0xfe, b'<']);
    let store = FsStore::new(dir.path());
    let err = build(&ConversionConfig::default(), &store)
        .await
        .unwrap_err();
    assert!(matches!(err, Html2MdError::ParseFailed { .. }));
    assert!(!dir.path().join("markdown").exists());
}

#[tokio::test]
async fn empty_document_builds_blank_preamble() {
    let dir = workspace(b"");
    let store = FsStore::new(dir.path());
    let config = ConversionConfig::default();
    let out = build(&config, &store).await.unwrap();

    assert_eq!(out.markdown, "");
    assert_eq!(section_files(dir.path()), vec!["00-前言.md"]);
    assert_eq!(read(dir.path(), "markdown/sections/00-前言.md"), "\n");
    assert_eq!(
        read(dir.path(), "markdown/sections.manifest.md"),
        "- 00-前言.md: 00-前言\n"
    );
    assert_eq!(verify(&config, &store).await.unwrap().files_verified, 1);
}

#[test]
fn sync_wrappers_work() {
    let dir = workspace(b"<h2>Only</h2><p>x</p>");
    let config = ConversionConfig::default();
    let out = edgequake_html2md::build_sync(&config, dir.path()).unwrap();
    assert_eq!(out.sections[0].file_name, "00-only.md");
    let report = edgequake_html2md::verify_sync(&config, dir.path()).unwrap();
    assert_eq!(report.files_verified, 1);
}
