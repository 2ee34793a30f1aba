//! CLI binary for edgequake-html2md.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs build and/or verify against the filesystem and
//! prints a summary.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use edgequake_html2md::{build, verify, BuildOutput, BuildStats, ConversionConfig, FsStore, VerifyReport};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert HTML/index.html, split it and verify the split
  html2md

  # Only convert and split
  html2md build

  # Re-check existing artifacts
  html2md verify

  # Work on another project directory
  html2md --root ../handbook

  # Custom locations, JSON summary on stdout
  html2md --input site/page.html --output-dir out --json

OUTPUT LAYOUT (relative to --root):
  <output-dir>/index.full.md          full Markdown document
  <output-dir>/sections/NN-<slug>.md  one file per `## ` section
  <output-dir>/sections.manifest.md   "- <file>: <title>" per section

ENVIRONMENT VARIABLES:
  HTML2MD_ROOT, HTML2MD_INPUT, HTML2MD_OUTPUT_DIR, HTML2MD_PREAMBLE_LABEL,
  HTML2MD_JSON, HTML2MD_VERBOSE, HTML2MD_QUIET
  RUST_LOG overrides the log filter chosen by --verbose / --quiet.
"#;

/// Convert an HTML document to Markdown sections and verify the split.
#[derive(Parser, Debug)]
#[command(
    name = "html2md",
    version,
    about = "Convert an HTML document to Markdown, split it by `## ` sections and verify nothing was lost",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory that input and output paths are relative to.
    #[arg(long, global = true, env = "HTML2MD_ROOT", default_value = ".")]
    root: PathBuf,

    /// HTML document to convert.
    #[arg(short, long, global = true, env = "HTML2MD_INPUT")]
    input: Option<PathBuf>,

    /// Directory receiving the full document, sections and manifest.
    #[arg(short, long, global = true, env = "HTML2MD_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Label of the section before the first `## ` heading.
    #[arg(long, global = true, env = "HTML2MD_PREAMBLE_LABEL")]
    preamble_label: Option<String>,

    /// Print a JSON summary on stdout instead of text.
    #[arg(long, global = true, env = "HTML2MD_JSON")]
    json: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "HTML2MD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "HTML2MD_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Convert and split, writing every artifact.
    Build,
    /// Check that the persisted sections add up to the full document.
    Verify,
    /// Build, then verify (default).
    All,
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    build: Option<BuildSummary<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verify: Option<&'a VerifyReport>,
}

#[derive(Serialize)]
struct BuildSummary<'a> {
    stats: &'a BuildStats,
    sections: Vec<SectionSummary<'a>>,
}

#[derive(Serialize)]
struct SectionSummary<'a> {
    file_name: &'a str,
    title: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The summary lines printed below cover what INFO logs would say.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || cli.json {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli)?;
    let store = FsStore::new(&cli.root);
    let command = cli.command.unwrap_or(Command::All);

    // ── Build ────────────────────────────────────────────────────────────
    let built: Option<BuildOutput> = if matches!(command, Command::Build | Command::All) {
        let output = build(&config, &store).await.context("Build failed")?;
        if !cli.quiet && !cli.json {
            print_build_summary(&output, &config);
        }
        Some(output)
    } else {
        None
    };

    // ── Verify ───────────────────────────────────────────────────────────
    let verified: Option<VerifyReport> = if matches!(command, Command::Verify | Command::All) {
        let report = verify(&config, &store)
            .await
            .context("Verification failed")?;
        if !cli.quiet && !cli.json {
            eprintln!(
                "{} Verified {} files, no text loss after split+merge.",
                green("✔"),
                bold(&report.files_verified.to_string())
            );
        }
        Some(report)
    } else {
        None
    };

    if cli.json {
        let summary = Summary {
            build: built.as_ref().map(|b| BuildSummary {
                stats: &b.stats,
                sections: b
                    .sections
                    .iter()
                    .map(|s| SectionSummary {
                        file_name: &s.file_name,
                        title: &s.title,
                    })
                    .collect(),
            }),
            verify: verified.as_ref(),
        };
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder();
    if let Some(ref input) = cli.input {
        builder = builder.input_path(input);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.output_dir(dir);
    }
    if let Some(ref label) = cli.preamble_label {
        builder = builder.preamble_label(label.clone());
    }
    builder.build().context("Invalid configuration")
}

fn print_build_summary(output: &BuildOutput, config: &ConversionConfig) {
    let stats = &output.stats;
    eprintln!(
        "{} {}  {} bytes HTML  →  {} bytes Markdown  {}",
        cyan("◆"),
        bold(&config.full_document_path().display().to_string()),
        stats.input_bytes,
        stats.markdown_bytes,
        dim(&format!("{}ms", stats.total_duration_ms)),
    );
    for section in &output.sections {
        eprintln!("  {} {}", green("✓"), section.file_name);
    }
    eprintln!(
        "{} {} sections written to {}",
        green("✔"),
        bold(&stats.section_count.to_string()),
        config.sections_dir().display()
    );
}
