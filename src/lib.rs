//! # edgequake-html2md
//!
//! Convert an HTML document to canonical Markdown, split it into one file per
//! second-level section, and prove the split lost nothing.
//!
//! ## Pipeline Overview
//!
//! ```text
//! HTML/index.html
//!  │
//!  ├─ 1. Input      read bytes, parse with html5ever into an RcDom
//!  ├─ 2. Sanitize   remove comments, flatten table cells to one line
//!  ├─ 3. Translate  HTML tree → Markdown tree
//!  ├─ 4. Serialize  GFM Markdown: `-` bullets, `*` emphasis, fenced code
//!  ├─ 5. Split      cut at `## ` lines → NN-<slug>.md + manifest
//!  └─ 6. Verify     re-read artifacts, compare normalised text
//! ```
//!
//! All reads and writes go through an [`ArtifactStore`]; [`FsStore`] maps it
//! onto a directory and [`MemoryStore`] keeps everything in memory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_html2md::{build, verify, ConversionConfig, FsStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let store = FsStore::current_dir();
//!     let output = build(&config, &store).await?;
//!     eprintln!("{} sections", output.stats.section_count);
//!     let report = verify(&config, &store).await?;
//!     eprintln!("verified {} files", report.files_verified);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `html2md` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-html2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod markdown;
pub mod output;
pub mod pipeline;
pub mod store;
pub mod verify;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, MarkdownStyle};
pub use convert::{build, build_sync, html_to_markdown};
pub use error::Html2MdError;
pub use output::{BuildOutput, BuildStats, VerifyReport};
pub use pipeline::split::{render_manifest, slugify, split_sections, SectionEntry};
pub use store::{ArtifactStore, FsStore, MemoryStore};
pub use verify::{normalize, verify, verify_sync};
