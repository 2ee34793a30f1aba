//! Configuration types for HTML-to-Markdown conversion and section splitting.
//!
//! All path and style behaviour is controlled through [`ConversionConfig`],
//! built via its [`ConversionConfigBuilder`]. The defaults reproduce the
//! fixed layout the tool has always used, relative to the working directory:
//!
//! ```text
//! HTML/index.html                  input document
//! markdown/index.full.md           full Markdown
//! markdown/sections/NN-<slug>.md   one file per section
//! markdown/sections.manifest.md    file name → title index
//! ```

use crate::error::Html2MdError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default input document, relative to the store root.
pub const DEFAULT_INPUT_PATH: &str = "HTML/index.html";
/// Default output directory, relative to the store root.
pub const DEFAULT_OUTPUT_DIR: &str = "markdown";
/// Default sections subdirectory inside the output directory.
pub const DEFAULT_SECTIONS_DIR: &str = "sections";
/// Default file name of the full Markdown document.
pub const DEFAULT_FULL_DOCUMENT: &str = "index.full.md";
/// Default file name of the manifest.
pub const DEFAULT_MANIFEST: &str = "sections.manifest.md";
/// Default label of the section that precedes the first `## ` heading.
pub const DEFAULT_PREAMBLE_LABEL: &str = "前言";

/// Configuration for a conversion + split run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_html2md::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .input_path("site/index.html")
///     .output_dir("out")
///     .build()
///     .unwrap();
/// assert_eq!(config.sections_dir().to_str(), Some("out/sections"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// HTML document to convert. Default: `HTML/index.html`.
    pub input_path: PathBuf,

    /// Directory receiving every artifact. Default: `markdown`.
    pub output_dir: PathBuf,

    /// Name of the sections subdirectory. Default: `sections`.
    pub sections_dir_name: String,

    /// Name of the full-document file. Default: `index.full.md`.
    pub full_document_name: String,

    /// Name of the manifest file. Default: `sections.manifest.md`.
    pub manifest_name: String,

    /// Label of the preamble section. Default: `前言`.
    ///
    /// The preamble title is this label prefixed with its ordinal, e.g.
    /// `00-前言`.
    pub preamble_label: String,

    /// Markdown serialisation style.
    pub style: MarkdownStyle,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            sections_dir_name: DEFAULT_SECTIONS_DIR.to_string(),
            full_document_name: DEFAULT_FULL_DOCUMENT.to_string(),
            manifest_name: DEFAULT_MANIFEST.to_string(),
            preamble_label: DEFAULT_PREAMBLE_LABEL.to_string(),
            style: MarkdownStyle::default(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory holding the per-section files.
    pub fn sections_dir(&self) -> PathBuf {
        self.output_dir.join(&self.sections_dir_name)
    }

    /// Path of the full Markdown document.
    pub fn full_document_path(&self) -> PathBuf {
        self.output_dir.join(&self.full_document_name)
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir.join(&self.manifest_name)
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn input_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config.input_path = path.as_ref().to_path_buf();
        self
    }

    pub fn output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.config.output_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn sections_dir_name(mut self, name: impl Into<String>) -> Self {
        self.config.sections_dir_name = name.into();
        self
    }

    pub fn full_document_name(mut self, name: impl Into<String>) -> Self {
        self.config.full_document_name = name.into();
        self
    }

    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.config.manifest_name = name.into();
        self
    }

    pub fn preamble_label(mut self, label: impl Into<String>) -> Self {
        self.config.preamble_label = label.into();
        self
    }

    pub fn style(mut self, style: MarkdownStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Html2MdError> {
        let c = &self.config;
        for (what, name) in [
            ("sections directory name", &c.sections_dir_name),
            ("full document name", &c.full_document_name),
            ("manifest name", &c.manifest_name),
        ] {
            validate_file_name(what, name)?;
        }
        if c.full_document_name == c.manifest_name {
            return Err(Html2MdError::InvalidConfig(format!(
                "full document and manifest must differ, both are '{}'",
                c.manifest_name
            )));
        }
        if c.input_path.as_os_str().is_empty() {
            return Err(Html2MdError::InvalidConfig(
                "input path must not be empty".into(),
            ));
        }
        c.style.validate()?;
        Ok(self.config)
    }
}

fn validate_file_name(what: &str, name: &str) -> Result<(), Html2MdError> {
    if name.trim().is_empty() {
        return Err(Html2MdError::InvalidConfig(format!("{what} must not be empty")));
    }
    if name.contains('/') || name.contains('\\') || name == "." || name == ".." {
        return Err(Html2MdError::InvalidConfig(format!(
            "{what} must be a plain file name, got '{name}'"
        )));
    }
    Ok(())
}

// ── Markdown style ───────────────────────────────────────────────────────

/// Serialisation choices for the generated Markdown.
///
/// Code blocks are always fenced and list-item content is always indented by
/// one level past the marker; the splitter and verifier rely on both, so they
/// are not configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownStyle {
    /// Unordered-list bullet: `-`, `*` or `+`. Default: `-`.
    pub bullet: char,
    /// Emphasis marker: `*` or `_`. Default: `*`.
    pub emphasis: char,
    /// Strong marker (doubled on output): `*` or `_`. Default: `*`.
    pub strong: char,
    /// Thematic-break character (tripled on output): `*`, `-` or `_`. Default: `*`.
    pub rule: char,
}

impl Default for MarkdownStyle {
    fn default() -> Self {
        Self {
            bullet: '-',
            emphasis: '*',
            strong: '*',
            rule: '*',
        }
    }
}

impl MarkdownStyle {
    fn validate(&self) -> Result<(), Html2MdError> {
        if !matches!(self.bullet, '-' | '*' | '+') {
            return Err(Html2MdError::InvalidConfig(format!(
                "bullet must be '-', '*' or '+', got '{}'",
                self.bullet
            )));
        }
        for (what, marker) in [("emphasis", self.emphasis), ("strong", self.strong)] {
            if !matches!(marker, '*' | '_') {
                return Err(Html2MdError::InvalidConfig(format!(
                    "{what} marker must be '*' or '_', got '{marker}'"
                )));
            }
        }
        if !matches!(self.rule, '*' | '-' | '_') {
            return Err(Html2MdError::InvalidConfig(format!(
                "rule marker must be '*', '-' or '_', got '{}'",
                self.rule
            )));
        }
        if self.rule == self.bullet {
            // A rule built from the bullet character is ambiguous inside list items.
            return Err(Html2MdError::InvalidConfig(
                "rule marker must differ from the bullet".into(),
            ));
        }
        Ok(())
    }
}
