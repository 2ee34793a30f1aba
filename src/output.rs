//! Result types returned by [`crate::build`] and [`crate::verify`].

use crate::pipeline::split::SectionEntry;
use serde::Serialize;

/// Everything a build produced. The same data has already been persisted
/// through the store when this is returned.
#[derive(Debug, Clone, Serialize)]
pub struct BuildOutput {
    /// The full Markdown document.
    pub markdown: String,
    /// Sections in document order.
    pub sections: Vec<SectionEntry>,
    /// Manifest text as written.
    pub manifest: String,
    pub stats: BuildStats,
}

/// Counters and timings of a build.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildStats {
    pub input_bytes: usize,
    pub markdown_bytes: usize,
    pub section_count: usize,
    /// Comment nodes removed before translation.
    pub comments_removed: usize,
    /// Table cells flattened to one line.
    pub cells_flattened: usize,
    /// Parse, sanitize, translate and serialize.
    pub convert_duration_ms: u64,
    /// Writing every artifact.
    pub write_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Outcome of a successful round-trip verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Number of section files read back.
    pub files_verified: usize,
    /// Length in bytes of the normalised text both sides agreed on.
    pub normalized_len: usize,
}
