//! Error types for the edgequake-html2md library.
//!
//! Every failure in this crate is fatal: a run either produces a complete,
//! self-consistent set of artifacts or it is reported as failed. There is no
//! partial-success mode, so a single error type covers the four failure
//! families:
//!
//! * **input**: the HTML source is missing or unreadable (nothing written)
//! * **parse**: the source cannot be decoded as a document (nothing written)
//! * **output**: directory creation or a file write failed (may leave
//!   partial output behind; there is no rollback)
//! * **verification**: the split sections do not add back up to the full
//!   document, which signals a regression in the converter or the splitter

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-html2md library.
#[derive(Debug, Error)]
pub enum Html2MdError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("HTML file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Any other I/O failure while reading the input document.
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Parse errors ──────────────────────────────────────────────────────
    /// The input bytes could not be turned into a document tree.
    #[error("Could not parse '{path}' as an HTML document: {detail}")]
    ParseFailed { path: PathBuf, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create a directory or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read back a persisted artifact during verification.
    #[error("Failed to read artifact '{path}': {source}")]
    ArtifactReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Verification errors ───────────────────────────────────────────────
    /// Normalised full document and normalised section concatenation differ.
    #[error(
        "Split+merge verification failed: text mismatch detected \
         ({sections} sections, normalised lengths {full_len} vs {merged_len})"
    )]
    VerificationFailed {
        sections: usize,
        full_len: usize,
        merged_len: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Html2MdError {
    /// Map an I/O error raised while reading the input document.
    pub(crate) fn from_input_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => Html2MdError::InputNotFound { path },
            std::io::ErrorKind::PermissionDenied => Html2MdError::PermissionDenied { path },
            _ => Html2MdError::InputReadFailed { path, source },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_failed_display() {
        let e = Html2MdError::VerificationFailed {
            sections: 4,
            full_len: 120,
            merged_len: 118,
        };
        let msg = e.to_string();
        assert!(msg.contains("text mismatch"), "got: {msg}");
        assert!(msg.contains("120 vs 118"), "got: {msg}");
    }

    #[test]
    fn not_found_io_maps_to_input_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e = Html2MdError::from_input_io(PathBuf::from("HTML/index.html"), io);
        assert!(matches!(e, Html2MdError::InputNotFound { .. }));
        assert!(e.to_string().contains("HTML/index.html"));
    }

    #[test]
    fn permission_io_maps_to_permission_denied() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let e = Html2MdError::from_input_io(PathBuf::from("a.html"), io);
        assert!(matches!(e, Html2MdError::PermissionDenied { .. }));
    }

    #[test]
    fn other_io_keeps_source() {
        let io = std::io::Error::other("disk on fire");
        let e = Html2MdError::from_input_io(PathBuf::from("a.html"), io);
        assert!(e.to_string().contains("disk on fire"));
    }

    #[test]
    fn output_write_failed_display() {
        let e = Html2MdError::OutputWriteFailed {
            path: PathBuf::from("markdown/sections/00-a.md"),
            source: std::io::Error::other("read-only"),
        };
        assert!(e.to_string().contains("00-a.md"));
        assert!(e.to_string().contains("read-only"));
    }
}
