//! Round-trip verification of persisted artifacts.
//!
//! Reads back the full document and every section file, joins the sections in
//! file-name order and checks that both sides normalise to the same text.
//! Normalisation removes fenced code blocks and every whitespace character,
//! so the check is about content, not layout: it catches text that was lost
//! or duplicated by the split, not reflowed blank lines.

use crate::config::ConversionConfig;
use crate::error::Html2MdError;
use crate::output::VerifyReport;
use crate::store::{ArtifactStore, FsStore};
use futures::future::try_join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A fence opener to the next fence closer, across lines, shortest match.
static RE_FENCED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Separator used when merging sections back together.
const SECTION_JOIN: &str = "\n\n";

/// Strip fenced code and all whitespace.
pub fn normalize(text: &str) -> String {
    let without_code = RE_FENCED.replace_all(text, "");
    RE_WHITESPACE.replace_all(&without_code, "").into_owned()
}

/// Check that the persisted sections add back up to the full document.
///
/// # Errors
/// - [`Html2MdError::ArtifactReadFailed`] when the full document, the
///   sections directory or a section file cannot be read
/// - [`Html2MdError::VerificationFailed`] when the normalised texts differ
pub async fn verify<S: ArtifactStore>(
    config: &ConversionConfig,
    store: &S,
) -> Result<VerifyReport, Html2MdError> {
    let full_path = config.full_document_path();
    let sections_dir = config.sections_dir();

    let full = read_artifact(store, &full_path).await?;

    let mut names = store
        .list_dir(&sections_dir)
        .await
        .map_err(|e| Html2MdError::ArtifactReadFailed {
            path: sections_dir.clone(),
            source: e,
        })?;
    let listed = names.len();
    names.retain(|name| name.ends_with(".md"));
    names.sort();
    if names.len() < listed {
        debug!("Ignoring {} non-Markdown entries", listed - names.len());
    }

    let paths: Vec<PathBuf> = names.iter().map(|name| sections_dir.join(name)).collect();
    // Reads run concurrently; try_join_all keeps results in input order.
    let contents = try_join_all(paths.iter().map(|p| read_artifact(store, p))).await?;
    let merged = contents.join(SECTION_JOIN);

    let normalized_full = normalize(&full);
    let normalized_merged = normalize(&merged);
    if normalized_full != normalized_merged {
        warn!(
            "Verification mismatch over {} files ({} vs {} normalised bytes)",
            names.len(),
            normalized_full.len(),
            normalized_merged.len()
        );
        return Err(Html2MdError::VerificationFailed {
            sections: names.len(),
            full_len: normalized_full.len(),
            merged_len: normalized_merged.len(),
        });
    }

    info!(
        "Verified {} files, no text loss after split+merge.",
        names.len()
    );
    Ok(VerifyReport {
        files_verified: names.len(),
        normalized_len: normalized_full.len(),
    })
}

/// Synchronous wrapper around [`verify`] on the filesystem under `root`.
pub fn verify_sync(
    config: &ConversionConfig,
    root: impl AsRef<Path>,
) -> Result<VerifyReport, Html2MdError> {
    let store = FsStore::new(root.as_ref());
    tokio::runtime::Runtime::new()
        .map_err(|e| Html2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(verify(config, &store))
}

async fn read_artifact<S: ArtifactStore>(store: &S, path: &Path) -> Result<String, Html2MdError> {
    store
        .read_to_string(path)
        .await
        .map_err(|e| Html2MdError::ArtifactReadFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn store_with(full: &str, sections: &[(&str, &str)]) -> MemoryStore {
        let mut store = MemoryStore::new().with_file("markdown/index.full.md", full);
        for (name, body) in sections {
            store = store.with_file(format!("markdown/sections/{name}"), *body);
        }
        store
    }

    fn run(store: &MemoryStore) -> Result<VerifyReport, Html2MdError> {
        tokio_test::block_on(verify(&ConversionConfig::default(), store))
    }

    #[test]
    fn normalize_strips_code_and_whitespace() {
        assert_eq!(normalize("a b\n\n```rust\nlet x;\n```\nc\td"), "abcd");
        assert_eq!(normalize("x ``` one ``` y ``` two ``` z"), "xyz");
    }

    #[test]
    fn matching_sections_verify() {
        let store = store_with(
            "intro\n\n## A\n\nbody\n",
            &[("00-前言.md", "intro\n"), ("01-a.md", "## A\n\nbody\n")],
        );
        let report = run(&store).unwrap();
        assert_eq!(report.files_verified, 2);
        assert_eq!(report.normalized_len, normalize("intro##Abody").len());
    }

    #[test]
    fn sections_are_merged_in_name_order() {
        // Listed out of order by the store; the sort must restore it.
        let store = store_with(
            "first\n\nsecond\n",
            &[("01-b.md", "second\n"), ("00-a.md", "first\n")],
        );
        assert_eq!(run(&store).unwrap().files_verified, 2);
    }

    #[test]
    fn missing_text_fails() {
        let store = store_with("a\n\n## B\n\nlost words\n", &[("00-a.md", "a\n")]);
        let err = run(&store).unwrap_err();
        assert!(matches!(
            err,
            Html2MdError::VerificationFailed { sections: 1, .. }
        ));
    }

    #[test]
    fn duplicated_text_fails() {
        let store = store_with("a\n", &[("00-a.md", "a\n"), ("01-a.md", "a\n")]);
        assert!(run(&store).is_err());
    }

    #[test]
    fn non_markdown_entries_are_ignored() {
        let store = store_with(
            "x\n",
            &[("00-x.md", "x\n"), ("notes.txt", "junk"), ("01-y.md.bak", "y")],
        );
        assert_eq!(run(&store).unwrap().files_verified, 1);
    }

    #[test]
    fn deleted_section_after_build_fails() {
        let store = MemoryStore::new().with_file(
            "HTML/index.html",
            "<p>lead</p><h2>A</h2><p>kept</p><h2>B</h2><p>dropped</p>",
        );
        let config = ConversionConfig::default();
        tokio_test::block_on(crate::convert::build(&config, &store)).unwrap();
        assert_eq!(run(&store).unwrap().files_verified, 3);

        assert!(store.remove("markdown/sections/02-b.md"));
        assert!(!store.remove("markdown/sections/02-b.md"));
        let err = run(&store).unwrap_err();
        assert!(matches!(
            err,
            Html2MdError::VerificationFailed { sections: 2, .. }
        ));
    }

    #[test]
    fn missing_full_document_is_a_read_error() {
        let store = MemoryStore::new().with_file("markdown/sections/00-a.md", "a\n");
        let err = run(&store).unwrap_err();
        assert!(matches!(err, Html2MdError::ArtifactReadFailed { .. }));
    }

    #[test]
    fn missing_sections_dir_is_a_read_error() {
        let store = MemoryStore::new().with_file("markdown/index.full.md", "a\n");
        let err = run(&store).unwrap_err();
        assert!(matches!(err, Html2MdError::ArtifactReadFailed { .. }));
    }
}
