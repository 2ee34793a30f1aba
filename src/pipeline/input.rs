//! Input stage: read the HTML source and parse it into a document tree.
//!
//! Parsing always treats the input as a complete document, so a bare
//! fragment still gets the implied `html`/`head`/`body` wrappers from the
//! HTML5 tree builder. The only unrecoverable parse condition is input that
//! is not valid UTF-8; everything else is handled by the HTML5 error-recovery
//! rules.

use crate::error::Html2MdError;
use crate::store::ArtifactStore;
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::RcDom;
use std::path::Path;
use tracing::{debug, info};

/// Read the input document from the store.
pub async fn read_document<S: ArtifactStore>(
    store: &S,
    path: &Path,
) -> Result<Vec<u8>, Html2MdError> {
    let bytes = store
        .read(path)
        .await
        .map_err(|e| Html2MdError::from_input_io(path.to_path_buf(), e))?;
    info!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Decode and parse HTML bytes as a full document.
pub fn parse_html(bytes: &[u8], path: &Path) -> Result<RcDom, Html2MdError> {
    let text = std::str::from_utf8(bytes).map_err(|e| Html2MdError::ParseFailed {
        path: path.to_path_buf(),
        detail: format!("input is not valid UTF-8: {e}"),
    })?;
    let dom = parse_html_str(text);
    debug!("Parsed {} into a document tree", path.display());
    Ok(dom)
}

/// Parse already-decoded HTML. A leading byte order mark is ignored.
pub fn parse_html_str(text: &str) -> RcDom {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    parse_document(RcDom::default(), ParseOpts::default()).one(text)
}
