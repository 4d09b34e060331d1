pub mod conflicts;
pub mod export;
pub mod inspect;
pub mod tokenize;

use crate::output::{CliError, OutputMode, render_error};
use anyhow::Context as _;
use refanno_core::RefDocument;
use std::path::Path;
use tracing::debug;

/// Load a REF document from `path`.
///
/// `.json` files are parsed as REF documents; anything else is read as plain
/// text with one paragraph per line. Parse failures are rendered to stderr
/// before the error is returned.
pub fn load_document(path: &Path, output: OutputMode) -> anyhow::Result<RefDocument> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if !is_json {
        debug!(path = %path.display(), "loading plain text document");
        return Ok(RefDocument::from_text(&raw));
    }

    match RefDocument::from_json(&raw) {
        Ok(doc) => Ok(doc),
        Err(err) => {
            render_error(output, &CliError::from(&err))?;
            Err(err).with_context(|| format!("Failed to load {}", path.display()))
        }
    }
}
