use std::panic;
use std::path::Path;

use tracing::debug;

use crate::document::extract::ExtractError;
use crate::document::normalize::ExtractedDocument;

/// One fragment per page. Image-only pages give empty fragments, which are kept.
pub fn extract(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let bytes = std::fs::read(path)?;

    // pdf-extract panics on some malformed inputs instead of returning an error.
    let pages = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .map_err(|_| ExtractError::Malformed("PDF parser aborted on this file".to_string()))??;

    debug!("pdf: {} page(s)", pages.len());
    Ok(ExtractedDocument::new(pages))
}
