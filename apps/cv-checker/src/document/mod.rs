//! Résumé ingestion: resolve the reference, pick an extractor, normalise the text.

pub mod extract;
pub mod format;
pub mod normalize;
pub mod source;
