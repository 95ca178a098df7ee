//! Text Normalizer: joins extracted fragments into the one text block passed downstream.

use serde::Serialize;

/// Separator placed between fragments.
pub const FRAGMENT_SEPARATOR: &str = "\n";

/// Ordered text fragments, one per page/sheet cell/slide run/paragraph,
/// exactly as the source container yields them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedDocument {
    fragments: Vec<String>,
}

impl ExtractedDocument {
    pub fn new(fragments: Vec<String>) -> Self {
        Self { fragments }
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// The canonical résumé text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalText(String);

impl CanonicalText {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trims each fragment at its edges only and joins them in order.
/// Internal whitespace is kept: it can carry tabular alignment.
pub fn normalize(doc: &ExtractedDocument) -> CanonicalText {
    let joined = doc
        .fragments()
        .iter()
        .map(|f| f.trim())
        .collect::<Vec<_>>()
        .join(FRAGMENT_SEPARATOR);
    CanonicalText(joined)
}
