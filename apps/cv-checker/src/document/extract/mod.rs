//! Extractors: one per format family, selected by the format dispatcher.
//!
//! Every extractor returns the document's fragments in source order. Failures
//! carry the underlying library error and are never swallowed.

mod excel;
mod hangul;
mod ole;
mod pdf;
mod powerpoint;
mod word;
mod xml;

use std::path::Path;

use thiserror::Error;

use crate::document::format::DocumentFormat;
use crate::document::normalize::ExtractedDocument;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_extract::OutputError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document is password-protected or encrypted")]
    Encrypted,

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Format family handlers. `legacy` selects the pre-2007 binary variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Pdf,
    Word { legacy: bool },
    Excel,
    PowerPoint { legacy: bool },
    Hangul { legacy: bool },
}

impl Extractor {
    pub fn for_format(format: DocumentFormat) -> Self {
        match format {
            DocumentFormat::Pdf => Extractor::Pdf,
            DocumentFormat::Doc => Extractor::Word { legacy: true },
            DocumentFormat::Docx => Extractor::Word { legacy: false },
            DocumentFormat::Xls | DocumentFormat::Xlsx => Extractor::Excel,
            DocumentFormat::Ppt => Extractor::PowerPoint { legacy: true },
            DocumentFormat::Pptx => Extractor::PowerPoint { legacy: false },
            DocumentFormat::Hwp => Extractor::Hangul { legacy: true },
            DocumentFormat::Hwpx => Extractor::Hangul { legacy: false },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Extractor::Pdf => "pdf",
            Extractor::Word { .. } => "word",
            Extractor::Excel => "excel",
            Extractor::PowerPoint { .. } => "powerpoint",
            Extractor::Hangul { .. } => "hangul",
        }
    }

    pub fn extract(&self, path: &Path) -> Result<ExtractedDocument, ExtractError> {
        match self {
            Extractor::Pdf => pdf::extract(path),
            Extractor::Word { legacy: false } => word::extract_docx(path),
            Extractor::Word { legacy: true } => word::extract_doc(path),
            Extractor::Excel => excel::extract(path),
            Extractor::PowerPoint { legacy: false } => powerpoint::extract_pptx(path),
            Extractor::PowerPoint { legacy: true } => powerpoint::extract_ppt(path),
            Extractor::Hangul { legacy: false } => hangul::extract_hwpx(path),
            Extractor::Hangul { legacy: true } => hangul::extract_hwp(path),
        }
    }
}
