//! Format Dispatcher: maps a résumé artifact onto the extractor for its format family.
//!
//! Unknown extensions are refused outright; there is no sniffing fallback.

use std::path::Path;

use crate::document::extract::Extractor;
use crate::document::source::ResumeArtifact;
use crate::errors::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Doc,
    Docx,
    Xls,
    Xlsx,
    Ppt,
    Pptx,
    Hwp,
    Hwpx,
}

impl DocumentFormat {
    /// Case-insensitive extension lookup; a leading dot is tolerated.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        let format = match ext.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "doc" => DocumentFormat::Doc,
            "docx" => DocumentFormat::Docx,
            "xls" => DocumentFormat::Xls,
            "xlsx" => DocumentFormat::Xlsx,
            "ppt" => DocumentFormat::Ppt,
            "pptx" => DocumentFormat::Pptx,
            "hwp" => DocumentFormat::Hwp,
            "hwpx" => DocumentFormat::Hwpx,
            _ => return None,
        };
        Some(format)
    }

    /// Maps a `Content-Type` header value (parameters ignored).
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        let format = match mime.as_str() {
            "application/pdf" => DocumentFormat::Pdf,
            "application/msword" => DocumentFormat::Doc,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                DocumentFormat::Docx
            }
            "application/vnd.ms-excel" => DocumentFormat::Xls,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                DocumentFormat::Xlsx
            }
            "application/vnd.ms-powerpoint" => DocumentFormat::Ppt,
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => {
                DocumentFormat::Pptx
            }
            "application/x-hwp" | "application/haansofthwp" | "application/vnd.hancom.hwp" => {
                DocumentFormat::Hwp
            }
            "application/hwp+zip" | "application/vnd.hancom.hwpx" => DocumentFormat::Hwpx,
            _ => return None,
        };
        Some(format)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Xls => "xls",
            DocumentFormat::Xlsx => "xlsx",
            DocumentFormat::Ppt => "ppt",
            DocumentFormat::Pptx => "pptx",
            DocumentFormat::Hwp => "hwp",
            DocumentFormat::Hwpx => "hwpx",
        }
    }
}

/// Lower-cased extension of `path`, if any.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Chooses the extractor for an artifact from its file extension.
pub fn dispatch(artifact: &ResumeArtifact) -> Result<Extractor, PipelineError> {
    let path = artifact.path();
    let ext = extension_of(path).ok_or_else(|| {
        PipelineError::UnsupportedFormat(format!("{} has no file extension", path.display()))
    })?;
    let format = DocumentFormat::from_extension(&ext).ok_or_else(|| {
        PipelineError::UnsupportedFormat(format!(
            ".{ext} ({}); expected PDF, DOC/DOCX, XLS/XLSX, PPT/PPTX or HWP/HWPX",
            path.display()
        ))
    })?;
    Ok(Extractor::for_format(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn artifact(name: &str) -> ResumeArtifact {
        ResumeArtifact::local(PathBuf::from(name))
    }

    #[test]
    fn test_extension_lookup_is_case_insensitive() {
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension(".DocX"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("hwpx"), Some(DocumentFormat::Hwpx));
        assert_eq!(DocumentFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_content_type_lookup_ignores_parameters() {
        assert_eq!(
            DocumentFormat::from_content_type("application/pdf; charset=binary"),
            Some(DocumentFormat::Pdf)
        );
        assert_eq!(
            DocumentFormat::from_content_type(
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            ),
            Some(DocumentFormat::Pptx)
        );
        assert_eq!(DocumentFormat::from_content_type("text/html"), None);
    }

    #[test]
    fn test_dispatch_routes_every_supported_family() {
        let cases = [
            ("cv.pdf", Extractor::Pdf),
            ("cv.DOC", Extractor::Word { legacy: true }),
            ("cv.docx", Extractor::Word { legacy: false }),
            ("cv.xls", Extractor::Excel),
            ("cv.XLSX", Extractor::Excel),
            ("cv.ppt", Extractor::PowerPoint { legacy: true }),
            ("cv.pptx", Extractor::PowerPoint { legacy: false }),
            ("cv.hwp", Extractor::Hangul { legacy: true }),
            ("cv.hwpx", Extractor::Hangul { legacy: false }),
        ];
        for (name, expected) in cases {
            assert_eq!(dispatch(&artifact(name)).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn test_dispatch_refuses_unsupported_extensions() {
        for name in ["cv.txt", "cv.md", "cv", "cv.pdf.bak"] {
            let err = dispatch(&artifact(name)).unwrap_err();
            assert_eq!(err.kind(), "UnsupportedFormatError", "{name}");
        }
    }
}
