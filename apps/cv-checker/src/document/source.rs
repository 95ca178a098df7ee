//! Source Resolver: turns the `--cv` reference into a locally readable artifact.
//!
//! Remote résumés are downloaded into a temporary file that is removed when the
//! `ResumeArtifact` is dropped, on success and failure alike.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use reqwest::Client;
use tempfile::TempPath;
use tracing::info;
use url::Url;

use crate::document::format::{extension_of, DocumentFormat};
use crate::errors::PipelineError;
use crate::http::{fetch, parse_web_url};

/// Where the résumé lives, as given by the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeReference {
    Remote(Url),
    Local(PathBuf),
}

impl ResumeReference {
    pub fn parse(raw: &str) -> Self {
        match parse_web_url(raw) {
            Some(url) => ResumeReference::Remote(url),
            None => ResumeReference::Local(PathBuf::from(raw)),
        }
    }
}

impl std::fmt::Display for ResumeReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResumeReference::Remote(url) => write!(f, "{url}"),
            ResumeReference::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A readable résumé file. Owns its temporary file, if it has one.
#[derive(Debug)]
pub struct ResumeArtifact {
    path: PathBuf,
    temp: Option<TempPath>,
}

impl ResumeArtifact {
    pub fn local(path: PathBuf) -> Self {
        Self { path, temp: None }
    }

    /// Writes `bytes` to a fresh temporary file ending in `.{extension}`.
    pub fn temporary(bytes: &[u8], extension: Option<&str>) -> std::io::Result<Self> {
        let suffix = extension.map(|e| format!(".{e}")).unwrap_or_default();
        let mut file = tempfile::Builder::new()
            .prefix("cv-checker-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        let temp = file.into_temp_path();
        Ok(Self {
            path: temp.to_path_buf(),
            temp: Some(temp),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }
}

pub async fn resolve(
    reference: &ResumeReference,
    http: &Client,
) -> Result<ResumeArtifact, PipelineError> {
    match reference {
        ResumeReference::Local(path) => resolve_local(path),
        ResumeReference::Remote(url) => resolve_remote(url, http).await,
    }
}

fn resolve_local(path: &Path) -> Result<ResumeArtifact, PipelineError> {
    let meta = std::fs::metadata(path)
        .map_err(|e| PipelineError::NotFound(format!("{}: {e}", path.display())))?;
    if !meta.is_file() {
        return Err(PipelineError::NotFound(format!(
            "{} is not a regular file",
            path.display()
        )));
    }
    File::open(path)
        .map_err(|e| PipelineError::NotFound(format!("{} is not readable: {e}", path.display())))?;

    info!("using local résumé {}", path.display());
    Ok(ResumeArtifact::local(path.to_path_buf()))
}

async fn resolve_remote(url: &Url, http: &Client) -> Result<ResumeArtifact, PipelineError> {
    let fetched = fetch(http, url).await?;
    let extension = remote_extension(&fetched.url, fetched.content_type.as_deref());

    let artifact = ResumeArtifact::temporary(&fetched.body, extension.as_deref())?;
    info!(
        "downloaded résumé from {} into {} ({} bytes)",
        url,
        artifact.path().display(),
        fetched.body.len()
    );
    Ok(artifact)
}

/// URL path extension when supported, else the content-type mapping,
/// else whatever extension the URL had.
fn remote_extension(url: &Url, content_type: Option<&str>) -> Option<String> {
    let url_ext = url
        .path_segments()
        .and_then(|segments| segments.last())
        .and_then(|name| extension_of(Path::new(name)));

    if let Some(ext) = &url_ext {
        if DocumentFormat::from_extension(ext).is_some() {
            return url_ext;
        }
    }
    content_type
        .and_then(DocumentFormat::from_content_type)
        .map(|f| f.extension().to_string())
        .or(url_ext)
}
