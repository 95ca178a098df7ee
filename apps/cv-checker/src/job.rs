//! Job description loading: a posting URL, a local text file or stdin.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqwest::Client;
use scraper::{Html, Node, Selector};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt};
use tracing::{info, warn};
use url::Url;

use crate::errors::PipelineError;
use crate::http::{fetch, parse_web_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSource {
    Url(Url),
    Path(PathBuf),
    Stdin,
}

impl JobSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "-" {
            return JobSource::Stdin;
        }
        match parse_web_url(raw) {
            Some(url) => JobSource::Url(url),
            None => JobSource::Path(PathBuf::from(raw)),
        }
    }
}

impl std::fmt::Display for JobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobSource::Url(url) => write!(f, "{url}"),
            JobSource::Path(path) => write!(f, "{}", path.display()),
            JobSource::Stdin => f.write_str("<stdin>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescription {
    pub reference: String,
    pub text: String,
}

pub async fn load(source: &JobSource, client: &Client) -> Result<JobDescription, PipelineError> {
    let text = match source {
        JobSource::Url(url) => {
            let fetched = fetch(client, url).await?;
            let raw = String::from_utf8_lossy(&fetched.body);
            let is_html = fetched
                .content_type
                .as_deref()
                .is_some_and(|ct| ct.to_ascii_lowercase().contains("html"))
                || looks_like_html(&raw);
            if is_html {
                html_to_text(&raw)
            } else {
                raw.into_owned()
            }
        }
        JobSource::Path(path) => {
            let raw = read_local(path).await?;
            if looks_like_html(&raw) {
                html_to_text(&raw)
            } else {
                raw
            }
        }
        JobSource::Stdin => read_all(tokio::io::stdin()).await?,
    };

    if text.trim().is_empty() {
        warn!("job description from {} is empty", source);
    }
    info!("job description loaded from {} ({} chars)", source, text.chars().count());

    Ok(JobDescription {
        reference: source.to_string(),
        text,
    })
}

async fn read_local(path: &Path) -> Result<String, PipelineError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(PipelineError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(PipelineError::Io(e)),
    }
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> Result<String, PipelineError> {
    let mut text = String::new();
    reader.read_to_string(&mut text).await?;
    Ok(text)
}

/// Reads one answer line from the operator. `None` when the answer is empty.
pub async fn read_answer<R: AsyncBufRead + Unpin>(
    mut reader: R,
) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let answer = line.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

fn looks_like_html(raw: &str) -> bool {
    let head = raw.trim_start();
    head.starts_with('<')
        && (head
            .get(..5)
            .is_some_and(|p| p.eq_ignore_ascii_case("<!doc"))
            || head.contains("<body"))
}

/// Visible text of `<body>`, one trimmed text node per line.
/// Script, style and noscript contents are left out.
fn html_to_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let root = match Selector::parse("body") {
        Ok(selector) => doc.select(&selector).next(),
        Err(_) => None,
    }
    .unwrap_or_else(|| doc.root_element());

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        if hidden {
            continue;
        }
        let s = text.trim();
        if !s.is_empty() {
            lines.push(s.to_string());
        }
    }
    lines.join("\n")
}
