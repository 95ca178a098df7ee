//! Timeout-bounded HTTP GET shared by the résumé resolver and the job loader.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::errors::PipelineError;

const AGENT: &str = concat!("cv-checker/", env!("CARGO_PKG_VERSION"));

pub struct Fetched {
    pub body: Bytes,
    pub content_type: Option<String>,
    /// URL after redirects.
    pub url: Url,
}

pub fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));

    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
}

/// GETs `url`; transport failures and non-2xx statuses become `FetchError`.
pub async fn fetch(client: &Client, url: &Url) -> Result<Fetched, PipelineError> {
    let fetch_error = |message: String| PipelineError::Fetch {
        url: url.to_string(),
        message,
    };

    let resp = client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(fetch_error(format!("http status {status}")));
    }

    let content_type = resp
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let final_url = resp.url().clone();

    let body = resp
        .bytes()
        .await
        .map_err(|e| fetch_error(format!("failed to read body: {e}")))?;

    debug!(
        "fetched {} ({} bytes, content-type {:?})",
        final_url,
        body.len(),
        content_type
    );

    Ok(Fetched {
        body,
        content_type,
        url: final_url,
    })
}

/// Parses `raw` as a URL only when it uses the `http` or `https` scheme.
pub fn parse_web_url(raw: &str) -> Option<Url> {
    Url::parse(raw.trim())
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}
