use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::llm_client::DEFAULT_BASE_URL;

/// Runtime configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub model_catalog_path: PathBuf,
    pub examples_path: PathBuf,
    pub http_timeout: Duration,
    pub completion_reserve_tokens: usize,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            openrouter_api_key: require(&lookup, "OPENROUTER_API_KEY")?,
            openrouter_base_url: get("OPENROUTER_BASE_URL", DEFAULT_BASE_URL),
            model_catalog_path: get("CV_CHECKER_MODEL_CATALOG", "free_model_names.txt").into(),
            examples_path: get("CV_CHECKER_EXAMPLES", "fixtures/learning_examples.json").into(),
            http_timeout: Duration::from_secs(parse(
                &get("CV_CHECKER_HTTP_TIMEOUT_SECS", "120"),
                "CV_CHECKER_HTTP_TIMEOUT_SECS",
            )?),
            completion_reserve_tokens: parse(
                &get("CV_CHECKER_COMPLETION_RESERVE", "1024"),
                "CV_CHECKER_COMPLETION_RESERVE",
            )?,
            rust_log: get("RUST_LOG", "info"),
        })
    }
}

fn require(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse<T>(raw: &str, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
}
