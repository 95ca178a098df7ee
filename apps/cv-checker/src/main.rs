mod cli;
mod config;
mod document;
mod errors;
mod http;
mod job;
mod llm_client;
mod models;
mod pipeline;
mod prompt;
mod verdict;

#[cfg(test)]
mod test_support;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::Cli;
use crate::config::Config;
use crate::document::source::ResumeReference;
use crate::errors::PipelineError;
use crate::job::JobSource;
use crate::llm_client::LlmClient;
use crate::models::catalog::ModelCatalog;
use crate::pipeline::{run_comparison, ComparisonRequest, PipelineContext};
use crate::prompt::PromptBudget;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(kind = e.kind(), "run failed: {e}");
            eprintln!("error[{}]: {e}", e.kind());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<(), PipelineError> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Logs go to stderr; stdout carries only the verdict
    let level = if cli.verbose { "debug" } else { config.rust_log.as_str() };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting cv-checker v{}", env!("CARGO_PKG_VERSION"));

    let catalog = if config.model_catalog_path.is_file() {
        ModelCatalog::load(&config.model_catalog_path)?
    } else {
        warn!(
            "model catalog {} not found, using the built-in list",
            config.model_catalog_path.display()
        );
        ModelCatalog::builtin()
    };
    info!("{} model(s) in catalog", catalog.entries().len());

    let job = match cli.job.as_deref() {
        Some(raw) => JobSource::parse(raw),
        None => match ask_for_job().await? {
            Some(answer) => JobSource::parse(&answer),
            None => {
                info!("no job description given, nothing to compare");
                return Ok(());
            }
        },
    };

    let http = http::build_client(config.http_timeout).context("failed to build HTTP client")?;
    let llm = build_llm_client(&config)?;
    info!("LLM client initialized ({})", config.openrouter_base_url);

    let ctx = PipelineContext {
        catalog,
        examples_path: config.examples_path.clone(),
        http,
        budget: PromptBudget {
            completion_reserve_tokens: config.completion_reserve_tokens,
        },
    };
    let request = ComparisonRequest {
        cv: ResumeReference::parse(&cli.cv),
        job,
        mode: cli.learn_mode,
        model_id: cli.model_type,
        digest_job: cli.digest_job,
    };

    let verdict = run_comparison(&ctx, &request, &llm).await?;

    let mut stdout = std::io::stdout().lock();
    if cli.json {
        serde_json::to_writer_pretty(&mut stdout, &verdict).map_err(std::io::Error::from)?;
        writeln!(stdout)?;
    } else {
        writeln!(stdout, "{verdict}")?;
    }
    Ok(())
}

/// Building the completion client is part of configuration: a bad base URL
/// or an unusable TLS backend is reported as a configuration failure.
fn build_llm_client(config: &Config) -> Result<LlmClient, PipelineError> {
    url::Url::parse(&config.openrouter_base_url).with_context(|| {
        format!(
            "OPENROUTER_BASE_URL is not a valid URL: '{}'",
            config.openrouter_base_url
        )
    })?;
    let llm = LlmClient::new(
        config.openrouter_api_key.clone(),
        &config.openrouter_base_url,
        config.http_timeout,
        u32::try_from(config.completion_reserve_tokens).unwrap_or(u32::MAX),
    )
    .context("failed to build completion client")?;
    Ok(llm)
}

/// Prompts once on stderr and reads the answer from stdin.
async fn ask_for_job() -> Result<Option<String>, PipelineError> {
    eprint!("Job posting link or path: ");
    std::io::stderr().flush()?;
    Ok(job::read_answer(BufReader::new(tokio::io::stdin())).await?)
}
