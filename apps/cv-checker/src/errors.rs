use thiserror::Error;

use crate::document::extract::ExtractError;
use crate::llm_client::LlmError;

/// Every way a single résumé/job comparison can fail.
/// All variants are fatal to the run; `main` maps them onto exit codes.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to extract text from {path}: {source}")]
    Extraction {
        path: String,
        #[source]
        source: ExtractError,
    },

    #[error(
        "prompt for {model} is too large: ~{estimated_tokens} tokens against a budget of {budget_tokens}"
    )]
    PromptTooLarge {
        model: String,
        estimated_tokens: usize,
        budget_tokens: usize,
    },

    #[error("unknown model: {0}")]
    UnknownModel(String),

    #[error("completion failed [{kind}]: {0}", kind = .0.kind())]
    Completion(#[from] LlmError),

    #[error("example fixture error: {0}")]
    Fixture(String),

    #[error("configuration error: {0:#}")]
    Config(#[from] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Stable name of the failure kind, shown to the operator.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Fetch { .. } => "FetchError",
            PipelineError::NotFound(_) => "NotFoundError",
            PipelineError::UnsupportedFormat(_) => "UnsupportedFormatError",
            PipelineError::Extraction { .. } => "ExtractionError",
            PipelineError::PromptTooLarge { .. } => "PromptTooLargeError",
            PipelineError::UnknownModel(_) => "UnknownModelError",
            PipelineError::Completion(_) => "CompletionError",
            PipelineError::Fixture(_) => "FixtureError",
            PipelineError::Config(_) => "ConfigError",
            PipelineError::Io(_) => "IoError",
        }
    }

    /// Process exit code for this failure. Never 0; 2 is left to clap usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::Fetch { .. } => 3,
            PipelineError::NotFound(_) => 4,
            PipelineError::UnsupportedFormat(_) => 5,
            PipelineError::Extraction { .. } => 6,
            PipelineError::PromptTooLarge { .. } => 7,
            PipelineError::UnknownModel(_) => 8,
            PipelineError::Completion(_) => 9,
            PipelineError::Fixture(_) => 10,
            PipelineError::Config(_) => 11,
            PipelineError::Io(_) => 12,
        }
    }
}
