use clap::Parser;

use crate::prompt::LearnMode;

/// Scores how well a résumé matches a job description using an LLM.
#[derive(Debug, Parser)]
#[command(name = "cv-checker", version)]
pub struct Cli {
    /// Résumé to check: a local path or an http(s) URL.
    #[arg(long)]
    pub cv: String,

    /// Prompting strategy.
    #[arg(long = "learn_mode", visible_alias = "learn-mode", value_enum)]
    pub learn_mode: LearnMode,

    /// Model identifier from the model catalog.
    #[arg(long = "model_type", visible_alias = "model-type")]
    pub model_type: String,

    /// Job description: a URL, a text file, or `-` for stdin.
    /// Asked for interactively when omitted.
    #[arg(long)]
    pub job: Option<String>,

    /// Reduce the posting to responsibilities and requirements before comparing.
    #[arg(long)]
    pub digest_job: bool,

    /// Print the verdict as JSON.
    #[arg(long)]
    pub json: bool,

    /// Debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}
