//! Result Interpreter: wraps the completion outcome into the verdict shown to
//! the operator. The response text is surfaced as-is; no score is parsed out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::errors::PipelineError;
use crate::llm_client::CompletionResult;
use crate::prompt::LearnMode;

#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub resume_reference: String,
    pub job_reference: String,
    pub model: String,
    pub mode: LearnMode,
    pub generated_at: DateTime<Utc>,
    pub response_text: String,
}

/// Identifiers carried alongside the response.
#[derive(Debug, Clone)]
pub struct VerdictContext {
    pub resume_reference: String,
    pub job_reference: String,
    pub model: String,
    pub mode: LearnMode,
}

/// Failed completions keep their backend failure kind.
pub fn interpret(
    outcome: CompletionResult,
    context: VerdictContext,
) -> Result<Verdict, PipelineError> {
    let completion = outcome?;
    if let Some(usage) = &completion.usage {
        info!(
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            "completion received from {}",
            context.model
        );
    }
    Ok(Verdict {
        resume_reference: context.resume_reference,
        job_reference: context.job_reference,
        model: context.model,
        mode: context.mode,
        generated_at: Utc::now(),
        response_text: completion.text,
    })
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Resume:    {}", self.resume_reference)?;
        writeln!(f, "Job:       {}", self.job_reference)?;
        writeln!(f, "Model:     {}", self.model)?;
        writeln!(f, "Mode:      {}", self.mode)?;
        writeln!(f, "Generated: {}", self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f)?;
        write!(f, "{}", self.response_text.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{Completion, LlmError, Usage};

    fn context() -> VerdictContext {
        VerdictContext {
            resume_reference: "cv.pdf".to_string(),
            job_reference: "https://jobs.example.com/1".to_string(),
            model: "google/gemma-3-27b-it:free".to_string(),
            mode: LearnMode::OneShot,
        }
    }

    #[test]
    fn test_success_surfaces_text_unchanged() {
        let text = "Semantic Similarity Percentage: 72%\n\nRationale: strong Rust background.  ";
        let verdict = interpret(
            Ok(Completion {
                text: text.to_string(),
                usage: Some(Usage {
                    prompt_tokens: 900,
                    completion_tokens: 120,
                }),
            }),
            context(),
        )
        .unwrap();

        assert_eq!(verdict.response_text, text);
        assert_eq!(verdict.resume_reference, "cv.pdf");
        assert_eq!(verdict.mode, LearnMode::OneShot);
    }

    #[test]
    fn test_failure_kind_is_preserved() {
        let err = interpret(
            Err(LlmError::Api {
                status: 401,
                message: "No auth credentials found".to_string(),
            }),
            context(),
        )
        .err()
        .unwrap();

        assert_eq!(err.kind(), "CompletionError");
        match err {
            PipelineError::Completion(inner) => assert_eq!(inner.kind(), "authentication"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_display_and_json() {
        let verdict = interpret(
            Ok(Completion {
                text: "Looks like a match.".to_string(),
                usage: None,
            }),
            context(),
        )
        .unwrap();

        let shown = verdict.to_string();
        assert!(shown.starts_with("Resume:    cv.pdf\n"));
        assert!(shown.contains("Mode:      one-shot"));
        assert!(shown.ends_with("Looks like a match."));

        let json: serde_json::Value = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["mode"], "one-shot");
        assert_eq!(json["response_text"], "Looks like a match.");
    }
}
