//! Prompt Assembler: turns canonical résumé text and a job description into the
//! single request sent to the completion backend, with a pre-flight size check.
//!
//! The learning mode only matters here: `Shots::Zero` carries no examples at all,
//! `Shots::Few` carries every fixture example in fixture order.

pub mod prompts;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::normalize::CanonicalText;
use crate::errors::PipelineError;
use crate::llm_client::prompts::{
    FOLLOW_EXAMPLE_INSTRUCTION, RECRUITER_SYSTEM, TRANSLATE_INSTRUCTION,
};
use crate::models::catalog::ModelEntry;
use crate::models::learning_example::LearningExample;
use crate::prompt::prompts::{
    COMPARISON_EXAMPLE_TEMPLATE, COMPARISON_INSTRUCTIONS, COMPARISON_PAYLOAD_TEMPLATE,
    DIGEST_EXAMPLE_TEMPLATE, DIGEST_INSTRUCTIONS, DIGEST_PAYLOAD_TEMPLATE,
};

/// Rough characters-per-token ratio used for the pre-flight estimate.
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LearnMode {
    ZeroShot,
    OneShot,
}

impl std::fmt::Display for LearnMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LearnMode::ZeroShot => f.write_str("zero-shot"),
            LearnMode::OneShot => f.write_str("one-shot"),
        }
    }
}

/// Which worked examples go into a prompt.
#[derive(Debug, Clone, Copy)]
pub enum Shots<'a> {
    Zero,
    Few(&'a [LearningExample]),
}

impl Shots<'_> {
    fn mode(&self) -> LearnMode {
        match self {
            Shots::Zero => LearnMode::ZeroShot,
            Shots::Few(_) => LearnMode::OneShot,
        }
    }

    fn examples(&self) -> Vec<LearningExample> {
        match self {
            Shots::Zero => Vec::new(),
            Shots::Few(examples) => examples.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTask {
    /// Score the résumé against the job description.
    Comparison,
    /// Reduce a raw job posting to its responsibilities and requirements.
    JobDigest,
}

/// Tokens kept free for the model's answer.
#[derive(Debug, Clone, Copy)]
pub struct PromptBudget {
    pub completion_reserve_tokens: usize,
}

impl PromptBudget {
    fn for_model(&self, model: &ModelEntry) -> usize {
        model
            .context_tokens
            .saturating_sub(self.completion_reserve_tokens)
    }
}

/// A fully assembled, size-checked request. Consumed once by the completion client.
#[derive(Debug, Clone)]
pub struct PromptRequest {
    pub task: PromptTask,
    pub mode: LearnMode,
    pub model_identifier: String,
    pub system_instructions: String,
    pub canonical_resume_text: String,
    pub job_description_text: String,
    pub examples: Vec<LearningExample>,
}

impl PromptRequest {
    /// The user message: worked examples first, then instructions, then the documents.
    pub fn render_user_prompt(&self) -> String {
        match self.task {
            PromptTask::Comparison => self.render_comparison(),
            PromptTask::JobDigest => self.render_digest(),
        }
    }

    fn render_comparison(&self) -> String {
        let mut sections = Vec::new();

        for (i, example) in self.examples.iter().enumerate() {
            let index = (i + 1).to_string();
            sections.push(fill_template(
                COMPARISON_EXAMPLE_TEMPLATE,
                &[
                    ("index", index.as_str()),
                    ("job_excerpt", example.job_excerpt.as_str()),
                    ("resume_excerpt", example.resume_excerpt.as_str()),
                    ("verdict_text", example.verdict_text.as_str()),
                ],
            ));
        }
        if !self.examples.is_empty() {
            sections.push(FOLLOW_EXAMPLE_INSTRUCTION.to_string());
        }

        sections.push(TRANSLATE_INSTRUCTION.to_string());
        sections.push(COMPARISON_INSTRUCTIONS.to_string());
        sections.push(if self.examples.is_empty() {
            "Now compare the following Job Description and CV:".to_string()
        } else {
            "Now, given the following Job Description and CV, compare them in the same format as the example(s) above:".to_string()
        });
        sections.push(fill_template(
            COMPARISON_PAYLOAD_TEMPLATE,
            &[
                ("job_text", self.job_description_text.as_str()),
                ("resume_text", self.canonical_resume_text.as_str()),
            ],
        ));

        sections.join("\n\n")
    }

    fn render_digest(&self) -> String {
        let mut sections = Vec::new();

        let pairs: Vec<(&str, &str)> = self
            .examples
            .iter()
            .filter_map(LearningExample::digest_pair)
            .collect();
        for (i, (posting, digest)) in pairs.iter().enumerate() {
            let index = (i + 1).to_string();
            sections.push(fill_template(
                DIGEST_EXAMPLE_TEMPLATE,
                &[
                    ("index", index.as_str()),
                    ("posting_excerpt", *posting),
                    ("digest_text", *digest),
                ],
            ));
        }
        if !pairs.is_empty() {
            sections.push(FOLLOW_EXAMPLE_INSTRUCTION.to_string());
        }

        sections.push(TRANSLATE_INSTRUCTION.to_string());
        sections.push(DIGEST_INSTRUCTIONS.to_string());
        sections.push(fill_template(
            DIGEST_PAYLOAD_TEMPLATE,
            &[("posting_text", self.job_description_text.as_str())],
        ));

        sections.join("\n\n")
    }

    /// Estimated token footprint of everything sent to the backend.
    pub fn estimated_tokens(&self) -> usize {
        let chars =
            self.system_instructions.chars().count() + self.render_user_prompt().chars().count();
        chars.div_ceil(CHARS_PER_TOKEN)
    }
}

/// Builds the comparison request.
pub fn assemble(
    shots: Shots<'_>,
    model: &ModelEntry,
    resume_text: &CanonicalText,
    job_text: &str,
    budget: &PromptBudget,
) -> Result<PromptRequest, PipelineError> {
    let request = PromptRequest {
        task: PromptTask::Comparison,
        mode: shots.mode(),
        model_identifier: model.identifier.clone(),
        system_instructions: RECRUITER_SYSTEM.to_string(),
        canonical_resume_text: resume_text.as_str().to_string(),
        job_description_text: job_text.to_string(),
        examples: shots.examples(),
    };
    check_size(request, model, budget)
}

/// Builds the optional job-digest request. Only examples carrying a digest pair are rendered.
pub fn assemble_digest(
    shots: Shots<'_>,
    model: &ModelEntry,
    posting_text: &str,
    budget: &PromptBudget,
) -> Result<PromptRequest, PipelineError> {
    let request = PromptRequest {
        task: PromptTask::JobDigest,
        mode: shots.mode(),
        model_identifier: model.identifier.clone(),
        system_instructions: RECRUITER_SYSTEM.to_string(),
        canonical_resume_text: String::new(),
        job_description_text: posting_text.to_string(),
        examples: shots.examples(),
    };
    check_size(request, model, budget)
}

fn check_size(
    request: PromptRequest,
    model: &ModelEntry,
    budget: &PromptBudget,
) -> Result<PromptRequest, PipelineError> {
    let estimated_tokens = request.estimated_tokens();
    let budget_tokens = budget.for_model(model);
    debug!(
        task = ?request.task,
        estimated_tokens,
        budget_tokens,
        "prompt size check for {}",
        model.identifier
    );
    if estimated_tokens > budget_tokens {
        return Err(PipelineError::PromptTooLarge {
            model: model.identifier.clone(),
            estimated_tokens,
            budget_tokens,
        });
    }
    Ok(request)
}

/// Single-pass `{name}` substitution. Substituted values are never re-scanned,
/// so braces inside résumé or job text survive untouched.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::normalize::{normalize, ExtractedDocument};

    fn model(context_tokens: usize) -> ModelEntry {
        ModelEntry {
            identifier: "google/gemma-3-27b-it:free".to_string(),
            context_tokens,
        }
    }

    fn budget() -> PromptBudget {
        PromptBudget {
            completion_reserve_tokens: 1024,
        }
    }

    fn resume() -> CanonicalText {
        normalize(&ExtractedDocument::new(vec![
            "Experience: Engineer".to_string(),
            "Education: BSc".to_string(),
        ]))
    }

    fn example(tag: &str) -> LearningExample {
        LearningExample {
            resume_excerpt: format!("resume-{tag}"),
            job_excerpt: format!("job-{tag}"),
            verdict_text: format!("verdict-{tag}"),
            posting_excerpt: None,
            digest_text: None,
        }
    }

    #[test]
    fn test_zero_shot_has_only_instructions_and_documents() {
        let request = assemble(
            Shots::Zero,
            &model(96_000),
            &resume(),
            "Rust engineer wanted",
            &budget(),
        )
        .unwrap();

        assert_eq!(request.mode, LearnMode::ZeroShot);
        assert!(request.examples.is_empty());
        let prompt = request.render_user_prompt();
        assert!(!prompt.contains("Example 1"));
        assert!(!prompt.contains(FOLLOW_EXAMPLE_INSTRUCTION));
        assert!(prompt.contains("Experience: Engineer\nEducation: BSc"));
        assert!(prompt.contains("Rust engineer wanted"));
    }

    #[test]
    fn test_instructions_ask_for_attributes_judgment_and_rationale() {
        let request =
            assemble(Shots::Zero, &model(96_000), &resume(), "job", &budget()).unwrap();
        let prompt = request.render_user_prompt();
        assert!(prompt.contains("Extract the attributes of the CV"));
        assert!(prompt.contains("Semantic Similarity Percentage"));
        assert!(prompt.contains("rationale"));
    }

    #[test]
    fn test_one_shot_uses_every_example_in_fixture_order_before_instructions() {
        let examples = vec![example("a"), example("b"), example("c")];
        let request = assemble(
            Shots::Few(&examples),
            &model(96_000),
            &resume(),
            "job",
            &budget(),
        )
        .unwrap();

        assert_eq!(request.mode, LearnMode::OneShot);
        assert_eq!(request.examples, examples);

        let prompt = request.render_user_prompt();
        let a = prompt.find("verdict-a").unwrap();
        let b = prompt.find("verdict-b").unwrap();
        let c = prompt.find("verdict-c").unwrap();
        let instructions = prompt.find("Extract the attributes").unwrap();
        assert!(a < b && b < c && c < instructions);
    }

    #[test]
    fn test_single_example_is_carried_unmodified() {
        let examples = vec![LearningExample {
            resume_excerpt: "- Skills: Python\n".to_string(),
            job_excerpt: "Requirements:\n- SQL".to_string(),
            verdict_text: "The Semantic Similarity Percentage: 40%".to_string(),
            posting_excerpt: Some("raw posting".to_string()),
            digest_text: Some("Requirements:\n- SQL".to_string()),
        }];
        let request = assemble(
            Shots::Few(&examples),
            &model(96_000),
            &resume(),
            "job",
            &budget(),
        )
        .unwrap();
        assert_eq!(request.examples.len(), 1);
        assert_eq!(request.examples[0], examples[0]);
    }

    #[test]
    fn test_oversized_input_is_rejected_not_truncated() {
        let huge = "x".repeat(200_000);
        let err = assemble(Shots::Zero, &model(32_768), &resume(), &huge, &budget())
            .unwrap_err();
        match err {
            PipelineError::PromptTooLarge {
                estimated_tokens,
                budget_tokens,
                ..
            } => {
                assert!(estimated_tokens > budget_tokens);
                assert_eq!(budget_tokens, 32_768 - 1024);
            }
            other => panic!("expected PromptTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_examples_count_toward_budget() {
        let examples = vec![LearningExample {
            verdict_text: "v".repeat(10_000),
            ..example("big")
        }];
        let small_model = model(3_000);
        assert!(assemble(Shots::Zero, &small_model, &resume(), "job", &budget()).is_ok());
        assert!(matches!(
            assemble(Shots::Few(&examples), &small_model, &resume(), "job", &budget()),
            Err(PipelineError::PromptTooLarge { .. })
        ));
    }

    #[test]
    fn test_digest_renders_only_examples_with_digest_pairs() {
        let examples = vec![
            example("plain"),
            LearningExample {
                posting_excerpt: Some("posting-x".to_string()),
                digest_text: Some("digest-x".to_string()),
                ..example("x")
            },
        ];
        let request = assemble_digest(
            Shots::Few(&examples),
            &model(96_000),
            "Cookie banner\nWe need Rust",
            &budget(),
        )
        .unwrap();
        assert_eq!(request.task, PromptTask::JobDigest);
        let prompt = request.render_user_prompt();
        assert!(prompt.contains("Example 1:\n\nJob posting:\nposting-x"));
        assert!(!prompt.contains("verdict-plain"));
        assert!(prompt.ends_with("Job posting:\nCookie banner\nWe need Rust"));
    }

    #[test]
    fn test_fill_template_does_not_rescan_values() {
        let out = fill_template(
            "A {first} B {second} {unknown}",
            &[("first", "{second}"), ("second", "2")],
        );
        assert_eq!(out, "A {second} B 2 {unknown}");
    }

    #[test]
    fn test_learn_mode_names() {
        assert_eq!(LearnMode::ZeroShot.to_string(), "zero-shot");
        assert_eq!(
            serde_json::to_string(&LearnMode::OneShot).unwrap(),
            "\"one-shot\""
        );
    }
}
