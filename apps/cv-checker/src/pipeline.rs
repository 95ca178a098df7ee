//! One résumé/job comparison, start to finish:
//! resolve → dispatch → extract → normalize → assemble → complete → interpret.

use std::path::PathBuf;

use reqwest::Client;
use tracing::{debug, info, warn};

use crate::document::extract::ExtractError;
use crate::document::format::dispatch;
use crate::document::normalize::{normalize, CanonicalText};
use crate::document::source::{resolve, ResumeReference};
use crate::errors::PipelineError;
use crate::job::{self, JobSource};
use crate::llm_client::CompletionBackend;
use crate::models::catalog::ModelCatalog;
use crate::models::learning_example::{load_examples, LearningExample};
use crate::prompt::{assemble, assemble_digest, LearnMode, PromptBudget, Shots};
use crate::verdict::{interpret, Verdict, VerdictContext};

/// Collaborators shared by every run.
pub struct PipelineContext {
    pub catalog: ModelCatalog,
    pub examples_path: PathBuf,
    pub http: Client,
    pub budget: PromptBudget,
}

#[derive(Debug, Clone)]
pub struct ComparisonRequest {
    pub cv: ResumeReference,
    pub job: JobSource,
    pub mode: LearnMode,
    pub model_id: String,
    pub digest_job: bool,
}

pub async fn run_comparison(
    ctx: &PipelineContext,
    req: &ComparisonRequest,
    backend: &dyn CompletionBackend,
) -> Result<Verdict, PipelineError> {
    let model = ctx.catalog.lookup(&req.model_id)?;
    info!("comparing {} against {} with {} ({})", req.cv, req.job, model.identifier, req.mode);

    let resume_text = extract_resume(&req.cv, &ctx.http).await?;
    let job = job::load(&req.job, &ctx.http).await?;

    let examples: Vec<LearningExample> = match req.mode {
        LearnMode::ZeroShot => Vec::new(),
        LearnMode::OneShot => load_examples(&ctx.examples_path)?,
    };
    let shots = match req.mode {
        LearnMode::ZeroShot => Shots::Zero,
        LearnMode::OneShot => Shots::Few(&examples),
    };

    let job_text = if req.digest_job {
        let digest_request = assemble_digest(shots, model, &job.text, &ctx.budget)?;
        let digest = backend.complete(&digest_request).await?;
        info!("job digest: {} chars", digest.text.chars().count());
        digest.text
    } else {
        job.text
    };

    let request = assemble(shots, model, &resume_text, &job_text, &ctx.budget)?;
    info!(
        examples = request.examples.len(),
        estimated_tokens = request.estimated_tokens(),
        "prompt assembled"
    );

    let outcome = backend.complete(&request).await;
    interpret(
        outcome,
        VerdictContext {
            resume_reference: req.cv.to_string(),
            job_reference: job.reference,
            model: model.identifier.clone(),
            mode: req.mode,
        },
    )
}

/// Everything that touches the artifact happens here, so a temporary download
/// is gone by the time this returns, whatever the outcome.
async fn extract_resume(
    reference: &ResumeReference,
    http: &Client,
) -> Result<CanonicalText, PipelineError> {
    let artifact = resolve(reference, http).await?;
    let extractor = dispatch(&artifact)?;
    debug!(
        temporary = artifact.is_temporary(),
        "{} handled by the {} extractor",
        artifact.path().display(),
        extractor.name()
    );

    let doc = extractor
        .extract(artifact.path())
        .map_err(|source: ExtractError| PipelineError::Extraction {
            path: reference.to_string(),
            source,
        })?;
    if doc.is_empty() {
        warn!("no text found in {}", reference);
    } else {
        info!("extracted {} fragment(s) from {}", doc.len(), reference);
    }
    Ok(normalize(&doc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::extract::fixtures::write_zip;
    use crate::http::build_client;
    use crate::llm_client::{Completion, CompletionResult, LlmError};
    use crate::prompt::{PromptRequest, PromptTask};
    use crate::test_support::{http_response, serve};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Replays canned outcomes and records every request it is given.
    struct StubBackend {
        replies: Mutex<VecDeque<CompletionResult>>,
        seen: Mutex<Vec<PromptRequest>>,
    }

    impl StubBackend {
        fn new(replies: Vec<CompletionResult>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn answering(text: &str) -> Self {
            Self::new(vec![Ok(Completion {
                text: text.to_string(),
                usage: None,
            })])
        }

        fn seen(&self) -> Vec<PromptRequest> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionBackend for StubBackend {
        async fn complete(&self, request: &PromptRequest) -> CompletionResult {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }

    const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Jane Doe</w:t></w:r></w:p>
<w:p><w:r><w:t>Skills: Rust, PostgreSQL</w:t></w:r></w:p>
</w:body></w:document>"#;

    const FIXTURE: &str = r#"[{"resume_excerpt": "Skills: Go", "job_excerpt": "Needs Go", "verdict_text": "90%"}]"#;

    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            write_zip(&dir.path().join("cv.docx"), &[("word/document.xml", DOCUMENT_XML)]);
            std::fs::write(dir.path().join("job.txt"), "Requirements: Rust").unwrap();
            std::fs::write(dir.path().join("examples.json"), FIXTURE).unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn context(&self, catalog: &str) -> PipelineContext {
            PipelineContext {
                catalog: ModelCatalog::parse(catalog).unwrap(),
                examples_path: self.path("examples.json"),
                http: build_client(Duration::from_secs(5)).unwrap(),
                budget: PromptBudget {
                    completion_reserve_tokens: 1024,
                },
            }
        }

        fn request(&self, cv: &Path, mode: LearnMode) -> ComparisonRequest {
            ComparisonRequest {
                cv: ResumeReference::Local(cv.to_path_buf()),
                job: JobSource::Path(self.path("job.txt")),
                mode,
                model_id: "test/model".to_string(),
                digest_job: false,
            }
        }
    }

    const CATALOG: &str = "test/model 32768\n";

    #[tokio::test]
    async fn test_zero_shot_sends_no_examples() {
        let ws = Workspace::new();
        let backend = StubBackend::answering("Semantic Similarity Percentage: 80%");

        let verdict = run_comparison(
            &ws.context(CATALOG),
            &ws.request(&ws.path("cv.docx"), LearnMode::ZeroShot),
            &backend,
        )
        .await
        .unwrap();

        let seen = backend.seen();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].mode, LearnMode::ZeroShot);
        assert!(seen[0].examples.is_empty());
        assert_eq!(seen[0].canonical_resume_text, "Jane Doe\nSkills: Rust, PostgreSQL");
        assert_eq!(seen[0].job_description_text, "Requirements: Rust");
        assert_eq!(verdict.response_text, "Semantic Similarity Percentage: 80%");
        assert_eq!(verdict.model, "test/model");
    }

    #[tokio::test]
    async fn test_one_shot_sends_fixture_examples() {
        let ws = Workspace::new();
        let backend = StubBackend::answering("ok");

        run_comparison(
            &ws.context(CATALOG),
            &ws.request(&ws.path("cv.docx"), LearnMode::OneShot),
            &backend,
        )
        .await
        .unwrap();

        let fixture = load_examples(&ws.path("examples.json")).unwrap();
        let seen = backend.seen();
        assert_eq!(seen[0].mode, LearnMode::OneShot);
        assert_eq!(seen[0].examples, fixture);
        assert!(seen[0].render_user_prompt().contains("Needs Go"));
    }

    #[tokio::test]
    async fn test_one_shot_with_empty_fixture_fails_before_completion() {
        let ws = Workspace::new();
        std::fs::write(ws.path("examples.json"), "[]").unwrap();
        let backend = StubBackend::answering("unused");

        let err = run_comparison(
            &ws.context(CATALOG),
            &ws.request(&ws.path("cv.docx"), LearnMode::OneShot),
            &backend,
        )
        .await
        .err()
        .unwrap();

        assert_eq!(err.kind(), "FixtureError");
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn test_zero_shot_never_reads_fixture() {
        let ws = Workspace::new();
        std::fs::remove_file(ws.path("examples.json")).unwrap();
        let backend = StubBackend::answering("ok");

        let result = run_comparison(
            &ws.context(CATALOG),
            &ws.request(&ws.path("cv.docx"), LearnMode::ZeroShot),
            &backend,
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_model_is_checked_first() {
        let ws = Workspace::new();
        let backend = StubBackend::answering("unused");
        let mut req = ws.request(&ws.path("missing.pdf"), LearnMode::ZeroShot);
        req.model_id = "nobody/nothing".to_string();

        let err = run_comparison(&ws.context(CATALOG), &req, &backend)
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), "UnknownModelError");
    }

    #[tokio::test]
    async fn test_unsupported_format_makes_no_completion_call() {
        let ws = Workspace::new();
        std::fs::write(ws.path("cv.txt"), "plain text résumé").unwrap();
        let backend = StubBackend::answering("unused");

        let err = run_comparison(
            &ws.context(CATALOG),
            &ws.request(&ws.path("cv.txt"), LearnMode::ZeroShot),
            &backend,
        )
        .await
        .err()
        .unwrap();

        assert_eq!(err.kind(), "UnsupportedFormatError");
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_extraction_error() {
        let ws = Workspace::new();
        std::fs::write(ws.path("broken.docx"), b"not a zip").unwrap();
        let backend = StubBackend::answering("unused");

        let err = run_comparison(
            &ws.context(CATALOG),
            &ws.request(&ws.path("broken.docx"), LearnMode::ZeroShot),
            &backend,
        )
        .await
        .err()
        .unwrap();

        assert_eq!(err.kind(), "ExtractionError");
        assert!(err.to_string().contains("broken.docx"));
    }

    #[tokio::test]
    async fn test_oversized_prompt_is_rejected_before_completion() {
        let ws = Workspace::new();
        let backend = StubBackend::answering("unused");

        let err = run_comparison(
            &ws.context("test/model 1100\n"),
            &ws.request(&ws.path("cv.docx"), LearnMode::ZeroShot),
            &backend,
        )
        .await
        .err()
        .unwrap();

        assert_eq!(err.kind(), "PromptTooLargeError");
        assert!(backend.seen().is_empty());
    }

    #[tokio::test]
    async fn test_completion_failure_keeps_kind() {
        let ws = Workspace::new();
        let backend = StubBackend::new(vec![Err(LlmError::RateLimited { retries: 3 })]);

        let err = run_comparison(
            &ws.context(CATALOG),
            &ws.request(&ws.path("cv.docx"), LearnMode::ZeroShot),
            &backend,
        )
        .await
        .err()
        .unwrap();

        match err {
            PipelineError::Completion(inner) => assert_eq!(inner.kind(), "rate_limited"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_digest_replaces_job_text() {
        let ws = Workspace::new();
        let backend = StubBackend::new(vec![
            Ok(Completion {
                text: "Requirements:\n- Rust".to_string(),
                usage: None,
            }),
            Ok(Completion {
                text: "verdict".to_string(),
                usage: None,
            }),
        ]);
        let mut req = ws.request(&ws.path("cv.docx"), LearnMode::ZeroShot);
        req.digest_job = true;

        run_comparison(&ws.context(CATALOG), &req, &backend)
            .await
            .unwrap();

        let seen = backend.seen();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].task, PromptTask::JobDigest);
        assert_eq!(seen[1].task, PromptTask::Comparison);
        assert_eq!(seen[1].job_description_text, "Requirements:\n- Rust");
    }

    #[tokio::test]
    async fn test_remote_resume_is_downloaded_and_extracted() {
        let ws = Workspace::new();
        let docx = std::fs::read(ws.path("cv.docx")).unwrap();
        let base = serve(vec![http_response(
            200,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            &docx,
        )])
        .await;
        let backend = StubBackend::answering("ok");
        let mut req = ws.request(&ws.path("unused"), LearnMode::ZeroShot);
        req.cv = ResumeReference::parse(&format!("{base}/download?id=7"));

        let verdict = run_comparison(&ws.context(CATALOG), &req, &backend)
            .await
            .unwrap();

        assert!(verdict.resume_reference.contains("/download?id=7"));
        assert_eq!(
            backend.seen()[0].canonical_resume_text,
            "Jane Doe\nSkills: Rust, PostgreSQL"
        );
    }
}
