//! Worked examples for one-shot prompting, read from a JSON fixture.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::PipelineError;

/// A prior résumé/job/verdict triple shown to the model before the real documents.
/// `posting_excerpt`/`digest_text` optionally demonstrate the job-digest step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningExample {
    pub resume_excerpt: String,
    pub job_excerpt: String,
    pub verdict_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posting_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_text: Option<String>,
}

impl LearningExample {
    /// The (posting, digest) pair, when this example demonstrates the digest step.
    pub fn digest_pair(&self) -> Option<(&str, &str)> {
        match (&self.posting_excerpt, &self.digest_text) {
            (Some(p), Some(d)) => Some((p.as_str(), d.as_str())),
            _ => None,
        }
    }
}

/// Loads the fixture, keeping the file's order. An empty fixture is an error
/// since one-shot mode needs at least one example.
pub fn load_examples(path: &Path) -> Result<Vec<LearningExample>, PipelineError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        PipelineError::Fixture(format!("cannot read {}: {e}", path.display()))
    })?;
    let examples: Vec<LearningExample> = serde_json::from_str(&raw).map_err(|e| {
        PipelineError::Fixture(format!("{} is not a list of examples: {e}", path.display()))
    })?;
    if examples.is_empty() {
        return Err(PipelineError::Fixture(format!(
            "{} contains no examples",
            path.display()
        )));
    }
    debug!("loaded {} learning example(s) from {}", examples.len(), path.display());
    Ok(examples)
}
