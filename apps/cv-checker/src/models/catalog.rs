//! Model catalog: the read-only list of model identifiers the operator may pick.

use std::path::Path;

use anyhow::{Context, Result};
use crate::errors::PipelineError;

/// Context window assumed when the catalog line does not state one.
pub const DEFAULT_CONTEXT_TOKENS: usize = 32_768;

/// Model used when the operator has no preference.
pub const DEFAULT_MODEL: &str = "google/gemma-3-27b-it:free";

const BUILTIN_MODELS: &[(&str, usize)] = &[
    ("google/gemma-3-27b-it:free", 96_000),
    ("deepseek/deepseek-chat-v3-0324:free", 163_840),
    ("meta-llama/llama-3.3-70b-instruct:free", 131_072),
    ("mistralai/mistral-small-3.1-24b-instruct:free", 96_000),
    ("qwen/qwq-32b:free", 40_000),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEntry {
    pub identifier: String,
    pub context_tokens: usize,
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    /// Free models known to work with the default backend.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_MODELS
                .iter()
                .map(|(id, ctx)| ModelEntry {
                    identifier: (*id).to_string(),
                    context_tokens: *ctx,
                })
                .collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read model catalog {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid model catalog {}", path.display()))
    }

    /// Parses `<identifier> [context_tokens]` lines; `#` starts a comment.
    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                continue;
            }
            let mut parts = line.split_whitespace();
            let identifier = parts.next().unwrap_or_default().to_string();
            let context_tokens = match parts.next() {
                Some(raw) => raw.replace('_', "").parse::<usize>().with_context(|| {
                    format!("line {}: context size '{raw}' is not a number", lineno + 1)
                })?,
                None => DEFAULT_CONTEXT_TOKENS,
            };
            entries.push(ModelEntry {
                identifier,
                context_tokens,
            });
        }
        anyhow::ensure!(!entries.is_empty(), "catalog lists no models");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn lookup(&self, identifier: &str) -> Result<&ModelEntry, PipelineError> {
        self.entries
            .iter()
            .find(|e| e.identifier == identifier)
            .ok_or_else(|| {
                PipelineError::UnknownModel(format!("{identifier} (try {})", self.suggestion()))
            })
    }

    /// The default model when listed, else the first entry.
    fn suggestion(&self) -> &str {
        self.entries
            .iter()
            .find(|e| e.identifier == DEFAULT_MODEL)
            .or_else(|| self.entries.first())
            .map(|e| e.identifier.as_str())
            .unwrap_or(DEFAULT_MODEL)
    }
}
