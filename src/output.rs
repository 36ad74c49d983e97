//! Values produced and consumed by the pipeline.

use crate::config::AiModel;
use crate::prompts::PromptPreset;
use serde::{Deserialize, Serialize};

/// Text extracted from one PDF.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// All pages in order, separated by `<!-- page N -->` marker lines.
    pub markdown: String,
    /// Number of pages in the document (≥ 1 for any successful extraction).
    pub page_count: usize,
}

impl ExtractionResult {
    /// The per-page segments of [`ExtractionResult::markdown`], in order.
    pub fn pages(&self) -> Vec<&str> {
        crate::pipeline::extract::split_pages(&self.markdown)
    }
}

/// One request for AI cleaning.
#[derive(Debug, Clone, Default)]
pub struct CleaningRequest {
    /// The raw text to clean.
    pub text: String,
    pub model: AiModel,
    pub prompt_preset: PromptPreset,
    /// Free-text prompt; used only when non-blank.
    pub custom_prompt: Option<String>,
    /// Per-request key; overrides the configured credential when non-blank.
    pub api_key: Option<String>,
}

/// Outcome of AI cleaning. Always produced, even when the provider failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningResult {
    /// Provider output, or the untouched input text when `error` is set.
    pub cleaned_text: String,
    /// Wire name of the provider that was asked (`gemini`, `groq`, …).
    pub model_used: String,
    /// Short diagnostic when the provider call failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CleaningResult {
    /// `true` when the provider call failed and `cleaned_text` is the raw input.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
