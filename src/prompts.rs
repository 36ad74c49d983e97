//! Prompt presets for AI cleaning.
//!
//! Every prompt the service sends lives here so that a wording change is a
//! one-file edit and unit tests can inspect prompts without a provider.
//!
//! Callers pick a [`PromptPreset`] by name in the `prompt_preset` form field,
//! or send their own text in `custom_prompt`; [`resolve_prompt`] decides
//! which one wins.

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default instruction: turn raw extraction into clean Markdown for an LLM.
pub const CLEAN_PROMPT: &str = r#"Convert this raw PDF extraction into clean markdown optimized for LLM consumption.

Keep: All meaningful information a human would want to read - specs, instructions, explanations, tables, formulas, procedures, etc.

Remove: Noise and garbage - repetitive data dumps, raw coordinate/index sequences, meaningless character patterns, encoding artifacts, or any data that provides no informational value without its original visual context.

When you remove something, briefly note what was there (e.g., "[raw data table removed]").

Use your judgment. Preserve substance, discard noise. Output clean, well-structured markdown."#;

pub const SUMMARIZE_PROMPT: &str =
    "Summarize this document in 5-10 bullet points, focusing on the key information.";

pub const EXTRACT_SPECS_PROMPT: &str = "Extract all technical specifications from this document and format them as a structured table in markdown.";

/// System message for chat-completions providers (Groq, SambaNova).
///
/// Gemini receives the user message only.
pub const CHAT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant that processes documents. Be thorough and precise.";

/// A named, built-in prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptPreset {
    /// Clean the extraction into readable Markdown. (default)
    #[default]
    Clean,
    /// 5–10 bullet summary.
    Summarize,
    /// Technical specifications as a Markdown table.
    ExtractSpecs,
    /// Caller-supplied prompt; falls back to [`PromptPreset::Clean`] when blank.
    Custom,
}

impl PromptPreset {
    pub const ALL: [PromptPreset; 4] = [
        PromptPreset::Clean,
        PromptPreset::Summarize,
        PromptPreset::ExtractSpecs,
        PromptPreset::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PromptPreset::Clean => "clean",
            PromptPreset::Summarize => "summarize",
            PromptPreset::ExtractSpecs => "extract_specs",
            PromptPreset::Custom => "custom",
        }
    }

    /// The built-in template text. `Custom` has none of its own.
    pub fn template(&self) -> &'static str {
        match self {
            PromptPreset::Clean | PromptPreset::Custom => CLEAN_PROMPT,
            PromptPreset::Summarize => SUMMARIZE_PROMPT,
            PromptPreset::ExtractSpecs => EXTRACT_SPECS_PROMPT,
        }
    }
}

impl fmt::Display for PromptPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PromptPreset {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        PromptPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == name)
            .ok_or_else(|| {
                ExtractError::Validation(format!(
                    "Unknown prompt preset {s:?}; expected one of: clean, summarize, extract_specs, custom"
                ))
            })
    }
}

/// Choose the instruction text for a request.
///
/// A non-blank `custom` prompt always wins. Otherwise the preset's template
/// is used, which for [`PromptPreset::Custom`] means the `clean` template.
pub fn resolve_prompt(preset: PromptPreset, custom: Option<&str>) -> &str {
    match custom {
        Some(text) if !text.trim().is_empty() => text,
        _ => preset.template(),
    }
}

/// The single user message sent to every provider.
pub fn build_user_message(prompt: &str, content: &str) -> String {
    format!("{prompt}\n\n---\n\nDocument content:\n\n{content}")
}
