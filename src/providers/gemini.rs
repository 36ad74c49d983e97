//! Google Gemini provider.
//!
//! Calls `generateContent` on the Generative Language REST API. The key
//! travels as the `key` query parameter; the instruction and document go in
//! a single user turn (no system instruction).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::ProviderError;
use crate::prompts::build_user_message;
use crate::providers::{status_error, transport_error, CompletionProvider};

const PROVIDER: &str = "Gemini";

/// Google Gemini provider.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
    timeout_secs: u64,
}

impl GeminiProvider {
    pub fn from_config(client: reqwest::Client, config: &ServerConfig) -> Self {
        Self {
            client,
            base_url: config.gemini_base_url.clone(),
            model: config.gemini_model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.gemini_max_output_tokens,
            timeout_secs: config.ai_timeout_secs,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

// -- Gemini API request/response types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

fn malformed(detail: impl Into<String>) -> ProviderError {
    ProviderError::MalformedResponse {
        provider: PROVIDER.to_string(),
        detail: detail.into(),
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(resp: GeminiResponse) -> Result<String, ProviderError> {
    let block_reason = resp.prompt_feedback.and_then(|f| f.block_reason);

    let candidate = resp
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| match block_reason {
            Some(reason) => malformed(format!("prompt blocked ({reason})")),
            None => malformed("no candidates in response"),
        })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".into());
        return Err(malformed(format!("candidate has no text (finish reason {reason})")));
    }
    Ok(text)
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(
        &self,
        prompt: &str,
        content: &str,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(build_user_message(prompt, content)),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        debug!("Gemini request: model={}, {} chars", self.model, content.len());
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(PROVIDER, status, &body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| malformed(format!("failed to parse response: {}", e.without_url())))?;

        extract_text(parsed)
    }
}
