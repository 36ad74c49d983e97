//! OpenAI-compatible chat-completions provider (Groq, SambaNova).
//!
//! Both vendors expose `POST {base}/chat/completions` with Bearer auth and
//! the OpenAI request/response shape; only base URL and model differ.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ServerConfig;
use crate::error::ProviderError;
use crate::prompts::{build_user_message, CHAT_SYSTEM_PROMPT};
use crate::providers::{status_error, transport_error, CompletionProvider};

/// Chat-completions client for one OpenAI-compatible vendor.
#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    name: &'static str,
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout_secs: u64,
}

impl ChatCompletionsProvider {
    pub fn new(
        name: &'static str,
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            name,
            client,
            base_url: base_url.into(),
            model: model.into(),
            temperature: config.temperature,
            max_tokens: config.chat_max_tokens,
            timeout_secs: config.ai_timeout_secs,
        }
    }

    pub fn groq(client: reqwest::Client, config: &ServerConfig) -> Self {
        Self::new(
            "Groq",
            client,
            config.groq_base_url.clone(),
            config.groq_model.clone(),
            config,
        )
    }

    pub fn sambanova(client: reqwest::Client, config: &ServerConfig) -> Self {
        Self::new(
            "SambaNova",
            client,
            config.sambanova_base_url.clone(),
            config.sambanova_model.clone(),
            config,
        )
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

// -- OpenAI chat API request/response types --

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[async_trait]
impl CompletionProvider for ChatCompletionsProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(
        &self,
        prompt: &str,
        content: &str,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: Some(CHAT_SYSTEM_PROMPT.into()),
                },
                ChatMessage {
                    role: "user".into(),
                    content: Some(build_user_message(prompt, content)),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("{} request: model={}, {} chars", self.name, self.model, content.len());
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(self.name, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(self.name, status, &body));
        }

        let parsed: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| ProviderError::MalformedResponse {
                    provider: self.name.to_string(),
                    detail: format!("failed to parse response: {}", e.without_url()),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: self.name.to_string(),
                detail: "no message content in response".into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AiModel;
    use crate::providers::test_support::spawn_mock;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    fn groq(base_url: String) -> ChatCompletionsProvider {
        let config = ServerConfig::builder()
            .base_url(AiModel::Groq, base_url)
            .build()
            .unwrap();
        ChatCompletionsProvider::groq(reqwest::Client::new(), &config)
    }

    async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if auth != "Bearer gsk-test" {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": {"message": "Invalid API Key", "type": "invalid_request_error"}})),
            );
        }
        let summary = format!(
            "{}|{}|{}|{}|{}",
            body["model"].as_str().unwrap_or(""),
            body["messages"][0]["role"].as_str().unwrap_or(""),
            body["messages"][1]["content"].as_str().unwrap_or(""),
            body["temperature"],
            body["max_tokens"],
        );
        (
            StatusCode::OK,
            Json(json!({
                "id": "chatcmpl-1",
                "choices": [{"index": 0, "message": {"role": "assistant", "content": summary}}]
            })),
        )
    }

    #[tokio::test]
    async fn sends_chat_completion_request() {
        let base = spawn_mock(Router::new().route("/chat/completions", post(echo))).await;
        let out = groq(base).complete("Clean", "Body", "gsk-test").await.unwrap();
        assert_eq!(
            out,
            "llama-3.3-70b-versatile|system|Clean\n\n---\n\nDocument content:\n\nBody|0.3|8192"
        );
    }

    #[tokio::test]
    async fn unauthorized_is_auth_error() {
        let base = spawn_mock(Router::new().route("/chat/completions", post(echo))).await;
        let err = groq(base).complete("p", "c", "wrong").await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::Auth {
                provider: "Groq".into(),
                detail: "Invalid API Key".into()
            }
        );
    }

    #[tokio::test]
    async fn non_json_body_is_malformed() {
        let app = Router::new().route("/chat/completions", post(|| async { "<html>oops</html>" }));
        let err = groq(spawn_mock(app).await)
            .complete("p", "c", "k")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn empty_choices_is_malformed() {
        let app = Router::new().route(
            "/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let err = groq(spawn_mock(app).await)
            .complete("p", "c", "k")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no message content"));
    }

    #[test]
    fn sambanova_uses_its_own_endpoint_and_model() {
        let p = ChatCompletionsProvider::sambanova(reqwest::Client::new(), &ServerConfig::default());
        assert_eq!(p.name(), "SambaNova");
        assert_eq!(p.endpoint(), "https://api.sambanova.ai/v1/chat/completions");
        assert_eq!(p.model, "Meta-Llama-3.3-70B-Instruct");
    }
}
