//! AI completion providers.
//!
//! Each provider turns "instruction + document text + credential" into the
//! model's text answer, or a [`ProviderError`]. Request construction and
//! response parsing are private to the provider module; the AI cleaner only
//! sees [`CompletionProvider`].
//!
//! | [`AiModel`]   | Client                                   | Endpoint                              |
//! |---------------|------------------------------------------|---------------------------------------|
//! | `gemini`      | [`gemini::GeminiProvider`]               | `/v1beta/models/{model}:generateContent` |
//! | `groq`        | [`openai_compat::ChatCompletionsProvider`] | `/chat/completions`                 |
//! | `sambanova`   | [`openai_compat::ChatCompletionsProvider`] | `/chat/completions`                 |
//!
//! The credential is passed per call rather than stored in the client so
//! that a key supplied with one request never leaks into another.

pub mod gemini;
pub mod openai_compat;

use crate::config::{AiModel, ServerConfig};
use crate::error::{ExtractError, ProviderError};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// "Given prompt + text + credential, return text or failure."
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Human-facing provider name, used in diagnostics.
    fn name(&self) -> &str;

    /// Send one completion request and return the model's text.
    ///
    /// Exactly one attempt is made; callers decide what a failure means.
    async fn complete(
        &self,
        prompt: &str,
        content: &str,
        api_key: &str,
    ) -> Result<String, ProviderError>;
}

/// The provider implementation registered for each [`AiModel`].
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<AiModel, Arc<dyn CompletionProvider>>,
}

impl ProviderSet {
    /// An empty set; every model reports "not configured".
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the production clients for every [`AiModel`].
    ///
    /// All clients share one connection pool.
    pub fn from_config(config: &ServerConfig) -> Result<Self, ExtractError> {
        let client = http_client(config.ai_timeout_secs)?;
        Ok(Self::new()
            .with(
                AiModel::Gemini,
                Arc::new(gemini::GeminiProvider::from_config(client.clone(), config)),
            )
            .with(
                AiModel::Groq,
                Arc::new(openai_compat::ChatCompletionsProvider::groq(
                    client.clone(),
                    config,
                )),
            )
            .with(
                AiModel::SambaNova,
                Arc::new(openai_compat::ChatCompletionsProvider::sambanova(
                    client, config,
                )),
            ))
    }

    /// Register (or replace) the provider for `model`.
    pub fn with(mut self, model: AiModel, provider: Arc<dyn CompletionProvider>) -> Self {
        self.providers.insert(model, provider);
        self
    }

    pub fn get(&self, model: AiModel) -> Option<Arc<dyn CompletionProvider>> {
        self.providers.get(&model).cloned()
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(|m| m.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("ProviderSet")
            .field("models", &names)
            .finish()
    }
}

/// Shared HTTP client for outbound provider calls.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ExtractError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("edgequake-pdf-extract/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ExtractError::Internal(format!("HTTP client: {e}")))
}

// ── Shared response handling ─────────────────────────────────────────────

/// `{"error": {"message": "..."}}`, used by Gemini and the OpenAI dialect.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Longest upstream error body echoed into a diagnostic.
const MAX_ERROR_DETAIL_CHARS: usize = 300;

/// Pull the human-readable message out of an error body.
fn error_message(body: &str) -> String {
    let msg = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error.map(|d| d.message))
        .unwrap_or_else(|| body.trim().to_string());
    if msg.chars().count() > MAX_ERROR_DETAIL_CHARS {
        let truncated: String = msg.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
        format!("{truncated}…")
    } else {
        msg
    }
}

/// Map a non-2xx response onto a [`ProviderError`].
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: &str) -> ProviderError {
    let provider = provider.to_string();
    match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            ProviderError::Auth {
                provider,
                detail: error_message(body),
            }
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { provider },
        _ => ProviderError::Status {
            provider,
            status: status.as_u16(),
            detail: error_message(body),
        },
    }
}

/// Map a transport failure onto a [`ProviderError`].
pub(crate) fn transport_error(provider: &str, timeout_secs: u64, e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout {
            provider: provider.to_string(),
            secs: timeout_secs,
        }
    } else {
        ProviderError::Request {
            provider: provider.to_string(),
            // Strip the URL: Gemini carries the key in the query string.
            detail: e.without_url().to_string(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `app` on an ephemeral local port; returns its base URL.
    pub async fn spawn_mock(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}
