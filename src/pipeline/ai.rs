//! AI cleaner: send extracted text to a language model and never fail.
//!
//! [`clean_with_ai`] always returns a [`CleaningResult`]. Every failure is
//! caught here: missing credential, transport error, non-2xx status,
//! malformed body, or a call exceeding the configured ceiling. The result
//! then carries the untouched input text plus a short diagnostic in
//! `error`, so the HTTP layer can still answer 200 with usable content.
//!
//! ## Credential resolution
//!
//! 1. a non-blank `api_key` on the request (this request only)
//! 2. the server credential for the chosen model ([`ServerConfig::credential_for`])
//! 3. otherwise [`ProviderError::MissingCredential`]
//!
//! No retries: one attempt, then degrade. The client can resubmit.

use crate::config::ServerConfig;
use crate::error::ProviderError;
use crate::output::{CleaningRequest, CleaningResult};
use crate::pipeline::clean::clean_text;
use crate::prompts::resolve_prompt;
use crate::providers::ProviderSet;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Clean `request.text` with the requested provider.
pub async fn clean_with_ai(
    request: &CleaningRequest,
    providers: &ProviderSet,
    config: &ServerConfig,
) -> CleaningResult {
    let model_used = request.model.as_str().to_string();

    match call_provider(request, providers, config).await {
        Ok(text) => {
            let cleaned_text = if config.postprocess_ai_output {
                clean_text(&text)
            } else {
                text
            };
            CleaningResult {
                cleaned_text,
                model_used,
                error: None,
            }
        }
        Err(e) => {
            warn!("AI cleaning with {} failed: {}", model_used, e);
            CleaningResult {
                cleaned_text: request.text.clone(),
                model_used,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Pick the key for this request; see the module docs for precedence.
pub fn resolve_credential<'a>(
    request: &'a CleaningRequest,
    config: &'a ServerConfig,
) -> Option<&'a str> {
    request
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| config.credential_for(request.model))
}

async fn call_provider(
    request: &CleaningRequest,
    providers: &ProviderSet,
    config: &ServerConfig,
) -> Result<String, ProviderError> {
    let model = request.model;
    let provider_name = model.display_name().to_string();

    let api_key = resolve_credential(request, config).ok_or_else(|| {
        ProviderError::MissingCredential {
            provider: provider_name.clone(),
        }
    })?;

    let provider = providers.get(model).ok_or_else(|| ProviderError::Request {
        provider: provider_name.clone(),
        detail: "provider is not configured on this server".into(),
    })?;

    let prompt = resolve_prompt(request.prompt_preset, request.custom_prompt.as_deref());
    debug!(
        "AI cleaning: model={}, preset={}, custom_prompt={}, {} chars",
        model,
        request.prompt_preset,
        prompt != request.prompt_preset.template(),
        request.text.len()
    );

    let start = Instant::now();
    let ceiling = Duration::from_secs(config.ai_timeout_secs);
    let text = timeout(ceiling, provider.complete(prompt, &request.text, api_key))
        .await
        .map_err(|_| ProviderError::Timeout {
            provider: provider_name,
            secs: config.ai_timeout_secs,
        })??;

    info!(
        "AI cleaning with {} done: {} → {} chars in {}ms",
        model,
        request.text.len(),
        text.len(),
        start.elapsed().as_millis()
    );
    Ok(text)
}
