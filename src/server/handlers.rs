//! Route handlers.

use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use crate::config::AiModel;
use crate::convert;
use crate::output::{CleaningRequest, ExtractionResult};
use crate::prompts::PromptPreset;
use crate::server::error::ApiError;
use crate::server::form::FormData;
use crate::server::AppState;

const INDEX_HTML: &str = include_str!("../../web/index.html");
const APP_JS: &str = include_str!("../../web/app.js");

/// Response of `POST /extract-with-ai`.
#[derive(Debug, Serialize)]
pub struct AiExtractResponse {
    /// Raw extracted text.
    pub markdown: String,
    pub page_count: usize,
    /// AI output, or `markdown` again when `error` is set.
    pub cleaned_text: String,
    pub model_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Response of `POST /clean`.
#[derive(Debug, Serialize)]
pub struct CleanResponse {
    pub markdown: String,
    /// Length of the submitted text, in characters.
    pub original_length: usize,
    /// Length of `markdown`, in characters.
    pub cleaned_length: usize,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Service metadata for discovery (`GET /` and `GET /api`).
pub async fn service_info() -> Json<Value> {
    Json(json!({
        "name": "PDF Extractor API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "POST /extract": "Extract text from PDF",
            "POST /extract-and-clean": "Extract + clean text",
            "POST /extract-with-ai": "Extract + AI cleaning (Gemini/Groq/SambaNova)",
            "POST /clean": "Clean existing text",
            "GET /health": "Health check",
            "GET /app": "Browser client"
        },
        "models": AiModel::ALL.iter().map(AiModel::as_str).collect::<Vec<_>>(),
        "prompt_presets": PromptPreset::ALL.iter().map(PromptPreset::as_str).collect::<Vec<_>>(),
    }))
}

pub async fn app_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn app_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        APP_JS,
    )
}

pub async fn extract(
    State(state): State<AppState>,
    mut form: FormData,
) -> Result<Json<ExtractionResult>, ApiError> {
    let file = form.take_file()?;
    let result = convert::extract(state.extractor, file.filename.as_deref(), file.bytes).await?;
    Ok(Json(result))
}

pub async fn extract_and_clean(
    State(state): State<AppState>,
    mut form: FormData,
) -> Result<Json<ExtractionResult>, ApiError> {
    let file = form.take_file()?;
    let result =
        convert::extract_and_clean(state.extractor, file.filename.as_deref(), file.bytes).await?;
    Ok(Json(result))
}

pub async fn extract_with_ai(
    State(state): State<AppState>,
    mut form: FormData,
) -> Result<Json<AiExtractResponse>, ApiError> {
    // Validate every option before doing any work.
    let model = match form.non_blank("model") {
        Some(name) => name.parse::<AiModel>()?,
        None => AiModel::default(),
    };
    let prompt_preset = match form.non_blank("prompt_preset") {
        Some(name) => name.parse::<PromptPreset>()?,
        None => PromptPreset::default(),
    };
    let request = CleaningRequest {
        text: String::new(),
        model,
        prompt_preset,
        custom_prompt: form.non_blank("custom_prompt").map(str::to_string),
        api_key: form.non_blank("api_key").map(str::to_string),
    };
    let file = form.take_file()?;

    let out = convert::extract_with_ai(
        state.extractor,
        file.filename.as_deref(),
        file.bytes,
        request,
        &state.providers,
        &state.config,
    )
    .await?;

    if out.cleaning.is_degraded() {
        info!("Returning raw text for {} request", out.cleaning.model_used);
    }

    Ok(Json(AiExtractResponse {
        markdown: out.extraction.markdown,
        page_count: out.extraction.page_count,
        cleaned_text: out.cleaning.cleaned_text,
        model_used: out.cleaning.model_used,
        error: out.cleaning.error,
    }))
}

pub async fn clean(form: FormData) -> Result<Json<CleanResponse>, ApiError> {
    let text = form.require_field("text")?;
    let markdown = convert::clean(text);
    Ok(Json(CleanResponse {
        original_length: text.chars().count(),
        cleaned_length: markdown.chars().count(),
        markdown,
    }))
}
