//! Library entry points composing the pipeline stages.
//!
//! The HTTP handlers and the CLI both go through these functions, so every
//! surface validates, extracts and cleans the same way.
//!
//! | Function               | Stages                         |
//! |------------------------|--------------------------------|
//! | [`extract`]            | input → extract                |
//! | [`extract_and_clean`]  | input → extract → clean        |
//! | [`extract_with_ai`]    | input → extract → ai           |
//! | [`clean`]              | clean                          |

use crate::config::ServerConfig;
use crate::error::ExtractError;
use crate::output::{CleaningRequest, CleaningResult, ExtractionResult};
use crate::pipeline::{ai, clean::clean_text, extract::TextExtractor, input};
use crate::providers::ProviderSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the text of an uploaded PDF.
///
/// `filename` is the client-supplied name, if any; it is only checked for a
/// `.pdf` extension. The bytes are moved onto tokio's blocking pool because
/// pdfium is synchronous, and dropped when extraction returns.
///
/// # Errors
/// - [`ExtractError::Validation`]: filename without `.pdf`
/// - [`ExtractError::InvalidDocument`]: empty upload, no `%PDF` header, or
///   pdfium could not parse it
/// - [`ExtractError::EmptyDocument`]: zero pages
/// - [`ExtractError::PasswordProtected`]: encrypted document
/// - [`ExtractError::PdfiumUnavailable`]: no pdfium library could be bound
pub async fn extract(
    extractor: Arc<dyn TextExtractor>,
    filename: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ExtractionResult, ExtractError> {
    input::validate_upload(filename, &bytes)?;

    let start = Instant::now();
    let size = bytes.len();
    let backend = extractor.name().to_string();
    let result = tokio::task::spawn_blocking(move || extractor.extract(&bytes))
        .await
        .map_err(|e| ExtractError::Internal(format!("extraction task panicked: {e}")))??;

    info!(
        "Extracted {} pages ({} bytes → {} chars) with {} in {}ms",
        result.page_count,
        size,
        result.markdown.len(),
        backend,
        start.elapsed().as_millis()
    );
    Ok(result)
}

/// [`extract`], then run the pattern cleaner over the text.
///
/// `page_count` is that of the document; the cleaner only rewrites text.
pub async fn extract_and_clean(
    extractor: Arc<dyn TextExtractor>,
    filename: Option<&str>,
    bytes: Vec<u8>,
) -> Result<ExtractionResult, ExtractError> {
    let raw = extract(extractor, filename, bytes).await?;
    Ok(ExtractionResult {
        markdown: clean(&raw.markdown),
        page_count: raw.page_count,
    })
}

/// The output of [`extract_with_ai`]: raw extraction plus the AI outcome.
#[derive(Debug, Clone)]
pub struct AiExtraction {
    pub extraction: ExtractionResult,
    pub cleaning: CleaningResult,
}

/// [`extract`], then send the raw text to the requested AI provider.
///
/// `request.text` is replaced by the extracted text. Provider failures do
/// not make this function fail; see [`ai::clean_with_ai`].
pub async fn extract_with_ai(
    extractor: Arc<dyn TextExtractor>,
    filename: Option<&str>,
    bytes: Vec<u8>,
    mut request: CleaningRequest,
    providers: &ProviderSet,
    config: &ServerConfig,
) -> Result<AiExtraction, ExtractError> {
    let extraction = extract(extractor, filename, bytes).await?;
    request.text = extraction.markdown.clone();
    let cleaning = ai::clean_with_ai(&request, providers, config).await;
    Ok(AiExtraction {
        extraction,
        cleaning,
    })
}

/// Run the pattern cleaner over already-extracted text.
pub fn clean(text: &str) -> String {
    let cleaned = clean_text(text);
    debug!("Cleaned {} → {} chars", text.len(), cleaned.len());
    cleaned
}

/// Extract a PDF from disk. Used by the CLI.
pub async fn extract_file(
    extractor: Arc<dyn TextExtractor>,
    path: impl AsRef<Path>,
) -> Result<ExtractionResult, ExtractError> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ExtractError::invalid(format!("{}: {e}", path.display())))?;
    let filename = path.file_name().and_then(|n| n.to_str());
    extract(extractor, filename, bytes).await
}
