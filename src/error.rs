//! Error types for the edgequake-pdf-extract library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExtractError`]: **Fatal** for the request: the upload is not a PDF,
//!   has no pages, a form field is missing, or pdfium itself is unavailable.
//!   Returned as `Err(ExtractError)` and mapped to a 4xx/5xx by the server.
//!
//! * [`ProviderError`]: **Non-fatal**: the AI provider call failed (network,
//!   timeout, 429, bad key, garbage JSON). The AI cleaner never propagates it;
//!   it is rendered into [`crate::output::CleaningResult::error`] next to a
//!   usable fallback text.

use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf-extract library.
///
/// Provider failures use [`ProviderError`] and are embedded in
/// [`crate::output::CleaningResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Document errors ───────────────────────────────────────────────────
    /// The bytes cannot be parsed as a PDF (wrong format, corrupt xref, …).
    #[error("Invalid PDF document: {detail}")]
    InvalidDocument { detail: String },

    /// The PDF parsed but contains no pages.
    #[error("PDF document has no pages")]
    EmptyDocument,

    /// The PDF is encrypted; uploads carry no password field.
    #[error("PDF document is password protected")]
    PasswordProtected,

    // ── Request errors ────────────────────────────────────────────────────
    /// A required form field is missing or has an unsupported value.
    #[error("{0}")]
    Validation(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumUnavailable(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Shorthand for [`ExtractError::InvalidDocument`].
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidDocument {
            detail: detail.into(),
        }
    }

    /// `true` for errors caused by the client's input (4xx class).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDocument { .. }
                | Self::EmptyDocument
                | Self::PasswordProtected
                | Self::Validation(_)
        )
    }
}

/// A non-fatal failure of one AI provider call.
///
/// Rendered to a short diagnostic string and returned alongside the raw
/// text; see [`crate::pipeline::ai::clean_with_ai`].
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProviderError {
    /// Neither the request nor the server configuration supplied a key.
    #[error("{provider} API key required")]
    MissingCredential { provider: String },

    /// The HTTP request could not be sent or the connection broke.
    #[error("{provider} request failed: {detail}")]
    Request { provider: String, detail: String },

    /// No response arrived within the configured ceiling.
    #[error("{provider} did not respond within {secs}s")]
    Timeout { provider: String, secs: u64 },

    /// HTTP 429.
    #[error("{provider} rate limit exceeded")]
    RateLimited { provider: String },

    /// HTTP 401/403.
    #[error("{provider} rejected the API key: {detail}")]
    Auth { provider: String, detail: String },

    /// Any other non-2xx status.
    #[error("{provider} API error ({status}): {detail}")]
    Status {
        provider: String,
        status: u16,
        detail: String,
    },

    /// 2xx, but the body did not have the expected shape.
    #[error("{provider} returned a malformed response: {detail}")]
    MalformedResponse { provider: String, detail: String },
}
