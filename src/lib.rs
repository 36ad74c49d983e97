//! # edgequake-pdf-extract
//!
//! Extract the text of PDF documents and clean it, either with fast
//! deterministic pattern rules or with a language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF bytes
//!  │
//!  ├─ 1. Input    reject non-PDF uploads (extension, %PDF magic)
//!  ├─ 2. Extract  per-page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3a. Clean   ordered pattern rules (headers, page numbers, dumps, mojibake)
//!  └─ 3b. AI      Gemini / Groq / SambaNova; on failure, raw text + error
//! ```
//!
//! The same pipeline is exposed three ways: library functions in
//! [`convert`], an axum HTTP service in [`server`], and the `pdf-extract`
//! binary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_extract::{convert, PdfiumExtractor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = Arc::new(PdfiumExtractor::default());
//!     let bytes = std::fs::read("document.pdf")?;
//!     let result = convert::extract_and_clean(extractor, Some("document.pdf"), bytes).await?;
//!     println!("{} pages\n{}", result.page_count, result.markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! Bad input ([`ExtractError`]) fails the request. AI provider trouble
//! ([`ProviderError`]) never does: [`pipeline::ai::clean_with_ai`] returns
//! the raw text with a diagnostic instead.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-extract` binary (clap + anyhow + tracing-subscriber + dotenvy) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AiModel, ServerConfig, ServerConfigBuilder};
pub use error::{ExtractError, ProviderError};
pub use output::{CleaningRequest, CleaningResult, ExtractionResult};
pub use pipeline::clean::clean_text;
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use prompts::PromptPreset;
pub use providers::{CompletionProvider, ProviderSet};
pub use server::{router, AppState};
