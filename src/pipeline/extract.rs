//! PDF text extraction via pdfium.
//!
//! ## Why a trait?
//!
//! [`TextExtractor`] is the seam between the HTTP layer and the C library.
//! Production uses [`PdfiumExtractor`]; tests plug in a stub so the routes
//! can be exercised on machines without a pdfium shared library.
//!
//! ## Why blocking?
//!
//! `pdfium-render` wraps a C++ library that keeps thread-local state and is
//! not async-safe. Extraction is therefore a plain synchronous call;
//! [`crate::convert::extract`] runs it on tokio's blocking pool so worker
//! threads keep serving other requests.
//!
//! ## Output format
//!
//! Page texts are joined with a `<!-- page N -->` marker line between them,
//! where `N` is the 1-based number of the page that follows. Every page
//! yields a segment, blank pages included, so [`split_pages`] always returns
//! `page_count` segments in document order.

use crate::error::ExtractError;
use crate::output::ExtractionResult;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use regex::Regex;
use std::path::PathBuf;
use tracing::{debug, info};

/// Extracts per-page text from PDF bytes.
pub trait TextExtractor: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Extract every page of `pdf`, in order.
    ///
    /// Must not keep `pdf` (or any copy of it) beyond the call.
    fn extract(&self, pdf: &[u8]) -> Result<ExtractionResult, ExtractError>;
}

/// [`TextExtractor`] backed by the pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumExtractor {
    library_path: Option<PathBuf>,
}

impl PdfiumExtractor {
    /// `library_path` may name the library file itself or its directory.
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    /// Bind to pdfium, from most-specific to least-specific location:
    ///
    /// 1. the configured path (file, or directory holding the platform library)
    /// 2. the working directory
    /// 3. the system library search path
    pub fn bind(&self) -> Result<Pdfium, ExtractError> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Some(ref path) = self.library_path {
            if path.is_dir() {
                candidates.push(Pdfium::pdfium_platform_library_name_at_path(path));
            } else {
                candidates.push(path.clone());
            }
        }
        candidates.push(Pdfium::pdfium_platform_library_name_at_path("./"));

        for path in &candidates {
            if let Ok(bindings) = Pdfium::bind_to_library(path) {
                debug!("Bound pdfium at {}", path.display());
                return Ok(Pdfium::new(bindings));
            }
        }

        Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| ExtractError::PdfiumUnavailable(e.to_string()))
    }
}

impl TextExtractor for PdfiumExtractor {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn extract(&self, pdf: &[u8]) -> Result<ExtractionResult, ExtractError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(classify_load_error)?;

        let pages = document.pages();
        let page_count = pages.len() as usize;
        if page_count == 0 {
            return Err(ExtractError::EmptyDocument);
        }
        info!("PDF loaded: {} pages", page_count);

        let mut texts = Vec::with_capacity(page_count);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| ExtractError::invalid(format!("page {}: {e}", idx + 1)))?;
            let text = normalise_page_text(&text.all());
            debug!("Page {} → {} chars", idx + 1, text.len());
            texts.push(text);
        }

        Ok(ExtractionResult {
            markdown: join_pages(&texts),
            page_count,
        })
    }
}

/// Map a pdfium load failure onto the error taxonomy.
fn classify_load_error(e: PdfiumError) -> ExtractError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        ExtractError::PasswordProtected
    } else {
        ExtractError::InvalidDocument { detail }
    }
}

// ── Page assembly ────────────────────────────────────────────────────────

static RE_PAGE_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*<!-- page \d+ -->[ \t]*$").unwrap());

static RE_PAGE_MARKER_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<!-- page \d+ -->$").unwrap());

/// Render the separator placed before page `page_num` (1-indexed).
pub fn page_marker(page_num: usize) -> String {
    format!("<!-- page {} -->", page_num)
}

/// `true` if `line` is exactly a page marker.
pub fn is_page_marker(line: &str) -> bool {
    RE_PAGE_MARKER_LINE.is_match(line.trim())
}

/// Join page texts into one document with a marker between pages.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
            out.push_str(&page_marker(i + 1));
            out.push_str("\n\n");
        }
        out.push_str(page.as_ref());
    }
    out
}

/// Recover the page segments of a document built by [`join_pages`].
///
/// Splits on marker lines wherever they sit, so text whose blank lines were
/// collapsed or whose leading page was emptied by cleaning still yields one
/// segment per page.
pub fn split_pages(markdown: &str) -> Vec<&str> {
    RE_PAGE_SPLIT
        .split(markdown)
        .map(|segment| segment.trim_matches('\n'))
        .collect()
}

/// Normalise one page of pdfium output.
///
/// pdfium separates lines with `\r\n`, pads lines with trailing blanks and
/// sprinkles NULs and zero-width characters through some fonts' text.
pub fn normalise_page_text(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");
    let stripped = unified.replace(
        [
            '\0', '\u{200B}', '\u{FEFF}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{FFFE}',
        ],
        "",
    );
    stripped
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
