//! Input validation: reject uploads that are obviously not PDFs.
//!
//! pdfium will happily spend time on a 40 MB JPEG before giving up with an
//! opaque `FormatError`. Checking the filename and the `%PDF` magic bytes
//! first gives the client a precise message and keeps garbage away from the
//! C library entirely.

use crate::error::ExtractError;
use tracing::debug;

/// PDF readers accept the header anywhere in the first 1024 bytes.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// `true` if `bytes` carry a `%PDF` header within the search window.
pub fn is_pdf_bytes(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    window.windows(4).any(|w| w == b"%PDF")
}

/// `true` if `filename` ends with `.pdf`, ignoring case.
pub fn has_pdf_extension(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Validate an uploaded file before extraction.
///
/// * a filename that does not end in `.pdf` → [`ExtractError::Validation`]
/// * zero bytes, or no `%PDF` header → [`ExtractError::InvalidDocument`]
pub fn validate_upload(filename: Option<&str>, bytes: &[u8]) -> Result<(), ExtractError> {
    if let Some(name) = filename.filter(|n| !n.is_empty()) {
        if !has_pdf_extension(name) {
            return Err(ExtractError::Validation("File must be a PDF".into()));
        }
    }

    if bytes.is_empty() {
        return Err(ExtractError::invalid("uploaded file is empty"));
    }

    if !is_pdf_bytes(bytes) {
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(ExtractError::invalid(format!(
            "not a PDF file (first bytes: {magic:?})"
        )));
    }

    debug!("Upload accepted: {} bytes", bytes.len());
    Ok(())
}
