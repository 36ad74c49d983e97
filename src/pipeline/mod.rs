//! Pipeline stages for PDF text extraction and cleaning.
//!
//! Each submodule implements exactly one step, so each is independently
//! testable and the HTTP layer only composes them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ clean            (/extract-and-clean)
//! (magic)   (pdfium)  └─▶ ai ──▶ clean   (/extract-with-ai)
//! ```
//!
//! 1. [`input`]:   reject uploads that are not PDFs before pdfium sees them
//! 2. [`extract`]: per-page text via pdfium; blocking, run in `spawn_blocking`
//! 3. [`clean`]:   deterministic rules that strip headers, page numbers,
//!    encoding artefacts and data dumps
//! 4. [`ai`]:      one provider call with a bounded wait; failures degrade
//!    to the raw text instead of failing the request

pub mod ai;
pub mod clean;
pub mod extract;
pub mod input;
