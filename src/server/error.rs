//! HTTP error responses.
//!
//! Every failure leaves the server as `{"detail": "<message>"}`. Client
//! errors echo the [`ExtractError`] message; server errors log the detail
//! and answer with a generic message so no internals or credentials leak.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::ExtractError;

/// An error rendered as a JSON `detail` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// Map a body-extraction failure reported by axum (multipart, form).
    ///
    /// Only the size-limit case keeps its status; anything else is a
    /// malformed request.
    pub fn from_body_rejection(status: StatusCode, body_text: String) -> Self {
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            Self::new(status, "Uploaded file is too large")
        } else {
            Self::bad_request(format!("Malformed form body: {body_text}"))
        }
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        if e.is_client_error() {
            return Self::bad_request(e.to_string());
        }
        match e {
            ExtractError::PdfiumUnavailable(ref detail) => {
                error!("pdfium unavailable: {}", detail);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PDF engine is not available on this server",
                )
            }
            other => {
                error!("Request failed: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}
