//! Form body extraction.
//!
//! Routes take their input as form fields: `multipart/form-data` for
//! uploads, and `application/x-www-form-urlencoded` is accepted too for the
//! text-only `/clean` route. [`FormData`] buffers the fields of either kind
//! into memory; the upload lives only as long as the request.

use std::collections::HashMap;

use axum::extract::multipart::MultipartError;
use axum::extract::{Form, FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;

use crate::error::ExtractError;
use crate::server::error::ApiError;

/// Name of the multipart part carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// One uploaded file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied name; may be absent.
    pub filename: Option<String>,
    pub bytes: Vec<u8>,
}

/// All fields of a submitted form. Later duplicates replace earlier ones.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    file: Option<UploadedFile>,
}

impl FormData {
    /// A text field, if it was sent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A text field that was sent and is not blank.
    pub fn non_blank(&self, name: &str) -> Option<&str> {
        self.field(name).filter(|v| !v.trim().is_empty())
    }

    /// A text field the route cannot work without.
    pub fn require_field(&self, name: &str) -> Result<&str, ExtractError> {
        self.field(name)
            .ok_or_else(|| ExtractError::Validation(format!("Missing form field: {name}")))
    }

    /// Take the uploaded file out of the form.
    pub fn take_file(&mut self) -> Result<UploadedFile, ExtractError> {
        self.file
            .take()
            .ok_or_else(|| ExtractError::Validation("No file uploaded".into()))
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some(UploadedFile {
                    filename,
                    bytes: Vec::from(bytes),
                });
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::from_body_rejection(e.status(), e.body_text())
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|r| ApiError::from_body_rejection(r.status(), r.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|r| ApiError::from_body_rejection(r.status(), r.body_text()))?;
            Ok(Self { fields, file: None })
        } else {
            Err(ApiError::bad_request(
                "Expected a multipart/form-data or application/x-www-form-urlencoded body",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        FormData {
            fields: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file: None,
        }
    }

    #[test]
    fn blank_fields_are_not_non_blank() {
        let f = form(&[("custom_prompt", "  "), ("model", "groq")]);
        assert_eq!(f.non_blank("custom_prompt"), None);
        assert_eq!(f.field("custom_prompt"), Some("  "));
        assert_eq!(f.non_blank("model"), Some("groq"));
    }

    #[test]
    fn missing_required_field_is_validation_error() {
        let err = form(&[]).require_field("text").unwrap_err();
        assert_eq!(err.to_string(), "Missing form field: text");
    }

    #[test]
    fn missing_file_is_validation_error() {
        let err = form(&[]).take_file().unwrap_err();
        assert!(matches!(err, ExtractError::Validation(_)));
    }
}
