//! Recognized fields of a quickstart response body
//!
//! Every endpoint may answer with an `error` object instead of data, and some
//! attach a base64 `pdf`. Everything else in the body belongs to the
//! endpoint's transform.

use base64::Engine;
use serde_json::Value;

use super::ApiError;

/// Fields of an error object the error panel labels itself
pub const KNOWN_ERROR_FIELDS: [&str; 5] = [
    "error_code",
    "error_type",
    "error_message",
    "display_message",
    "status_code",
];

/// Request-level error reported by the backend, kept verbatim
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    raw: Value,
}

impl ErrorPayload {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// The `error` field exactly as the backend sent it
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    fn text_field(&self, key: &str) -> Option<String> {
        match self.raw.get(key)? {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn error_type(&self) -> Option<String> {
        self.text_field("error_type")
    }

    pub fn error_code(&self) -> Option<String> {
        self.text_field("error_code")
    }

    pub fn error_message(&self) -> Option<String> {
        self.text_field("error_message")
    }

    pub fn display_message(&self) -> Option<String> {
        self.text_field("display_message")
    }

    pub fn status_code(&self) -> Option<String> {
        self.text_field("status_code")
    }

    /// Error bodies that are a bare string rather than an object
    pub fn plain_text(&self) -> Option<&str> {
        self.raw.as_str()
    }
}

/// Base64-encoded PDF document returned by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPayload(String);

impl PdfPayload {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Decode the document bytes
    pub fn decode(&self) -> Result<Vec<u8>, ApiError> {
        // Some backends wrap long base64 lines
        let compact: String = self
            .0
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| ApiError::Decode(format!("invalid PDF payload: {}", e)))
    }
}

/// The `error` field, if present and non-null
pub fn extract_error(body: &Value) -> Option<ErrorPayload> {
    match body.get("error") {
        None | Some(Value::Null) => None,
        Some(error) => Some(ErrorPayload::new(error.clone())),
    }
}

/// The `pdf` field, if present as a string
pub fn extract_pdf(body: &Value) -> Option<PdfPayload> {
    match body.get("pdf") {
        Some(Value::String(s)) => Some(PdfPayload::new(s.clone())),
        Some(Value::Null) | None => None,
        Some(other) => {
            tracing::warn!("Ignoring non-string pdf field: {}", other);
            None
        }
    }
}
