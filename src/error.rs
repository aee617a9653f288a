//! # Error Values
//!
//! Handlers never write failure responses themselves. They return an
//! [`ApiError`] (inside `anyhow::Error`) and the dispatcher's adapter turns it
//! into exactly one wire response plus one entry on the request's log record.
//!
//! An [`ApiError`] has two halves:
//!
//! - [`Internal`] - developer-facing detail, attached to the log record and never sent
//! - [`ResponseBody`] - the `{"message", "code", "status"}` envelope the client sees
//!
//! ```rust
//! use brrtapi::error::ApiError;
//!
//! let err = ApiError::new(
//!     "internal error message",
//!     "response body error message",
//!     400,
//!     None,
//! );
//! assert_eq!(err.body.status, "Bad Request");
//! ```

use http::StatusCode;
use serde::Serialize;
use std::fmt;

/// Content type written with every error envelope.
pub const CONTENT_JSON: &str = "application/json";

/// Body used when the error envelope itself cannot be serialized.
pub const FALLBACK_ERROR_BODY: &[u8] =
    br#"{"message":"an error has occurred","code":500,"status":"Internal Server Error"}"#;

/// Developer-facing half of an [`ApiError`].
///
/// Serialized under `error` in the request log record. The wrapped cause is
/// kept for [`std::error::Error::source`] but only its rendered text is logged.
#[derive(Debug, Default, Serialize)]
pub struct Internal {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_text: Option<String>,
    #[serde(skip)]
    pub cause: Option<anyhow::Error>,
}

/// User-facing half of an [`ApiError`]; the JSON envelope written to the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseBody {
    pub message: String,
    pub code: u16,
    pub status: String,
}

/// Structured failure returned by a handler.
#[derive(Debug)]
pub struct ApiError {
    pub internal: Internal,
    pub body: ResponseBody,
}

/// Reason phrase for a status code, empty for codes without a canonical one.
#[must_use]
pub fn status_text(code: u16) -> &'static str {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

/// Replace codes `http` cannot represent with 500.
fn checked_code(code: u16) -> u16 {
    match StatusCode::from_u16(code) {
        Ok(status) => status.as_u16(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
    }
}

impl ApiError {
    /// Internal messages are logged, external messages are sent back in the response.
    pub fn new(
        internal: impl Into<String>,
        external: impl Into<String>,
        code: u16,
        cause: Option<anyhow::Error>,
    ) -> Self {
        let code = checked_code(code);
        Self {
            internal: Internal {
                message: internal.into(),
                error_text: cause.as_ref().map(|e| format!("{e:#}")),
                cause,
            },
            body: ResponseBody {
                message: external.into(),
                code,
                status: status_text(code).to_string(),
            },
        }
    }

    /// Default value for a handler error that is not an [`ApiError`].
    pub fn handler_error(cause: anyhow::Error, request_id: impl fmt::Display) -> Self {
        Self::new(
            "handler error",
            format!("an error has occurred, please see request id: {request_id}"),
            StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            Some(cause),
        )
    }

    /// Resolve whatever a handler returned into a structured error.
    ///
    /// Structured errors pass through untouched apart from re-deriving the
    /// status text, anything else becomes [`ApiError::handler_error`].
    pub fn from_handler(err: anyhow::Error, request_id: impl fmt::Display) -> Self {
        match err.downcast::<ApiError>() {
            Ok(mut api) => {
                api.body.code = checked_code(api.body.code);
                api.body.status = status_text(api.body.code).to_string();
                api
            }
            Err(other) => Self::handler_error(other, request_id),
        }
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.body.code
    }

    /// Serialized response envelope, falling back to a fixed body on failure.
    #[must_use]
    pub fn response_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(&self.body).unwrap_or_else(|_| FALLBACK_ERROR_BODY.to_vec())
    }

    /// Split into the part for the log record and the part for the wire.
    #[must_use]
    pub fn into_parts(self) -> (Internal, ResponseBody) {
        (self.internal, self.body)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.body) {
            Ok(body) => f.write_str(&body),
            Err(_) => write!(f, "{} {}", self.body.code, self.body.message),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.internal
            .cause
            .as_ref()
            .map(|e| &**e as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_status_text_derived_from_code() {
        let err = ApiError::new("internal", "external", 406, None);
        assert_eq!(err.body.status, "Not Acceptable");
        assert_eq!(status_text(404), "Not Found");
    }

    #[test]
    fn test_cause_text_rendered() {
        let err = ApiError::new("decode", "bad body", 400, Some(anyhow!("eof")));
        assert_eq!(err.internal.error_text.as_deref(), Some("eof"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_display_is_response_envelope() {
        let err = ApiError::new("internal error message", "response body error message", 400, None);
        assert_eq!(
            err.to_string(),
            r#"{"message":"response body error message","code":400,"status":"Bad Request"}"#
        );
    }

    #[test]
    fn test_from_handler_keeps_structured_error() {
        let err: anyhow::Error = ApiError::new("i", "e", 418, None).into();
        let api = ApiError::from_handler(err, "req-1");
        assert_eq!(api.code(), 418);
        assert_eq!(api.internal.message, "i");
    }

    #[test]
    fn test_from_handler_wraps_plain_error() {
        let api = ApiError::from_handler(anyhow!("boom"), "01HZX");
        assert_eq!(api.code(), 500);
        assert_eq!(api.internal.message, "handler error");
        assert_eq!(api.internal.error_text.as_deref(), Some("boom"));
        assert!(api.body.message.ends_with("01HZX"));
        assert_eq!(api.body.status, "Internal Server Error");
    }

    #[test]
    fn test_invalid_code_becomes_500() {
        let api = ApiError::new("i", "e", 42, None);
        assert_eq!(api.code(), 500);
    }

    #[test]
    fn test_internal_serialization_omits_cause() {
        let err = ApiError::new("internal error message", "x", 400, Some(anyhow!("testing 400 error")));
        let (internal, _) = err.into_parts();
        let v = serde_json::to_value(&internal).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"message": "internal error message", "error_text": "testing 400 error"})
        );
    }
}
