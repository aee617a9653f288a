use http::Method;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Cursor;
use std::time::Instant;
use tracing::Span;

use super::request::ParsedRequest;
use crate::error::Internal;
use crate::ids::RequestId;
use crate::request_log::LogRecord;
use crate::router::ParamVec;

/// Request-scoped state handed to middleware and handlers.
///
/// Owned by the coroutine serving the request; nothing in here is shared
/// across requests.
#[derive(Debug)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    uri: String,
    query: Vec<(String, String)>,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    body_error: Option<String>,
    path_params: ParamVec,
    started: Instant,
    log: Option<LogRecord>,
    span: Option<Span>,
}

impl RequestContext {
    pub fn new(req: ParsedRequest, method: Method, request_id: RequestId) -> Self {
        Self {
            request_id,
            method,
            path: req.path,
            uri: req.uri,
            query: req.query,
            headers: req.headers,
            body: req.body,
            body_error: req.body_error,
            path_params: ParamVec::new(),
            started: Instant::now(),
            log: None,
            span: None,
        }
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path plus query string, as received.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn host(&self) -> &str {
        self.header("host").unwrap_or_default()
    }

    /// Header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        match self.headers.get(name) {
            Some(v) => Some(v.as_str()),
            None => self
                .headers
                .get(&name.to_ascii_lowercase())
                .map(String::as_str),
        }
    }

    /// Last value wins for repeated keys.
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rfind(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn set_path_params(&mut self, params: ParamVec) {
        self.path_params = params;
    }

    /// Client address from `x-forwarded-for` (first hop) or `x-real-ip`, else `-`.
    #[must_use]
    pub fn remote_addr(&self) -> &str {
        if let Some(first) = self
            .header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            return first;
        }
        match self.header("x-real-ip").map(str::trim) {
            Some(ip) if !ip.is_empty() => ip,
            _ => "-",
        }
    }

    /// Captured request body. Reading it does not consume it.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Fresh reader over the captured body; every call starts at byte 0.
    #[must_use]
    pub fn body_reader(&self) -> Cursor<&[u8]> {
        Cursor::new(self.body.as_slice())
    }

    /// Error raised while the body was read off the socket, if any.
    #[must_use]
    pub fn body_error(&self) -> Option<&str> {
        self.body_error.as_deref()
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the body does not match `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// When the pipeline started handling this request.
    #[must_use]
    pub fn started(&self) -> Instant {
        self.started
    }

    /// The request log record, present when the request logger is installed.
    #[must_use]
    pub fn log(&self) -> Option<&LogRecord> {
        self.log.as_ref()
    }

    pub fn log_mut(&mut self) -> Option<&mut LogRecord> {
        self.log.as_mut()
    }

    pub fn set_log(&mut self, record: LogRecord) {
        self.log = Some(record);
    }

    pub fn take_log(&mut self) -> Option<LogRecord> {
        self.log.take()
    }

    /// Ask the request logger not to write a record for this request.
    pub fn skip_logging(&mut self) {
        if let Some(rec) = self.log.as_mut() {
            rec.no_log = true;
        }
    }

    /// Attach the developer-facing half of an error to the log record.
    pub fn attach_error(&mut self, internal: Internal) {
        if let Some(rec) = self.log.as_mut() {
            rec.error = Some(internal);
        }
    }

    #[must_use]
    pub fn span(&self) -> Option<&Span> {
        self.span.as_ref()
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = Some(span);
    }
}
