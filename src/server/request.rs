use may_minihttp::Request;
use std::collections::HashMap;
use std::io::Read;
use tracing::debug;

/// Raw request data pulled off the wire before any middleware runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedRequest {
    /// HTTP method token as sent (e.g. `GET`)
    pub method: String,
    /// Path without the query string
    pub path: String,
    /// Path and query string as sent
    pub uri: String,
    /// Decoded query pairs in order
    pub query: Vec<(String, String)>,
    /// Headers with lowercase names
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    /// Set when the body stream failed mid-read; `body` holds what arrived
    pub body_error: Option<String>,
}

impl ParsedRequest {
    /// Build a request by hand, mostly for driving the pipeline in-process.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        Self {
            method: method.into(),
            path: split_path(&uri).to_string(),
            query: parse_query_params(&uri),
            uri,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

fn split_path(uri: &str) -> &str {
    match uri.split('?').next() {
        Some(p) if !p.is_empty() => p,
        _ => "/",
    }
}

/// Decode everything after `?` as `application/x-www-form-urlencoded`.
#[must_use]
pub fn parse_query_params(uri: &str) -> Vec<(String, String)> {
    match uri.split_once('?') {
        Some((_, query)) => url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        None => Vec::new(),
    }
}

/// Extract everything the pipeline needs from a `may_minihttp::Request`.
///
/// The body is drained here, once; later stages replay it from memory.
pub fn parse_request(req: Request) -> ParsedRequest {
    let method = req.method().to_string();
    let uri = req.path().to_string();

    let headers: HashMap<String, String> = req
        .headers()
        .iter()
        .map(|h| {
            (
                h.name.to_ascii_lowercase(),
                String::from_utf8_lossy(h.value).to_string(),
            )
        })
        .collect();

    let mut body = Vec::new();
    let body_error = req.body().read_to_end(&mut body).err().map(|e| e.to_string());

    debug!(
        method = %method,
        uri = %uri,
        headers_count = headers.len(),
        body_bytes = body.len(),
        "HTTP request parsed"
    );

    ParsedRequest {
        path: split_path(&uri).to_string(),
        query: parse_query_params(&uri),
        method,
        uri,
        headers,
        body,
        body_error,
    }
}
