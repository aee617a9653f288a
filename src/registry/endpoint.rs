use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use super::method::Verb;
use crate::dispatcher::Handler;

/// Default content type for request and response bodies.
pub const CONTENT_JSON: &str = "application/json";

/// A documented parameter: query string key, path placeholder or JSON body field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Declarative record of one API operation.
///
/// The full route is `/{version}/{group}/{path}`; `version` and `group` may be
/// empty. Example bodies only feed the generated documentation and are never
/// executed.
#[derive(Clone)]
pub struct Endpoint {
    pub name: String,
    pub version: String,
    pub group: String,
    pub path: String,
    pub(crate) full_path: String,
    pub methods: Vec<Verb>,
    pub request_content_type: String,
    pub response_content_type: String,
    pub request_body_example: Option<Value>,
    pub response_body_example: Option<Value>,
    pub description: String,
    pub query_params: Vec<Param>,
    pub path_params: Vec<Param>,
    pub json_fields: Vec<Param>,
    pub pretty_output: bool,
    pub(crate) handler: Arc<dyn Handler>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("name", &self.name)
            .field("full_path", &self.full_path)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

fn example_value<T: Serialize>(example: &T) -> Option<Value> {
    match serde_json::to_value(example) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "Endpoint example body is not serializable");
            None
        }
    }
}

impl Endpoint {
    /// A `GET` endpoint at `path` with JSON content types.
    pub fn new(path: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            group: String::new(),
            path: path.into(),
            full_path: String::new(),
            methods: vec![Verb::Get],
            request_content_type: CONTENT_JSON.to_string(),
            response_content_type: CONTENT_JSON.to_string(),
            request_body_example: None,
            response_body_example: None,
            description: String::new(),
            query_params: Vec::new(),
            path_params: Vec::new(),
            json_fields: Vec::new(),
            pretty_output: false,
            handler: Arc::new(handler),
        }
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    #[must_use]
    pub fn methods(mut self, methods: impl IntoIterator<Item = Verb>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn request_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.request_content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn response_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.response_content_type = content_type.into();
        self
    }

    #[must_use]
    pub fn request_example<T: Serialize>(mut self, example: &T) -> Self {
        self.request_body_example = example_value(example);
        self
    }

    #[must_use]
    pub fn response_example<T: Serialize>(mut self, example: &T) -> Self {
        self.response_body_example = example_value(example);
        self
    }

    #[must_use]
    pub fn query_param(mut self, param: Param) -> Self {
        self.query_params.push(param);
        self
    }

    /// Path placeholders are always required.
    #[must_use]
    pub fn path_param(mut self, param: Param) -> Self {
        self.path_params.push(param.required());
        self
    }

    #[must_use]
    pub fn json_fields(mut self, fields: impl IntoIterator<Item = Param>) -> Self {
        self.json_fields.extend(fields);
        self
    }

    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty_output = pretty;
        self
    }

    /// Normalized `/{version}/{group}/{path}`; empty until registered.
    #[must_use]
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    #[must_use]
    pub fn handler(&self) -> Arc<dyn Handler> {
        Arc::clone(&self.handler)
    }

    /// Methods joined for display, e.g. `GET|POST`.
    #[must_use]
    pub fn method_list(&self) -> String {
        self.methods
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join("|")
    }

    pub(crate) fn build_full_path(&self) -> String {
        clean_path(&format!("/{}/{}{}", self.version, self.group, self.path))
    }
}

/// Lexical path cleaning: collapse repeated slashes, resolve `.` and `..`,
/// drop the trailing slash. The result is always rooted; the root stays `/`.
#[must_use]
pub fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        return "/".to_string();
    }
    let mut out = String::with_capacity(path.len());
    for p in parts {
        out.push('/');
        out.push_str(p);
    }
    out
}

/// Problem found while scanning `{param}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BraceError {
    /// `}` with no open `{`
    Unopened,
    /// `{` while another `{` is still open
    Nested,
    /// `{` never closed
    Unclosed,
}

/// Count `{name}` placeholders in a path template.
///
/// # Errors
///
/// Returns a [`BraceError`] when braces do not pair up.
pub fn count_path_params(path: &str) -> Result<usize, BraceError> {
    let mut open = false;
    let mut count = 0;
    for c in path.chars() {
        match c {
            '{' if open => return Err(BraceError::Nested),
            '{' => open = true,
            '}' if !open => return Err(BraceError::Unopened),
            '}' => {
                open = false;
                count += 1;
            }
            _ => {}
        }
    }
    if open {
        return Err(BraceError::Unclosed);
    }
    Ok(count)
}

/// Problem with where a placeholder sits in the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentError {
    /// Placeholder mixed with literal text inside one segment, e.g. `item-{id}`
    Embedded,
    /// `{}` or `{*}` without a name
    Unnamed,
    /// `{*name}` anywhere but the last segment
    TailNotLast,
}

/// Every placeholder must fill a whole segment: `{name}`, or `{*name}` as the
/// last segment to capture the rest of the path.
///
/// # Errors
///
/// The offending segment and what is wrong with it.
pub fn check_placeholder_segments(path: &str) -> Result<(), (String, SegmentError)> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    for (i, segment) in segments.iter().enumerate() {
        if !segment.contains(['{', '}']) {
            continue;
        }
        let fail = |problem: SegmentError| -> Result<(), (String, SegmentError)> {
            Err(((*segment).to_string(), problem))
        };
        let Some(inner) = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
        else {
            return fail(SegmentError::Embedded);
        };
        if inner.contains(['{', '}']) {
            return fail(SegmentError::Embedded);
        }
        let (name, tail) = match inner.strip_prefix('*') {
            Some(name) => (name, true),
            None => (inner, false),
        };
        if name.is_empty() {
            return fail(SegmentError::Unnamed);
        }
        if tail && i + 1 != segments.len() {
            return fail(SegmentError::TailNotLast);
        }
    }
    Ok(())
}
