use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::{status_text, Internal};
use crate::ids::RequestId;

/// One structured line per request.
///
/// Filled at the start of the request, finalized once after the handler ran,
/// then serialized to the sink and dropped.
#[derive(Debug, Serialize)]
pub struct LogRecord {
    pub id: RequestId,
    pub host: String,
    pub request_uri: String,
    #[serde(serialize_with = "rfc3339")]
    pub request_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    pub method: String,
    pub remote_address: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub user_agent: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Internal>,
    /// Seconds spent in the downstream stages
    pub latency: f64,
    pub response_code: u16,
    pub response: String,
    /// Set by handlers that opt out of request logging
    #[serde(skip)]
    pub no_log: bool,
}

fn rfc3339<S: Serializer>(t: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

impl LogRecord {
    pub fn new(id: RequestId) -> Self {
        Self {
            id,
            host: String::new(),
            request_uri: String::new(),
            request_time: Utc::now(),
            request_body: None,
            content_length: None,
            method: String::new(),
            remote_address: String::new(),
            user_agent: String::new(),
            content_type: String::new(),
            error: None,
            latency: 0.0,
            response_code: 200,
            response: String::new(),
            no_log: false,
        }
    }

    /// Record the outcome; called once per request.
    pub fn finalize(&mut self, latency_secs: f64, response_code: u16) {
        self.latency = latency_secs;
        self.response_code = response_code;
        self.response = status_text(response_code).to_string();
    }

    /// Error records are echoed in red: non-2xx or an attached error.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some() || !(200..300).contains(&self.response_code)
    }
}

/// Value recorded under `request_body`.
///
/// Empty bodies are omitted; anything that is not JSON is replaced by a
/// diagnostic string instead of failing the request.
#[must_use]
pub fn body_field(body: &[u8], read_error: Option<&str>) -> Option<Value> {
    if let Some(err) = read_error {
        return Some(Value::String(format!("could not read request body {err}")));
    }
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(v) => Some(v),
        Err(_) => Some(Value::String("request body is not valid json".to_string())),
    }
}
