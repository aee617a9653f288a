use may_minihttp::Response;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::warn;

use crate::error::{status_text, CONTENT_JSON};

pub const CONTENT_TEXT: &str = "text/plain; charset=utf-8";

/// Buffered response for one request.
///
/// The status is set at most once. Nothing reaches the wire until the service
/// flushes the writer after every middleware has run, so the recorded status
/// is always the one sent.
#[derive(Debug, Default)]
pub struct ResponseWriter {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the status code. Only the first call counts.
    pub fn write_header(&mut self, code: u16) {
        match self.status {
            Some(existing) => warn!(
                existing,
                ignored = code,
                "superfluous write_header call"
            ),
            None => self.status = Some(code),
        }
    }

    /// Append to the body; implies `200` if no status was written yet.
    pub fn write(&mut self, bytes: &[u8]) {
        if self.status.is_none() {
            self.status = Some(200);
        }
        self.body.extend_from_slice(bytes);
    }

    /// Replace (case-insensitively) or add a header.
    ///
    /// Every distinct `name: value` line sent is kept for the life of the
    /// process, so values should come from a small fixed set (content types,
    /// redirect targets). Past [`MAX_INTERNED_HEADER_LINES`] distinct lines,
    /// new ones are dropped at flush with a warning.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1 = value,
            None => self.headers.push((name.to_string(), value)),
        }
    }

    /// Serialize `value` as compact JSON and write it with `status`.
    ///
    /// # Errors
    ///
    /// Serialization failure; nothing is written in that case.
    pub fn json<T: Serialize + ?Sized>(
        &mut self,
        status: u16,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        self.send(status, CONTENT_JSON, &body);
        Ok(())
    }

    /// Like [`ResponseWriter::json`] but indented.
    ///
    /// # Errors
    ///
    /// Serialization failure; nothing is written in that case.
    pub fn json_pretty<T: Serialize + ?Sized>(
        &mut self,
        status: u16,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec_pretty(value)?;
        self.send(status, CONTENT_JSON, &body);
        Ok(())
    }

    pub fn text(&mut self, status: u16, body: impl AsRef<str>) {
        self.send(status, CONTENT_TEXT, body.as_ref().as_bytes());
    }

    /// Write raw bytes with an explicit content type.
    pub fn send(&mut self, status: u16, content_type: &str, body: &[u8]) {
        self.set_header("Content-Type", content_type);
        self.write_header(status);
        self.write(body);
    }

    /// Redirect to `location` with an empty body.
    pub fn redirect(&mut self, status: u16, location: &str) {
        self.set_header("Location", location);
        self.write_header(status);
    }

    /// Status that will be sent: the written one, else `200`.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    /// Whether a status has been written.
    #[must_use]
    pub fn is_written(&self) -> bool {
        self.status.is_some()
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Body as UTF-8, lossy.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Copy everything onto the wire response.
    pub fn flush_into(self, res: &mut Response) {
        let code = self.status();
        let reason = match status_text(code) {
            "" => "Unknown",
            r => r,
        };
        res.status_code(usize::from(code), reason);
        for (name, value) in &self.headers {
            if let Some(line) = header_line(name, value) {
                res.header(line);
            }
        }
        res.body_vec(self.body);
    }
}

/// Upper bound on distinct header lines kept for the life of the process.
pub const MAX_INTERNED_HEADER_LINES: usize = 4096;

/// `may_minihttp` keeps header lines as `&'static str`; each distinct line is
/// allocated once and reused afterwards, up to a fixed number of lines.
#[derive(Debug)]
struct HeaderLines {
    lines: HashSet<&'static str>,
    cap: usize,
}

impl HeaderLines {
    fn with_cap(cap: usize) -> Self {
        Self {
            lines: HashSet::new(),
            cap,
        }
    }

    /// `None` once `cap` distinct lines exist and `line` is not one of them.
    fn intern(&mut self, line: String) -> Option<&'static str> {
        if let Some(existing) = self.lines.get(line.as_str()) {
            return Some(*existing);
        }
        if self.lines.len() >= self.cap {
            return None;
        }
        let leaked: &'static str = Box::leak(line.into_boxed_str());
        self.lines.insert(leaked);
        Some(leaked)
    }
}

fn header_line(name: &str, value: &str) -> Option<&'static str> {
    static LINES: OnceLock<Mutex<HeaderLines>> = OnceLock::new();
    let line = format!("{name}: {value}");
    let interned = LINES
        .get_or_init(|| Mutex::new(HeaderLines::with_cap(MAX_INTERNED_HEADER_LINES)))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .intern(line);
    if interned.is_none() {
        warn!(header = %name, "Header line table full, header dropped");
    }
    interned
}
