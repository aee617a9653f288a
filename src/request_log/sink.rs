use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling::{self, RollingFileAppender};

use super::record::LogRecord;

/// File path that disables the file sink.
pub const NOP_SINK: &str = "nop://";

/// How often the request log file rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl Rotation {
    fn to_appender(self) -> rolling::Rotation {
        match self {
            Rotation::Minutely => rolling::Rotation::MINUTELY,
            Rotation::Hourly => rolling::Rotation::HOURLY,
            Rotation::Daily => rolling::Rotation::DAILY,
            Rotation::Never => rolling::Rotation::NEVER,
        }
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rotation::Minutely => "minutely",
            Rotation::Hourly => "hourly",
            Rotation::Daily => "daily",
            Rotation::Never => "never",
        })
    }
}

impl FromStr for Rotation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minutely" => Ok(Rotation::Minutely),
            "hourly" => Ok(Rotation::Hourly),
            "daily" => Ok(Rotation::Daily),
            "never" | "" => Ok(Rotation::Never),
            other => Err(format!(
                "unknown rotation '{other}', expected minutely|hourly|daily|never"
            )),
        }
    }
}

/// Where and how request log records are written.
#[derive(Debug, Clone, Default)]
pub struct SinkOptions {
    /// Empty or [`NOP_SINK`] disables the file sink
    pub file_path: String,
    pub rotation: Rotation,
    pub pretty: bool,
    /// Echo every record to stdout
    pub debug: bool,
    /// Color the stdout echo by outcome
    pub color: bool,
}

type SharedWriter = Mutex<Box<dyn Write + Send>>;

/// Destination for request log records: an optional file and an optional
/// console echo. Write failures are reported and swallowed.
pub struct LogSink {
    file: Option<SharedWriter>,
    console: Option<SharedWriter>,
    pretty: bool,
    color: bool,
    _guard: Option<WorkerGuard>,
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogSink")
            .field("file", &self.file.is_some())
            .field("console", &self.console.is_some())
            .field("pretty", &self.pretty)
            .field("color", &self.color)
            .finish()
    }
}

impl LogSink {
    /// Sink that drops everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            file: None,
            console: None,
            pretty: false,
            color: false,
            _guard: None,
        }
    }

    /// Build the file sink (rolling, non-blocking, never dropping records) and
    /// the console echo.
    ///
    /// # Errors
    ///
    /// Fails when the log directory or file cannot be created.
    pub fn from_options(opts: &SinkOptions) -> Result<Self> {
        let mut sink = Self::disabled();
        sink.pretty = opts.pretty;
        sink.color = opts.color;

        let path = opts.file_path.trim();
        if !path.is_empty() && path != NOP_SINK {
            let path = Path::new(path);
            let dir = match path.parent() {
                Some(p) if !p.as_os_str().is_empty() => p,
                _ => Path::new("."),
            };
            let prefix = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("requests.log");
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating request log dir {}", dir.display()))?;
            let appender = RollingFileAppender::builder()
                .rotation(opts.rotation.to_appender())
                .filename_prefix(prefix)
                .build(dir)
                .with_context(|| format!("opening request log {}", path.display()))?;
            // Blocks the writer when the worker queue is full rather than
            // dropping records.
            let (writer, guard) = NonBlockingBuilder::default()
                .lossy(false)
                .finish(appender);
            sink.file = Some(Mutex::new(Box::new(writer)));
            sink._guard = Some(guard);
            info!(
                file_path = %path.display(),
                rotation = %opts.rotation,
                "Request log file sink ready"
            );
        }

        if opts.debug {
            sink.console = Some(Mutex::new(Box::new(io::stdout())));
        }
        Ok(sink)
    }

    /// File sink backed by any writer.
    #[must_use]
    pub fn with_writer(writer: impl Write + Send + 'static, pretty: bool) -> Self {
        let mut sink = Self::disabled();
        sink.file = Some(Mutex::new(Box::new(writer)));
        sink.pretty = pretty;
        sink
    }

    /// Console echo backed by any writer.
    #[must_use]
    pub fn with_console(mut self, writer: impl Write + Send + 'static, color: bool) -> Self {
        self.console = Some(Mutex::new(Box::new(writer)));
        self.color = color;
        self
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.file.is_some() || self.console.is_some()
    }

    /// Serialize `record` and write one line to each configured destination.
    pub fn write(&self, record: &LogRecord) {
        if !self.is_enabled() {
            return;
        }
        let line = if self.pretty {
            serde_json::to_string_pretty(record)
        } else {
            serde_json::to_string(record)
        };
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(request_id = %record.id, error = %e, "Could not serialize request log record");
                return;
            }
        };

        if let Some(file) = &self.file {
            write_line(file, &line, record);
        }
        if let Some(console) = &self.console {
            let echoed = match (self.color, record.is_error()) {
                (false, _) => line,
                (true, true) => line.red().to_string(),
                (true, false) => line.green().to_string(),
            };
            write_line(console, &echoed, record);
        }
    }
}

fn write_line(writer: &SharedWriter, line: &str, record: &LogRecord) {
    let mut w = writer.lock().unwrap_or_else(PoisonError::into_inner);
    let result = w
        .write_all(line.as_bytes())
        .and_then(|()| w.write_all(b"\n"))
        .and_then(|()| w.flush());
    if let Err(e) = result {
        warn!(request_id = %record.id, error = %e, "Request log write failed");
    }
}

/// Cloneable in-memory writer; every clone appends to the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryWriter(Arc<Mutex<Vec<u8>>>);

impl MemoryWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    #[must_use]
    pub fn contents(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Non-empty lines written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
