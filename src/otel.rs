//! Diagnostics logging setup.
//!
//! Installs a `tracing-subscriber` registry with an [`EnvFilter`] and a JSON or
//! pretty formatter. This is the operator-facing log of the service itself;
//! per-request access records go through [`crate::request_log`] instead.
//!
//! `RUST_LOG` always wins over the configured level.

use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Write through a `tracing_appender::non_blocking` stdout worker
    pub async_logging: bool,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            async_logging: true,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Read `BRRTAPI_LOG_LEVEL`, `BRRTAPI_LOG_FORMAT` and `BRRTAPI_LOG_ASYNC`,
    /// falling back to [`LogConfig::default`].
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: lookup("BRRTAPI_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: lookup("BRRTAPI_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            async_logging: lookup("BRRTAPI_LOG_ASYNC")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.async_logging),
            include_location: defaults.include_location,
        }
    }

    /// Debug mode forces `debug` level, pretty output and source locations.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        if debug {
            self.log_level = "debug".to_string();
            self.format = LogFormat::Pretty;
            self.include_location = true;
        }
        self
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

/// Filter used when `RUST_LOG` is not set.
fn default_filter(config: &LogConfig) -> EnvFilter {
    let mut filter = EnvFilter::new(config.level().as_str());
    // may_minihttp reports client disconnects at info; keep its warnings only.
    if let Ok(directive) = "may_minihttp=warn".parse() {
        filter = filter.add_directive(directive);
    }
    filter
}

/// Install the global subscriber.
///
/// Returns the non-blocking writer's guard when `async_logging` is on; keep
/// it alive until exit so buffered lines are flushed.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config));

    let (writer, guard) = if config.async_logging {
        let (nb, guard) = tracing_appender::non_blocking(std::io::stdout());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(nb), Some(guard))
    } else {
        (
            tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout),
            None,
        )
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
