//! # Configuration
//!
//! Application settings loaded from an optional YAML (`.yaml`/`.yml`) or TOML
//! (`.toml`) file. Every field has a default, so an empty file (or no file)
//! yields a runnable configuration. The CLI overrides individual fields after
//! loading.
//!
//! ```yaml
//! port: 9876
//! debug: true
//! color: true
//! any_excluded_methods: [HEAD, DELETE]
//! stack_size: 0x8000
//! log:
//!   file_path: logs/access.log
//!   rotation: daily
//! ```

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::registry::AnyExpansion;
use crate::request_log::{Rotation, SinkOptions};

pub const DEFAULT_PORT: u16 = 9876;
pub const DEFAULT_STACK_SIZE: usize = 0x8000;

/// Request log file settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    /// Empty or `nop://` disables the file sink.
    pub file_path: String,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub debug: bool,
    pub pretty_log: bool,
    pub color: bool,
    pub build_docs: bool,
    pub docs_dir: PathBuf,
    pub any_excluded_methods: Vec<String>,
    /// Coroutine stack size in bytes; accepts `0x8000` or `32768`.
    #[serde(deserialize_with = "stack_size")]
    pub stack_size: usize,
    pub log: LogOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            debug: false,
            pretty_log: false,
            color: false,
            build_docs: false,
            docs_dir: PathBuf::from("docs"),
            any_excluded_methods: vec!["HEAD".to_string(), "DELETE".to_string()],
            stack_size: DEFAULT_STACK_SIZE,
            log: LogOptions::default(),
        }
    }
}

impl AppConfig {
    /// Load `path`, or the defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Unreadable file, unknown extension, or a parse failure. The error
    /// carries the file path.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Self::from_yaml(&text)
                .with_context(|| format!("failed to parse config {}", path.display())),
            "toml" => Self::from_toml(&text)
                .with_context(|| format!("failed to parse config {}", path.display())),
            other => bail!(
                "unsupported config format {other:?} for {}",
                path.display()
            ),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The `Any` expansion described by `any_excluded_methods`.
    ///
    /// # Errors
    ///
    /// An entry that is not a known HTTP method name.
    pub fn any_expansion(&self) -> Result<AnyExpansion> {
        AnyExpansion::from_names(&self.any_excluded_methods)
            .context("invalid any_excluded_methods")
    }

    /// Options for the request log sink.
    #[must_use]
    pub fn sink_options(&self) -> SinkOptions {
        SinkOptions {
            file_path: self.log.file_path.clone(),
            rotation: self.log.rotation,
            pretty: self.pretty_log,
            debug: self.debug,
            color: self.color,
        }
    }
}

fn stack_size<'de, D: Deserializer<'de>>(de: D) -> Result<usize, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(usize),
        Text(String),
    }
    match Raw::deserialize(de)? {
        Raw::Num(n) => Ok(n),
        Raw::Text(s) => parse_stack_size(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid stack size {s:?}"))),
    }
}

/// Parse `0x8000` or `32768`.
#[must_use]
pub fn parse_stack_size(s: &str) -> Option<usize> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
