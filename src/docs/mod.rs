//! # API Documentation
//!
//! Documentation is generated from the same [`Registry`] that drives routing,
//! so it cannot drift from what the server actually binds.
//!
//! - [`openapi_document`] builds an OpenAPI 3.1 document, checked against `oas3`
//! - [`render_markdown`] renders a Slate-style Markdown page (`askama`)
//! - [`write_artifacts`] writes both into a directory (the `docs` command)
//! - [`DocsSite`] serves them under the reserved `/docs` routes
//!
//! ```rust
//! use brrtapi::docs::{openapi_document, DocsInfo};
//! use brrtapi::registry::Registry;
//!
//! let doc = openapi_document(&Registry::default(), &DocsInfo::default());
//! assert_eq!(doc["openapi"], "3.1.0");
//! ```

mod groups;
mod markdown;
mod openapi;
mod site;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

use crate::registry::Registry;

pub use groups::{group_endpoints, group_title, DocGroup};
pub use markdown::render_markdown;
pub use openapi::{openapi_document, validate_document};
pub use site::{DocsSite, SPEC_URL};

pub const OPENAPI_FILE: &str = "openapi.json";
pub const MARKDOWN_FILE: &str = "index.html.md";

/// Title block of the generated documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsInfo {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Default for DocsInfo {
    fn default() -> Self {
        Self {
            title: crate::version::APP_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "REST API scaffold with structured request logging.".to_string(),
        }
    }
}

/// Write `openapi.json` and `index.html.md` into `dir`, creating it if needed.
/// Existing files are overwritten, so repeated runs give identical output.
///
/// # Errors
///
/// The generated document fails `oas3` validation, the template fails to
/// render, or a file cannot be written.
pub fn write_artifacts(registry: &Registry, info: &DocsInfo, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create docs dir {}", dir.display()))?;

    let doc = openapi_document(registry, info);
    validate_document(&doc).context("generated OpenAPI document is invalid")?;
    let openapi_path = dir.join(OPENAPI_FILE);
    fs::write(&openapi_path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("failed to write {}", openapi_path.display()))?;

    let markdown = render_markdown(registry, info).context("failed to render api docs")?;
    let markdown_path = dir.join(MARKDOWN_FILE);
    fs::write(&markdown_path, markdown)
        .with_context(|| format!("failed to write {}", markdown_path.display()))?;

    info!(
        dir = %dir.display(),
        endpoints = registry.len(),
        "API documentation written"
    );
    Ok(())
}
