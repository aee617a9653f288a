use anyhow::{Context, Result};
use serde_json::json;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use super::{openapi_document, DocsInfo, OPENAPI_FILE};
use crate::dispatcher::HandlerResult;
use crate::error::{ApiError, CONTENT_JSON};
use crate::registry::{Endpoint, Param, Registry};
use crate::server::{RequestContext, ResponseWriter};
use crate::static_files::StaticFiles;

/// Where the docs page fetches the OpenAPI document from.
pub const SPEC_URL: &str = "/docs/openapi.json";

const INDEX_FILE: &str = "index.html";

/// The reserved `/docs` routes.
///
/// `GET /docs` redirects to `/docs/`, which renders `index.html` from the
/// docs directory. `GET /docs/openapi.json` serves the document published
/// from the frozen registry; any other file comes from the docs directory.
/// None of these requests are written to the request log.
#[derive(Debug)]
pub struct DocsSite {
    files: StaticFiles,
    info: DocsInfo,
    openapi: OnceLock<Vec<u8>>,
}

impl DocsSite {
    pub fn new(dir: impl Into<PathBuf>, info: DocsInfo) -> Arc<Self> {
        Arc::new(Self {
            files: StaticFiles::new(dir),
            info,
            openapi: OnceLock::new(),
        })
    }

    /// Endpoint descriptors for `/docs` and `/docs/{*file}`.
    pub fn endpoints(self: &Arc<Self>) -> Vec<Endpoint> {
        let root = Arc::clone(self);
        let file = Arc::clone(self);
        vec![
            Endpoint::new(
                "/docs",
                move |ctx: &mut RequestContext, res: &mut ResponseWriter| -> HandlerResult {
                    root.serve(ctx, res)
                },
            )
            .name("API Docs")
            .description("Redirects to the rendered API documentation.")
            .response_content_type("text/html"),
            Endpoint::new(
                "/docs/{*file}",
                move |ctx: &mut RequestContext, res: &mut ResponseWriter| -> HandlerResult {
                    file.serve(ctx, res)
                },
            )
            .name("API Docs Files")
            .description("Serves the API documentation and its OpenAPI document.")
            .response_content_type("text/html")
            .path_param(Param::new("file", "documentation file path below the docs directory")),
        ]
    }

    /// Snapshot the OpenAPI document of `registry` for `/docs/openapi.json`.
    ///
    /// Call once after the dispatcher has bound and frozen the registry;
    /// later calls keep the first snapshot.
    ///
    /// # Errors
    ///
    /// The document cannot be serialized.
    pub fn publish(&self, registry: &Registry) -> Result<()> {
        if !registry.is_frozen() {
            warn!("Publishing API docs from a registry that is not frozen");
        }
        let bytes = serde_json::to_vec(&openapi_document(registry, &self.info))
            .context("failed to serialize OpenAPI document")?;
        if self.openapi.set(bytes).is_err() {
            debug!("API docs already published");
        }
        Ok(())
    }

    #[must_use]
    pub fn is_published(&self) -> bool {
        self.openapi.get().is_some()
    }

    fn serve(&self, ctx: &mut RequestContext, res: &mut ResponseWriter) -> HandlerResult {
        ctx.skip_logging();

        let file = match ctx.path_param("file") {
            Some(file) => file.to_string(),
            None if ctx.path().ends_with('/') => INDEX_FILE.to_string(),
            None => {
                res.redirect(301, "/docs/");
                return Ok(());
            }
        };

        if file == OPENAPI_FILE {
            return match self.openapi.get() {
                Some(bytes) => {
                    res.send(200, CONTENT_JSON, bytes);
                    Ok(())
                }
                None => Err(ApiError::new(
                    "api docs requested before publish",
                    "documentation is not available yet",
                    503,
                    None,
                )
                .into()),
            };
        }

        let ctx_vars = json!({ "spec_url": SPEC_URL, "title": self.info.title });
        let page_vars = (file == INDEX_FILE).then_some(&ctx_vars);
        match self.files.load(&file, page_vars) {
            Ok((bytes, content_type)) => {
                res.send(200, content_type, &bytes);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                res.write_header(404);
                Ok(())
            }
            Err(e) => Err(ApiError::new(
                "could not read docs file",
                "could not load documentation",
                500,
                Some(anyhow::Error::new(e).context(file)),
            )
            .into()),
        }
    }
}
